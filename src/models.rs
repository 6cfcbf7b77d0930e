//! Domain records as delivered by the upstream tracker API.
//!
//! These are read-only snapshots: the engine never creates, mutates, or
//! deletes them, it only reads and derives. Field names follow the upstream
//! GraphQL payloads (camelCase on the wire).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Categorical type of a workflow state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateType {
    Triage,
    Backlog,
    Unstarted,
    Started,
    Completed,
    Canceled,
}

/// A column in the team's workflow. Positions are unique per team and order
/// columns left-to-right (ascending = earlier in flow).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowState {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub state_type: StateType,
    pub color: String,
    pub position: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub display_name: String,
    pub email: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Label {
    pub id: String,
    pub name: String,
    pub color: String,
}

/// A single tracked issue.
///
/// Timestamps are ground truth for time-based metrics; `state` is used for
/// categorical grouping. The two can disagree in upstream data (e.g. a
/// completion timestamp while the state says otherwise) and the engine
/// tolerates that rather than reconciling it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub id: String,
    pub identifier: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// 0 = none, 1 = urgent, 2 = high, 3 = normal, 4 = low.
    pub priority: u8,
    #[serde(default)]
    pub estimate: Option<f64>,
    pub state: WorkflowState,
    #[serde(default)]
    pub assignee: Option<User>,
    #[serde(default)]
    pub labels: Vec<Label>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub canceled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub archived_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

impl Issue {
    pub fn is_archived(&self) -> bool {
        self.archived_at.is_some()
    }

    /// Neither completed nor canceled by state, and not archived.
    pub fn is_open(&self) -> bool {
        !self.is_archived()
            && self.state.state_type != StateType::Completed
            && self.state.state_type != StateType::Canceled
    }

    pub fn has_label(&self, name: &str) -> bool {
        self.labels.iter().any(|l| l.name.eq_ignore_ascii_case(name))
    }
}

/// A time-boxed iteration with day-indexed scope snapshots.
///
/// The history arrays are parallel: index `i` is the snapshot at the end of
/// day `i + 1` of the cycle. Aligned lengths are an input invariant; reads
/// treat a missing element as 0.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cycle {
    pub id: String,
    /// Team-scoped sequence number, monotonically increasing.
    pub number: u32,
    #[serde(default)]
    pub name: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    /// Completion fraction in [0, 1].
    pub progress: f64,
    #[serde(default)]
    pub scope_history: Vec<u32>,
    #[serde(default)]
    pub completed_scope_history: Vec<u32>,
    #[serde(default)]
    pub in_progress_scope_history: Vec<u32>,
    #[serde(default)]
    pub issue_count_history: Vec<u32>,
    #[serde(default)]
    pub completed_issue_count_history: Vec<u32>,
}

impl Cycle {
    /// Display name, falling back to "Cycle {number}".
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("Cycle {}", self.number))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectState {
    Planned,
    Started,
    Paused,
    Completed,
    Canceled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub state: ProjectState,
    /// Completion fraction in [0, 1].
    pub progress: f64,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub target_date: Option<NaiveDate>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub lead: Option<User>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: String,
    pub name: String,
    pub key: String,
    #[serde(default)]
    pub members: Vec<User>,
    #[serde(default)]
    pub states: Vec<WorkflowState>,
    #[serde(default)]
    pub labels: Vec<Label>,
}

/// Display order for priority distributions: urgent first, "no priority"
/// last.
pub const PRIORITY_ORDER: [u8; 5] = [1, 2, 3, 4, 0];

/// Fixed label for a numeric priority.
pub fn priority_label(priority: u8) -> &'static str {
    match priority {
        1 => "Urgent",
        2 => "High",
        3 => "Normal",
        4 => "Low",
        _ => "No Priority",
    }
}

/// Fixed display color for a numeric priority.
pub fn priority_color(priority: u8) -> &'static str {
    match priority {
        1 => "hsl(0, 84%, 60%)",
        2 => "hsl(25, 95%, 53%)",
        3 => "hsl(221, 83%, 53%)",
        _ => "hsl(var(--muted-foreground))",
    }
}
