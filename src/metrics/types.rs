use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::models::StateType;

/// Headline KPIs with previous-period counterparts for trend display.
///
/// Each KPI compares against the window its concept is naturally measured
/// over: completion and carryover are cycle-relative, cycle time and
/// throughput use rolling calendar windows.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiMetrics {
    /// Current cycle progress as a percentage; 0 without a current cycle.
    pub completion_rate: f64,
    /// Mean cycle time (business days) over the trailing 30 days; 0 if none.
    pub average_cycle_time: f64,
    /// Issues completed in the trailing 7 days.
    pub weekly_throughput: u64,
    /// Share of the previous cycle's final scope left incomplete.
    pub carryover_rate: f64,
    pub previous_completion_rate: Option<f64>,
    /// Mean cycle time over the 30-60 day window; `None` if none qualified.
    pub previous_average_cycle_time: Option<f64>,
    /// Issues completed in the 7-14 day window.
    pub previous_weekly_throughput: u64,
    /// Never computed (no "previous of previous" cycle is considered).
    pub previous_carryover_rate: Option<f64>,
}

/// Per-cycle completed/total snapshot taken from the end of each history.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VelocityPoint {
    pub cycle_number: u32,
    pub cycle_name: String,
    pub completed_points: u32,
    pub total_points: u32,
    pub completed_issues: u32,
    pub total_issues: u32,
}

/// Issue count for one workflow-state column.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSlice {
    pub name: String,
    #[serde(rename = "type")]
    pub state_type: StateType,
    pub color: String,
    pub count: u64,
}

/// Issue count for one priority bucket.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrioritySlice {
    pub priority: u8,
    pub label: &'static str,
    pub count: u64,
    pub color: &'static str,
}

/// One day of a cycle's burndown/burnup, with the ideal linear ramp.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BurndownPoint {
    /// 1-based day label.
    pub day: usize,
    pub date: NaiveDate,
    pub remaining: i64,
    pub ideal: f64,
    pub scope: u32,
    pub completed: u32,
    pub in_progress: u32,
}

/// Per-member workload split into completed and in-progress work.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberWorkload {
    pub user: crate::models::User,
    pub assigned_count: u64,
    pub completed_count: u64,
    pub in_progress_count: u64,
    pub total_estimate: f64,
    pub completed_estimate: f64,
    /// Mean cycle time over the member's completed issues; `None` if none.
    pub average_cycle_time: Option<f64>,
}

/// One completed issue plotted by completion date and cycle time.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleTimePoint {
    pub issue_id: String,
    pub identifier: String,
    pub title: String,
    pub completed_at: DateTime<Utc>,
    pub cycle_time_days: i64,
}

/// One end-of-day snapshot of issue counts per workflow state.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CfdPoint {
    pub date: NaiveDate,
    pub counts: BTreeMap<String, u64>,
}

/// Cumulative flow series plus the band order for stacking.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CfdSeries {
    /// State names ordered by workflow position (left to right).
    pub state_names: Vec<String>,
    pub points: Vec<CfdPoint>,
}

/// Average time completed work attributes to a workflow state, plus current
/// occupancy.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusDwell {
    pub name: String,
    pub color: String,
    pub average_days: f64,
    pub issue_count: u64,
    /// Set when the average exceeds twice the overall state average.
    pub is_anomaly: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistogramBin {
    pub range: String,
    pub min: i64,
    pub max: i64,
    pub count: u64,
}

/// Lead-time distribution with headline percentiles.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadTimeHistogram {
    pub bins: Vec<HistogramBin>,
    pub median: f64,
    pub p85: f64,
    pub p95: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskReason {
    Overdue,
    StaleWip,
    HighPriorityUnstarted,
}

/// One risk flag on an open issue. An issue may appear once per reason.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskIssue {
    pub issue_id: String,
    pub identifier: String,
    pub title: String,
    pub priority: u8,
    pub reason: RiskReason,
    pub detail: String,
}
