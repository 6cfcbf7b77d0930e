//! Rule engine turning computed metrics into advisory messages.
//!
//! Thresholds are fixed; rules are independent of each other. The member-WIP
//! rule may emit several entries (one per member over the limit). When
//! nothing fires, a single success message is emitted instead.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::metrics::KpiMetrics;
use crate::models::{Issue, StateType, User};

pub const CARRYOVER_WARNING: f64 = 20.0;
pub const CARRYOVER_DANGER: f64 = 30.0;
pub const SCOPE_CREEP_WARNING: f64 = 10.0;
pub const SCOPE_CREEP_DANGER: f64 = 20.0;
/// Strictly more issues in progress than this flags a member.
pub const WIP_PER_MEMBER_DANGER: u64 = 5;
/// Cycle time at or above this multiple of the previous period warns.
pub const CYCLE_TIME_RATIO_WARNING: f64 = 1.5;
pub const BUG_RATE_DANGER: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Danger,
    Warning,
    Info,
    Success,
}

#[derive(Debug, Clone, Serialize)]
pub struct Insight {
    pub severity: Severity,
    pub title: String,
    pub message: String,
}

impl Insight {
    fn new(severity: Severity, title: &str, message: String) -> Self {
        Self {
            severity,
            title: title.to_string(),
            message,
        }
    }
}

/// Evaluate every rule against the KPI bundle, scope creep, and the raw
/// issue/member collections.
pub fn generate_insights(
    kpi: &KpiMetrics,
    scope_creep: f64,
    issues: &[Issue],
    members: &[User],
) -> Vec<Insight> {
    let mut insights = Vec::new();

    // Carryover rate
    if kpi.carryover_rate > CARRYOVER_DANGER {
        insights.push(Insight::new(
            Severity::Danger,
            "High carryover rate",
            format!(
                "Carryover rate is {:.0}%. Consider revisiting estimation accuracy.",
                kpi.carryover_rate
            ),
        ));
    } else if kpi.carryover_rate > CARRYOVER_WARNING {
        insights.push(Insight::new(
            Severity::Warning,
            "Carryover rate needs attention",
            format!(
                "Carryover rate is {:.0}%. Review how work is being prioritized.",
                kpi.carryover_rate
            ),
        ));
    }

    // Scope creep
    if scope_creep > SCOPE_CREEP_DANGER {
        insights.push(Insight::new(
            Severity::Danger,
            "Scope creep detected",
            format!(
                "Scope grew {scope_creep:.0}% mid-cycle. Consider re-triaging requirements.",
            ),
        ));
    } else if scope_creep > SCOPE_CREEP_WARNING {
        insights.push(Insight::new(
            Severity::Warning,
            "Scope is trending up",
            format!("Scope grew {scope_creep:.0}% mid-cycle."),
        ));
    }

    // WIP concentration per member
    let mut wip_by_member: BTreeMap<&str, u64> = BTreeMap::new();
    for issue in issues {
        if issue.state.state_type != StateType::Started {
            continue;
        }
        if let Some(assignee) = &issue.assignee {
            *wip_by_member.entry(assignee.id.as_str()).or_insert(0) += 1;
        }
    }
    for (member_id, wip) in &wip_by_member {
        if *wip > WIP_PER_MEMBER_DANGER {
            let name = members
                .iter()
                .find(|m| m.id == *member_id)
                .map(|m| m.name.as_str())
                .unwrap_or("A team member");
            insights.push(Insight::new(
                Severity::Danger,
                "WIP limit exceeded",
                format!("{name} has {wip} issues in progress. Consider redistributing work."),
            ));
        }
    }

    // Cycle-time trend
    if let Some(previous) = kpi.previous_average_cycle_time {
        if previous > 0.0 && kpi.average_cycle_time > previous * CYCLE_TIME_RATIO_WARNING {
            let increase = kpi.average_cycle_time / previous * 100.0 - 100.0;
            insights.push(Insight::new(
                Severity::Warning,
                "Cycle time is increasing",
                format!(
                    "Average cycle time is up {increase:.0}% over the previous period. Check for blockers.",
                ),
            ));
        }
    }

    // Bug share of completed work
    let completed: Vec<&Issue> = issues
        .iter()
        .filter(|i| i.state.state_type == StateType::Completed)
        .collect();
    let bugs = completed.iter().filter(|i| i.has_label("bug")).count();
    let bug_rate = if completed.is_empty() {
        0.0
    } else {
        bugs as f64 / completed.len() as f64 * 100.0
    };
    if bug_rate > BUG_RATE_DANGER {
        insights.push(Insight::new(
            Severity::Danger,
            "High bug rate",
            format!(
                "Bugs make up {bug_rate:.0}% of completed issues. Consider quality improvements.",
            ),
        ));
    }

    if insights.is_empty() {
        insights.push(Insight::new(
            Severity::Success,
            "All metrics healthy",
            "All metrics are within normal ranges. Keep it up.".to_string(),
        ));
    }

    insights
}
