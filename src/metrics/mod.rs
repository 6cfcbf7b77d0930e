//! Derived delivery metrics.
//!
//! Every function here is a pure batch transform over immutable snapshot
//! slices: no I/O, no shared state, re-entrant by construction. Time-relative
//! metrics take the reference instant as an explicit `now` argument.

pub mod types;

pub use types::*;

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};

use crate::date_util::{business_days_between, format_short_date};
use crate::models::{
    priority_color, priority_label, Cycle, Issue, StateType, User, WorkflowState, PRIORITY_ORDER,
};
use crate::stats::{mean, percentile};

/// Issues in a started state for at least this many business days are
/// flagged as stale work-in-progress.
pub const STALE_WIP_BUSINESS_DAYS: i64 = 5;

// ── Per-issue derivations ──────────────────────────────────────────

/// Business days from work start to completion.
///
/// Measures from `started_at`, falling back to `created_at` for issues that
/// were never explicitly started. `None` without a completion timestamp.
pub fn cycle_time(issue: &Issue) -> Option<i64> {
    let completed = issue.completed_at?;
    let start = issue.started_at.unwrap_or(issue.created_at);
    Some(business_days_between(start, completed))
}

/// Business days from creation to completion, backlog wait included.
///
/// Always at least `cycle_time` for the same issue. `None` without a
/// completion timestamp.
pub fn lead_time(issue: &Issue) -> Option<i64> {
    let completed = issue.completed_at?;
    Some(business_days_between(issue.created_at, completed))
}

// ── KPI bundle ─────────────────────────────────────────────────────

/// Headline KPIs with previous-period counterparts.
///
/// `previous` is the cycle immediately preceding `current` by sequence
/// number; carryover is computed from its final history snapshot. Cycle time
/// and throughput use rolling calendar windows (30/7 days) rather than cycle
/// boundaries.
pub fn kpi_metrics(
    issues: &[Issue],
    current: Option<&Cycle>,
    previous: Option<&Cycle>,
    now: DateTime<Utc>,
) -> KpiMetrics {
    let one_week_ago = now - Duration::days(7);
    let two_weeks_ago = now - Duration::days(14);
    let thirty_days_ago = now - Duration::days(30);
    let sixty_days_ago = now - Duration::days(60);

    let completion_rate = current.map_or(0.0, |c| c.progress * 100.0);
    let previous_completion_rate = previous.map(|c| c.progress * 100.0);

    let recent_times: Vec<f64> = issues
        .iter()
        .filter(|i| i.completed_at.is_some_and(|c| c > thirty_days_ago))
        .filter_map(cycle_time)
        .map(|d| d as f64)
        .collect();
    let average_cycle_time = mean(&recent_times).unwrap_or(0.0);

    let prior_times: Vec<f64> = issues
        .iter()
        .filter(|i| {
            i.completed_at
                .is_some_and(|c| c > sixty_days_ago && c <= thirty_days_ago)
        })
        .filter_map(cycle_time)
        .map(|d| d as f64)
        .collect();
    let previous_average_cycle_time = mean(&prior_times);

    let weekly_throughput = issues
        .iter()
        .filter(|i| i.completed_at.is_some_and(|c| c > one_week_ago))
        .count() as u64;
    let previous_weekly_throughput = issues
        .iter()
        .filter(|i| {
            i.completed_at
                .is_some_and(|c| c > two_weeks_ago && c <= one_week_ago)
        })
        .count() as u64;

    let mut carryover_rate = 0.0;
    if let Some(prev) = previous {
        if let (Some(&total), Some(&completed)) = (
            prev.scope_history.last(),
            prev.completed_scope_history.last(),
        ) {
            if total > 0 {
                carryover_rate = (total as f64 - completed as f64) / total as f64 * 100.0;
            }
        }
    }

    KpiMetrics {
        completion_rate,
        average_cycle_time,
        weekly_throughput,
        carryover_rate,
        previous_completion_rate,
        previous_average_cycle_time,
        previous_weekly_throughput,
        previous_carryover_rate: None,
    }
}

// ── Velocity ───────────────────────────────────────────────────────

/// Per-cycle completed/total snapshots, one point per cycle.
///
/// `cycles` is expected pre-sorted ascending by number. Each point reads the
/// last element of the relevant history array (0 when empty); there is no
/// cross-cycle computation.
pub fn velocity_series(cycles: &[Cycle]) -> Vec<VelocityPoint> {
    cycles
        .iter()
        .map(|cycle| VelocityPoint {
            cycle_number: cycle.number,
            cycle_name: cycle.display_name(),
            completed_points: cycle.completed_scope_history.last().copied().unwrap_or(0),
            total_points: cycle.scope_history.last().copied().unwrap_or(0),
            completed_issues: cycle
                .completed_issue_count_history
                .last()
                .copied()
                .unwrap_or(0),
            total_issues: cycle.issue_count_history.last().copied().unwrap_or(0),
        })
        .collect()
}

// ── Distributions ──────────────────────────────────────────────────

/// Non-archived issues grouped by workflow-state name, in first-seen order.
/// The state type and color are taken from the first issue seen per name.
pub fn status_distribution(issues: &[Issue]) -> Vec<StatusSlice> {
    let mut slices: Vec<StatusSlice> = Vec::new();
    for issue in issues.iter().filter(|i| !i.is_archived()) {
        match slices.iter_mut().find(|s| s.name == issue.state.name) {
            Some(slice) => slice.count += 1,
            None => slices.push(StatusSlice {
                name: issue.state.name.clone(),
                state_type: issue.state.state_type,
                color: issue.state.color.clone(),
                count: 1,
            }),
        }
    }
    slices
}

/// Open issues counted per priority, emitted urgent-first with "no priority"
/// last, restricted to priorities actually present.
pub fn priority_distribution(issues: &[Issue]) -> Vec<PrioritySlice> {
    let mut counts: BTreeMap<u8, u64> = BTreeMap::new();
    for issue in issues.iter().filter(|i| i.is_open()) {
        *counts.entry(issue.priority).or_insert(0) += 1;
    }

    PRIORITY_ORDER
        .iter()
        .filter_map(|&priority| {
            counts.get(&priority).map(|&count| PrioritySlice {
                priority,
                label: priority_label(priority),
                count,
                color: priority_color(priority),
            })
        })
        .collect()
}

// ── Burndown / burnup ──────────────────────────────────────────────

/// Daily burndown/burnup points for one cycle.
///
/// The ideal line ramps linearly from the initial scope to zero on the final
/// snapshotted day. Cycles with fewer than two snapshots yield an empty
/// series.
pub fn burndown_series(cycle: &Cycle) -> Vec<BurndownPoint> {
    let days = cycle.scope_history.len();
    if days <= 1 {
        return Vec::new();
    }

    let initial = cycle.scope_history[0] as f64;
    let start = cycle.starts_at.date_naive();

    cycle
        .scope_history
        .iter()
        .enumerate()
        .map(|(i, &scope)| {
            let completed = cycle.completed_scope_history.get(i).copied().unwrap_or(0);
            let in_progress = cycle
                .in_progress_scope_history
                .get(i)
                .copied()
                .unwrap_or(0);
            let ideal = (initial - (initial / (days - 1) as f64) * i as f64).max(0.0);

            BurndownPoint {
                day: i + 1,
                date: start + Duration::days(i as i64),
                remaining: scope as i64 - completed as i64,
                ideal,
                scope,
                completed,
                in_progress,
            }
        })
        .collect()
}

// ── Scope creep ────────────────────────────────────────────────────

/// Percentage growth of total scope from the first to the latest snapshot.
/// 0 with fewer than two snapshots or zero initial scope.
pub fn scope_creep(cycle: &Cycle) -> f64 {
    if cycle.scope_history.len() < 2 {
        return 0.0;
    }
    let initial = cycle.scope_history[0] as f64;
    let latest = cycle.scope_history[cycle.scope_history.len() - 1] as f64;
    if initial > 0.0 {
        (latest - initial) / initial * 100.0
    } else {
        0.0
    }
}

// ── Member workload ────────────────────────────────────────────────

/// Assigned/completed/in-progress split per team member, with estimate sums
/// and mean cycle time over the member's completed issues.
pub fn member_workload(issues: &[Issue], members: &[User]) -> Vec<MemberWorkload> {
    members
        .iter()
        .map(|member| {
            let assigned: Vec<&Issue> = issues
                .iter()
                .filter(|i| {
                    !i.is_archived() && i.assignee.as_ref().is_some_and(|a| a.id == member.id)
                })
                .collect();

            let completed: Vec<&&Issue> = assigned
                .iter()
                .filter(|i| i.state.state_type == StateType::Completed)
                .collect();
            let in_progress_count = assigned
                .iter()
                .filter(|i| i.state.state_type == StateType::Started)
                .count() as u64;

            let times: Vec<f64> = completed
                .iter()
                .filter_map(|i| cycle_time(i))
                .map(|d| d as f64)
                .collect();

            MemberWorkload {
                user: member.clone(),
                assigned_count: assigned.len() as u64,
                completed_count: completed.len() as u64,
                in_progress_count,
                total_estimate: assigned.iter().map(|i| i.estimate.unwrap_or(0.0)).sum(),
                completed_estimate: completed.iter().map(|i| i.estimate.unwrap_or(0.0)).sum(),
                average_cycle_time: mean(&times),
            }
        })
        .collect()
}

// ── Cycle-time scatter ─────────────────────────────────────────────

/// Completed issues with a nonzero cycle time, ordered by completion
/// instant.
pub fn cycle_time_scatter(issues: &[Issue]) -> Vec<CycleTimePoint> {
    let mut points: Vec<CycleTimePoint> = issues
        .iter()
        .filter_map(|issue| {
            let completed_at = issue.completed_at?;
            let days = cycle_time(issue)?;
            if days <= 0 {
                return None;
            }
            Some(CycleTimePoint {
                issue_id: issue.id.clone(),
                identifier: issue.identifier.clone(),
                title: issue.title.clone(),
                completed_at,
                cycle_time_days: days,
            })
        })
        .collect();
    points.sort_by_key(|p| p.completed_at);
    points
}

// ── Cumulative flow ────────────────────────────────────────────────

/// End-of-day issue counts per workflow state over the trailing `days`.
///
/// Known limitation: with no state-transition log available, every issue is
/// classified by its present-day state applied retroactively. Bands show
/// current-state membership over time, not true historical state occupancy.
/// Issues not yet created at a snapshot are excluded, issues canceled by
/// then are excluded, and everything else counts under its current state
/// name.
pub fn cumulative_flow(
    issues: &[Issue],
    states: &[WorkflowState],
    days: usize,
    now: DateTime<Utc>,
) -> CfdSeries {
    let mut ordered: Vec<&WorkflowState> = states.iter().collect();
    ordered.sort_by(|a, b| a.position.total_cmp(&b.position));
    let state_names: Vec<String> = ordered.iter().map(|s| s.name.clone()).collect();

    let mut points = Vec::with_capacity(days);
    for offset in (0..days).rev() {
        let day = (now - Duration::days(offset as i64)).date_naive();
        let cutoff = day.and_hms_milli_opt(23, 59, 59, 999).unwrap().and_utc();

        let mut counts: BTreeMap<String, u64> =
            state_names.iter().map(|n| (n.clone(), 0)).collect();

        for issue in issues {
            if issue.created_at > cutoff {
                continue;
            }
            if issue.completed_at.is_some_and(|c| c <= cutoff) {
                *counts.entry(issue.state.name.clone()).or_insert(0) += 1;
                continue;
            }
            if issue.canceled_at.is_some_and(|c| c <= cutoff) {
                continue;
            }
            *counts.entry(issue.state.name.clone()).or_insert(0) += 1;
        }

        points.push(CfdPoint { date: day, counts });
    }

    CfdSeries {
        state_names,
        points,
    }
}

// ── Status dwell time ──────────────────────────────────────────────

/// Mean cycle time attributed to each workflow state, with current
/// occupancy counts.
///
/// A state is anomalous when its average exceeds twice the overall average
/// across states (states with a zero average do not dilute the divisor,
/// which is floored at one).
pub fn status_dwell_times(issues: &[Issue], states: &[WorkflowState]) -> Vec<StatusDwell> {
    let mut totals: BTreeMap<&str, (i64, u64)> =
        states.iter().map(|s| (s.name.as_str(), (0, 0))).collect();

    for issue in issues {
        if issue.completed_at.is_none() {
            continue;
        }
        let Some(days) = cycle_time(issue) else {
            continue;
        };
        if let Some(entry) = totals.get_mut(issue.state.name.as_str()) {
            entry.0 += days;
            entry.1 += 1;
        }
    }

    let mut occupancy: BTreeMap<&str, u64> = BTreeMap::new();
    for issue in issues.iter().filter(|i| !i.is_archived()) {
        *occupancy.entry(issue.state.name.as_str()).or_insert(0) += 1;
    }

    let mut results: Vec<StatusDwell> = states
        .iter()
        .map(|state| {
            let (total, count) = totals
                .get(state.name.as_str())
                .copied()
                .unwrap_or((0, 0));
            let average_days = if count > 0 {
                total as f64 / count as f64
            } else {
                0.0
            };
            StatusDwell {
                name: state.name.clone(),
                color: state.color.clone(),
                average_days,
                issue_count: occupancy.get(state.name.as_str()).copied().unwrap_or(0),
                is_anomaly: false,
            }
        })
        .collect();

    let contributing = results
        .iter()
        .filter(|r| r.average_days > 0.0)
        .count()
        .max(1);
    let overall = results.iter().map(|r| r.average_days).sum::<f64>() / contributing as f64;

    for dwell in &mut results {
        dwell.is_anomaly = dwell.average_days > overall * 2.0;
    }

    results
}

// ── Lead-time histogram ────────────────────────────────────────────

/// Lead-time distribution over completed issues, with median/p85/p95.
///
/// Zero-day lead times are excluded. Bins are half-open `[min, max)` with a
/// width of `ceil((max - min) / bin_count)`, floored at one day. Empty input
/// yields empty bins and zero percentiles.
pub fn lead_time_histogram(issues: &[Issue], bin_count: usize) -> LeadTimeHistogram {
    let bin_count = bin_count.max(1);

    let mut lead_times: Vec<i64> = issues
        .iter()
        .filter_map(lead_time)
        .filter(|&days| days > 0)
        .collect();
    lead_times.sort_unstable();

    if lead_times.is_empty() {
        return LeadTimeHistogram::default();
    }

    let sorted: Vec<f64> = lead_times.iter().map(|&d| d as f64).collect();
    let median = percentile(&sorted, 50.0);
    let p85 = percentile(&sorted, 85.0);
    let p95 = percentile(&sorted, 95.0);

    let min = lead_times[0];
    let max = lead_times[lead_times.len() - 1];
    let bin_width = (((max - min) as f64 / bin_count as f64).ceil() as i64).max(1);

    let mut bins = Vec::with_capacity(bin_count);
    for i in 0..bin_count {
        let bin_min = min + i as i64 * bin_width;
        let bin_max = bin_min + bin_width;
        let count = lead_times
            .iter()
            .filter(|&&lt| lt >= bin_min && lt < bin_max)
            .count() as u64;
        bins.push(HistogramBin {
            range: format!("{bin_min}-{bin_max}"),
            min: bin_min,
            max: bin_max,
            count,
        });
    }

    LeadTimeHistogram {
        bins,
        median,
        p85,
        p95,
    }
}

// ── Risk detection ─────────────────────────────────────────────────

/// Flag open issues that need attention, one entry per (issue, reason).
///
/// Reasons: past due date; in progress for `STALE_WIP_BUSINESS_DAYS` or
/// more; urgent/high priority while still unstarted. Completed, canceled,
/// and archived issues are never flagged. Output sorts ascending by numeric
/// priority.
pub fn detect_risks(issues: &[Issue], now: DateTime<Utc>) -> Vec<RiskIssue> {
    let mut risks = Vec::new();

    for issue in issues {
        if !issue.is_open() {
            continue;
        }

        if let Some(due) = issue.due_date {
            let due_start = due.and_hms_opt(0, 0, 0).unwrap().and_utc();
            if due_start < now {
                risks.push(risk(issue, RiskReason::Overdue, format!(
                    "past due {}",
                    format_short_date(due)
                )));
            }
        }

        if issue.state.state_type == StateType::Started {
            if let Some(started) = issue.started_at {
                let days = business_days_between(started, now);
                if days >= STALE_WIP_BUSINESS_DAYS {
                    risks.push(risk(
                        issue,
                        RiskReason::StaleWip,
                        format!("{days} business days in progress"),
                    ));
                }
            }
        }

        if (issue.priority == 1 || issue.priority == 2)
            && matches!(
                issue.state.state_type,
                StateType::Backlog | StateType::Unstarted | StateType::Triage
            )
        {
            risks.push(risk(
                issue,
                RiskReason::HighPriorityUnstarted,
                format!("{} priority, not started", priority_label(issue.priority)),
            ));
        }
    }

    risks.sort_by_key(|r| r.priority);
    risks
}

fn risk(issue: &Issue, reason: RiskReason, detail: String) -> RiskIssue {
    RiskIssue {
        issue_id: issue.id.clone(),
        identifier: issue.identifier.clone(),
        title: issue.title.clone(),
        priority: issue.priority,
        reason,
        detail,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 9, 0, 0).unwrap()
    }

    fn state(name: &str, state_type: StateType, position: f64) -> WorkflowState {
        WorkflowState {
            id: format!("st_{name}"),
            name: name.to_string(),
            state_type,
            color: "#888888".to_string(),
            position,
        }
    }

    fn member(id: &str, name: &str) -> User {
        User {
            id: id.to_string(),
            name: name.to_string(),
            display_name: name.to_lowercase(),
            email: format!("{}@example.com", name.to_lowercase()),
            avatar_url: None,
        }
    }

    fn issue(id: &str, st: WorkflowState) -> Issue {
        Issue {
            id: id.to_string(),
            identifier: format!("ENG-{id}"),
            title: format!("Issue {id}"),
            description: None,
            priority: 3,
            estimate: None,
            state: st,
            assignee: None,
            labels: vec![],
            created_at: at(2025, 3, 3),
            updated_at: at(2025, 3, 3),
            started_at: None,
            completed_at: None,
            canceled_at: None,
            archived_at: None,
            due_date: None,
        }
    }

    fn cycle(number: u32, scope: &[u32], completed: &[u32]) -> Cycle {
        Cycle {
            id: format!("cyc_{number}"),
            number,
            name: None,
            starts_at: at(2025, 3, 3),
            ends_at: at(2025, 3, 17),
            progress: 0.0,
            scope_history: scope.to_vec(),
            completed_scope_history: completed.to_vec(),
            in_progress_scope_history: vec![],
            issue_count_history: vec![],
            completed_issue_count_history: vec![],
        }
    }

    fn done_state() -> WorkflowState {
        state("Done", StateType::Completed, 5.0)
    }

    // ── cycle time / lead time ─────────────────────────────────────

    #[test]
    fn test_cycle_and_lead_time() {
        // Created Mon 3/3, started two business days later (Wed 3/5),
        // completed seven business days after creation (Wed 3/12).
        let mut i = issue("1", done_state());
        i.started_at = Some(at(2025, 3, 5));
        i.completed_at = Some(at(2025, 3, 12));

        assert_eq!(lead_time(&i), Some(7));
        assert_eq!(cycle_time(&i), Some(5));
    }

    #[test]
    fn test_cycle_time_falls_back_to_created_at() {
        let mut i = issue("1", done_state());
        i.completed_at = Some(at(2025, 3, 12));

        assert_eq!(cycle_time(&i), Some(7));
        assert_eq!(cycle_time(&i), lead_time(&i));
    }

    #[test]
    fn test_incomplete_issue_has_no_times() {
        let mut i = issue("1", state("In Progress", StateType::Started, 3.0));
        i.started_at = Some(at(2025, 3, 5));

        assert_eq!(cycle_time(&i), None);
        assert_eq!(lead_time(&i), None);
    }

    #[test]
    fn test_lead_time_never_below_cycle_time() {
        for (started, completed) in [
            (Some(at(2025, 3, 4)), at(2025, 3, 10)),
            (Some(at(2025, 3, 7)), at(2025, 3, 21)),
            (None, at(2025, 3, 14)),
        ] {
            let mut i = issue("1", done_state());
            i.started_at = started;
            i.completed_at = Some(completed);
            assert!(lead_time(&i).unwrap() >= cycle_time(&i).unwrap());
        }
    }

    // ── KPI bundle ─────────────────────────────────────────────────

    #[test]
    fn test_kpi_metrics_windows() {
        let now = Utc.with_ymd_and_hms(2025, 4, 30, 12, 0, 0).unwrap();

        // Completed within the trailing 30 days; cycle time 3.
        let mut recent = issue("1", done_state());
        recent.created_at = at(2025, 4, 21);
        recent.started_at = Some(at(2025, 4, 22));
        recent.completed_at = Some(at(2025, 4, 25));

        // Completed in the 30-60 day window; cycle time 2.
        let mut prior = issue("2", done_state());
        prior.created_at = at(2025, 3, 17);
        prior.started_at = Some(at(2025, 3, 18));
        prior.completed_at = Some(at(2025, 3, 20));

        let issues = vec![recent, prior];

        let mut current = cycle(8, &[10, 10], &[0, 4]);
        current.progress = 0.45;
        let previous = cycle(7, &[10, 12], &[0, 9]);

        let kpi = kpi_metrics(&issues, Some(&current), Some(&previous), now);

        assert_eq!(kpi.completion_rate, 45.0);
        assert_eq!(kpi.previous_completion_rate, Some(0.0));
        assert_eq!(kpi.average_cycle_time, 3.0);
        assert_eq!(kpi.previous_average_cycle_time, Some(2.0));
        assert_eq!(kpi.weekly_throughput, 1);
        assert_eq!(kpi.previous_weekly_throughput, 0);
        assert_eq!(kpi.carryover_rate, 25.0);
        assert_eq!(kpi.previous_carryover_rate, None);
    }

    #[test]
    fn test_kpi_metrics_without_cycles() {
        let now = Utc.with_ymd_and_hms(2025, 4, 30, 12, 0, 0).unwrap();
        let kpi = kpi_metrics(&[], None, None, now);

        assert_eq!(kpi.completion_rate, 0.0);
        assert_eq!(kpi.previous_completion_rate, None);
        assert_eq!(kpi.average_cycle_time, 0.0);
        assert_eq!(kpi.previous_average_cycle_time, None);
        assert_eq!(kpi.weekly_throughput, 0);
        assert_eq!(kpi.carryover_rate, 0.0);
    }

    #[test]
    fn test_kpi_carryover_guards_zero_scope() {
        let now = Utc.with_ymd_and_hms(2025, 4, 30, 12, 0, 0).unwrap();
        let previous = cycle(7, &[0, 0], &[0, 0]);
        let kpi = kpi_metrics(&[], None, Some(&previous), now);
        assert_eq!(kpi.carryover_rate, 0.0);

        let empty = cycle(7, &[], &[]);
        let kpi = kpi_metrics(&[], None, Some(&empty), now);
        assert_eq!(kpi.carryover_rate, 0.0);
    }

    // ── velocity ───────────────────────────────────────────────────

    #[test]
    fn test_velocity_series_reads_final_snapshots() {
        let mut a = cycle(1, &[10, 12], &[4, 9]);
        a.issue_count_history = vec![5, 6];
        a.completed_issue_count_history = vec![2, 5];
        let mut b = cycle(2, &[], &[]);
        b.name = Some("Sprint Omega".to_string());

        let points = velocity_series(&[a, b]);

        assert_eq!(points.len(), 2);
        assert_eq!(points[0].cycle_name, "Cycle 1");
        assert_eq!(points[0].total_points, 12);
        assert_eq!(points[0].completed_points, 9);
        assert_eq!(points[0].total_issues, 6);
        assert_eq!(points[0].completed_issues, 5);
        assert_eq!(points[1].cycle_name, "Sprint Omega");
        assert_eq!(points[1].total_points, 0);
        assert_eq!(points[1].completed_points, 0);
    }

    // ── distributions ──────────────────────────────────────────────

    #[test]
    fn test_status_distribution_first_seen_order() {
        let backlog = state("Backlog", StateType::Backlog, 1.0);
        let started = state("In Progress", StateType::Started, 3.0);

        let mut archived = issue("4", backlog.clone());
        archived.archived_at = Some(at(2025, 3, 10));

        let issues = vec![
            issue("1", started.clone()),
            issue("2", backlog.clone()),
            issue("3", started.clone()),
            archived,
        ];

        let slices = status_distribution(&issues);
        assert_eq!(slices.len(), 2);
        assert_eq!(slices[0].name, "In Progress");
        assert_eq!(slices[0].count, 2);
        assert_eq!(slices[0].state_type, StateType::Started);
        assert_eq!(slices[1].name, "Backlog");
        assert_eq!(slices[1].count, 1);
    }

    #[test]
    fn test_priority_distribution_fixed_order() {
        let backlog = state("Backlog", StateType::Backlog, 1.0);

        let mut urgent_done = issue("1", done_state());
        urgent_done.priority = 1;
        let mut high_a = issue("2", backlog.clone());
        high_a.priority = 2;
        let mut high_b = issue("3", backlog.clone());
        high_b.priority = 2;
        let mut none = issue("4", backlog.clone());
        none.priority = 0;
        let normal = issue("5", backlog.clone());

        let slices =
            priority_distribution(&[urgent_done, high_a, high_b, none, normal]);

        // Completed issue excluded; order is [1, 2, 3, 4, 0] filtered.
        let priorities: Vec<u8> = slices.iter().map(|s| s.priority).collect();
        assert_eq!(priorities, vec![2, 3, 0]);
        assert_eq!(slices[0].count, 2);
        assert_eq!(slices[0].label, "High");
        assert_eq!(slices[2].label, "No Priority");
    }

    // ── burndown ───────────────────────────────────────────────────

    #[test]
    fn test_burndown_series() {
        let mut c = cycle(1, &[10, 10, 12, 12], &[0, 2, 5, 9]);
        c.in_progress_scope_history = vec![3, 4, 4, 2];

        let series = burndown_series(&c);

        assert_eq!(series.len(), 4);
        assert_eq!(series[0].day, 1);
        assert_eq!(series[0].date, c.starts_at.date_naive());
        assert_eq!(series[0].remaining, 10);
        assert_eq!(series[0].ideal, 10.0);
        assert_eq!(series[3].day, 4);
        assert_eq!(series[3].remaining, 3);
        assert_eq!(series[3].ideal, 0.0);
        assert_eq!(series[3].scope, 12);
        assert_eq!(series[3].in_progress, 2);
        // Interior ideal points descend linearly.
        assert!((series[1].ideal - 10.0 * 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_burndown_degenerate_histories() {
        assert!(burndown_series(&cycle(1, &[], &[])).is_empty());
        assert!(burndown_series(&cycle(1, &[10], &[0])).is_empty());
    }

    // ── scope creep ────────────────────────────────────────────────

    #[test]
    fn test_scope_creep() {
        assert_eq!(scope_creep(&cycle(1, &[10, 10, 12, 12], &[])), 20.0);
        assert!((scope_creep(&cycle(1, &[12, 10], &[])) + 100.0 / 6.0).abs() < 1e-9);
        assert_eq!(scope_creep(&cycle(1, &[10], &[])), 0.0);
        assert_eq!(scope_creep(&cycle(1, &[], &[])), 0.0);
        assert_eq!(scope_creep(&cycle(1, &[0, 5], &[])), 0.0);
    }

    // ── member workload ────────────────────────────────────────────

    #[test]
    fn test_member_workload() {
        let alice = member("u1", "Alice");
        let bob = member("u2", "Bob");
        let started = state("In Progress", StateType::Started, 3.0);

        let mut done_a = issue("1", done_state());
        done_a.assignee = Some(alice.clone());
        done_a.estimate = Some(3.0);
        done_a.started_at = Some(at(2025, 3, 3));
        done_a.completed_at = Some(at(2025, 3, 6));

        let mut done_b = issue("2", done_state());
        done_b.assignee = Some(alice.clone());
        done_b.estimate = Some(2.0);
        done_b.started_at = Some(at(2025, 3, 3));
        done_b.completed_at = Some(at(2025, 3, 10));

        let mut wip = issue("3", started.clone());
        wip.assignee = Some(alice.clone());

        let mut archived = issue("4", started);
        archived.assignee = Some(alice.clone());
        archived.archived_at = Some(at(2025, 3, 10));

        let issues = vec![done_a, done_b, wip, archived];
        let workload = member_workload(&issues, &[alice, bob]);

        assert_eq!(workload.len(), 2);
        assert_eq!(workload[0].assigned_count, 3);
        assert_eq!(workload[0].completed_count, 2);
        assert_eq!(workload[0].in_progress_count, 1);
        assert_eq!(workload[0].total_estimate, 5.0);
        assert_eq!(workload[0].completed_estimate, 5.0);
        // Cycle times 3 and 5 business days.
        assert_eq!(workload[0].average_cycle_time, Some(4.0));

        assert_eq!(workload[1].assigned_count, 0);
        assert_eq!(workload[1].average_cycle_time, None);
    }

    // ── cycle-time scatter ─────────────────────────────────────────

    #[test]
    fn test_cycle_time_scatter_orders_and_filters() {
        let mut fast = issue("1", done_state());
        fast.started_at = Some(at(2025, 3, 10));
        fast.completed_at = Some(at(2025, 3, 10));

        let mut late = issue("2", done_state());
        late.started_at = Some(at(2025, 3, 10));
        late.completed_at = Some(at(2025, 3, 14));

        let mut early = issue("3", done_state());
        early.started_at = Some(at(2025, 3, 3));
        early.completed_at = Some(at(2025, 3, 5));

        let open = issue("4", state("Backlog", StateType::Backlog, 1.0));

        let points = cycle_time_scatter(&[fast, late, early, open]);

        // Zero-cycle-time and open issues drop out; rest sort by completion.
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].identifier, "ENG-3");
        assert_eq!(points[0].cycle_time_days, 2);
        assert_eq!(points[1].identifier, "ENG-2");
        assert_eq!(points[1].cycle_time_days, 4);
    }

    // ── cumulative flow ────────────────────────────────────────────

    #[test]
    fn test_cumulative_flow() {
        let now = Utc.with_ymd_and_hms(2025, 3, 14, 9, 0, 0).unwrap();
        let states = [
            state("Done", StateType::Completed, 5.0),
            state("Backlog", StateType::Backlog, 1.0),
            state("In Progress", StateType::Started, 3.0),
        ];

        // Created mid-window.
        let mut fresh = issue("1", state("Backlog", StateType::Backlog, 1.0));
        fresh.created_at = at(2025, 3, 13);

        // Canceled mid-window; counts under its current state before that.
        let mut dropped = issue("2", state("In Progress", StateType::Started, 3.0));
        dropped.canceled_at = Some(at(2025, 3, 13));

        // Completed before the window; counts under its current state.
        let mut done = issue("3", done_state());
        done.completed_at = Some(at(2025, 3, 10));

        let series = cumulative_flow(&[fresh, dropped, done], &states, 3, now);

        // Band order follows workflow position, not input order.
        assert_eq!(series.state_names, vec!["Backlog", "In Progress", "Done"]);
        assert_eq!(series.points.len(), 3);

        let dates: Vec<chrono::NaiveDate> =
            series.points.iter().map(|p| p.date).collect();
        assert_eq!(
            dates,
            vec![
                chrono::NaiveDate::from_ymd_opt(2025, 3, 12).unwrap(),
                chrono::NaiveDate::from_ymd_opt(2025, 3, 13).unwrap(),
                chrono::NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
            ]
        );

        // Day 1: fresh not yet created, dropped still active, done counted.
        assert_eq!(series.points[0].counts["Backlog"], 0);
        assert_eq!(series.points[0].counts["In Progress"], 1);
        assert_eq!(series.points[0].counts["Done"], 1);

        // Day 2: fresh appears, dropped is canceled out.
        assert_eq!(series.points[1].counts["Backlog"], 1);
        assert_eq!(series.points[1].counts["In Progress"], 0);
        assert_eq!(series.points[1].counts["Done"], 1);

        // Day 3 matches day 2.
        assert_eq!(series.points[2].counts["Backlog"], 1);
        assert_eq!(series.points[2].counts["Done"], 1);
    }

    // ── status dwell time ──────────────────────────────────────────

    #[test]
    fn test_status_dwell_times_flags_anomaly() {
        let review = state("Review", StateType::Started, 4.0);
        let done = done_state();
        let backlog = state("Backlog", StateType::Backlog, 1.0);
        let states = [backlog.clone(), review.clone(), done.clone()];

        // Ten business days attributed to Review.
        let mut slow = issue("1", review.clone());
        slow.started_at = Some(at(2025, 3, 3));
        slow.completed_at = Some(at(2025, 3, 17));

        // One business day each attributed to Done and Backlog.
        let mut quick_a = issue("2", done.clone());
        quick_a.started_at = Some(at(2025, 3, 3));
        quick_a.completed_at = Some(at(2025, 3, 4));
        let mut quick_b = issue("3", backlog.clone());
        quick_b.started_at = Some(at(2025, 3, 3));
        quick_b.completed_at = Some(at(2025, 3, 4));

        let waiting = issue("4", backlog.clone());

        let dwell = status_dwell_times(&[slow, quick_a, quick_b, waiting], &states);

        assert_eq!(dwell.len(), 3);
        assert_eq!(dwell[0].name, "Backlog");
        assert_eq!(dwell[0].average_days, 1.0);
        assert_eq!(dwell[0].issue_count, 2);
        assert!(!dwell[0].is_anomaly);

        // Overall average is (10 + 1 + 1) / 3 = 4; only Review exceeds 8.
        assert_eq!(dwell[1].name, "Review");
        assert_eq!(dwell[1].average_days, 10.0);
        assert_eq!(dwell[1].issue_count, 1);
        assert!(dwell[1].is_anomaly);

        assert!(!dwell[2].is_anomaly);
    }

    #[test]
    fn test_status_dwell_times_empty() {
        let states = [state("Backlog", StateType::Backlog, 1.0)];
        let dwell = status_dwell_times(&[], &states);
        assert_eq!(dwell.len(), 1);
        assert_eq!(dwell[0].average_days, 0.0);
        assert_eq!(dwell[0].issue_count, 0);
        assert!(!dwell[0].is_anomaly);
    }

    // ── lead-time histogram ────────────────────────────────────────

    #[test]
    fn test_lead_time_histogram() {
        // Lead times 1, 2, 2, 3, 5, 8, 13 business days.
        let offsets = [1u32, 2, 2, 3, 5, 8, 13];
        let completions = [
            at(2025, 3, 4),
            at(2025, 3, 5),
            at(2025, 3, 5),
            at(2025, 3, 6),
            at(2025, 3, 10),
            at(2025, 3, 13),
            at(2025, 3, 20),
        ];
        let issues: Vec<Issue> = offsets
            .iter()
            .zip(completions)
            .enumerate()
            .map(|(idx, (_, completed))| {
                let mut i = issue(&idx.to_string(), done_state());
                i.completed_at = Some(completed);
                i
            })
            .collect();

        let histogram = lead_time_histogram(&issues, 5);

        assert_eq!(histogram.median, 3.0);
        assert_eq!(histogram.p85, 8.5);
        assert_eq!(histogram.p95, 11.5);

        // Width ceil((13 - 1) / 5) = 3, five half-open bins from 1.
        assert_eq!(histogram.bins.len(), 5);
        assert_eq!(histogram.bins[0].range, "1-4");
        let counts: Vec<u64> = histogram.bins.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![4, 1, 1, 0, 1]);
        assert_eq!(counts.iter().sum::<u64>(), 7);
    }

    #[test]
    fn test_lead_time_histogram_empty() {
        let open = issue("1", state("Backlog", StateType::Backlog, 1.0));

        // Same-day completion has zero lead time and is excluded too.
        let mut same_day = issue("2", done_state());
        same_day.completed_at = Some(same_day.created_at);

        let histogram = lead_time_histogram(&[open, same_day], 10);
        assert!(histogram.bins.is_empty());
        assert_eq!(histogram.median, 0.0);
        assert_eq!(histogram.p85, 0.0);
        assert_eq!(histogram.p95, 0.0);
    }

    // ── risk detection ─────────────────────────────────────────────

    #[test]
    fn test_detect_risks() {
        let now = Utc.with_ymd_and_hms(2025, 3, 14, 12, 0, 0).unwrap();
        let backlog = state("Backlog", StateType::Backlog, 1.0);
        let started = state("In Progress", StateType::Started, 3.0);

        // Overdue and stale at once: two entries for one issue.
        let mut swamped = issue("1", started.clone());
        swamped.priority = 2;
        swamped.started_at = Some(at(2025, 3, 3));
        swamped.due_date = Some(chrono::NaiveDate::from_ymd_opt(2025, 3, 10).unwrap());

        let mut urgent_waiting = issue("2", backlog.clone());
        urgent_waiting.priority = 1;

        let mut unprioritized_overdue = issue("3", backlog.clone());
        unprioritized_overdue.priority = 0;
        unprioritized_overdue.due_date =
            Some(chrono::NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());

        // Never flagged: done, canceled, archived, or comfortably on track.
        let mut finished = issue("4", done_state());
        finished.due_date = Some(chrono::NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
        finished.completed_at = Some(at(2025, 3, 12));

        let mut abandoned = issue("5", state("Canceled", StateType::Canceled, 6.0));
        abandoned.due_date = Some(chrono::NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());

        let mut on_track = issue("6", started);
        on_track.started_at = Some(at(2025, 3, 12));
        on_track.due_date = Some(chrono::NaiveDate::from_ymd_opt(2025, 3, 28).unwrap());

        let issues = vec![
            swamped,
            urgent_waiting,
            unprioritized_overdue,
            finished,
            abandoned,
            on_track,
        ];
        let risks = detect_risks(&issues, now);

        assert_eq!(risks.len(), 4);
        // Ascending numeric priority: 0 sorts first.
        assert_eq!(risks[0].identifier, "ENG-3");
        assert_eq!(risks[0].reason, RiskReason::Overdue);
        assert_eq!(risks[1].identifier, "ENG-2");
        assert_eq!(risks[1].reason, RiskReason::HighPriorityUnstarted);
        assert_eq!(risks[2].identifier, "ENG-1");
        assert_eq!(risks[2].reason, RiskReason::Overdue);
        assert_eq!(risks[2].detail, "past due 3/10");
        assert_eq!(risks[3].identifier, "ENG-1");
        assert_eq!(risks[3].reason, RiskReason::StaleWip);
        assert_eq!(risks[3].detail, "10 business days in progress");
    }
}
