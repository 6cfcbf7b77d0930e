//! Metrics-derivation engine for team delivery analytics.
//!
//! Transforms immutable snapshots of issue/cycle/workflow-state records into
//! time series, distributions, and rule-based insights: velocity, cycle and
//! lead time, carryover, scope creep, workload, cumulative flow, dwell time,
//! and risk flags. All computation is synchronous and pure — callers hand in
//! data fetched elsewhere and get new values back, so results may be
//! recomputed freely whenever fresher input arrives.

pub mod config;
pub mod date_util;
pub mod error;
pub mod glossary;
pub mod insights;
pub mod metrics;
pub mod models;
pub mod session;
pub mod snapshot;
pub mod stats;

pub use config::DashboardConfig;
pub use error::{Error, Result};
pub use insights::{generate_insights, Insight, Severity};
pub use metrics::{
    BurndownPoint, CfdPoint, CfdSeries, CycleTimePoint, HistogramBin, KpiMetrics,
    LeadTimeHistogram, MemberWorkload, PrioritySlice, RiskIssue, RiskReason, StatusDwell,
    StatusSlice, VelocityPoint,
};
pub use models::{
    Cycle, Issue, Label, Project, ProjectState, StateType, Team, User, WorkflowState,
};
pub use snapshot::TeamSnapshot;
