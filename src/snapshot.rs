//! The full input bundle for one team, as fetched and normalized upstream.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::{Cycle, Issue, Project, Team};

/// Immutable snapshot of everything the metrics engine reads for a team.
///
/// The engine never mutates a snapshot; consumers refresh by loading a new
/// one and discarding the old.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamSnapshot {
    pub team: Team,
    #[serde(default)]
    pub issues: Vec<Issue>,
    #[serde(default)]
    pub cycles: Vec<Cycle>,
    #[serde(default)]
    pub projects: Vec<Project>,
}

impl TeamSnapshot {
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| Error::Snapshot(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let snapshot = Self::from_json(&raw)?;
        log::debug!(
            "loaded snapshot for {}: {} issues, {} cycles, {} projects",
            snapshot.team.key,
            snapshot.issues.len(),
            snapshot.cycles.len(),
            snapshot.projects.len()
        );
        Ok(snapshot)
    }

    /// Cycles ascending by sequence number.
    pub fn sorted_cycles(&self) -> Vec<&Cycle> {
        let mut cycles: Vec<&Cycle> = self.cycles.iter().collect();
        cycles.sort_by_key(|c| c.number);
        cycles
    }

    /// The cycle whose time window contains `now`. If windows overlap, the
    /// highest-numbered one wins.
    pub fn current_cycle(&self, now: DateTime<Utc>) -> Option<&Cycle> {
        self.cycles
            .iter()
            .filter(|c| c.starts_at <= now && now <= c.ends_at)
            .max_by_key(|c| c.number)
    }

    /// The cycle immediately preceding `current` by sequence number.
    pub fn previous_cycle(&self, current: &Cycle) -> Option<&Cycle> {
        self.cycles
            .iter()
            .filter(|c| c.number < current.number)
            .max_by_key(|c| c.number)
    }

    pub fn cycle_by_number(&self, number: u32) -> Option<&Cycle> {
        self.cycles.iter().find(|c| c.number == number)
    }
}
