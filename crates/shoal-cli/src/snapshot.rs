//! Planning snapshots: one cycle's inputs in a JSON file.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use shoal_core::{Application, Job, Offer};
use shoal_planner::{Cycle, InMemoryRegistry, PlanSummary, Rejection};

/// Offers, queued jobs and registered applications as seen by a driver.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub offers: Vec<Offer>,
    #[serde(default)]
    pub jobs: Vec<Job>,
    #[serde(default)]
    pub applications: Vec<Application>,
    /// Unix time to stamp transitions with; defaults to the current time.
    #[serde(default)]
    pub now: Option<u64>,
}

impl Snapshot {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading snapshot {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("parsing snapshot {}", path.display()))
    }

    pub fn registry(&self) -> InMemoryRegistry {
        self.applications.iter().cloned().collect()
    }
}

/// What `shoal plan` prints.
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub summary: PlanSummary,
    pub killed: &'a [Rejection],
    pub plan: &'a shoal_planner::Plan,
}

impl<'a> From<&'a Cycle> for Report<'a> {
    fn from(cycle: &'a Cycle) -> Self {
        Self {
            summary: cycle.plan.summary(),
            killed: &cycle.killed,
            plan: &cycle.plan,
        }
    }
}
