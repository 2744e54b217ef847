//! Job state changes decided by a planning cycle.
//!
//! `filter` and `plan` never touch the caller's job records. They return
//! [`JobTransition`]s and the persistence layer applies them when it
//! commits the cycle.

use serde::{Deserialize, Serialize};
use shoal_core::Job;

use crate::error::{PlanError, PlanResult};

/// A state change for one job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobTransition {
    /// Queued → starting under the given task id.
    Start { job_id: u64, task_id: String },
    /// Queued → killed, terminally.
    Kill { job_id: u64, reason: String },
}

impl JobTransition {
    pub fn job_id(&self) -> u64 {
        match self {
            JobTransition::Start { job_id, .. } | JobTransition::Kill { job_id, .. } => *job_id,
        }
    }

    /// Apply this transition to `job` at Unix time `at`.
    pub fn apply(&self, job: &mut Job, at: u64) -> PlanResult<()> {
        if job.id != self.job_id() {
            return Err(PlanError::JobMismatch {
                expected: self.job_id(),
                found: job.id,
            });
        }
        match self {
            JobTransition::Start { task_id, .. } => job.starting(task_id.clone(), None, at)?,
            JobTransition::Kill { reason, .. } => job.killed(at, None, reason.clone())?,
        }
        Ok(())
    }
}
