//! Planner error types.
//!
//! Schedulability conditions (not enough capacity, fragmentation, killed
//! jobs) are not errors. These variants mean the caller broke a
//! precondition and the cycle's result must be discarded.

use thiserror::Error;

/// Errors that abort a planning cycle.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("no run-as user configured for launched tasks")]
    MissingRunAsUser,

    #[error("job {job_id} reached planning without its application '{appid}'")]
    UnresolvedApplication { job_id: u64, appid: String },

    #[error("transition for job {expected} applied to job {found}")]
    JobMismatch { expected: u64, found: u64 },

    #[error(transparent)]
    Core(#[from] shoal_core::CoreError),
}

pub type PlanResult<T> = Result<T, PlanError>;
