//! Job eligibility filtering.
//!
//! One pass over the queue. Each job is either resolved against the
//! application registry and passed on, or rejected with a [`KillReason`].
//! Rejections are terminal: the scheduler's GPU posture is fixed
//! configuration, and a missing application does not come back by itself.

use std::fmt;

use serde::Serialize;
use shoal_core::{Application, Job};

use crate::observer::PlanObserver;
use crate::pair::AppJobPair;
use crate::registry::ApplicationRegistry;
use crate::transition::JobTransition;

/// Why a job was killed before planning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum KillReason {
    /// The job asks for GPUs but the scheduler runs with GPUs disabled.
    GpuDisabled { job_id: u64, appid: String, gpu: u32 },
    /// The job's application is not registered.
    MissingApplication { job_id: u64, appid: String },
}

impl KillReason {
    pub fn code(&self) -> &'static str {
        match self {
            KillReason::GpuDisabled { .. } => "gpu_disabled",
            KillReason::MissingApplication { .. } => "missing_application",
        }
    }
}

impl fmt::Display for KillReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KillReason::GpuDisabled { job_id, appid, gpu } => write!(
                f,
                "Job ({job_id}@{appid}) requires {gpu} GPUs while this scheduler is not \
                 capable of using GPU resources. Try setting gpu_enabled = true in the \
                 scheduler configuration."
            ),
            KillReason::MissingApplication { job_id, appid } => {
                write!(f, "Application '{appid}' of Job (id={job_id}) does not exist")
            }
        }
    }
}

/// A job killed by the filter, with its reason.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rejection {
    pub job: Job,
    pub reason: KillReason,
}

impl Rejection {
    pub fn transition(&self) -> JobTransition {
        JobTransition::Kill {
            job_id: self.job.id,
            reason: self.reason.to_string(),
        }
    }
}

/// Output of a filter pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Filtered {
    /// Runnable jobs in input order.
    pub eligible: Vec<AppJobPair>,
    pub killed: Vec<Rejection>,
}

impl Filtered {
    /// A `Kill` transition per rejected job.
    pub fn transitions(&self) -> Vec<JobTransition> {
        self.killed.iter().map(Rejection::transition).collect()
    }
}

/// Decide whether a single job may run, resolving its application.
pub fn check_job(
    job: &Job,
    gpu_enabled: bool,
    registry: &dyn ApplicationRegistry,
) -> Result<Application, KillReason> {
    if job.resources.gpu > 0 && !gpu_enabled {
        return Err(KillReason::GpuDisabled {
            job_id: job.id,
            appid: job.appid.clone(),
            gpu: job.resources.gpu,
        });
    }
    registry
        .get(&job.appid)
        .ok_or_else(|| KillReason::MissingApplication {
            job_id: job.id,
            appid: job.appid.clone(),
        })
}

/// Split `jobs` into eligible pairs and rejections, preserving order.
pub fn filter_jobs(
    jobs: Vec<Job>,
    gpu_enabled: bool,
    registry: &dyn ApplicationRegistry,
    observer: &impl PlanObserver,
) -> Filtered {
    let mut filtered = Filtered::default();
    for job in jobs {
        match check_job(&job, gpu_enabled, registry) {
            Ok(app) => filtered.eligible.push(AppJobPair::resolved(app, job)),
            Err(reason) => {
                observer.job_rejected(&job, &reason);
                filtered.killed.push(Rejection { job, reason });
            }
        }
    }
    filtered
}
