//! Jobs paired with their owning application for one cycle.

use serde::Serialize;
use shoal_core::{Application, Job};

use crate::error::{PlanError, PlanResult};

/// A job and the application it resolved to, if any.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppJobPair {
    application: Option<Application>,
    job: Job,
}

impl AppJobPair {
    pub fn new(application: Option<Application>, job: Job) -> Self {
        Self { application, job }
    }

    pub fn resolved(application: Application, job: Job) -> Self {
        Self::new(Some(application), job)
    }

    pub fn has_application(&self) -> bool {
        self.application.is_some()
    }

    pub fn application(&self) -> Option<&Application> {
        self.application.as_ref()
    }

    pub fn job(&self) -> &Job {
        &self.job
    }

    /// Split into application and job, failing if resolution never happened.
    pub fn into_resolved(self) -> PlanResult<(Application, Job)> {
        match self.application {
            Some(app) => Ok((app, self.job)),
            None => Err(PlanError::UnresolvedApplication {
                job_id: self.job.id,
                appid: self.job.appid,
            }),
        }
    }
}
