//! Jobs and their resource demands.
//!
//! A [`Job`] is created *queued* by the submission path. The planner only
//! ever moves it to *starting* or *killed*; everything after that is the
//! business of the executor-reporting layer.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Resources a single job asks for.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResourceDemand {
    pub cpu: f64,
    pub mem_mb: u64,
    #[serde(default)]
    pub gpu: u32,
    #[serde(default)]
    pub disk_mb: u64,
    /// Number of ports, not specific port numbers.
    #[serde(default)]
    pub ports: u32,
}

impl ResourceDemand {
    pub fn new(cpu: f64, mem_mb: u64) -> Self {
        Self {
            cpu,
            mem_mb,
            ..Self::default()
        }
    }

    pub fn with_gpu(mut self, gpu: u32) -> Self {
        self.gpu = gpu;
        self
    }

    pub fn with_disk(mut self, disk_mb: u64) -> Self {
        self.disk_mb = disk_mb;
        self
    }

    pub fn with_ports(mut self, ports: u32) -> Self {
        self.ports = ports;
        self
    }
}

impl fmt::Display for ResourceDemand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cpu={:.1} mem={}MB gpu={} disk={}MB ports={}",
            self.cpu, self.mem_mb, self.gpu, self.disk_mb, self.ports
        )
    }
}

/// Lifecycle state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    #[default]
    Queued,
    Starting,
    Started,
    Finished,
    Killed,
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            JobState::Queued => "queued",
            JobState::Starting => "starting",
            JobState::Started => "started",
            JobState::Finished => "finished",
            JobState::Killed => "killed",
        })
    }
}

/// A batch job owned by exactly one application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: u64,
    pub appid: String,
    pub name: String,
    pub cmd: String,
    /// Environment passed to the launched command.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    pub resources: ResourceDemand,
    #[serde(default)]
    pub state: JobState,
    #[serde(default)]
    pub task_id: Option<String>,
    /// Host the task landed on, once the executor reports it.
    #[serde(default)]
    pub slave_hostname: Option<String>,
    /// Human-readable reason attached when the job is killed.
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub started_at: Option<u64>,
    #[serde(default)]
    pub finished_at: Option<u64>,
}

impl Job {
    /// A fresh queued job.
    pub fn new(
        id: u64,
        appid: impl Into<String>,
        name: impl Into<String>,
        cmd: impl Into<String>,
        resources: ResourceDemand,
    ) -> Self {
        Self {
            id,
            appid: appid.into(),
            name: name.into(),
            cmd: cmd.into(),
            env: BTreeMap::new(),
            resources,
            state: JobState::Queued,
            task_id: None,
            slave_hostname: None,
            reason: None,
            started_at: None,
            finished_at: None,
        }
    }

    /// Queued → starting, recording the generated task id.
    pub fn starting(
        &mut self,
        task_id: impl Into<String>,
        host: Option<String>,
        at: u64,
    ) -> CoreResult<()> {
        self.ensure_queued(JobState::Starting)?;
        self.state = JobState::Starting;
        self.task_id = Some(task_id.into());
        self.slave_hostname = host;
        self.started_at = Some(at);
        Ok(())
    }

    /// Queued → killed with a reason.
    pub fn killed(&mut self, at: u64, host: Option<String>, reason: impl Into<String>) -> CoreResult<()> {
        self.ensure_queued(JobState::Killed)?;
        self.state = JobState::Killed;
        self.slave_hostname = host;
        self.reason = Some(reason.into());
        self.finished_at = Some(at);
        Ok(())
    }

    fn ensure_queued(&self, to: JobState) -> CoreResult<()> {
        if self.state == JobState::Queued {
            Ok(())
        } else {
            Err(CoreError::InvalidTransition {
                job_id: self.id,
                from: self.state,
                to,
            })
        }
    }
}

/// Sort key a planner expects the job queue to be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Job id, ascending.
    Id,
}

impl SortKey {
    pub fn compare(&self, a: &Job, b: &Job) -> Ordering {
        match self {
            SortKey::Id => a.id.cmp(&b.id),
        }
    }

    /// Stable sort of a queue snapshot by `keys`, most significant first.
    pub fn sort(jobs: &mut [Job], keys: &[SortKey]) {
        jobs.sort_by(|a, b| {
            keys.iter()
                .map(|k| k.compare(a, b))
                .find(|o| o.is_ne())
                .unwrap_or(Ordering::Equal)
        });
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortKey::Id => f.write_str("id"),
        }
    }
}

/// Current Unix epoch in seconds.
pub fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(id: u64) -> Job {
        Job::new(id, "app", format!("job-{id}"), "echo hi", ResourceDemand::new(1.0, 32))
    }

    #[test]
    fn new_job_is_queued() {
        let j = job(1);
        assert_eq!(j.state, JobState::Queued);
        assert!(j.task_id.is_none());
        assert!(j.reason.is_none());
    }

    #[test]
    fn starting_records_task_and_time() {
        let mut j = job(1);
        j.starting("task-1", None, 1_700_000_000).unwrap();

        assert_eq!(j.state, JobState::Starting);
        assert_eq!(j.task_id.as_deref(), Some("task-1"));
        assert_eq!(j.started_at, Some(1_700_000_000));
        assert!(j.slave_hostname.is_none());
    }

    #[test]
    fn killed_records_reason() {
        let mut j = job(2);
        j.killed(42, None, "no such application").unwrap();

        assert_eq!(j.state, JobState::Killed);
        assert_eq!(j.reason.as_deref(), Some("no such application"));
        assert_eq!(j.finished_at, Some(42));
    }

    #[test]
    fn only_queued_jobs_can_transition() {
        let mut j = job(3);
        j.starting("t", None, 1).unwrap();

        let err = j.killed(2, None, "late").unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidTransition {
                job_id: 3,
                from: JobState::Starting,
                to: JobState::Killed
            }
        ));
        assert!(j.starting("again", None, 3).is_err());
        assert_eq!(j.task_id.as_deref(), Some("t"));
    }

    #[test]
    fn sort_by_id_ascending() {
        let mut jobs = vec![job(5), job(1), job(3)];
        SortKey::sort(&mut jobs, &[SortKey::Id]);
        let ids: Vec<u64> = jobs.iter().map(|j| j.id).collect();
        assert_eq!(ids, vec![1, 3, 5]);
    }

    #[test]
    fn sort_without_keys_keeps_order() {
        let mut jobs = vec![job(5), job(1)];
        SortKey::sort(&mut jobs, &[]);
        assert_eq!(jobs[0].id, 5);
    }

    #[test]
    fn job_deserializes_with_defaults() {
        let json = r#"{"id": 7, "appid": "a", "name": "n", "cmd": "true",
                       "resources": {"cpu": 1.0, "mem_mb": 64}}"#;
        let j: Job = serde_json::from_str(json).unwrap();
        assert_eq!(j.state, JobState::Queued);
        assert_eq!(j.resources.ports, 0);
        assert!(j.env.is_empty());
    }

    #[test]
    fn epoch_secs_returns_reasonable_value() {
        assert!(epoch_secs() > 1_600_000_000);
    }
}
