//! Applications: the owners of jobs.
//!
//! Applications are registered and stored elsewhere; the planner only looks
//! them up by id to decide who a job runs as and what it needs fetched.

use serde::{Deserialize, Serialize};

/// How a job's command is isolated on the node.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Container {
    /// Plain process under the node's own containerizer.
    #[default]
    Mesos,
    Docker { image: String },
}

/// An application registered with the scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub appid: String,
    /// Key id of the user that loaded the application.
    pub owner: String,
    /// Unix user the jobs run as; falls back to the scheduler default.
    #[serde(default)]
    pub user: Option<String>,
    /// URIs fetched into the sandbox before the command starts.
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default)]
    pub container: Container,
}

impl Application {
    pub fn new(appid: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            appid: appid.into(),
            owner: owner.into(),
            user: None,
            files: Vec::new(),
            container: Container::Mesos,
        }
    }

    /// The Unix user to launch as, given the scheduler-wide default.
    pub fn run_as<'a>(&'a self, default_user: &'a str) -> &'a str {
        match self.user.as_deref() {
            Some(user) if !user.is_empty() => user,
            _ => default_user,
        }
    }
}
