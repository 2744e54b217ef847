//! shoal-core: shared data model for the Shoal batch scheduler.
//!
//! Holds the value types that flow through a planning cycle (resources,
//! offers, jobs, applications) together with the scheduler configuration.
//! Nothing in here performs I/O except [`ShoalConfig::from_file`].

pub mod application;
pub mod config;
pub mod error;
pub mod job;
pub mod offer;
pub mod resource;

pub use application::{Application, Container};
pub use config::{PlannerConfig, PlannerKind, ShoalConfig};
pub use error::{CoreError, CoreResult};
pub use job::{Job, JobState, ResourceDemand, SortKey, epoch_secs};
pub use offer::Offer;
pub use resource::{PortRange, Resource, cpu_fits};
