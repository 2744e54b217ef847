//! shoal-planner: the planning engine of the Shoal batch scheduler.
//!
//! Decides, once per batch of resource offers, which queued jobs launch on
//! which node. The crate performs no I/O and holds no global state: the
//! application registry and the observability hooks are passed in, and
//! job state changes come back as [`JobTransition`]s for the caller to
//! commit.
//!
//! # Components
//!
//! - **`filter`**: kills jobs that can never run, resolves the rest
//! - **`naive`**: greedy in-order packing onto per-node acceptors
//! - **`acceptor`**: per-node offer pool and launch descriptors
//! - **`plan`**: the immutable result of a cycle
//! - **`cycle`**: sort → filter → plan in one call
//!
//! # Flow
//!
//! ```text
//! jobs ──sort(order_by)──▶ filter ──eligible──▶ plan ──▶ Plan
//!                            │                   ▲         ├── acceptors (accept / decline)
//!                            └── killed          offers    ├── keep
//!                                                          └── stock
//! ```

pub mod acceptor;
pub mod cycle;
pub mod error;
pub mod filter;
pub mod naive;
pub mod observer;
pub mod pair;
pub mod plan;
pub mod planner;
pub mod registry;
pub mod transition;

pub use acceptor::{Assignment, CommandSpec, LaunchTask, OfferAcceptor};
pub use cycle::{Cycle, run_cycle};
pub use error::{PlanError, PlanResult};
pub use filter::{Filtered, KillReason, Rejection, check_job, filter_jobs};
pub use naive::{NaivePlanner, Totals};
pub use observer::{PlanObserver, TracingObserver};
pub use pair::AppJobPair;
pub use plan::{Plan, PlanSummary};
pub use planner::Planner;
pub use registry::{ApplicationRegistry, InMemoryRegistry};
pub use transition::JobTransition;
