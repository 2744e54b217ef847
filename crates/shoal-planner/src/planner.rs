//! The planner capability.

use shoal_core::{Job, Offer, SortKey};

use crate::error::PlanResult;
use crate::filter::Filtered;
use crate::pair::AppJobPair;
use crate::plan::Plan;
use crate::registry::ApplicationRegistry;

/// A scheduling strategy: filters the queue, then packs it onto offers.
pub trait Planner {
    /// Order the job queue must be sorted by before `filter`/`plan`.
    ///
    /// This is a contract on the caller; planners assume it and do not
    /// re-sort.
    fn order_by(&self) -> &[SortKey];

    /// Drop jobs that can never run and resolve the rest.
    fn filter(
        &self,
        jobs: Vec<Job>,
        gpu_enabled: bool,
        registry: &dyn ApplicationRegistry,
    ) -> Filtered;

    /// Decide acceptances, pending jobs and held offers for one cycle.
    fn plan(
        &self,
        offers: Vec<Offer>,
        eligible: Vec<AppJobPair>,
        max_stock: usize,
        run_as_user: Option<&str>,
    ) -> PlanResult<Plan>;
}
