//! One full planning cycle: sort, filter, plan.
//!
//! The scheduling driver calls [`run_cycle`] once per offer batch and then
//! commits the result. Cycles must not overlap on the same job snapshot.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use shoal_core::{Job, Offer, PlannerConfig, SortKey};
use tracing::{debug, warn};

use crate::error::PlanResult;
use crate::filter::{Filtered, Rejection};
use crate::plan::Plan;
use crate::planner::Planner;
use crate::registry::ApplicationRegistry;
use crate::transition::JobTransition;

/// Everything decided in one cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cycle {
    /// Jobs killed by the filter, already in the killed state.
    pub killed: Vec<Rejection>,
    pub plan: Plan,
}

impl Cycle {
    /// Kill transitions followed by start transitions.
    pub fn transitions(&self) -> impl Iterator<Item = JobTransition> + '_ {
        self.killed
            .iter()
            .map(Rejection::transition)
            .chain(self.plan.transitions().iter().cloned())
    }

    /// Apply this cycle's transitions to the caller's job records.
    ///
    /// Returns how many records changed. Transitions for jobs not in
    /// `jobs` are skipped. Either every transition applies or `jobs` is
    /// left untouched.
    pub fn commit(&self, jobs: &mut [Job], at: u64) -> PlanResult<usize> {
        let index: HashMap<u64, usize> = jobs.iter().enumerate().map(|(i, j)| (j.id, i)).collect();
        let mut staged: BTreeMap<usize, Job> = BTreeMap::new();
        let mut applied = 0;
        for transition in self.transitions() {
            match index.get(&transition.job_id()) {
                Some(&i) => {
                    let job = staged.entry(i).or_insert_with(|| jobs[i].clone());
                    transition.apply(job, at)?;
                    applied += 1;
                }
                None => warn!(job = transition.job_id(), "no record to commit transition to"),
            }
        }
        for (i, job) in staged {
            jobs[i] = job;
        }
        Ok(applied)
    }
}

/// Sort `jobs` as the planner requires, filter them, then plan.
///
/// Jobs rejected by the filter are marked killed at `now`.
pub fn run_cycle<P: Planner + ?Sized>(
    planner: &P,
    config: &PlannerConfig,
    offers: Vec<Offer>,
    mut jobs: Vec<Job>,
    registry: &dyn ApplicationRegistry,
    now: u64,
) -> PlanResult<Cycle> {
    SortKey::sort(&mut jobs, planner.order_by());

    let Filtered {
        eligible,
        mut killed,
    } = planner.filter(jobs, config.gpu_enabled, registry);
    for rejection in &mut killed {
        rejection.transition().apply(&mut rejection.job, now)?;
    }

    let plan = planner.plan(
        offers,
        eligible,
        config.max_stock,
        config.run_as_user.as_deref(),
    )?;

    let summary = plan.summary();
    debug!(
        killed = killed.len(),
        assigned = summary.assigned_jobs,
        kept = summary.kept_jobs,
        stocked = summary.stocked_offers,
        declined = summary.declined_offers,
        "planning cycle finished"
    );

    Ok(Cycle { killed, plan })
}
