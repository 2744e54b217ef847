//! Naive planner: greedy, in-order, non-backtracking packing.
//!
//! Given a batch of offers and a sorted queue, the naive planner:
//! 1. Checks that the summed offers can cover the summed demand at all
//! 2. Groups offers per node and fills nodes one after another from the
//!    head of the queue, moving on as soon as the head does not fit
//! 3. Stocks offers of nodes that received nothing, up to `max_stock`

use std::collections::{HashMap, VecDeque};

use serde::Serialize;
use shoal_core::{Application, Job, Offer, SortKey, cpu_fits};

use crate::acceptor::{LaunchTask, OfferAcceptor};
use crate::error::{PlanError, PlanResult};
use crate::filter::{Filtered, filter_jobs};
use crate::observer::{PlanObserver, TracingObserver};
use crate::pair::AppJobPair;
use crate::plan::Plan;
use crate::planner::Planner;
use crate::registry::ApplicationRegistry;
use crate::transition::JobTransition;

const ORDER_BY: &[SortKey] = &[SortKey::Id];

/// Summed capacity or demand over a whole cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Totals {
    pub cpu: f64,
    pub mem_mb: u64,
    pub gpu: u64,
    pub ports: u64,
}

impl Totals {
    pub fn of_offers<'a>(offers: impl IntoIterator<Item = &'a Offer>) -> Self {
        offers.into_iter().fold(Self::default(), |mut t, offer| {
            let r = &offer.resource;
            t.cpu += r.cpu();
            t.mem_mb += r.mem_mb();
            t.gpu += u64::from(r.gpu());
            t.ports += r.port_amount();
            t
        })
    }

    pub fn of_jobs<'a>(jobs: impl IntoIterator<Item = &'a Job>) -> Self {
        jobs.into_iter().fold(Self::default(), |mut t, job| {
            let d = &job.resources;
            t.cpu += d.cpu;
            t.mem_mb += d.mem_mb;
            t.gpu += u64::from(d.gpu);
            t.ports += u64::from(d.ports);
            t
        })
    }

    /// Sum-against-sum test; disk is not considered.
    pub fn covers(&self, demand: &Totals) -> bool {
        cpu_fits(demand.cpu, self.cpu)
            && demand.mem_mb <= self.mem_mb
            && demand.gpu <= self.gpu
            && demand.ports <= self.ports
    }
}

/// The default planner.
#[derive(Debug, Clone, Default)]
pub struct NaivePlanner<O = TracingObserver> {
    observer: O,
}

impl NaivePlanner {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<O: PlanObserver> NaivePlanner<O> {
    pub fn with_observer(observer: O) -> Self {
        Self { observer }
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }
}

impl<O: PlanObserver> Planner for NaivePlanner<O> {
    fn order_by(&self) -> &[SortKey] {
        ORDER_BY
    }

    fn filter(
        &self,
        jobs: Vec<Job>,
        gpu_enabled: bool,
        registry: &dyn ApplicationRegistry,
    ) -> Filtered {
        filter_jobs(jobs, gpu_enabled, registry, &self.observer)
    }

    fn plan(
        &self,
        offers: Vec<Offer>,
        eligible: Vec<AppJobPair>,
        max_stock: usize,
        run_as_user: Option<&str>,
    ) -> PlanResult<Plan> {
        let user = run_as_user
            .filter(|u| !u.is_empty())
            .ok_or(PlanError::MissingRunAsUser)?;
        let queue = eligible
            .into_iter()
            .map(AppJobPair::into_resolved)
            .collect::<PlanResult<VecDeque<_>>>()?;

        let offered = Totals::of_offers(&offers);
        let demanded = Totals::of_jobs(queue.iter().map(|(_, job)| job));
        if queue.is_empty() {
            return Ok(self.defer(offers, queue, max_stock));
        }
        if !offered.covers(&demanded) {
            self.observer.cycle_deferred(&offered, &demanded);
            return Ok(self.defer(offers, queue, max_stock));
        }

        let (acceptors, keep, transitions) = pack(offers, queue, user, &self.observer);

        let mut stock = Vec::new();
        let mut out = Vec::with_capacity(acceptors.len());
        let mut declined = 0;
        for acceptor in acceptors {
            if !acceptor.is_empty() {
                out.push(acceptor);
                continue;
            }
            let mut offers = acceptor.into_offers().into_iter();
            while stock.len() < max_stock {
                match offers.next() {
                    Some(offer) => stock.push(offer),
                    None => break,
                }
            }
            if let Some(rest) = OfferAcceptor::from_offers(offers) {
                declined += rest.offers().len();
                out.push(rest);
            }
        }
        self.observer.offers_released(stock.len(), declined);

        Ok(Plan::new(out, keep, stock, transitions))
    }
}

impl<O: PlanObserver> NaivePlanner<O> {
    /// Skip packing: keep every job, stock what fits, decline the rest.
    fn defer(
        &self,
        offers: Vec<Offer>,
        queue: VecDeque<(Application, Job)>,
        max_stock: usize,
    ) -> Plan {
        let split = offers.len().min(max_stock);
        let mut stock = offers;
        let declined: Vec<OfferAcceptor> = stock
            .split_off(split)
            .into_iter()
            .map(OfferAcceptor::new)
            .collect();
        self.observer.offers_released(stock.len(), declined.len());

        let keep = queue.into_iter().map(|(_, job)| job).collect();
        Plan::new(declined, keep, stock, Vec::new())
    }
}

/// Group offers per node, keeping the order nodes are first seen in.
fn group_by_node(offers: Vec<Offer>) -> Vec<OfferAcceptor> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut acceptors: Vec<OfferAcceptor> = Vec::new();
    for offer in offers {
        match index.get(&offer.node_id) {
            Some(&i) => acceptors[i].add_offer(offer),
            None => {
                index.insert(offer.node_id.clone(), acceptors.len());
                acceptors.push(OfferAcceptor::new(offer));
            }
        }
    }
    acceptors
}

/// Fill nodes in order from the head of the shared queue.
///
/// A node is left as soon as the head job does not fit it; nothing
/// further down the queue is tried there. What is left of the queue
/// carries over to the next node.
fn pack(
    offers: Vec<Offer>,
    mut queue: VecDeque<(Application, Job)>,
    run_as_user: &str,
    observer: &impl PlanObserver,
) -> (Vec<OfferAcceptor>, Vec<Job>, Vec<JobTransition>) {
    let mut acceptors = group_by_node(offers);
    let mut transitions = Vec::new();

    for acceptor in &mut acceptors {
        let mut last_port = 0;
        while let Some((_, head)) = queue.front() {
            if !acceptor.total_resource().covers(&head.resources) {
                observer.node_exhausted(acceptor.node_id(), head, acceptor.total_resource());
                break;
            }
            let Some((app, job)) = queue.pop_front() else {
                break;
            };

            let assigned = acceptor.cut(&job.resources, last_port);
            last_port = last_port.max(assigned.last_port());
            let task = LaunchTask::build(&app, &job, acceptor.node_id(), assigned, run_as_user);

            observer.task_assigned(&task, &job);
            transitions.push(JobTransition::Start {
                job_id: job.id,
                task_id: task.task_id.clone(),
            });
            acceptor.add_task(task, job);
        }
    }

    let keep = queue.into_iter().map(|(_, job)| job).collect();
    (acceptors, keep, transitions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shoal_core::{PortRange, Resource, ResourceDemand};

    fn offer(id: &str, node: &str, cpu: f64, mem: u64) -> Offer {
        Offer::new(
            id,
            node,
            format!("{node}.local"),
            Resource::new(cpu, mem, 0, 10_000, vec![PortRange::new(31000, 31099)]),
        )
    }

    fn pair(id: u64, cpu: f64, mem: u64) -> AppJobPair {
        AppJobPair::resolved(
            Application::new("app", "owner"),
            Job::new(id, "app", format!("j{id}"), "true", ResourceDemand::new(cpu, mem)),
        )
    }

    fn ids<'a>(jobs: impl Iterator<Item = &'a Job>) -> Vec<u64> {
        jobs.map(|j| j.id).collect()
    }

    #[test]
    fn order_by_job_id() {
        assert_eq!(NaivePlanner::new().order_by(), &[SortKey::Id]);
    }

    #[test]
    fn packs_single_node_in_order() {
        let plan = NaivePlanner::new()
            .plan(vec![offer("o1", "n1", 4.0, 4096)], vec![pair(1, 1.0, 1024), pair(2, 2.0, 1024)], 4, Some("batch"))
            .unwrap();

        assert_eq!(plan.acceptors().len(), 1);
        assert_eq!(ids(plan.assigned_jobs()), vec![1, 2]);
        assert!(plan.keep().is_empty());
        assert!(plan.stock().is_empty());
        assert_eq!(plan.acceptors()[0].total_resource().cpu(), 1.0);
        assert_eq!(plan.transitions().len(), 2);
    }

    #[test]
    fn merges_offers_of_same_node() {
        let offers = vec![offer("o1", "n1", 1.0, 512), offer("o2", "n1", 1.0, 512)];
        let plan = NaivePlanner::new()
            .plan(offers, vec![pair(1, 2.0, 1024)], 4, Some("batch"))
            .unwrap();

        assert_eq!(plan.acceptors().len(), 1);
        assert_eq!(plan.acceptors()[0].offers().len(), 2);
        assert_eq!(ids(plan.assigned_jobs()), vec![1]);
    }

    #[test]
    fn head_job_blocks_smaller_jobs_behind_it() {
        let offers = vec![offer("o1", "n1", 2.0, 4096), offer("o2", "n2", 3.0, 4096)];
        let plan = NaivePlanner::new()
            .plan(offers, vec![pair(1, 4.0, 10), pair(2, 1.0, 10)], 0, Some("batch"))
            .unwrap();

        // Job 1 fits neither node, and job 2 is never tried past it.
        assert_eq!(ids(plan.keep().iter()), vec![1, 2]);
        assert_eq!(plan.assigned_jobs().count(), 0);
        assert_eq!(plan.acceptors().len(), 2);
        assert!(plan.acceptors().iter().all(OfferAcceptor::is_empty));
    }

    #[test]
    fn remaining_queue_moves_to_next_node() {
        let offers = vec![offer("o1", "n1", 1.0, 4096), offer("o2", "n2", 4.0, 4096)];
        let plan = NaivePlanner::new()
            .plan(offers, vec![pair(1, 1.0, 10), pair(2, 3.0, 10), pair(3, 1.0, 10)], 4, Some("batch"))
            .unwrap();

        let n1: Vec<u64> = ids(plan.acceptors()[0].jobs());
        let n2: Vec<u64> = ids(plan.acceptors()[1].jobs());
        assert_eq!(n1, vec![1]);
        assert_eq!(n2, vec![2, 3]);
    }

    #[test]
    fn empty_nodes_are_stocked_up_to_bound() {
        let offers = vec![
            offer("o1", "n1", 4.0, 4096),
            offer("o2", "n2", 4.0, 4096),
            offer("o3", "n3", 4.0, 4096),
            offer("o4", "n3", 4.0, 4096),
        ];
        let plan = NaivePlanner::new()
            .plan(offers, vec![pair(1, 1.0, 10)], 2, Some("batch"))
            .unwrap();

        let stocked: Vec<&str> = plan.stock().iter().map(|o| o.id.as_str()).collect();
        assert_eq!(stocked, vec!["o2", "o3"]);
        let declined: Vec<&str> = plan.to_decline().map(|o| o.id.as_str()).collect();
        assert_eq!(declined, vec!["o4"]);
        assert_eq!(plan.to_accept().count(), 1);
    }

    #[test]
    fn deferred_cycle_keeps_everything() {
        let offers = vec![offer("o1", "n1", 2.0, 4096), offer("o2", "n2", 3.0, 4096)];
        let plan = NaivePlanner::new()
            .plan(offers, vec![pair(1, 6.0, 10), pair(2, 4.0, 10)], 1, Some("batch"))
            .unwrap();

        assert_eq!(ids(plan.keep().iter()), vec![1, 2]);
        assert_eq!(plan.stock().len(), 1);
        assert_eq!(plan.stock()[0].id, "o1");
        assert_eq!(plan.acceptors().len(), 1);
        assert!(plan.acceptors()[0].is_empty());
        assert!(plan.transitions().is_empty());
    }

    #[test]
    fn no_jobs_defers() {
        let plan = NaivePlanner::new()
            .plan(vec![offer("o1", "n1", 2.0, 4096)], Vec::new(), 4, Some("batch"))
            .unwrap();
        assert_eq!(plan.stock().len(), 1);
        assert!(plan.acceptors().is_empty());
    }

    #[test]
    fn missing_user_is_a_hard_failure() {
        let planner = NaivePlanner::new();
        let err = planner.plan(Vec::new(), Vec::new(), 1, None).unwrap_err();
        assert!(matches!(err, PlanError::MissingRunAsUser));
        assert!(matches!(
            planner.plan(Vec::new(), Vec::new(), 1, Some("")),
            Err(PlanError::MissingRunAsUser)
        ));
    }

    #[test]
    fn unresolved_pair_is_a_hard_failure() {
        let job = Job::new(9, "ghost", "j", "true", ResourceDemand::new(1.0, 1));
        let err = NaivePlanner::new()
            .plan(Vec::new(), vec![AppJobPair::new(None, job)], 1, Some("batch"))
            .unwrap_err();
        assert!(matches!(err, PlanError::UnresolvedApplication { job_id: 9, .. }));
    }

    #[test]
    fn totals_ignore_disk() {
        let offered = Totals::of_offers(&[offer("o1", "n1", 1.0, 1)]);
        let job = Job::new(1, "a", "j", "t", ResourceDemand::new(1.0, 1).with_disk(1_000_000));
        assert!(offered.covers(&Totals::of_jobs([&job])));
    }
}
