//! Per-node offer accumulation and launch descriptors.
//!
//! One [`OfferAcceptor`] exists per node seen in an offer batch. All of the
//! node's offers are merged into a single capacity pool which packing then
//! cuts tasks out of.

use std::collections::BTreeMap;

use serde::Serialize;
use shoal_core::{Application, Container, Job, Offer, Resource, ResourceDemand};

/// Command a launched task runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandSpec {
    pub value: String,
    /// Unix user the command runs as.
    pub user: String,
    pub env: BTreeMap<String, String>,
    /// URIs fetched into the sandbox first.
    pub uris: Vec<String>,
}

/// Launch descriptor for one job on one node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LaunchTask {
    pub task_id: String,
    pub name: String,
    pub node_id: String,
    /// Exactly the capacity cut from the node for this task.
    pub resource: Resource,
    pub command: CommandSpec,
    pub container: Container,
}

impl LaunchTask {
    /// Unique task id for a job of an application.
    pub fn task_id_for(appid: &str, job_id: u64) -> String {
        format!("shoal-{appid}-id-{job_id}")
    }

    pub fn build(
        app: &Application,
        job: &Job,
        node_id: &str,
        resource: Resource,
        default_user: &str,
    ) -> Self {
        Self {
            task_id: Self::task_id_for(&app.appid, job.id),
            name: format!("shoal-{}-name-{}", app.appid, job.name),
            node_id: node_id.to_string(),
            resource,
            command: CommandSpec {
                value: job.cmd.clone(),
                user: app.run_as(default_user).to_string(),
                env: job.env.clone(),
                uris: app.files.clone(),
            },
            container: app.container.clone(),
        }
    }
}

/// A task assigned to a node together with the job it runs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assignment {
    pub task: LaunchTask,
    pub job: Job,
}

/// Aggregated offers of one node and the tasks accepted onto them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OfferAcceptor {
    node_id: String,
    offers: Vec<Offer>,
    resource: Resource,
    tasks: Vec<Assignment>,
}

impl OfferAcceptor {
    pub fn new(offer: Offer) -> Self {
        Self {
            node_id: offer.node_id.clone(),
            resource: offer.resource.clone(),
            offers: vec![offer],
            tasks: Vec::new(),
        }
    }

    /// Acceptor over several offers of one node; `None` if `offers` is empty.
    pub fn from_offers(offers: impl IntoIterator<Item = Offer>) -> Option<Self> {
        let mut offers = offers.into_iter();
        let mut acceptor = Self::new(offers.next()?);
        for offer in offers {
            acceptor.add_offer(offer);
        }
        Some(acceptor)
    }

    /// Merge another offer of the same node into the pool.
    pub fn add_offer(&mut self, offer: Offer) {
        debug_assert_eq!(offer.node_id, self.node_id, "offer for a different node");
        self.resource.merge(&offer.resource);
        self.offers.push(offer);
    }

    /// Remaining aggregated capacity.
    pub fn total_resource(&self) -> &Resource {
        &self.resource
    }

    /// Carve `demand` out of the pool. See [`Resource::cut`].
    pub fn cut(&mut self, demand: &ResourceDemand, last_port: u32) -> Resource {
        self.resource.cut(demand, last_port)
    }

    pub fn add_task(&mut self, task: LaunchTask, job: Job) {
        self.tasks.push(Assignment { task, job });
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    pub fn offers(&self) -> &[Offer] {
        &self.offers
    }

    pub fn tasks(&self) -> &[Assignment] {
        &self.tasks
    }

    pub fn jobs(&self) -> impl Iterator<Item = &Job> {
        self.tasks.iter().map(|a| &a.job)
    }

    /// True when nothing was accepted here.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Give up the held offers.
    pub fn into_offers(self) -> Vec<Offer> {
        self.offers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shoal_core::PortRange;

    fn offer(id: &str, node: &str, cpu: f64, mem: u64, ports: Vec<PortRange>) -> Offer {
        Offer::new(id, node, format!("{node}.local"), Resource::new(cpu, mem, 0, 0, ports))
    }

    #[test]
    fn add_offer_merges_capacity() {
        let mut acceptor = OfferAcceptor::new(offer("o1", "n1", 2.0, 1024, vec![PortRange::new(1, 10)]));
        acceptor.add_offer(offer("o2", "n1", 1.0, 512, vec![PortRange::new(20, 29)]));

        assert_eq!(acceptor.node_id(), "n1");
        assert_eq!(acceptor.offers().len(), 2);
        assert_eq!(acceptor.total_resource().cpu(), 3.0);
        assert_eq!(acceptor.total_resource().mem_mb(), 1536);
        assert_eq!(acceptor.total_resource().port_amount(), 20);
        assert!(acceptor.is_empty());
    }

    #[test]
    fn from_offers_requires_one() {
        assert!(OfferAcceptor::from_offers(Vec::new()).is_none());
        let acceptor = OfferAcceptor::from_offers(vec![
            offer("o1", "n1", 1.0, 1, vec![]),
            offer("o2", "n1", 1.0, 1, vec![]),
        ])
        .unwrap();
        assert_eq!(acceptor.offers().len(), 2);
        assert_eq!(acceptor.total_resource().cpu(), 2.0);
    }

    #[test]
    fn cut_and_add_task() {
        let mut acceptor = OfferAcceptor::new(offer("o1", "n1", 4.0, 4096, vec![PortRange::new(31000, 31010)]));
        let app = Application::new("etl", "key");
        let job = Job::new(7, "etl", "nightly", "run.sh", ResourceDemand::new(1.0, 1024).with_ports(1));

        let assigned = acceptor.cut(&job.resources, 0);
        let task = LaunchTask::build(&app, &job, acceptor.node_id(), assigned, "batch");
        acceptor.add_task(task, job);

        assert!(!acceptor.is_empty());
        assert_eq!(acceptor.total_resource().cpu(), 3.0);
        assert_eq!(acceptor.tasks()[0].task.resource.ports(), &[PortRange::single(31000)]);
        assert_eq!(acceptor.jobs().map(|j| j.id).collect::<Vec<_>>(), vec![7]);
    }

    #[test]
    fn launch_task_naming_and_user() {
        let mut app = Application::new("etl", "key");
        app.files = vec!["https://example.com/etl.tar.gz".to_string()];
        let mut job = Job::new(42, "etl", "nightly", "./run.sh", ResourceDemand::new(1.0, 1));
        job.env.insert("MODE".to_string(), "full".to_string());

        let task = LaunchTask::build(&app, &job, "n1", Resource::empty(), "batch");

        assert_eq!(task.task_id, "shoal-etl-id-42");
        assert_eq!(task.name, "shoal-etl-name-nightly");
        assert_eq!(task.command.user, "batch");
        assert_eq!(task.command.value, "./run.sh");
        assert_eq!(task.command.env.get("MODE").map(String::as_str), Some("full"));
        assert_eq!(task.command.uris, app.files);

        app.user = Some("etl-user".to_string());
        let task = LaunchTask::build(&app, &job, "n1", Resource::empty(), "batch");
        assert_eq!(task.command.user, "etl-user");
    }
}
