//! Observability hooks for planning cycles.
//!
//! The planner holds no global logger. Callers pass a [`PlanObserver`];
//! [`TracingObserver`] turns the hooks into `tracing` events.

use shoal_core::{Job, Resource};
use tracing::{debug, info, warn};

use crate::acceptor::LaunchTask;
use crate::filter::KillReason;
use crate::naive::Totals;

/// Callbacks fired while a cycle runs. Every hook defaults to a no-op.
pub trait PlanObserver {
    /// A job was killed by `filter`.
    fn job_rejected(&self, _job: &Job, _reason: &KillReason) {}

    /// Offered capacity fell short of queued demand and packing was
    /// skipped. Not raised for an empty queue.
    fn cycle_deferred(&self, _offered: &Totals, _demanded: &Totals) {}

    fn task_assigned(&self, _task: &LaunchTask, _job: &Job) {}

    /// Packing on a node stopped because the queue head did not fit.
    fn node_exhausted(&self, _node_id: &str, _head: &Job, _remaining: &Resource) {}

    /// Offers left unused: `stocked` held for later, `declined` released.
    fn offers_released(&self, _stocked: usize, _declined: usize) {}
}

/// Observer that logs through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl PlanObserver for TracingObserver {
    fn job_rejected(&self, job: &Job, reason: &KillReason) {
        warn!(job = job.id, appid = %job.appid, code = reason.code(), "{reason}");
    }

    fn cycle_deferred(&self, offered: &Totals, demanded: &Totals) {
        info!(
            offered_cpu = offered.cpu,
            offered_mem_mb = offered.mem_mb,
            offered_gpu = offered.gpu,
            offered_ports = offered.ports,
            demanded_cpu = demanded.cpu,
            demanded_mem_mb = demanded.mem_mb,
            demanded_gpu = demanded.gpu,
            demanded_ports = demanded.ports,
            "offered capacity cannot cover queued demand, skipping packing"
        );
    }

    fn task_assigned(&self, task: &LaunchTask, job: &Job) {
        info!(
            job = job.id,
            task = %task.task_id,
            node = %task.node_id,
            user = %task.command.user,
            resource = %task.resource,
            "job {} is to be run as '{}'",
            job.id,
            job.cmd
        );
    }

    fn node_exhausted(&self, node_id: &str, head: &Job, remaining: &Resource) {
        debug!(
            node = node_id,
            job = head.id,
            demand = %head.resources,
            remaining = %remaining,
            "queue head does not fit, moving to next node"
        );
    }

    fn offers_released(&self, stocked: usize, declined: usize) {
        if stocked + declined > 0 {
            debug!(stocked, declined, "unused offers released");
        }
    }
}
