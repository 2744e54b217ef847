//! The result of one planning cycle.

use serde::Serialize;
use shoal_core::{Job, Offer};

use crate::acceptor::OfferAcceptor;
use crate::transition::JobTransition;

/// Immutable outcome of [`Planner::plan`](crate::Planner::plan).
///
/// Every offer handed to the cycle sits either inside one acceptor or in
/// `stock`; every eligible job is either assigned inside an acceptor or in
/// `keep`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Plan {
    acceptors: Vec<OfferAcceptor>,
    keep: Vec<Job>,
    stock: Vec<Offer>,
    transitions: Vec<JobTransition>,
}

/// Counts describing a plan, for logs and reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PlanSummary {
    pub accepted_nodes: usize,
    pub assigned_jobs: usize,
    pub kept_jobs: usize,
    pub stocked_offers: usize,
    pub declined_offers: usize,
}

impl Plan {
    pub(crate) fn new(
        acceptors: Vec<OfferAcceptor>,
        keep: Vec<Job>,
        stock: Vec<Offer>,
        transitions: Vec<JobTransition>,
    ) -> Self {
        Self {
            acceptors,
            keep,
            stock,
            transitions,
        }
    }

    /// All acceptors, including empty ones whose offers are to be declined.
    pub fn acceptors(&self) -> &[OfferAcceptor] {
        &self.acceptors
    }

    /// Jobs left pending for a later cycle.
    pub fn keep(&self) -> &[Job] {
        &self.keep
    }

    /// Offers to hold, neither accepted nor declined.
    pub fn stock(&self) -> &[Offer] {
        &self.stock
    }

    /// `Start` transitions for every assigned job, in assignment order.
    pub fn transitions(&self) -> &[JobTransition] {
        &self.transitions
    }

    /// Acceptors carrying at least one task.
    pub fn to_accept(&self) -> impl Iterator<Item = &OfferAcceptor> {
        self.acceptors.iter().filter(|a| !a.is_empty())
    }

    /// Offers held by acceptors with no task.
    pub fn to_decline(&self) -> impl Iterator<Item = &Offer> {
        self.acceptors
            .iter()
            .filter(|a| a.is_empty())
            .flat_map(|a| a.offers().iter())
    }

    pub fn assigned_jobs(&self) -> impl Iterator<Item = &Job> {
        self.acceptors.iter().flat_map(OfferAcceptor::jobs)
    }

    pub fn summary(&self) -> PlanSummary {
        PlanSummary {
            accepted_nodes: self.to_accept().count(),
            assigned_jobs: self.assigned_jobs().count(),
            kept_jobs: self.keep.len(),
            stocked_offers: self.stock.len(),
            declined_offers: self.to_decline().count(),
        }
    }
}
