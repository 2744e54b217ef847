//! Resource offers from the cluster resource manager.

use serde::{Deserialize, Serialize};

use crate::resource::Resource;

/// A revocable grant of capacity on one node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    pub id: String,
    pub node_id: String,
    pub hostname: String,
    pub resource: Resource,
}

impl Offer {
    pub fn new(
        id: impl Into<String>,
        node_id: impl Into<String>,
        hostname: impl Into<String>,
        resource: Resource,
    ) -> Self {
        Self {
            id: id.into(),
            node_id: node_id.into(),
            hostname: hostname.into(),
            resource,
        }
    }
}
