//! Node Source Decommissioning
//!
//! Undeploys or removes the node source behind a BYON or edge node. The
//! operation is idempotent: a node source that is already gone (or not
//! deployed) counts as success. Resource-manager failures are reported,
//! not propagated, so callers tearing down many nodes can keep going.

use crate::domain::ports::ResourceManagerRef;
use crate::error::Result;
use tracing::{error, info, warn};

/// Typed result of a decommission request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecommissionOutcome {
    /// The node source was removed from the resource manager
    Removed,
    /// The node source was undeployed
    Undeployed,
    /// Nothing to do, the node source was not in the relevant listing
    Absent,
    /// The resource manager refused or could not be reached
    Failed(String),
}

impl DecommissionOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecommissionOutcome::Removed => "removed",
            DecommissionOutcome::Undeployed => "undeployed",
            DecommissionOutcome::Absent => "absent",
            DecommissionOutcome::Failed(_) => "failed",
        }
    }

    pub fn is_success(&self) -> bool {
        !matches!(self, DecommissionOutcome::Failed(_))
    }
}

/// Undeploys or removes node sources
pub struct NodeSourceDecommissioner {
    gateway: ResourceManagerRef,
}

impl NodeSourceDecommissioner {
    pub fn new(gateway: ResourceManagerRef) -> Self {
        Self { gateway }
    }

    /// Undeploy `pool`, or remove it entirely when `fully_remove` is set.
    ///
    /// `preempt` does not wait for nodes in use to be freed.
    pub async fn decommission(&self, pool: &str, preempt: bool, fully_remove: bool) -> bool {
        self.decommission_outcome(pool, preempt, fully_remove)
            .await
            .is_success()
    }

    /// Same as [`decommission`](Self::decommission) with the reason kept
    pub async fn decommission_outcome(
        &self,
        pool: &str,
        preempt: bool,
        fully_remove: bool,
    ) -> DecommissionOutcome {
        let result = if fully_remove {
            self.remove(pool, preempt).await
        } else {
            self.undeploy(pool, preempt).await
        };

        match result {
            Ok(outcome) => {
                info!("Node source {} decommissioned: {:?}", pool, outcome);
                outcome
            }
            Err(e) => {
                error!("Failed to decommission node source {}: {}", pool, e);
                DecommissionOutcome::Failed(e.to_string())
            }
        }
    }

    async fn remove(&self, pool: &str, preempt: bool) -> Result<DecommissionOutcome> {
        info!("Removing node source {} from the resource manager", pool);
        if !self.gateway.all_pool_names().await?.contains(pool) {
            warn!("The node source {} does not exist in the resource manager", pool);
            return Ok(DecommissionOutcome::Absent);
        }
        self.gateway.remove_pool(pool, preempt).await?;
        Ok(DecommissionOutcome::Removed)
    }

    async fn undeploy(&self, pool: &str, preempt: bool) -> Result<DecommissionOutcome> {
        info!("Undeploying node source {} from the resource manager", pool);
        if !self.gateway.deployed_pool_names().await?.contains(pool) {
            warn!("The node source {} is not deployed in the resource manager", pool);
            return Ok(DecommissionOutcome::Absent);
        }
        self.gateway.undeploy_pool(pool, preempt).await?;
        Ok(DecommissionOutcome::Undeployed)
    }
}
