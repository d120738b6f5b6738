//! Domain Ports - Capabilities consumed by the lifecycle layer
//!
//! These traits define the boundaries between the orchestration logic and
//! the systems it drives: session validation, the resource manager, the
//! cloud/cluster/edge domain services and the persistence store.
//! Adapters implement these traits to provide concrete functionality.

use crate::domain::model::{
    ByonNode, Cloud, Cluster, EdgeNode, Hardware, Image, Location, NodeCandidate,
};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::Arc;

// =============================================================================
// Session Validator Port
// =============================================================================

/// Port for checking caller sessions
#[async_trait]
pub trait SessionValidator: Send + Sync {
    /// Whether the session is currently valid
    async fn is_active(&self, session_id: &str) -> Result<bool>;
}

// =============================================================================
// Resource Manager Port
// =============================================================================

/// Port for node source (resource pool) operations on the resource manager
///
/// Mutating calls may fail with [`Error::NotConnected`](crate::Error::NotConnected)
/// or [`Error::PermissionDenied`](crate::Error::PermissionDenied).
#[async_trait]
pub trait ResourceManagerGateway: Send + Sync {
    /// Names of node sources currently deployed
    async fn deployed_pool_names(&self) -> Result<BTreeSet<String>>;

    /// Names of all node sources, deployed or not
    async fn all_pool_names(&self) -> Result<BTreeSet<String>>;

    /// Host names of the nodes of a node source
    async fn hostnames_of(&self, pool: &str) -> Result<Vec<String>>;

    /// States of the nodes of a node source
    async fn states_of(&self, pool: &str) -> Result<Vec<String>>;

    /// Remove a node source; `preempt` does not wait for busy nodes
    async fn remove_pool(&self, pool: &str, preempt: bool) -> Result<()>;

    /// Undeploy a node source; `preempt` does not wait for busy nodes
    async fn undeploy_pool(&self, pool: &str, preempt: bool) -> Result<()>;
}

// =============================================================================
// Domain Service Ports
// =============================================================================

/// Port for cloud-provisioned resources
#[async_trait]
pub trait CloudDomainService: Send + Sync {
    /// Whether node-candidate discovery is still populating cloud inventories
    async fn is_async_discovery_in_progress(&self, session_id: &str) -> Result<bool>;

    /// Remove clouds and their deployed nodes in one call
    async fn remove_clouds(&self, session_id: &str, cloud_ids: &[String], preempt: bool)
        -> Result<bool>;
}

/// Port for cluster teardown
#[async_trait]
pub trait ClusterDomainService: Send + Sync {
    async fn delete_cluster(&self, session_id: &str, cluster_name: &str) -> Result<bool>;
}

/// Port for edge device deregistration
#[async_trait]
pub trait EdgeDomainService: Send + Sync {
    async fn delete_edge_node(&self, session_id: &str, edge_id: &str) -> Result<bool>;
}

// =============================================================================
// Persistence Port
// =============================================================================

/// Port for entity reads and writes
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    async fn list_clouds(&self) -> Result<Vec<Cloud>>;
    async fn get_cloud(&self, cloud_id: &str) -> Result<Option<Cloud>>;
    async fn save_cloud(&self, cloud: Cloud) -> Result<()>;
    async fn delete_cloud(&self, cloud_id: &str) -> Result<bool>;

    async fn list_node_candidates(&self) -> Result<Vec<NodeCandidate>>;
    async fn get_node_candidate(&self, id: &str) -> Result<Option<NodeCandidate>>;
    async fn save_node_candidate(&self, candidate: NodeCandidate) -> Result<()>;

    async fn get_image(&self, id: &str) -> Result<Option<Image>>;
    async fn save_image(&self, image: Image) -> Result<()>;
    async fn delete_image(&self, id: &str) -> Result<bool>;

    async fn get_hardware(&self, id: &str) -> Result<Option<Hardware>>;
    async fn save_hardware(&self, hardware: Hardware) -> Result<()>;
    async fn delete_hardware(&self, id: &str) -> Result<bool>;

    async fn get_location(&self, id: &str) -> Result<Option<Location>>;
    async fn save_location(&self, location: Location) -> Result<()>;
    async fn delete_location(&self, id: &str) -> Result<bool>;

    async fn list_clusters(&self) -> Result<Vec<Cluster>>;
    async fn get_cluster(&self, name: &str) -> Result<Option<Cluster>>;
    async fn save_cluster(&self, cluster: Cluster) -> Result<()>;
    async fn delete_cluster(&self, name: &str) -> Result<bool>;

    async fn list_byon_nodes(&self) -> Result<Vec<ByonNode>>;
    async fn get_byon_node(&self, id: &str) -> Result<Option<ByonNode>>;
    async fn save_byon_node(&self, node: ByonNode) -> Result<()>;

    async fn list_edge_nodes(&self) -> Result<Vec<EdgeNode>>;
    async fn get_edge_node(&self, id: &str) -> Result<Option<EdgeNode>>;
    async fn save_edge_node(&self, node: EdgeNode) -> Result<()>;
    async fn delete_edge_node(&self, id: &str) -> Result<bool>;

    /// Remove every stored entity
    async fn purge_all(&self, session_id: &str) -> Result<bool>;
}

// =============================================================================
// Type Aliases for Arc'd Traits
// =============================================================================

pub type SessionValidatorRef = Arc<dyn SessionValidator>;
pub type ResourceManagerRef = Arc<dyn ResourceManagerGateway>;
pub type CloudServiceRef = Arc<dyn CloudDomainService>;
pub type ClusterServiceRef = Arc<dyn ClusterDomainService>;
pub type EdgeServiceRef = Arc<dyn EdgeDomainService>;
pub type PersistenceRef = Arc<dyn PersistenceGateway>;
