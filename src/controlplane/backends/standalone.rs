//! Standalone Adapters
//!
//! In-process implementations of the session, resource-manager and domain
//! service ports, used when the service runs without a scheduler behind it.

use crate::domain::ports::{
    CloudDomainService, ClusterDomainService, EdgeDomainService, PersistenceRef,
    ResourceManagerGateway, ResourceManagerRef, SessionValidator,
};
use crate::error::{Error, Result};
use crate::nodes::NodeSourceDecommissioner;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

// =============================================================================
// Session Validator
// =============================================================================

/// Accepts a fixed set of session tokens, or any non-empty token when the set
/// is empty
pub struct StaticSessionValidator {
    tokens: HashSet<String>,
}

impl StaticSessionValidator {
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tokens: tokens.into_iter().map(Into::into).collect(),
        }
    }

    pub fn allow_any() -> Self {
        Self {
            tokens: HashSet::new(),
        }
    }
}

#[async_trait]
impl SessionValidator for StaticSessionValidator {
    async fn is_active(&self, session_id: &str) -> Result<bool> {
        if session_id.is_empty() {
            return Ok(false);
        }
        Ok(self.tokens.is_empty() || self.tokens.contains(session_id))
    }
}

// =============================================================================
// In-Memory Resource Manager
// =============================================================================

/// A node inside a node source
#[derive(Debug, Clone)]
struct NodeEntry {
    hostname: String,
    state: String,
}

#[derive(Debug, Clone, Default)]
struct PoolState {
    deployed: bool,
    nodes: Vec<NodeEntry>,
}

/// Node sources tracked in memory
#[derive(Default)]
pub struct InMemoryResourceManager {
    pools: RwLock<BTreeMap<String, PoolState>>,
}

impl InMemoryResourceManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a node source, optionally deployed right away
    pub fn define_pool(&self, pool: &str, deployed: bool) {
        debug!("Defining node source {} (deployed: {})", pool, deployed);
        self.pools.write().insert(
            pool.to_string(),
            PoolState {
                deployed,
                nodes: Vec::new(),
            },
        );
    }

    /// Add a node to a node source; an empty hostname means still starting
    pub fn add_node(&self, pool: &str, hostname: &str, state: &str) -> Result<()> {
        let mut pools = self.pools.write();
        let entry = pools.get_mut(pool).ok_or_else(|| Error::ResourceNotFound {
            kind: "NodeSource".into(),
            name: pool.to_string(),
        })?;
        entry.nodes.push(NodeEntry {
            hostname: hostname.to_string(),
            state: state.to_string(),
        });
        Ok(())
    }

    /// Report the hostname of every node of `pool` that has none yet
    pub fn set_hostname(&self, pool: &str, hostname: &str) -> Result<()> {
        let mut pools = self.pools.write();
        let entry = pools.get_mut(pool).ok_or_else(|| Error::ResourceNotFound {
            kind: "NodeSource".into(),
            name: pool.to_string(),
        })?;
        for node in entry.nodes.iter_mut().filter(|n| n.hostname.is_empty()) {
            node.hostname = hostname.to_string();
            node.state = "FREE".into();
        }
        Ok(())
    }

    fn nodes_of(&self, pool: &str) -> Vec<NodeEntry> {
        self.pools
            .read()
            .get(pool)
            .map(|p| p.nodes.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ResourceManagerGateway for InMemoryResourceManager {
    async fn deployed_pool_names(&self) -> Result<BTreeSet<String>> {
        Ok(self
            .pools
            .read()
            .iter()
            .filter(|(_, p)| p.deployed)
            .map(|(name, _)| name.clone())
            .collect())
    }

    async fn all_pool_names(&self) -> Result<BTreeSet<String>> {
        Ok(self.pools.read().keys().cloned().collect())
    }

    async fn hostnames_of(&self, pool: &str) -> Result<Vec<String>> {
        Ok(self.nodes_of(pool).into_iter().map(|n| n.hostname).collect())
    }

    async fn states_of(&self, pool: &str) -> Result<Vec<String>> {
        Ok(self.nodes_of(pool).into_iter().map(|n| n.state).collect())
    }

    async fn remove_pool(&self, pool: &str, preempt: bool) -> Result<()> {
        debug!("Removing node source {} (preempt: {})", pool, preempt);
        match self.pools.write().remove(pool) {
            Some(_) => Ok(()),
            None => Err(Error::ResourceNotFound {
                kind: "NodeSource".into(),
                name: pool.to_string(),
            }),
        }
    }

    async fn undeploy_pool(&self, pool: &str, preempt: bool) -> Result<()> {
        debug!("Undeploying node source {} (preempt: {})", pool, preempt);
        let mut pools = self.pools.write();
        let entry = pools.get_mut(pool).ok_or_else(|| Error::ResourceNotFound {
            kind: "NodeSource".into(),
            name: pool.to_string(),
        })?;
        entry.deployed = false;
        entry.nodes.clear();
        Ok(())
    }
}

// =============================================================================
// Store-Backed Domain Services
// =============================================================================

/// Cluster, cloud and edge services that tear a record down by removing its
/// node sources and then deleting the record
pub struct StoreBackedDomainServices {
    store: PersistenceRef,
    decommissioner: NodeSourceDecommissioner,
    discovery_in_progress: AtomicBool,
}

impl StoreBackedDomainServices {
    pub fn new(store: PersistenceRef, resource_manager: ResourceManagerRef) -> Self {
        Self {
            store,
            decommissioner: NodeSourceDecommissioner::new(resource_manager),
            discovery_in_progress: AtomicBool::new(false),
        }
    }

    /// Flag node-candidate discovery as running or finished
    pub fn set_discovery_in_progress(&self, running: bool) {
        self.discovery_in_progress.store(running, Ordering::SeqCst);
    }
}

#[async_trait]
impl ClusterDomainService for StoreBackedDomainServices {
    async fn delete_cluster(&self, session_id: &str, cluster_name: &str) -> Result<bool> {
        let Some(cluster) = self.store.get_cluster(cluster_name).await? else {
            warn!("Cluster {} not found for session {}", cluster_name, session_id);
            return Ok(false);
        };

        let mut all_removed = true;
        for pool in &cluster.node_sources {
            all_removed &= self.decommissioner.decommission(pool, true, true).await;
        }
        if !all_removed {
            warn!("Cluster {} kept, some node sources could not be removed", cluster_name);
            return Ok(false);
        }

        self.store.delete_cluster(cluster_name).await?;
        info!("Cluster {} deleted", cluster_name);
        Ok(true)
    }
}

#[async_trait]
impl EdgeDomainService for StoreBackedDomainServices {
    async fn delete_edge_node(&self, session_id: &str, edge_id: &str) -> Result<bool> {
        let Some(edge) = self.store.get_edge_node(edge_id).await? else {
            warn!("Edge device {} not found for session {}", edge_id, session_id);
            return Ok(false);
        };

        if !self.decommissioner.decommission(&edge.node_source, true, true).await {
            return Ok(false);
        }

        self.store.delete_edge_node(edge_id).await?;
        info!("Edge device {} deregistered", edge_id);
        Ok(true)
    }
}

#[async_trait]
impl CloudDomainService for StoreBackedDomainServices {
    async fn is_async_discovery_in_progress(&self, _session_id: &str) -> Result<bool> {
        Ok(self.discovery_in_progress.load(Ordering::SeqCst))
    }

    async fn remove_clouds(
        &self,
        session_id: &str,
        cloud_ids: &[String],
        preempt: bool,
    ) -> Result<bool> {
        info!(
            "Removing {} clouds for session {} (preempt: {})",
            cloud_ids.len(),
            session_id,
            preempt
        );
        let mut all_removed = true;
        for cloud_id in cloud_ids {
            if !self.store.delete_cloud(cloud_id).await? {
                warn!("Cloud {} not found", cloud_id);
                all_removed = false;
            }
        }
        Ok(all_removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controlplane::backends::MemoryPersistence;
    use crate::domain::model::CloudType;
    use crate::domain::ports::PersistenceGateway;
    use crate::nodes::HostnameResolver;
    use crate::test_support::{cloud, cluster, edge_node};
    use std::sync::Arc;

    fn services() -> (
        Arc<MemoryPersistence>,
        Arc<InMemoryResourceManager>,
        StoreBackedDomainServices,
    ) {
        let store = Arc::new(MemoryPersistence::new());
        let rm = Arc::new(InMemoryResourceManager::new());
        let services = StoreBackedDomainServices::new(store.clone(), rm.clone());
        (store, rm, services)
    }

    #[tokio::test]
    async fn test_static_sessions() {
        let validator = StaticSessionValidator::new(["alpha"]);
        assert!(validator.is_active("alpha").await.unwrap());
        assert!(!validator.is_active("beta").await.unwrap());

        let open = StaticSessionValidator::allow_any();
        assert!(open.is_active("anything").await.unwrap());
        assert!(!open.is_active("").await.unwrap());
    }

    #[tokio::test]
    async fn test_resource_manager_listings() {
        let rm = InMemoryResourceManager::new();
        rm.define_pool("ns-a", true);
        rm.define_pool("ns-b", false);
        rm.add_node("ns-a", "", "CONFIGURING").unwrap();

        assert_eq!(rm.deployed_pool_names().await.unwrap().len(), 1);
        assert_eq!(rm.all_pool_names().await.unwrap().len(), 2);
        assert_eq!(rm.states_of("ns-a").await.unwrap(), vec!["CONFIGURING"]);

        rm.set_hostname("ns-a", "a.local").unwrap();
        assert_eq!(rm.hostnames_of("ns-a").await.unwrap(), vec!["a.local"]);
        assert!(rm.add_node("missing", "x", "FREE").is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolver_against_in_memory_manager() {
        let rm = Arc::new(InMemoryResourceManager::new());
        rm.define_pool("ns-byon", true);
        rm.add_node("ns-byon", "worker.local", "FREE").unwrap();

        let hostname = HostnameResolver::new(rm).resolve("ns-byon").await.unwrap();
        assert_eq!(hostname, "worker.local");
    }

    #[tokio::test]
    async fn test_delete_cluster_removes_node_sources() {
        let (store, rm, services) = services();
        rm.define_pool("ns-1", true);
        rm.define_pool("ns-2", false);
        let mut record = cluster("analytics");
        record.node_sources = vec!["ns-1".into(), "ns-2".into()];
        store.save_cluster(record).await.unwrap();

        assert!(services.delete_cluster("s", "analytics").await.unwrap());
        assert!(rm.all_pool_names().await.unwrap().is_empty());
        assert!(store.get_cluster("analytics").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_missing_records_report_false() {
        let (_store, _rm, services) = services();
        assert!(!services.delete_cluster("s", "ghost").await.unwrap());
        assert!(!services.delete_edge_node("s", "ghost").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_edge_node_with_absent_pool() {
        let (store, _rm, services) = services();
        store.save_edge_node(edge_node("e1")).await.unwrap();

        assert!(services.delete_edge_node("s", "e1").await.unwrap());
        assert_eq!(store.stats().edge_nodes, 0);
    }

    #[tokio::test]
    async fn test_remove_clouds_and_discovery_flag() {
        let (store, _rm, services) = services();
        store.save_cloud(cloud("aws-1", CloudType::Public)).await.unwrap();

        assert!(!services.is_async_discovery_in_progress("s").await.unwrap());
        services.set_discovery_in_progress(true);
        assert!(services.is_async_discovery_in_progress("s").await.unwrap());

        assert!(services
            .remove_clouds("s", &["aws-1".to_string()], true)
            .await
            .unwrap());
        assert!(!services
            .remove_clouds("s", &["aws-1".to_string()], true)
            .await
            .unwrap());
    }
}
