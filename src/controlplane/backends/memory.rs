//! In-Memory Persistence Backend
//!
//! `PersistenceGateway` implementation backed by DashMap, used in standalone
//! mode and by tests. Listings are ordered by id.

use crate::domain::model::{
    ByonNode, Cloud, Cluster, EdgeNode, Hardware, Image, Location, NodeCandidate,
};
use crate::domain::ports::PersistenceGateway;
use crate::error::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

// =============================================================================
// Store Statistics
// =============================================================================

/// Entity counts of the store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    pub clouds: usize,
    pub node_candidates: usize,
    pub images: usize,
    pub hardware: usize,
    pub locations: usize,
    pub clusters: usize,
    pub byon_nodes: usize,
    pub edge_nodes: usize,
    pub writes: u64,
    pub purges: u64,
}

// =============================================================================
// Memory Persistence
// =============================================================================

/// Entity store keyed by entity id (cluster name for clusters)
#[derive(Default)]
pub struct MemoryPersistence {
    clouds: DashMap<String, Cloud>,
    node_candidates: DashMap<String, NodeCandidate>,
    images: DashMap<String, Image>,
    hardware: DashMap<String, Hardware>,
    locations: DashMap<String, Location>,
    clusters: DashMap<String, Cluster>,
    byon_nodes: DashMap<String, ByonNode>,
    edge_nodes: DashMap<String, EdgeNode>,
    writes: AtomicU64,
    purges: AtomicU64,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of entity counts
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            clouds: self.clouds.len(),
            node_candidates: self.node_candidates.len(),
            images: self.images.len(),
            hardware: self.hardware.len(),
            locations: self.locations.len(),
            clusters: self.clusters.len(),
            byon_nodes: self.byon_nodes.len(),
            edge_nodes: self.edge_nodes.len(),
            writes: self.writes.load(Ordering::Relaxed),
            purges: self.purges.load(Ordering::Relaxed),
        }
    }

    #[inline]
    fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::Relaxed);
    }
}

/// Snapshot of a map's values, ordered by key
fn values<V: Clone>(map: &DashMap<String, V>) -> Vec<V> {
    let mut entries: Vec<(String, V)> = map
        .iter()
        .map(|r| (r.key().clone(), r.value().clone()))
        .collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    entries.into_iter().map(|(_, v)| v).collect()
}

#[async_trait]
impl PersistenceGateway for MemoryPersistence {
    async fn list_clouds(&self) -> Result<Vec<Cloud>> {
        Ok(values(&self.clouds))
    }

    async fn get_cloud(&self, cloud_id: &str) -> Result<Option<Cloud>> {
        Ok(self.clouds.get(cloud_id).map(|r| r.value().clone()))
    }

    async fn save_cloud(&self, cloud: Cloud) -> Result<()> {
        self.record_write();
        self.clouds.insert(cloud.cloud_id.clone(), cloud);
        Ok(())
    }

    async fn delete_cloud(&self, cloud_id: &str) -> Result<bool> {
        Ok(self.clouds.remove(cloud_id).is_some())
    }

    async fn list_node_candidates(&self) -> Result<Vec<NodeCandidate>> {
        Ok(values(&self.node_candidates))
    }

    async fn get_node_candidate(&self, id: &str) -> Result<Option<NodeCandidate>> {
        Ok(self.node_candidates.get(id).map(|r| r.value().clone()))
    }

    async fn save_node_candidate(&self, candidate: NodeCandidate) -> Result<()> {
        self.record_write();
        self.node_candidates.insert(candidate.id.clone(), candidate);
        Ok(())
    }

    async fn get_image(&self, id: &str) -> Result<Option<Image>> {
        Ok(self.images.get(id).map(|r| r.value().clone()))
    }

    async fn save_image(&self, image: Image) -> Result<()> {
        self.record_write();
        self.images.insert(image.id.clone(), image);
        Ok(())
    }

    async fn delete_image(&self, id: &str) -> Result<bool> {
        Ok(self.images.remove(id).is_some())
    }

    async fn get_hardware(&self, id: &str) -> Result<Option<Hardware>> {
        Ok(self.hardware.get(id).map(|r| r.value().clone()))
    }

    async fn save_hardware(&self, hardware: Hardware) -> Result<()> {
        self.record_write();
        self.hardware.insert(hardware.id.clone(), hardware);
        Ok(())
    }

    async fn delete_hardware(&self, id: &str) -> Result<bool> {
        Ok(self.hardware.remove(id).is_some())
    }

    async fn get_location(&self, id: &str) -> Result<Option<Location>> {
        Ok(self.locations.get(id).map(|r| r.value().clone()))
    }

    async fn save_location(&self, location: Location) -> Result<()> {
        self.record_write();
        self.locations.insert(location.id.clone(), location);
        Ok(())
    }

    async fn delete_location(&self, id: &str) -> Result<bool> {
        Ok(self.locations.remove(id).is_some())
    }

    async fn list_clusters(&self) -> Result<Vec<Cluster>> {
        Ok(values(&self.clusters))
    }

    async fn get_cluster(&self, name: &str) -> Result<Option<Cluster>> {
        Ok(self.clusters.get(name).map(|r| r.value().clone()))
    }

    async fn save_cluster(&self, cluster: Cluster) -> Result<()> {
        self.record_write();
        self.clusters.insert(cluster.name.clone(), cluster);
        Ok(())
    }

    async fn delete_cluster(&self, name: &str) -> Result<bool> {
        Ok(self.clusters.remove(name).is_some())
    }

    async fn list_byon_nodes(&self) -> Result<Vec<ByonNode>> {
        Ok(values(&self.byon_nodes))
    }

    async fn get_byon_node(&self, id: &str) -> Result<Option<ByonNode>> {
        Ok(self.byon_nodes.get(id).map(|r| r.value().clone()))
    }

    async fn save_byon_node(&self, node: ByonNode) -> Result<()> {
        self.record_write();
        self.byon_nodes.insert(node.id.clone(), node);
        Ok(())
    }

    async fn list_edge_nodes(&self) -> Result<Vec<EdgeNode>> {
        Ok(values(&self.edge_nodes))
    }

    async fn get_edge_node(&self, id: &str) -> Result<Option<EdgeNode>> {
        Ok(self.edge_nodes.get(id).map(|r| r.value().clone()))
    }

    async fn save_edge_node(&self, node: EdgeNode) -> Result<()> {
        self.record_write();
        self.edge_nodes.insert(node.id.clone(), node);
        Ok(())
    }

    async fn delete_edge_node(&self, id: &str) -> Result<bool> {
        Ok(self.edge_nodes.remove(id).is_some())
    }

    async fn purge_all(&self, session_id: &str) -> Result<bool> {
        info!("Purging all stored entities for session {}", session_id);
        let before = self.stats();

        self.node_candidates.clear();
        self.images.clear();
        self.hardware.clear();
        self.locations.clear();
        self.clusters.clear();
        self.byon_nodes.clear();
        self.edge_nodes.clear();
        self.clouds.clear();
        self.purges.fetch_add(1, Ordering::Relaxed);

        debug!(
            "Purged {} candidates, {} clouds, {} clusters",
            before.node_candidates, before.clouds, before.clusters
        );
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::ResourceClass;

    #[tokio::test]
    async fn test_save_and_get_cloud() {
        let store = MemoryPersistence::new();
        store.save_cloud(Cloud::placeholder(ResourceClass::Byon)).await.unwrap();

        let cloud = store.get_cloud("byon").await.unwrap().unwrap();
        assert_eq!(cloud.owner, "BYON");
        assert!(store.get_cloud("edge").await.unwrap().is_none());
        assert_eq!(store.stats().writes, 1);
    }

    #[tokio::test]
    async fn test_purge_clears_everything() {
        let store = MemoryPersistence::new();
        store.save_cloud(Cloud::placeholder(ResourceClass::Edge)).await.unwrap();
        store
            .save_cluster(Cluster {
                cluster_id: "c-1".into(),
                name: "analytics".into(),
                node_candidate_id: None,
                node_sources: vec![],
            })
            .await
            .unwrap();

        assert!(store.purge_all("session-1").await.unwrap());

        let stats = store.stats();
        assert_eq!(stats.clouds, 0);
        assert_eq!(stats.clusters, 0);
        assert_eq!(stats.purges, 1);
    }

    #[test]
    fn test_delete_cloud() {
        let store = MemoryPersistence::new();
        tokio_test::block_on(async {
            tokio_test::assert_ok!(store.save_cloud(Cloud::placeholder(ResourceClass::Edge)).await);
            assert!(store.delete_cloud("edge").await.unwrap());
            assert!(!store.delete_cloud("edge").await.unwrap());
        });
    }

    #[tokio::test]
    async fn test_listings_are_ordered_by_key() {
        let store = MemoryPersistence::new();
        for id in ["e3", "e1", "e2"] {
            store
                .save_edge_node(crate::test_support::edge_node(id))
                .await
                .unwrap();
        }

        let ids: Vec<String> = store
            .list_edge_nodes()
            .await
            .unwrap()
            .into_iter()
            .map(|node| node.id)
            .collect();
        assert_eq!(ids, vec!["e1", "e2", "e3"]);
    }
}
