//! Resource Cleaners
//!
//! One cleaner per resource class. Each enumerates the stored records of its
//! class and deletes them through the owning domain service. Cluster and edge
//! cleaners delete item by item and never stop early; the cloud cleaner
//! removes all clouds in one bulk call.

use crate::controlplane::outcome::{FailureReason, ItemTally, Stage, StageOutcome};
use crate::domain::ports::{CloudServiceRef, ClusterServiceRef, EdgeServiceRef, PersistenceRef};
use crate::error::{Error, Result};
use async_trait::async_trait;
use tracing::{error, info, warn};

/// A teardown stage over one resource class
///
/// `Ok` carries the stage outcome, including soft failures. `Err` is reserved
/// for failures that must abort the whole teardown.
#[async_trait]
pub trait ResourceCleaner: Send + Sync {
    fn stage(&self) -> Stage;

    async fn clean(&self, session_id: &str) -> Result<StageOutcome>;
}

// =============================================================================
// Cluster Cleaner
// =============================================================================

pub struct ClusterCleaner {
    store: PersistenceRef,
    clusters: ClusterServiceRef,
}

impl ClusterCleaner {
    pub fn new(store: PersistenceRef, clusters: ClusterServiceRef) -> Self {
        Self { store, clusters }
    }
}

#[async_trait]
impl ResourceCleaner for ClusterCleaner {
    fn stage(&self) -> Stage {
        Stage::Clusters
    }

    async fn clean(&self, session_id: &str) -> Result<StageOutcome> {
        info!("Starting cluster cleanup for session {}", session_id);

        let clusters = match self.store.list_clusters().await {
            Ok(clusters) => clusters,
            Err(e) => {
                error!("Could not list clusters for session {}: {}", session_id, e);
                return Ok(StageOutcome::failed(
                    Stage::Clusters,
                    FailureReason::EnumerationFailed { message: e.to_string() },
                ));
            }
        };
        if clusters.is_empty() {
            warn!("No clusters found to clean for session {}", session_id);
            return Ok(StageOutcome::succeeded(Stage::Clusters, 0));
        }

        let mut tally = ItemTally::new(Stage::Clusters);
        for cluster in &clusters {
            let deleted = match self.clusters.delete_cluster(session_id, &cluster.name).await {
                Ok(deleted) => deleted,
                Err(e) => {
                    error!("Error deleting cluster {}: {}", cluster.name, e);
                    false
                }
            };
            if deleted {
                info!("Deleted cluster {} for session {}", cluster.name, session_id);
            } else {
                error!("Failed to delete cluster {} for session {}", cluster.name, session_id);
            }
            tally.record(deleted);
        }

        let outcome = tally.finish();
        if outcome.is_success() {
            info!("Removed all clusters for session {}", session_id);
        } else {
            warn!("Cluster cleanup completed with failures for session {}", session_id);
        }
        Ok(outcome)
    }
}

// =============================================================================
// Cloud Cleaner
// =============================================================================

pub struct CloudCleaner {
    store: PersistenceRef,
    clouds: CloudServiceRef,
}

impl CloudCleaner {
    pub fn new(store: PersistenceRef, clouds: CloudServiceRef) -> Self {
        Self { store, clouds }
    }
}

#[async_trait]
impl ResourceCleaner for CloudCleaner {
    fn stage(&self) -> Stage {
        Stage::Clouds
    }

    async fn clean(&self, session_id: &str) -> Result<StageOutcome> {
        info!("Starting cloud cleanup for session {}", session_id);

        // Best-effort guard: the flag is owned by the discovery subsystem
        match self.clouds.is_async_discovery_in_progress(session_id).await {
            Ok(false) => {}
            Ok(true) => {
                warn!("Asynchronous node candidate discovery in progress, cloud cleanup deferred");
                return Ok(StageOutcome::failed(
                    Stage::Clouds,
                    FailureReason::DiscoveryInProgress,
                ));
            }
            Err(e) => {
                error!("Could not check node candidate discovery: {}", e);
                return Err(e);
            }
        }

        // Unlike clusters and edges, an unreadable cloud inventory aborts the teardown
        let clouds = match self.store.list_clouds().await {
            Ok(clouds) => clouds,
            Err(e) => {
                error!("Could not list clouds for session {}: {}", session_id, e);
                return Err(e);
            }
        };

        // Placeholder clouds have no deployment behind them; the purge drops them
        let cloud_ids: Vec<String> = clouds
            .into_iter()
            .filter(|cloud| !cloud.cloud_type.is_placeholder())
            .map(|cloud| cloud.cloud_id)
            .collect();
        if cloud_ids.is_empty() {
            warn!("No clouds found to clean for session {}", session_id);
            return Ok(StageOutcome::succeeded(Stage::Clouds, 0));
        }

        info!("Found {} clouds to clean for session {}", cloud_ids.len(), session_id);
        let removed = match self.clouds.remove_clouds(session_id, &cloud_ids, true).await {
            Ok(removed) => removed,
            Err(e) => {
                error!("Cloud removal errored for session {}: {}", session_id, e);
                false
            }
        };
        if !removed {
            error!("Failed to remove one or more clouds for session {}", session_id);
            return Err(Error::BulkOperationFailure {
                operation: "cloud removal".into(),
                count: cloud_ids.len(),
            });
        }

        info!("Removed all clouds for session {}", session_id);
        Ok(StageOutcome::succeeded(Stage::Clouds, cloud_ids.len()))
    }
}

// =============================================================================
// Edge Cleaner
// =============================================================================

pub struct EdgeCleaner {
    store: PersistenceRef,
    edges: EdgeServiceRef,
}

impl EdgeCleaner {
    pub fn new(store: PersistenceRef, edges: EdgeServiceRef) -> Self {
        Self { store, edges }
    }
}

#[async_trait]
impl ResourceCleaner for EdgeCleaner {
    fn stage(&self) -> Stage {
        Stage::Edges
    }

    async fn clean(&self, session_id: &str) -> Result<StageOutcome> {
        info!("Starting edge device cleanup for session {}", session_id);

        let edges = match self.store.list_edge_nodes().await {
            Ok(edges) => edges,
            Err(e) => {
                error!("Could not list edge devices for session {}: {}", session_id, e);
                return Ok(StageOutcome::failed(
                    Stage::Edges,
                    FailureReason::EnumerationFailed { message: e.to_string() },
                ));
            }
        };
        if edges.is_empty() {
            warn!("No edge devices found for session {}, nothing to deregister", session_id);
            return Ok(StageOutcome::succeeded(Stage::Edges, 0));
        }

        info!("Deregistering {} edge devices for session {}", edges.len(), session_id);
        let mut tally = ItemTally::new(Stage::Edges);
        for edge in &edges {
            let deleted = match self.edges.delete_edge_node(session_id, &edge.id).await {
                Ok(deleted) => deleted,
                Err(e) => {
                    error!("Error deregistering edge device {}: {}", edge.id, e);
                    false
                }
            };
            if deleted {
                info!("Deregistered edge device {} for session {}", edge.id, session_id);
            } else {
                error!("Failed to deregister edge device {} for session {}", edge.id, session_id);
            }
            tally.record(deleted);
        }

        let outcome = tally.finish();
        if outcome.is_success() {
            info!("All edge devices deregistered for session {}", session_id);
        } else {
            warn!("Edge cleanup completed with failures for session {}", session_id);
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Cloud, CloudType, ResourceClass};
    use crate::domain::ports::PersistenceGateway;
    use crate::test_support::{
        cloud, cluster, edge_node, RecordingCloudService, RecordingClusterService,
        RecordingEdgeService, RecordingStore,
    };
    use assert_matches::assert_matches;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_empty_classes_succeed_without_deletes() {
        let store = Arc::new(RecordingStore::new());
        let clusters = Arc::new(RecordingClusterService::default());
        let clouds = Arc::new(RecordingCloudService::default());
        let edges = Arc::new(RecordingEdgeService::default());

        let outcomes = [
            ClusterCleaner::new(store.clone(), clusters.clone()).clean("s").await.unwrap(),
            CloudCleaner::new(store.clone(), clouds.clone()).clean("s").await.unwrap(),
            EdgeCleaner::new(store.clone(), edges.clone()).clean("s").await.unwrap(),
        ];

        assert!(outcomes.iter().all(|o| o.is_success() && o.attempted == 0));
        assert!(clusters.calls().is_empty());
        assert!(clouds.calls().is_empty());
        assert!(edges.calls().is_empty());
    }

    #[tokio::test]
    async fn test_cluster_failure_does_not_stop_later_items() {
        let store = Arc::new(RecordingStore::new());
        for name in ["c1", "c2", "c3"] {
            store.save_cluster(cluster(name)).await.unwrap();
        }
        let clusters = Arc::new(RecordingClusterService::failing(&["c2"]));

        let outcome = ClusterCleaner::new(store, clusters.clone())
            .clean("s")
            .await
            .unwrap();

        assert!(!outcome.is_success());
        assert_eq!(
            outcome.failure,
            Some(FailureReason::ItemFailures { failed: 1, attempted: 3 })
        );
        assert_eq!(clusters.calls(), vec!["c1", "c2", "c3"]);
    }

    #[tokio::test]
    async fn test_edge_error_counts_as_item_failure() {
        let store = Arc::new(RecordingStore::new());
        for id in ["e1", "e2", "e3"] {
            store.save_edge_node(edge_node(id)).await.unwrap();
        }
        let edges = Arc::new(RecordingEdgeService::erroring(&["e2"]));

        let outcome = EdgeCleaner::new(store, edges.clone()).clean("s").await.unwrap();

        assert!(!outcome.is_success());
        assert_eq!(outcome.attempted, 3);
        assert_eq!(edges.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_enumeration_failure_fails_stage() {
        let store = Arc::new(RecordingStore::new());
        store.fail_on("list_edge_nodes");
        let edges = Arc::new(RecordingEdgeService::default());

        let outcome = EdgeCleaner::new(store, edges.clone()).clean("s").await.unwrap();

        assert_matches!(outcome.failure, Some(FailureReason::EnumerationFailed { .. }));
        assert!(edges.calls().is_empty());
    }

    #[tokio::test]
    async fn test_cloud_cleanup_deferred_during_discovery() {
        let store = Arc::new(RecordingStore::new());
        store.save_cloud(cloud("aws-1", CloudType::Public)).await.unwrap();
        let clouds = Arc::new(RecordingCloudService::discovering());

        let outcome = CloudCleaner::new(store, clouds.clone()).clean("s").await.unwrap();

        assert_eq!(outcome.failure, Some(FailureReason::DiscoveryInProgress));
        assert!(clouds.calls().is_empty());
    }

    #[tokio::test]
    async fn test_discovery_check_error_is_fatal() {
        let store = Arc::new(RecordingStore::new());
        store.save_cloud(cloud("aws-1", CloudType::Public)).await.unwrap();
        let clouds = Arc::new(RecordingCloudService::unreachable());

        let result = CloudCleaner::new(store, clouds.clone()).clean("s").await;

        assert_matches!(result, Err(Error::Internal(_)));
        assert!(clouds.calls().is_empty());
    }

    #[tokio::test]
    async fn test_cloud_listing_error_is_fatal() {
        let store = Arc::new(RecordingStore::new());
        store.fail_on("list_clouds");
        let clouds = Arc::new(RecordingCloudService::default());

        let result = CloudCleaner::new(store, clouds.clone()).clean("s").await;

        assert_matches!(result, Err(Error::Persistence(_)));
        assert!(clouds.calls().is_empty());
    }

    #[tokio::test]
    async fn test_cloud_cleanup_is_bulk_and_skips_placeholders() {
        let store = Arc::new(RecordingStore::new());
        store.save_cloud(cloud("aws-1", CloudType::Public)).await.unwrap();
        store.save_cloud(cloud("os-1", CloudType::Private)).await.unwrap();
        store.save_cloud(Cloud::placeholder(ResourceClass::Byon)).await.unwrap();
        let clouds = Arc::new(RecordingCloudService::default());

        let outcome = CloudCleaner::new(store, clouds.clone()).clean("s").await.unwrap();

        assert!(outcome.is_success());
        assert_eq!(outcome.attempted, 2);
        let calls = clouds.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], vec!["aws-1", "os-1"]);
    }

    #[tokio::test]
    async fn test_failed_bulk_removal_is_fatal() {
        let store = Arc::new(RecordingStore::new());
        store.save_cloud(cloud("aws-1", CloudType::Public)).await.unwrap();
        let clouds = Arc::new(RecordingCloudService::rejecting());

        let result = CloudCleaner::new(store, clouds).clean("s").await;

        assert_matches!(result, Err(Error::BulkOperationFailure { count: 1, .. }));
    }
}
