//! Cleanup Orchestrator
//!
//! Coordinates a cascading teardown:
//! - clusters, then clouds, then edge devices, each stage run regardless
//!   of the previous ones
//! - the persistence purge, only when the three stages all succeeded
//!
//! Every entry point validates the caller's session first.

use crate::controlplane::cleaners::{CloudCleaner, ClusterCleaner, EdgeCleaner, ResourceCleaner};
use crate::controlplane::metrics::LifecycleMetrics;
use crate::controlplane::outcome::{CleanupReport, FailureReason, Stage, StageOutcome};
use crate::domain::ports::{
    CloudServiceRef, ClusterServiceRef, EdgeServiceRef, PersistenceRef, SessionValidatorRef,
};
use crate::error::{Error, Result};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Top-level teardown coordinator
pub struct CleanupOrchestrator {
    sessions: SessionValidatorRef,
    store: PersistenceRef,
    clusters: Arc<dyn ResourceCleaner>,
    clouds: Arc<dyn ResourceCleaner>,
    edges: Arc<dyn ResourceCleaner>,
    metrics: Option<LifecycleMetrics>,
}

impl CleanupOrchestrator {
    /// Create an orchestrator with the standard cluster/cloud/edge cleaners
    pub fn new(
        sessions: SessionValidatorRef,
        store: PersistenceRef,
        cluster_service: ClusterServiceRef,
        cloud_service: CloudServiceRef,
        edge_service: EdgeServiceRef,
    ) -> Self {
        Self {
            clusters: Arc::new(ClusterCleaner::new(store.clone(), cluster_service)),
            clouds: Arc::new(CloudCleaner::new(store.clone(), cloud_service)),
            edges: Arc::new(EdgeCleaner::new(store.clone(), edge_service)),
            sessions,
            store,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: LifecycleMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Tear down clusters, clouds and edge devices, then purge the store.
    ///
    /// The cloud stage aborts the sequence with an error when the bulk removal
    /// fails or the discovery check or cloud listing cannot be read.
    pub async fn clean_all(&self, session_id: &str) -> Result<CleanupReport> {
        info!("Received clean-all request for session {}", session_id);
        self.ensure_session(session_id).await?;
        let started_at = chrono::Utc::now();

        let clusters = self.run_stage(self.clusters.as_ref(), session_id).await?;
        let clouds = self.run_stage(self.clouds.as_ref(), session_id).await?;
        let edges = self.run_stage(self.edges.as_ref(), session_id).await?;

        let database = if clusters.is_success() && clouds.is_success() && edges.is_success() {
            info!("CLEAN-ALL: initiating database cleanup");
            self.purge(session_id).await
        } else {
            warn!("CLEAN-ALL: database cleanup skipped, an earlier stage failed");
            let outcome = StageOutcome::skipped(Stage::Database);
            self.record(&outcome);
            outcome
        };

        let success = clusters.is_success()
            && clouds.is_success()
            && edges.is_success()
            && database.is_success();
        info!(
            "CLEAN-ALL: completed all cleanup processes for session {} (success: {})",
            session_id, success
        );

        Ok(CleanupReport {
            session_id: session_id.to_string(),
            started_at,
            finished_at: chrono::Utc::now(),
            clusters,
            clouds,
            edges,
            database,
            success,
        })
    }

    /// Delete every cluster
    pub async fn clean_all_clusters(&self, session_id: &str) -> Result<StageOutcome> {
        info!("Received cluster cleanup request for session {}", session_id);
        self.ensure_session(session_id).await?;
        self.run_stage(self.clusters.as_ref(), session_id).await
    }

    /// Remove every cloud
    pub async fn clean_all_clouds(&self, session_id: &str) -> Result<StageOutcome> {
        info!("Received cloud cleanup request for session {}", session_id);
        self.ensure_session(session_id).await?;
        self.run_stage(self.clouds.as_ref(), session_id).await
    }

    /// Deregister every edge device
    pub async fn clean_all_edges(&self, session_id: &str) -> Result<StageOutcome> {
        info!("Received edge cleanup request for session {}", session_id);
        self.ensure_session(session_id).await?;
        self.run_stage(self.edges.as_ref(), session_id).await
    }

    /// Purge every stored entity, without tearing anything down first
    pub async fn clean_all_database(&self, session_id: &str) -> Result<StageOutcome> {
        info!("Received database cleanup request for session {}", session_id);
        self.ensure_session(session_id).await?;
        Ok(self.purge(session_id).await)
    }

    async fn ensure_session(&self, session_id: &str) -> Result<()> {
        if self.sessions.is_active(session_id).await? {
            return Ok(());
        }
        warn!("Session {} is not active, aborting cleanup", session_id);
        Err(Error::SessionInvalid {
            session_id: session_id.to_string(),
        })
    }

    async fn run_stage(
        &self,
        cleaner: &dyn ResourceCleaner,
        session_id: &str,
    ) -> Result<StageOutcome> {
        let stage = cleaner.stage();
        info!("CLEAN-ALL: initiating {} cleanup", stage);

        let outcome = match cleaner.clean(session_id).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("CLEAN-ALL: {} cleanup aborted: {}", stage, e);
                self.record(&StageOutcome::failed(
                    stage,
                    FailureReason::ServiceError { message: e.to_string() },
                ));
                return Err(e);
            }
        };

        match &outcome.failure {
            None => info!("CLEAN-ALL: successfully cleaned all {}", stage),
            Some(reason) => warn!("CLEAN-ALL: {} cleanup encountered issues: {}", stage, reason),
        }
        self.record(&outcome);
        Ok(outcome)
    }

    async fn purge(&self, session_id: &str) -> StageOutcome {
        let outcome = match self.store.purge_all(session_id).await {
            Ok(true) => {
                info!("Successfully cleaned database for session {}", session_id);
                StageOutcome::succeeded(Stage::Database, 1)
            }
            Ok(false) => {
                warn!("Database cleanup encountered issues for session {}", session_id);
                StageOutcome::failed(Stage::Database, FailureReason::PurgeFailed { message: None })
            }
            Err(e) => {
                error!("Database cleanup failed for session {}: {}", session_id, e);
                StageOutcome::failed(
                    Stage::Database,
                    FailureReason::PurgeFailed {
                        message: Some(e.to_string()),
                    },
                )
            }
        };
        self.record(&outcome);
        outcome
    }

    fn record(&self, outcome: &StageOutcome) {
        if let Some(metrics) = &self.metrics {
            metrics.record_stage(outcome);
        }
    }
}
