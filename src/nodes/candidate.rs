//! Node Candidate Synthesis
//!
//! BYON and edge nodes are not discovered from a cloud catalogue, so their
//! node candidates are synthesized from the properties the caller reports.
//! Each synthesized candidate owns a freshly created image, hardware and
//! location record and references the placeholder cloud of its class.

use crate::controlplane::metrics::LifecycleMetrics;
use crate::domain::model::{
    Hardware, Image, Location, NodeCandidate, NodeProperties, ResourceClass,
};
use crate::domain::ports::PersistenceRef;
use crate::error::Result;
use crate::nodes::DummyCloudRegistry;
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Length of the random suffix shared by the ids of one candidate's records
pub const ID_SUFFIX_LEN: usize = 16;

/// Random alphanumeric suffix drawn from the thread-local CSPRNG
pub fn random_suffix(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Builds and persists synthetic node candidates
pub struct NodeCandidateSynthesizer {
    clouds: Arc<DummyCloudRegistry>,
    store: PersistenceRef,
    metrics: Option<LifecycleMetrics>,
}

impl NodeCandidateSynthesizer {
    pub fn new(clouds: Arc<DummyCloudRegistry>, store: PersistenceRef) -> Self {
        Self {
            clouds,
            store,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: LifecycleMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Synthesize and persist the node candidate of a BYON or edge node.
    ///
    /// Image, hardware and location are stored before the candidate that
    /// references them. The first persistence failure aborts synthesis and
    /// removes the records already stored for this candidate.
    pub async fn synthesize(
        &self,
        properties: &NodeProperties,
        job_id: &str,
        class: ResourceClass,
        node_id: &str,
        node_name: &str,
    ) -> Result<NodeCandidate> {
        debug!("Creating the {} node candidate for {}", class.owner(), node_name);

        let cloud = self.clouds.get_or_create(class).await?;
        let suffix = random_suffix(ID_SUFFIX_LEN);
        let os = &properties.operating_system;

        let image = Image {
            id: format!("{}-image-{}", class, suffix),
            name: format!(
                "{}-image-name-{}-{}",
                class, os.operating_system_family, os.operating_system_architecture
            ),
            operating_system: os.clone(),
        };

        let hardware = Hardware {
            id: format!("{}-hardware-{}", class, suffix),
            name: format!("{}-{}", class, node_name),
            cores: properties.cores,
            cpu_frequency: properties.cpu_frequency,
            disk: properties.disk,
            ram: properties.ram,
            fpga: properties.fpga,
            gpu: properties.gpu,
            provider_id: properties.provider_id.clone(),
        };

        let location = Location {
            id: format!("{}-location-{}", class, suffix),
            geo_location: properties.geo_location.clone(),
        };

        let (job_id_for_byon, job_id_for_edge) = match class {
            ResourceClass::Byon => (Some(job_id.to_string()), None),
            ResourceClass::Edge => (None, Some(job_id.to_string())),
        };

        let candidate = NodeCandidate {
            id: format!("{}-nc-{}", class, suffix),
            node_id: node_id.to_string(),
            node_candidate_type: class.candidate_type(),
            price: properties.price,
            memory_price: 0.0,
            price_per_invocation: 0.0,
            cloud_id: cloud.cloud_id,
            image_id: image.id.clone(),
            hardware_id: hardware.id.clone(),
            location_id: location.id.clone(),
            job_id_for_byon,
            job_id_for_edge,
        };

        if let Err(e) = self.persist(image, hardware, location, &candidate).await {
            error!("Failed to persist {} node candidate {}: {}", class.owner(), candidate.id, e);
            self.roll_back(&candidate).await;
            return Err(e);
        }

        if let Some(metrics) = &self.metrics {
            metrics.record_candidate(class);
        }

        info!("{} node candidate {} created", class.owner(), candidate.id);
        Ok(candidate)
    }

    async fn persist(
        &self,
        image: Image,
        hardware: Hardware,
        location: Location,
        candidate: &NodeCandidate,
    ) -> Result<()> {
        self.store.save_image(image).await?;
        self.store.save_hardware(hardware).await?;
        self.store.save_location(location).await?;
        self.store.save_node_candidate(candidate.clone()).await
    }

    /// Best-effort removal of the records a failed synthesis left behind
    async fn roll_back(&self, candidate: &NodeCandidate) {
        let removals = [
            ("image", self.store.delete_image(&candidate.image_id).await),
            ("hardware", self.store.delete_hardware(&candidate.hardware_id).await),
            ("location", self.store.delete_location(&candidate.location_id).await),
        ];
        for (kind, result) in removals {
            if let Err(e) = result {
                warn!("Could not roll back {} of node candidate {}: {}", kind, candidate.id, e);
            }
        }
    }
}
