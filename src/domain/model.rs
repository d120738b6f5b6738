//! Domain Model - Persisted entities of the orchestration layer
//!
//! Clouds, node candidates and their descriptive sub-entities, plus the
//! cluster/BYON/edge records that reference them.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::Error;

// =============================================================================
// Resource Class
// =============================================================================

/// Non-cloud resource classes that get a placeholder cloud
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceClass {
    Byon,
    Edge,
}

impl ResourceClass {
    /// Tag used as the placeholder cloud id and as the id prefix of
    /// synthesized sub-entities
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceClass::Byon => "byon",
            ResourceClass::Edge => "edge",
        }
    }

    /// Owner recorded on the placeholder cloud
    pub fn owner(&self) -> &'static str {
        match self {
            ResourceClass::Byon => "BYON",
            ResourceClass::Edge => "EDGE",
        }
    }

    pub fn cloud_type(&self) -> CloudType {
        match self {
            ResourceClass::Byon => CloudType::Byon,
            ResourceClass::Edge => CloudType::Edge,
        }
    }

    pub fn candidate_type(&self) -> NodeCandidateType {
        match self {
            ResourceClass::Byon => NodeCandidateType::Byon,
            ResourceClass::Edge => NodeCandidateType::Edge,
        }
    }
}

impl std::fmt::Display for ResourceClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ResourceClass {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "byon" => Ok(ResourceClass::Byon),
            "edge" => Ok(ResourceClass::Edge),
            _ => Err(Error::InvalidResourceClass(s.to_string())),
        }
    }
}

// =============================================================================
// Cloud
// =============================================================================

/// Cloud classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CloudType {
    Public,
    Private,
    Byon,
    Edge,
    Simulation,
}

impl CloudType {
    /// Placeholder clouds exist only to anchor BYON/edge candidates
    pub fn is_placeholder(&self) -> bool {
        matches!(self, CloudType::Byon | CloudType::Edge)
    }
}

/// A registered cloud, or the placeholder cloud of a resource class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cloud {
    pub cloud_id: String,
    pub cloud_type: CloudType,
    pub owner: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Cloud {
    /// Build the placeholder cloud for a resource class
    pub fn placeholder(class: ResourceClass) -> Self {
        Self {
            cloud_id: class.as_str().to_string(),
            cloud_type: class.cloud_type(),
            owner: class.owner().to_string(),
            created_at: chrono::Utc::now(),
        }
    }
}

// =============================================================================
// Candidate Sub-Entities
// =============================================================================

/// Operating system of a node image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatingSystem {
    pub operating_system_family: String,
    pub operating_system_architecture: String,
    #[serde(default)]
    pub operating_system_version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub id: String,
    pub name: String,
    pub operating_system: OperatingSystem,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hardware {
    pub id: String,
    pub name: String,
    pub cores: u32,
    /// CPU frequency in GHz
    pub cpu_frequency: f64,
    /// Disk size in GB
    pub disk: f64,
    /// RAM in MB
    pub ram: u64,
    pub fpga: u32,
    pub gpu: u32,
    pub provider_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoLocation {
    pub city: String,
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: String,
    pub geo_location: Option<GeoLocation>,
}

// =============================================================================
// Node Candidate
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NodeCandidateType {
    Iaas,
    Paas,
    Faas,
    Byon,
    Edge,
    Simulation,
}

/// Descriptor of an available compute resource
///
/// Sub-entities are referenced by id; the candidate owns exactly one image,
/// hardware and location, created together with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeCandidate {
    pub id: String,
    pub node_id: String,
    pub node_candidate_type: NodeCandidateType,
    pub price: f64,
    pub memory_price: f64,
    pub price_per_invocation: f64,
    pub cloud_id: String,
    pub image_id: String,
    pub hardware_id: String,
    pub location_id: String,
    pub job_id_for_byon: Option<String>,
    pub job_id_for_edge: Option<String>,
}

/// Properties reported for a statically registered node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeProperties {
    pub operating_system: OperatingSystem,
    pub cores: u32,
    pub cpu_frequency: f64,
    pub disk: f64,
    pub ram: u64,
    #[serde(default)]
    pub fpga: u32,
    #[serde(default)]
    pub gpu: u32,
    #[serde(default)]
    pub provider_id: Option<String>,
    #[serde(default)]
    pub geo_location: Option<GeoLocation>,
    #[serde(default)]
    pub price: f64,
}

// =============================================================================
// Resource Records
// =============================================================================

/// A logical cluster built from deployed nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    pub cluster_id: String,
    pub name: String,
    pub node_candidate_id: Option<String>,
    /// Node sources backing the cluster members
    pub node_sources: Vec<String>,
}

/// A statically registered "bring your own" node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ByonNode {
    pub id: String,
    pub name: String,
    pub job_id: String,
    pub node_candidate_id: String,
    pub node_source: String,
}

/// A registered edge device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeNode {
    pub id: String,
    pub name: String,
    pub job_id: String,
    pub node_candidate_id: String,
    pub node_source: String,
}
