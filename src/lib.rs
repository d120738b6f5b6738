//! Resource Lifecycle - Teardown Orchestration and Synthetic Nodes
//!
//! Tears down every resource a deployment session created, in dependency
//! order, and keeps the bookkeeping for statically registered (BYON) and
//! edge nodes that no cloud provisions.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────────┐
//! │                          Cleanup Orchestrator                               │
//! │          clusters ──▶ clouds ──▶ edges ──▶ database purge (if all ok)       │
//! ├─────────────────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────────┐  │
//! │  │  Cluster        │  │  Cloud          │  │  Edge                       │  │
//! │  │  Cleaner        │  │  Cleaner (bulk) │  │  Cleaner                    │  │
//! │  └────────┬────────┘  └────────┬────────┘  └─────────────┬───────────────┘  │
//! ├───────────┴────────────────────┴─────────────────────────┴──────────────────┤
//! │                         Synthetic Node Bookkeeping                          │
//! │  ┌──────────────┐ ┌──────────────────┐ ┌──────────────┐ ┌────────────────┐  │
//! │  │ Placeholder  │ │ Candidate        │ │ Hostname     │ │ Node Source    │  │
//! │  │ Clouds       │ │ Synthesizer      │ │ Resolver     │ │ Decommissioner │  │
//! │  └──────────────┘ └──────────────────┘ └──────────────┘ └────────────────┘  │
//! ├─────────────────────────────────────────────────────────────────────────────┤
//! │                               Domain Ports                                  │
//! │   sessions · resource manager · cluster/cloud/edge services · persistence   │
//! └─────────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`controlplane`]: Cleanup orchestrator, cleaners, metrics, REST API and adapters
//! - [`nodes`]: Placeholder clouds, candidate synthesis, hostname resolution
//! - [`domain`]: Core domain types and ports
//! - [`error`]: Error types and handling

pub mod controlplane;
pub mod domain;
pub mod error;
pub mod nodes;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use controlplane::{
    ApiServer, ApiServerConfig, ApiState, CleanupOrchestrator, CleanupReport, FailureReason,
    InMemoryResourceManager, LifecycleMetrics, MemoryPersistence, RestRouter, Stage,
    StageOutcome, StaticSessionValidator, StoreBackedDomainServices,
};

pub use domain::model::{
    ByonNode, Cloud, CloudType, Cluster, EdgeNode, NodeCandidate, NodeCandidateType,
    NodeProperties, ResourceClass,
};

pub use domain::ports::{
    CloudDomainService, ClusterDomainService, EdgeDomainService, PersistenceGateway,
    ResourceManagerGateway, SessionValidator,
};

pub use error::{Error, Result};

pub use nodes::{
    DecommissionOutcome, DummyCloudRegistry, HostnameResolver, NodeCandidateSynthesizer,
    NodeSourceDecommissioner, ResolverConfig,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
