//! Cleanup Outcomes
//!
//! Typed per-stage results of a teardown. Soft failures (a resource that
//! could not be deleted, a guard that declined to run) are values here, not
//! errors, and are degraded to a boolean only at the orchestrator boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Stage
// =============================================================================

/// Teardown stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Clusters,
    Clouds,
    Edges,
    Database,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Clusters => "clusters",
            Stage::Clouds => "clouds",
            Stage::Edges => "edges",
            Stage::Database => "database",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Failure Reason
// =============================================================================

/// Why a stage did not succeed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// Some items could not be deleted; all were attempted
    ItemFailures { failed: usize, attempted: usize },
    /// Node-candidate discovery is still running for the session
    DiscoveryInProgress,
    /// The records of the stage could not be listed
    EnumerationFailed { message: String },
    /// A domain service could not answer a precondition query
    ServiceError { message: String },
    /// The persistence purge reported failure
    PurgeFailed { message: Option<String> },
    /// The stage was not run because an earlier stage failed
    Skipped,
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureReason::ItemFailures { failed, attempted } => {
                write!(f, "{} of {} items failed", failed, attempted)
            }
            FailureReason::DiscoveryInProgress => {
                write!(f, "asynchronous node candidate discovery in progress")
            }
            FailureReason::EnumerationFailed { message } => {
                write!(f, "enumeration failed: {}", message)
            }
            FailureReason::ServiceError { message } => write!(f, "service error: {}", message),
            FailureReason::PurgeFailed { message: Some(message) } => {
                write!(f, "purge failed: {}", message)
            }
            FailureReason::PurgeFailed { message: None } => write!(f, "purge failed"),
            FailureReason::Skipped => write!(f, "skipped"),
        }
    }
}

// =============================================================================
// Stage Outcome
// =============================================================================

/// Result of one teardown stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageOutcome {
    pub stage: Stage,
    /// Number of resources a delete was attempted on
    pub attempted: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureReason>,
}

impl StageOutcome {
    pub fn succeeded(stage: Stage, attempted: usize) -> Self {
        Self {
            stage,
            attempted,
            failure: None,
        }
    }

    pub fn failed(stage: Stage, reason: FailureReason) -> Self {
        let attempted = match &reason {
            FailureReason::ItemFailures { attempted, .. } => *attempted,
            _ => 0,
        };
        Self {
            stage,
            attempted,
            failure: Some(reason),
        }
    }

    pub fn skipped(stage: Stage) -> Self {
        Self::failed(stage, FailureReason::Skipped)
    }

    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

/// Per-item tally of a stage, aggregated as a logical AND
#[derive(Debug)]
pub(crate) struct ItemTally {
    stage: Stage,
    attempted: usize,
    failed: usize,
}

impl ItemTally {
    pub(crate) fn new(stage: Stage) -> Self {
        Self {
            stage,
            attempted: 0,
            failed: 0,
        }
    }

    pub(crate) fn record(&mut self, ok: bool) {
        self.attempted += 1;
        if !ok {
            self.failed += 1;
        }
    }

    pub(crate) fn finish(self) -> StageOutcome {
        if self.failed == 0 {
            StageOutcome::succeeded(self.stage, self.attempted)
        } else {
            StageOutcome::failed(
                self.stage,
                FailureReason::ItemFailures {
                    failed: self.failed,
                    attempted: self.attempted,
                },
            )
        }
    }
}

// =============================================================================
// Cleanup Report
// =============================================================================

/// Result of a full teardown
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupReport {
    pub session_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub clusters: StageOutcome,
    pub clouds: StageOutcome,
    pub edges: StageOutcome,
    /// Skipped unless clusters, clouds and edges all succeeded
    pub database: StageOutcome,
    pub success: bool,
}

impl CleanupReport {
    pub fn stages(&self) -> [&StageOutcome; 4] {
        [&self.clusters, &self.clouds, &self.edges, &self.database]
    }
}
