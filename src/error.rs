//! Error types for the resource lifecycle layer
//!
//! Provides structured error types for the teardown orchestrator, the
//! synthetic node-candidate bookkeeping and the ports they drive.
//!
//! Soft, per-item cleanup failures are not errors: they are recorded as
//! [`StageOutcome`](crate::controlplane::StageOutcome) values. Only the
//! failures that must abort the calling operation live here.

use thiserror::Error;

/// Unified error type for the crate
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Internal Errors
    // =========================================================================
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // =========================================================================
    // Session Errors
    // =========================================================================
    #[error("Session {session_id} is not active")]
    SessionInvalid { session_id: String },

    // =========================================================================
    // Resource Manager Errors
    // =========================================================================
    #[error("Not connected to the resource manager: {0}")]
    NotConnected(String),

    #[error("Permission denied by the resource manager: {0}")]
    PermissionDenied(String),

    #[error("Node source {pool} lists {count} hosts, expected exactly one")]
    InvariantViolation { pool: String, count: usize },

    #[error("Hostname of node source {pool} not available after {attempts} attempts")]
    RetryExhausted { pool: String, attempts: u32 },

    #[error("Hostname resolution for node source {pool} was cancelled")]
    Cancelled { pool: String },

    // =========================================================================
    // Domain Errors
    // =========================================================================
    #[error("Bulk {operation} failed for {count} resources")]
    BulkOperationFailure { operation: String, count: usize },

    #[error("Cloud {cloud_id} is not a {class} placeholder cloud")]
    PlaceholderConflict { cloud_id: String, class: String },

    #[error("Resource not found: {kind}/{name}")]
    ResourceNotFound { kind: String, name: String },

    #[error("Invalid resource class: {0}")]
    InvalidResourceClass(String),

    // =========================================================================
    // Persistence Errors
    // =========================================================================
    #[error("Persistence error: {0}")]
    Persistence(String),

    // =========================================================================
    // Metrics Errors
    // =========================================================================
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    // =========================================================================
    // IO Errors
    // =========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Check if this error must abort the operation that observed it.
    ///
    /// Fatal errors are never retried further up the stack.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::SessionInvalid { .. }
                | Error::InvariantViolation { .. }
                | Error::RetryExhausted { .. }
                | Error::BulkOperationFailure { .. }
                | Error::PlaceholderConflict { .. }
                | Error::Cancelled { .. }
                | Error::Persistence(_)
        )
    }

    /// Check if this error is transient
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::NotConnected(_))
    }

    /// Short machine-readable code used in API responses and metrics labels
    pub fn code(&self) -> &'static str {
        match self {
            Error::Internal(_) => "internal_error",
            Error::Configuration(_) => "configuration_error",
            Error::SessionInvalid { .. } => "session_invalid",
            Error::NotConnected(_) => "not_connected",
            Error::PermissionDenied(_) => "permission_denied",
            Error::InvariantViolation { .. } => "invariant_violation",
            Error::RetryExhausted { .. } => "retry_exhausted",
            Error::Cancelled { .. } => "cancelled",
            Error::BulkOperationFailure { .. } => "bulk_operation_failure",
            Error::PlaceholderConflict { .. } => "placeholder_conflict",
            Error::ResourceNotFound { .. } => "not_found",
            Error::InvalidResourceClass(_) => "invalid_resource_class",
            Error::Persistence(_) => "persistence_error",
            Error::Metrics(_) => "metrics_error",
            Error::Io(_) => "io_error",
        }
    }
}

/// Result type alias for the crate
pub type Result<T> = std::result::Result<T, Error>;
