//! Lifecycle Metrics
//!
//! Prometheus counters for teardown stages, host name resolution and
//! candidate synthesis, kept in a crate-owned registry and exposed by the
//! metrics server.

use crate::controlplane::outcome::StageOutcome;
use crate::domain::model::ResourceClass;
use crate::error::Result;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

/// Handle to the lifecycle counters; cheap to clone
#[derive(Clone)]
pub struct LifecycleMetrics {
    registry: Registry,
    cleanup_stages: IntCounterVec,
    resolution_attempts: IntCounter,
    candidates: IntCounterVec,
}

impl LifecycleMetrics {
    /// Create the counters and register them in a fresh registry
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let cleanup_stages = IntCounterVec::new(
            Opts::new(
                "lifecycle_cleanup_stages_total",
                "Cleanup stages run, by stage and result",
            ),
            &["stage", "result"],
        )?;
        let resolution_attempts = IntCounter::new(
            "lifecycle_hostname_poll_attempts_total",
            "Resource manager polls made while resolving node host names",
        )?;
        let candidates = IntCounterVec::new(
            Opts::new(
                "lifecycle_synthesized_candidates_total",
                "Node candidates synthesized, by resource class",
            ),
            &["class"],
        )?;

        registry.register(Box::new(cleanup_stages.clone()))?;
        registry.register(Box::new(resolution_attempts.clone()))?;
        registry.register(Box::new(candidates.clone()))?;

        Ok(Self {
            registry,
            cleanup_stages,
            resolution_attempts,
            candidates,
        })
    }

    pub fn record_stage(&self, outcome: &StageOutcome) {
        let result = if outcome.is_success() { "success" } else { "failure" };
        self.cleanup_stages
            .with_label_values(&[outcome.stage.as_str(), result])
            .inc();
    }

    #[inline]
    pub fn record_resolution_attempt(&self) {
        self.resolution_attempts.inc();
    }

    pub fn record_candidate(&self, class: ResourceClass) {
        self.candidates.with_label_values(&[class.as_str()]).inc();
    }

    /// Number of stage runs recorded for `stage` with `result`
    pub fn stage_count(&self, stage: &str, result: &str) -> u64 {
        self.cleanup_stages.with_label_values(&[stage, result]).get()
    }

    pub fn resolution_attempts(&self) -> u64 {
        self.resolution_attempts.get()
    }

    /// Render all counters in the Prometheus text format
    pub fn encode(&self) -> Result<(String, Vec<u8>)> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok((encoder.format_type().to_string(), buffer))
    }
}
