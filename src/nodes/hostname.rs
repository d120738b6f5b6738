//! Node Source Hostname Resolution
//!
//! A BYON or edge node source hosts exactly one node, but that node only
//! reports its host name once it has finished starting. The resolver polls
//! the resource manager until the host name shows up, with a bounded number
//! of attempts separated by a fixed interval.

use crate::controlplane::metrics::LifecycleMetrics;
use crate::domain::ports::ResourceManagerRef;
use crate::error::{Error, Result};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Default number of polls before giving up
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Default wait between two polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(20);

// =============================================================================
// Configuration
// =============================================================================

/// Polling bounds of the resolver
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Maximum number of polls
    pub max_attempts: u32,
    /// Wait between two polls
    pub interval: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl ResolverConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(Error::Configuration(
                "hostname resolution needs at least one attempt".into(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Poll Outcome
// =============================================================================

/// Why a poll did not yield a host name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingReason {
    /// The node source is not deployed yet
    NotDeployed,
    /// The node source has no node yet
    NoNodes,
    /// The node exists but has no host name; carries its current state
    Initializing { state: String },
    /// The resource manager could not be queried
    GatewayError(String),
}

impl std::fmt::Display for PendingReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PendingReason::NotDeployed => write!(f, "node source not deployed"),
            PendingReason::NoNodes => write!(f, "node source has no nodes"),
            PendingReason::Initializing { state } => {
                write!(f, "node is in {} state, host name is empty", state)
            }
            PendingReason::GatewayError(e) => write!(f, "resource manager error: {}", e),
        }
    }
}

/// Result of a single poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// The node reported its host name
    Ready(String),
    /// Nothing usable yet, poll again
    Pending(PendingReason),
    /// The node source lists more than one node
    Violation { count: usize },
}

// =============================================================================
// Hostname Resolver
// =============================================================================

/// Resolves the host name of single-node node sources
pub struct HostnameResolver {
    gateway: ResourceManagerRef,
    config: ResolverConfig,
    metrics: Option<LifecycleMetrics>,
}

impl HostnameResolver {
    pub fn new(gateway: ResourceManagerRef) -> Self {
        Self {
            gateway,
            config: ResolverConfig::default(),
            metrics: None,
        }
    }

    /// Create a resolver with custom polling bounds, rejecting invalid ones
    pub fn with_config(gateway: ResourceManagerRef, config: ResolverConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            gateway,
            config,
            metrics: None,
        })
    }

    pub fn with_metrics(mut self, metrics: LifecycleMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Query the resource manager once and classify what it reports
    pub async fn poll_once(&self, pool: &str) -> PollOutcome {
        let deployed = match self.gateway.deployed_pool_names().await {
            Ok(names) => names,
            Err(e) => return PollOutcome::Pending(PendingReason::GatewayError(e.to_string())),
        };
        if !deployed.contains(pool) {
            return PollOutcome::Pending(PendingReason::NotDeployed);
        }

        let hostnames = match self.gateway.hostnames_of(pool).await {
            Ok(names) => names,
            Err(e) => return PollOutcome::Pending(PendingReason::GatewayError(e.to_string())),
        };

        match hostnames.as_slice() {
            [] => PollOutcome::Pending(PendingReason::NoNodes),
            [hostname] if hostname.is_empty() => {
                let state = match self.gateway.states_of(pool).await {
                    Ok(states) => states.into_iter().next().unwrap_or_else(|| "unknown".into()),
                    Err(e) => {
                        debug!("Could not fetch node states of {}: {}", pool, e);
                        "unknown".into()
                    }
                };
                PollOutcome::Pending(PendingReason::Initializing { state })
            }
            [hostname] => PollOutcome::Ready(hostname.clone()),
            many => PollOutcome::Violation { count: many.len() },
        }
    }

    /// Resolve the host name of `pool`
    pub async fn resolve(&self, pool: &str) -> Result<String> {
        self.resolve_with_cancel(pool, &CancellationToken::new()).await
    }

    /// Resolve the host name of `pool`, giving up early when `cancel` fires.
    ///
    /// The wait between polls suspends only the calling task.
    pub async fn resolve_with_cancel(
        &self,
        pool: &str,
        cancel: &CancellationToken,
    ) -> Result<String> {
        info!("Getting the host name of node source {}", pool);
        let max_attempts = self.config.max_attempts;

        for attempt in 1..=max_attempts {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled { pool: pool.into() });
            }
            if let Some(metrics) = &self.metrics {
                metrics.record_resolution_attempt();
            }

            match self.poll_once(pool).await {
                PollOutcome::Ready(hostname) => {
                    info!(
                        "Node source {} resolved to {} after {} attempt(s)",
                        pool, hostname, attempt
                    );
                    return Ok(hostname);
                }
                PollOutcome::Violation { count } => {
                    error!("Node source {} has {} nodes, expected one", pool, count);
                    return Err(Error::InvariantViolation {
                        pool: pool.into(),
                        count,
                    });
                }
                PollOutcome::Pending(reason) => {
                    warn!(
                        "Node source {} not ready (attempt {}/{}): {}",
                        pool, attempt, max_attempts, reason
                    );
                }
            }

            if attempt < max_attempts {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        warn!("Host name resolution of {} cancelled", pool);
                        return Err(Error::Cancelled { pool: pool.into() });
                    }
                    _ = tokio::time::sleep(self.config.interval) => {}
                }
            }
        }

        error!(
            "The host name of {} is not retrieved after {} attempts",
            pool, max_attempts
        );
        Err(Error::RetryExhausted {
            pool: pool.into(),
            attempts: max_attempts,
        })
    }
}
