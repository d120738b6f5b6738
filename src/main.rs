//! Resource Lifecycle Service
//!
//! Serves the teardown orchestrator and the synthetic node operations over
//! REST, next to health and Prometheus metrics endpoints. This binary wires
//! the in-process standalone adapters behind the domain ports.

use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use resource_lifecycle::{
    ApiServer, ApiServerConfig, ApiState, CleanupOrchestrator, DummyCloudRegistry, Error,
    HostnameResolver, InMemoryResourceManager, LifecycleMetrics, MemoryPersistence,
    NodeCandidateSynthesizer, NodeSourceDecommissioner, ResolverConfig, Result,
    StaticSessionValidator, StoreBackedDomainServices,
};

// =============================================================================
// CLI Arguments
// =============================================================================

/// Resource Lifecycle - cascading teardown and BYON/edge node bookkeeping
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// REST API bind address
    #[arg(long, env = "API_ADDR", default_value = "0.0.0.0:8090")]
    api_addr: String,

    /// Health server bind address
    #[arg(long, env = "HEALTH_ADDR", default_value = "0.0.0.0:8081")]
    health_addr: String,

    /// Metrics server bind address
    #[arg(long, env = "METRICS_ADDR", default_value = "0.0.0.0:8080")]
    metrics_addr: String,

    /// Maximum hostname polls per node source
    #[arg(long, env = "RESOLVER_MAX_ATTEMPTS", default_value = "10")]
    resolver_max_attempts: u32,

    /// Seconds between two hostname polls
    #[arg(long, env = "RESOLVER_INTERVAL", default_value = "20")]
    resolver_interval_secs: u64,

    /// Accepted session tokens (comma separated); any non-empty token if unset
    #[arg(long, env = "SESSION_TOKENS", value_delimiter = ',')]
    session_tokens: Vec<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args);

    info!("Starting Resource Lifecycle service");
    info!("  Version: {}", resource_lifecycle::VERSION);
    info!("  REST API: {}", args.api_addr);
    info!(
        "  Hostname resolution: {} attempts every {}s",
        args.resolver_max_attempts, args.resolver_interval_secs
    );

    let resolver_config = ResolverConfig {
        max_attempts: args.resolver_max_attempts,
        interval: Duration::from_secs(args.resolver_interval_secs),
    };

    let metrics = LifecycleMetrics::new()?;

    // Standalone adapters
    let store = Arc::new(MemoryPersistence::new());
    let resource_manager = Arc::new(InMemoryResourceManager::new());
    let services = Arc::new(StoreBackedDomainServices::new(
        store.clone(),
        resource_manager.clone(),
    ));
    let sessions: resource_lifecycle::domain::SessionValidatorRef =
        if args.session_tokens.is_empty() {
            Arc::new(StaticSessionValidator::allow_any())
        } else {
            info!("  Accepting {} session tokens", args.session_tokens.len());
            Arc::new(StaticSessionValidator::new(args.session_tokens.clone()))
        };

    let orchestrator = CleanupOrchestrator::new(
        sessions.clone(),
        store.clone(),
        services.clone(),
        services.clone(),
        services,
    )
    .with_metrics(metrics.clone());

    let synthesizer = NodeCandidateSynthesizer::new(
        Arc::new(DummyCloudRegistry::new(store.clone())),
        store,
    )
    .with_metrics(metrics.clone());

    let resolver = HostnameResolver::with_config(resource_manager.clone(), resolver_config)?
        .with_metrics(metrics.clone());

    let state = ApiState {
        sessions,
        orchestrator: Arc::new(orchestrator),
        synthesizer: Arc::new(synthesizer),
        resolver: Arc::new(resolver),
        decommissioner: Arc::new(NodeSourceDecommissioner::new(resource_manager)),
    };

    // Start health server
    let health_addr = args.health_addr.clone();
    tokio::spawn(async move {
        if let Err(e) = run_health_server(&health_addr).await {
            error!("Health server error: {}", e);
        }
    });

    // Start metrics server
    let metrics_addr = args.metrics_addr.clone();
    tokio::spawn(async move {
        if let Err(e) = run_metrics_server(&metrics_addr, metrics).await {
            error!("Metrics server error: {}", e);
        }
    });

    let api_config = ApiServerConfig {
        rest_addr: args.api_addr.parse().map_err(|e| {
            Error::Configuration(format!("Invalid REST API address: {}", e))
        })?,
        ..Default::default()
    };

    let api_server = ApiServer::new(api_config, state);
    api_server.run().await?;

    info!("Resource Lifecycle service shutdown complete");
    Ok(())
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let directives = format!("{},hyper=warn,tower=warn,axum=info", level);
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&directives))
        .unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .init();
    }
}

// =============================================================================
// Health Server
// =============================================================================

fn plain_response(
    status: hyper::StatusCode,
    body: impl Into<hyper::Body>,
) -> hyper::Response<hyper::Body> {
    let mut response = hyper::Response::new(body.into());
    *response.status_mut() = status;
    response
}

async fn run_health_server(addr: &str) -> Result<()> {
    use hyper::service::{make_service_fn, service_fn};
    use hyper::{Body, Request, Server, StatusCode};

    let make_svc = make_service_fn(|_conn| async {
        Ok::<_, std::convert::Infallible>(service_fn(|req: Request<Body>| async move {
            let response = match req.uri().path() {
                "/healthz" | "/livez" | "/readyz" => plain_response(StatusCode::OK, "ok"),
                _ => plain_response(StatusCode::NOT_FOUND, "not found"),
            };
            Ok::<_, std::convert::Infallible>(response)
        }))
    });

    let addr: SocketAddr = addr.parse().map_err(|e| {
        Error::Configuration(format!("Invalid health server address: {}", e))
    })?;

    info!("Health server listening on {}", addr);
    Server::bind(&addr)
        .serve(make_svc)
        .await
        .map_err(|e| Error::Internal(format!("Health server error: {}", e)))?;

    Ok(())
}

// =============================================================================
// Metrics Server
// =============================================================================

async fn run_metrics_server(addr: &str, metrics: LifecycleMetrics) -> Result<()> {
    use hyper::header::{HeaderValue, CONTENT_TYPE};
    use hyper::service::{make_service_fn, service_fn};
    use hyper::{Body, Request, Server, StatusCode};

    let make_svc = make_service_fn(move |_conn| {
        let metrics = metrics.clone();
        async move {
            Ok::<_, std::convert::Infallible>(service_fn(move |req: Request<Body>| {
                let metrics = metrics.clone();
                async move {
                    let response = match req.uri().path() {
                        "/metrics" => match metrics.encode() {
                            Ok((content_type, buffer)) => {
                                let mut response = plain_response(StatusCode::OK, buffer);
                                if let Ok(value) = HeaderValue::from_str(&content_type) {
                                    response.headers_mut().insert(CONTENT_TYPE, value);
                                }
                                response
                            }
                            Err(e) => {
                                error!("Failed to encode metrics: {}", e);
                                plain_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
                            }
                        },
                        _ => plain_response(StatusCode::NOT_FOUND, "not found"),
                    };
                    Ok::<_, std::convert::Infallible>(response)
                }
            }))
        }
    });

    let addr: SocketAddr = addr.parse().map_err(|e| {
        Error::Configuration(format!("Invalid metrics server address: {}", e))
    })?;

    info!("Metrics server listening on {}", addr);
    Server::bind(&addr)
        .serve(make_svc)
        .await
        .map_err(|e| Error::Internal(format!("Metrics server error: {}", e)))?;

    Ok(())
}
