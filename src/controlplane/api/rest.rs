//! REST API Handlers
//!
//! Implements the REST API endpoints for teardown, synthetic node candidate
//! registration and node source management. Every `/v1` route expects the
//! caller's session in the `sessionid` header.

use crate::controlplane::CleanupOrchestrator;
use crate::domain::model::{NodeProperties, ResourceClass};
use crate::domain::ports::SessionValidatorRef;
use crate::error::{Error, Result};
use crate::nodes::{HostnameResolver, NodeCandidateSynthesizer, NodeSourceDecommissioner};
use axum::{
    extract::{Json, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Header carrying the caller's session
pub const SESSION_HEADER: &str = "sessionid";

// =============================================================================
// Request/Response Types
// =============================================================================

/// Node candidate registration request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCandidateRequest {
    /// Resource class: byon or edge
    pub resource_class: String,
    pub job_id: String,
    pub node_id: String,
    pub node_name: String,
    pub properties: NodeProperties,
}

/// Resolved host name of a node source
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostnameResponse {
    pub node_source: String,
    pub hostname: String,
}

/// Query of a decommission request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DecommissionQuery {
    #[serde(default)]
    pub preempt: bool,
    /// Remove the node source instead of undeploying it
    #[serde(default)]
    pub remove: bool,
}

/// Decommission result
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecommissionResponse {
    pub node_source: String,
    pub outcome: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// API error response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl From<&Error> for ApiErrorResponse {
    fn from(e: &Error) -> Self {
        Self {
            error: e.code().into(),
            message: e.to_string(),
            details: None,
        }
    }
}

/// HTTP status for an error crossing the API boundary
pub fn status_for(e: &Error) -> StatusCode {
    match e {
        Error::SessionInvalid { .. } => StatusCode::UNAUTHORIZED,
        Error::ResourceNotFound { .. } => StatusCode::NOT_FOUND,
        Error::InvalidResourceClass(_) | Error::Configuration(_) => StatusCode::BAD_REQUEST,
        Error::PermissionDenied(_) => StatusCode::FORBIDDEN,
        Error::NotConnected(_) => StatusCode::SERVICE_UNAVAILABLE,
        Error::InvariantViolation { .. }
        | Error::BulkOperationFailure { .. }
        | Error::PlaceholderConflict { .. } => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(e: Error) -> Response {
    let status = status_for(&e);
    if status.is_server_error() {
        error!("Request failed: {}", e);
    } else {
        warn!("Request rejected: {}", e);
    }
    (status, Json(ApiErrorResponse::from(&e))).into_response()
}

// =============================================================================
// REST Router
// =============================================================================

/// Shared application state
#[derive(Clone)]
pub struct ApiState {
    pub sessions: SessionValidatorRef,
    pub orchestrator: Arc<CleanupOrchestrator>,
    pub synthesizer: Arc<NodeCandidateSynthesizer>,
    pub resolver: Arc<HostnameResolver>,
    pub decommissioner: Arc<NodeSourceDecommissioner>,
}

/// REST API router builder
pub struct RestRouter {
    state: ApiState,
}

impl RestRouter {
    pub fn new(state: ApiState) -> Self {
        Self { state }
    }

    /// Build the Axum router
    pub fn build(self) -> Router {
        Router::new()
            // Teardown endpoints
            .route("/v1/clean", delete(clean_all))
            .route("/v1/clean/clusters", delete(clean_clusters))
            .route("/v1/clean/clouds", delete(clean_clouds))
            .route("/v1/clean/edges", delete(clean_edges))
            .route("/v1/clean/database", delete(clean_database))
            // Synthetic node endpoints
            .route("/v1/candidates", post(create_candidate))
            .route("/v1/nodesources/:name/hostname", get(get_hostname))
            .route("/v1/nodesources/:name", delete(decommission_node_source))
            .route("/health", get(health_check))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state)
    }
}

fn session_from(headers: &HeaderMap) -> Result<String> {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| Error::SessionInvalid {
            session_id: String::new(),
        })
}

/// Extract the session and check that it is active
async fn active_session(state: &ApiState, headers: &HeaderMap) -> Result<String> {
    let session_id = session_from(headers)?;
    if !state.sessions.is_active(&session_id).await? {
        return Err(Error::SessionInvalid { session_id });
    }
    Ok(session_id)
}

// =============================================================================
// Handlers
// =============================================================================

async fn clean_all(State(state): State<ApiState>, headers: HeaderMap) -> Response {
    let session_id = match session_from(&headers) {
        Ok(id) => id,
        Err(e) => return error_response(e),
    };
    match state.orchestrator.clean_all(&session_id).await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => error_response(e),
    }
}

async fn clean_clusters(State(state): State<ApiState>, headers: HeaderMap) -> Response {
    let session_id = match session_from(&headers) {
        Ok(id) => id,
        Err(e) => return error_response(e),
    };
    match state.orchestrator.clean_all_clusters(&session_id).await {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(e) => error_response(e),
    }
}

async fn clean_clouds(State(state): State<ApiState>, headers: HeaderMap) -> Response {
    let session_id = match session_from(&headers) {
        Ok(id) => id,
        Err(e) => return error_response(e),
    };
    match state.orchestrator.clean_all_clouds(&session_id).await {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(e) => error_response(e),
    }
}

async fn clean_edges(State(state): State<ApiState>, headers: HeaderMap) -> Response {
    let session_id = match session_from(&headers) {
        Ok(id) => id,
        Err(e) => return error_response(e),
    };
    match state.orchestrator.clean_all_edges(&session_id).await {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(e) => error_response(e),
    }
}

async fn clean_database(State(state): State<ApiState>, headers: HeaderMap) -> Response {
    let session_id = match session_from(&headers) {
        Ok(id) => id,
        Err(e) => return error_response(e),
    };
    match state.orchestrator.clean_all_database(&session_id).await {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(e) => error_response(e),
    }
}

/// Register the node candidate of a BYON or edge node
async fn create_candidate(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(request): Json<CreateCandidateRequest>,
) -> Response {
    if let Err(e) = active_session(&state, &headers).await {
        return error_response(e);
    }
    let class: ResourceClass = match request.resource_class.parse() {
        Ok(class) => class,
        Err(e) => return error_response(e),
    };
    info!("Registering {} node candidate for {}", class, request.node_name);

    match state
        .synthesizer
        .synthesize(
            &request.properties,
            &request.job_id,
            class,
            &request.node_id,
            &request.node_name,
        )
        .await
    {
        Ok(candidate) => (StatusCode::CREATED, Json(candidate)).into_response(),
        Err(e) => error_response(e),
    }
}

async fn get_hostname(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Path(name): Path<String>,
) -> Response {
    if let Err(e) = active_session(&state, &headers).await {
        return error_response(e);
    }
    match state.resolver.resolve(&name).await {
        Ok(hostname) => (
            StatusCode::OK,
            Json(HostnameResponse {
                node_source: name,
                hostname,
            }),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

async fn decommission_node_source(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Path(name): Path<String>,
    Query(query): Query<DecommissionQuery>,
) -> Response {
    if let Err(e) = active_session(&state, &headers).await {
        return error_response(e);
    }

    let outcome = state
        .decommissioner
        .decommission_outcome(&name, query.preempt, query.remove)
        .await;
    let status = if outcome.is_success() {
        StatusCode::OK
    } else {
        StatusCode::BAD_GATEWAY
    };
    let message = match &outcome {
        crate::nodes::DecommissionOutcome::Failed(message) => Some(message.clone()),
        _ => None,
    };

    (
        status,
        Json(DecommissionResponse {
            node_source: name,
            outcome: outcome.as_str().into(),
            success: outcome.is_success(),
            message,
        }),
    )
        .into_response()
}

/// Health check
async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}
