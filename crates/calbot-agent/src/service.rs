//! HTTP surface of the agent.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::{Method, StatusCode, header};
use axum::routing::{get, post};
use axum::{Json, Router};
use calbot_protocol::{HEALTH_OK, RunRequest, RunResponse};
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::agent::Agent;
use crate::error::AgentError;

/// Longest a single `/run` may take, tool calls included.
pub const RUN_TIMEOUT: Duration = Duration::from_secs(120);

/// Builds the agent router.
pub fn create_app(agent: Arc<Agent>) -> Router {
    let cors_layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .allow_origin(AllowOrigin::any());

    Router::new()
        .route("/health", get(health))
        .route("/run", post(run))
        .with_state(agent)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, RUN_TIMEOUT))
                .layer(cors_layer),
        )
}

async fn run(
    State(agent): State<Arc<Agent>>,
    body: Result<Json<RunRequest>, JsonRejection>,
) -> Result<Json<RunResponse>, AgentError> {
    let Json(request) = body.map_err(|e| AgentError::BadRequest(e.body_text()))?;
    if request.prompt.trim().is_empty() {
        return Err(AgentError::BadRequest("prompt must not be empty".to_string()));
    }

    info!(chars = request.prompt.len(), "received prompt");
    let reply = agent.run(&request.prompt).await?;
    Ok(Json(reply))
}

async fn health() -> &'static str {
    HEALTH_OK
}
