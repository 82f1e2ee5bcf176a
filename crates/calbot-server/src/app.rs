//! Router construction.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::http::{Method, StatusCode, header};
use axum::routing::{get, post};
use calbot_providers::CalendarStore;
use chrono::{DateTime, Utc};
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::agent_client::AgentClient;
use crate::handlers;

/// Source of "now" for range and date interpretation.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CalendarStore>,
    pub agent: AgentClient,
    clock: Clock,
}

impl AppState {
    pub fn new(store: Arc<dyn CalendarStore>, agent: AgentClient) -> Self {
        Self {
            store,
            agent,
            clock: Arc::new(Utc::now),
        }
    }

    /// Pins the clock, for deterministic tests.
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }
}

/// Builds the backend router.
pub fn create_app(state: AppState, request_timeout: Duration) -> Router {
    let cors_layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_origin(AllowOrigin::any());

    Router::new()
        .route("/health", get(handlers::health))
        .route("/availability", get(handlers::availability))
        .route("/events", post(handlers::create_event))
        .route("/event_details", get(handlers::event_details))
        .route("/run", post(handlers::run))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    request_timeout,
                ))
                .layer(cors_layer),
        )
}
