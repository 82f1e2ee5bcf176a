//! Request handlers for the backend endpoints.

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use calbot_core::{Interval, TimeWindow, dateparse, derive_free_slots, format_utc, parse_range};
use calbot_protocol::{
    AvailabilityQuery, AvailabilityResponse, CreateEventRequest, CreatedEvent, EventDetailsQuery,
    EventDetailsResponse, EventSelection, HEALTH_OK, RunRequest,
};
use calbot_providers::NewEvent;
use chrono::Duration;
use tracing::{debug, info};

use crate::agent_client::contextualize;
use crate::app::AppState;
use crate::error::ApiError;

/// `GET /availability`: free slots in a natural-language range.
pub async fn availability(
    State(state): State<AppState>,
    query: Result<Query<AvailabilityQuery>, QueryRejection>,
) -> Result<Json<AvailabilityResponse>, ApiError> {
    let Query(query) = query?;
    let slot = query.slot_duration()?;
    let window = parse_range(&query.range, state.now())?;

    let busy = state.store.free_busy(window).await?;
    let slots = derive_free_slots(&busy, window.start, window.end, slot);

    info!(
        range = %query.range,
        start = %format_utc(&window.start),
        end = %format_utc(&window.end),
        busy = busy.len(),
        slots = slots.len(),
        "computed availability"
    );
    Ok(Json(AvailabilityResponse { slots }))
}

/// `POST /events`: books an event.
///
/// `start` goes through the date interpreter as is, so "tomorrow at 3pm"
/// keeps its time of day.
pub async fn create_event(
    State(state): State<AppState>,
    body: Result<Json<CreateEventRequest>, JsonRejection>,
) -> Result<Json<CreatedEvent>, ApiError> {
    let Json(request) = body?;
    request.validate()?;

    let start = dateparse::interpret(&request.start, state.now())
        .ok_or_else(|| ApiError::bad_request(format!("could not understand start '{}'", request.start)))?;
    let end = start
        .checked_add_signed(Duration::minutes(request.duration_minutes))
        .ok_or_else(|| ApiError::bad_request(format!("start '{}' is too far in the future", request.start)))?;
    let when = Interval::new(start, end)?;

    let mut event = NewEvent::new(request.title.trim(), when);
    if let Some(description) = request.description.filter(|d| !d.trim().is_empty()) {
        event = event.with_description(description);
    }

    debug!(title = %event.title, start = %format_utc(&start), "booking event");
    let created = state.store.insert_event(event).await?;
    Ok(Json(created))
}

/// `GET /event_details`: events within explicit bounds or a phrase.
pub async fn event_details(
    State(state): State<AppState>,
    query: Result<Query<EventDetailsQuery>, QueryRejection>,
) -> Result<Json<EventDetailsResponse>, ApiError> {
    let Query(query) = query?;
    let window = match query.selection()? {
        EventSelection::Between { start, end } => TimeWindow::parse(start, end)?,
        EventSelection::Range(phrase) => parse_range(phrase, state.now())?,
    };

    let events = state.store.list_events(window).await?;
    info!(
        start = %format_utc(&window.start),
        end = %format_utc(&window.end),
        count = events.len(),
        "listed events"
    );
    Ok(Json(EventDetailsResponse { events }))
}

/// `POST /run`: forwards a prompt to the agent, stamped with the current time.
pub async fn run(
    State(state): State<AppState>,
    body: Result<Json<RunRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Json(request) = body?;
    let prompt = contextualize(&request.prompt, state.now());
    let reply = state.agent.run(prompt).await?;
    Ok(Json(reply))
}

pub async fn health() -> &'static str {
    HEALTH_OK
}
