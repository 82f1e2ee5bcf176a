//! HTTP wire types for calbot.
//!
//! The backend, the agent and the chat client exchange plain JSON over
//! HTTP. Every body and query string they share is defined here so the
//! three binaries cannot drift apart.
//!
//! # Endpoints
//!
//! | Route | Request | Response |
//! |-------|---------|----------|
//! | `GET /availability` | [`AvailabilityQuery`] | [`AvailabilityResponse`] |
//! | `POST /events` | [`CreateEventRequest`] | [`CreatedEvent`] |
//! | `GET /event_details` | [`EventDetailsQuery`] | [`EventDetailsResponse`] |
//! | `POST /run` | [`RunRequest`] | [`RunResponse`] |
//! | `GET /health` | | `OK` |
//!
//! Failures are reported as [`ErrorBody`] with a 4xx or 5xx status.

mod error;
mod types;

pub use error::ValidationError;
pub use types::{
    AvailabilityQuery, AvailabilityResponse, CreateEventRequest, CreatedEvent, ErrorBody,
    EventDetails, EventDetailsQuery, EventDetailsResponse, EventSelection, EventTime, RunRequest,
    RunResponse,
};

/// Longest event that can be booked, in minutes.
pub const MAX_EVENT_MINUTES: i64 = 24 * 60;

/// Body returned by `GET /health`.
pub const HEALTH_OK: &str = "OK";
