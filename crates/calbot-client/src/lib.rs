//! Terminal client for calbot.
//!
//! Talks to the calendar backend over HTTP: an interactive chat that
//! relays prompts to the assistant, plus one-shot commands for
//! availability, events and bookings.

pub mod api;
pub mod chat;
pub mod cli;
pub mod commands;
pub mod error;
pub mod render;

pub use api::BackendClient;
pub use chat::{ChatSession, run_chat};
pub use error::{ClientError, ClientResult};
