//! Google Calendar store.
//!
//! Authenticates as a service account (RS256 JWT assertion exchanged for an
//! access token) and talks to the Calendar API v3 over HTTPS.
//!
//! ```ignore
//! use calbot_providers::google::{GoogleCalendarStore, GoogleConfig};
//!
//! let config = GoogleConfig::new("team@example.com", "/etc/secrets/calendar-bot-sa.json");
//! let store = GoogleCalendarStore::from_config(&config)?;
//! store.verify_access().await?;
//! ```

mod auth;
mod client;
mod config;
mod store;

pub use auth::{
    AccessTokenSource, DEFAULT_TOKEN_URI, REFRESH_SKEW_SECS, ServiceAccountKey,
    ServiceAccountTokenSource, StaticToken,
};
pub use client::{ApiCalendar, ApiEvent, ApiEventInsert, ApiEventTime, ApiTimePeriod, GoogleCalendarClient};
pub use config::{GoogleConfig, first_existing};
pub use store::GoogleCalendarStore;
