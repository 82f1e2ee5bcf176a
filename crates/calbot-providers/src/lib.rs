//! Calendar stores for calbot.
//!
//! - [`CalendarStore`]: the trait the backend talks to
//! - [`google::GoogleCalendarStore`]: Google Calendar through a service account
//! - [`MemoryStore`] and [`ErrorStore`]: in-process stores for tests and demos
//! - [`ProviderError`]: error type shared by every store

pub mod error;
pub mod google;
pub mod store;

pub use error::{ProviderError, ProviderErrorCode, ProviderResult};
pub use store::{BoxFuture, CalendarInfo, CalendarStore, ErrorStore, MemoryStore, NewEvent};
