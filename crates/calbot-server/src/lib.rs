//! Calendar backend for calbot.
//!
//! Serves availability, booking and event lookup over HTTP on top of a
//! [`CalendarStore`](calbot_providers::CalendarStore), and relays chat
//! prompts to the agent service:
//!
//! | Method | Path             | Handler                        |
//! |--------|------------------|--------------------------------|
//! | GET    | `/availability`  | [`handlers::availability`]     |
//! | POST   | `/events`        | [`handlers::create_event`]     |
//! | GET    | `/event_details` | [`handlers::event_details`]    |
//! | POST   | `/run`           | [`handlers::run`]              |
//! | GET    | `/health`        | [`handlers::health`]           |

pub mod agent_client;
pub mod app;
pub mod config;
pub mod error;
pub mod handlers;
pub mod startup;

pub use agent_client::{AgentClient, contextualize};
pub use app::{AppState, Clock, create_app};
pub use config::{BackendArgs, ServerConfig, StoreConfig, StoreKind};
pub use error::{ApiError, ServerError, ServerResult};
pub use startup::{connect_store, verify_store};
