//! Startup phase: build the calendar store and prove it works before the
//! listener binds.

use std::sync::Arc;

use calbot_providers::google::GoogleCalendarStore;
use calbot_providers::{CalendarStore, MemoryStore};
use tracing::info;

use crate::config::StoreConfig;
use crate::error::ServerResult;

/// Builds the configured store and checks that its calendar is reachable.
///
/// Any failure here is fatal for the backend.
pub async fn connect_store(config: &StoreConfig) -> ServerResult<Arc<dyn CalendarStore>> {
    let store: Arc<dyn CalendarStore> = match config {
        StoreConfig::Google(google) => Arc::new(GoogleCalendarStore::from_config(google)?),
        StoreConfig::Memory { calendar_id } => Arc::new(MemoryStore::new(calendar_id.clone())),
    };
    verify_store(store).await
}

/// Checks calendar access on an already built store.
pub async fn verify_store(store: Arc<dyn CalendarStore>) -> ServerResult<Arc<dyn CalendarStore>> {
    let calendar = store.verify_access().await?;
    info!(
        store = store.name(),
        calendar_id = %calendar.id,
        summary = %calendar.summary,
        time_zone = calendar.time_zone.as_deref().unwrap_or("unknown"),
        "calendar is accessible"
    );
    Ok(store)
}
