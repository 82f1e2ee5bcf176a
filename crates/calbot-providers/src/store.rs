//! The [`CalendarStore`] trait and two small in-process stores.
//!
//! A store answers the three questions the backend asks of a calendar:
//! when is it busy, add this event, and what events fall in this window.

use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;

use calbot_core::{Interval, TimeWindow, format_utc};
use calbot_protocol::{CreatedEvent, EventDetails, EventTime};
use chrono::{DateTime, Utc};

use crate::error::{ProviderError, ProviderResult};

/// A boxed future so that `dyn CalendarStore` stays object safe.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Metadata returned by [`CalendarStore::verify_access`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarInfo {
    pub id: String,
    pub summary: String,
    /// IANA time zone of the calendar, if reported.
    pub time_zone: Option<String>,
}

impl CalendarInfo {
    pub fn new(id: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            summary: summary.into(),
            time_zone: None,
        }
    }

    #[must_use]
    pub fn with_time_zone(mut self, tz: impl Into<String>) -> Self {
        self.time_zone = Some(tz.into());
        self
    }
}

/// A validated event to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
    pub title: String,
    pub when: Interval,
    pub description: Option<String>,
}

impl NewEvent {
    pub fn new(title: impl Into<String>, when: Interval) -> Self {
        Self {
            title: title.into(),
            when,
            description: None,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.when.start()
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.when.end()
    }
}

/// Access to a single calendar.
///
/// Implementations must be `Send + Sync`; the backend shares one instance
/// across all requests behind an `Arc`.
pub trait CalendarStore: Send + Sync {
    /// Short name used in logs and error messages, e.g. "google".
    fn name(&self) -> &str;

    /// Checks that the configured calendar exists and is readable.
    fn verify_access(&self) -> BoxFuture<'_, ProviderResult<CalendarInfo>>;

    /// Busy periods overlapping `window`, in any order.
    fn free_busy(&self, window: TimeWindow) -> BoxFuture<'_, ProviderResult<Vec<Interval>>>;

    /// Inserts a timed event.
    fn insert_event(&self, event: NewEvent) -> BoxFuture<'_, ProviderResult<CreatedEvent>>;

    /// Events in `window`, recurring events expanded, ordered by start time.
    fn list_events(&self, window: TimeWindow) -> BoxFuture<'_, ProviderResult<Vec<EventDetails>>>;
}

/// A store that fails every call with the same error.
///
/// Useful for exercising error paths of callers.
#[derive(Debug)]
pub struct ErrorStore {
    name: String,
    error: ProviderError,
}

impl ErrorStore {
    pub fn new(name: impl Into<String>, error: ProviderError) -> Self {
        Self {
            name: name.into(),
            error,
        }
    }

    fn fail<T: Send + 'static>(&self) -> BoxFuture<'_, ProviderResult<T>> {
        let error = ProviderError::new(self.error.code(), self.error.message()).with_provider(&self.name);
        Box::pin(async move { Err(error) })
    }
}

impl CalendarStore for ErrorStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn verify_access(&self) -> BoxFuture<'_, ProviderResult<CalendarInfo>> {
        self.fail()
    }

    fn free_busy(&self, _window: TimeWindow) -> BoxFuture<'_, ProviderResult<Vec<Interval>>> {
        self.fail()
    }

    fn insert_event(&self, _event: NewEvent) -> BoxFuture<'_, ProviderResult<CreatedEvent>> {
        self.fail()
    }

    fn list_events(&self, _window: TimeWindow) -> BoxFuture<'_, ProviderResult<Vec<EventDetails>>> {
        self.fail()
    }
}

#[derive(Debug, Clone)]
struct StoredEvent {
    id: String,
    summary: String,
    when: Interval,
    description: String,
}

/// A calendar kept in memory.
///
/// Inserted events count as busy time. Used by tests and for running the
/// services without Google credentials.
#[derive(Debug)]
pub struct MemoryStore {
    calendar_id: String,
    events: Mutex<Vec<StoredEvent>>,
}

impl MemoryStore {
    pub fn new(calendar_id: impl Into<String>) -> Self {
        Self {
            calendar_id: calendar_id.into(),
            events: Mutex::new(Vec::new()),
        }
    }

    /// Adds an existing event, returning its id.
    pub fn add(&self, summary: impl Into<String>, when: Interval) -> String {
        self.push(summary.into(), when, String::new())
    }

    fn push(&self, summary: String, when: Interval, description: String) -> String {
        let mut events = self.events.lock().unwrap_or_else(|e| e.into_inner());
        let id = format!("mem-{}", events.len() + 1);
        events.push(StoredEvent {
            id: id.clone(),
            summary,
            when,
            description,
        });
        id
    }

    fn overlapping(&self, window: &TimeWindow) -> Vec<StoredEvent> {
        let events = self.events.lock().unwrap_or_else(|e| e.into_inner());
        let mut matching: Vec<StoredEvent> = events
            .iter()
            .filter(|e| e.when.start() < window.end && e.when.end() > window.start)
            .cloned()
            .collect();
        matching.sort_by_key(|e| e.when.start());
        matching
    }
}

impl CalendarStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn verify_access(&self) -> BoxFuture<'_, ProviderResult<CalendarInfo>> {
        let info = CalendarInfo::new(&self.calendar_id, "In-memory calendar").with_time_zone("UTC");
        Box::pin(async move { Ok(info) })
    }

    fn free_busy(&self, window: TimeWindow) -> BoxFuture<'_, ProviderResult<Vec<Interval>>> {
        let busy = self.overlapping(&window).into_iter().map(|e| e.when).collect();
        Box::pin(async move { Ok(busy) })
    }

    fn insert_event(&self, event: NewEvent) -> BoxFuture<'_, ProviderResult<CreatedEvent>> {
        let id = self.push(
            event.title.clone(),
            event.when,
            event.description.clone().unwrap_or_default(),
        );
        let created = CreatedEvent {
            html_link: format!("memory://{}/{id}", self.calendar_id),
            id,
            summary: event.title,
            start: EventTime::date_time(format_utc(&event.when.start())),
            end: EventTime::date_time(format_utc(&event.when.end())),
        };
        Box::pin(async move { Ok(created) })
    }

    fn list_events(&self, window: TimeWindow) -> BoxFuture<'_, ProviderResult<Vec<EventDetails>>> {
        let details = self
            .overlapping(&window)
            .into_iter()
            .map(|e| EventDetails {
                summary: e.summary,
                start: EventTime::date_time(format_utc(&e.when.start())),
                end: EventTime::date_time(format_utc(&e.when.end())),
                description: e.description,
            })
            .collect();
        Box::pin(async move { Ok(details) })
    }
}
