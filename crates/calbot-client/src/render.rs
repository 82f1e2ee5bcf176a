//! Plain-text rendering of backend responses.

use calbot_core::Interval;
use calbot_protocol::{CreatedEvent, EventDetails, EventTime};
use chrono::{DateTime, Utc};

/// `HH:MM` of a UTC instant.
pub fn clock(dt: &DateTime<Utc>) -> String {
    dt.format("%H:%M").to_string()
}

/// Button text for a bookable slot.
pub fn slot_label(slot: &Interval) -> String {
    format!("Book {}–{}", clock(&slot.start()), clock(&slot.end()))
}

/// One line per slot, prefixed with its date.
pub fn slots(slots: &[Interval]) -> String {
    if slots.is_empty() {
        return "No free slots.".to_string();
    }
    slots
        .iter()
        .map(|s| {
            format!(
                "{} {}–{}",
                s.start().format("%Y-%m-%d"),
                clock(&s.start()),
                clock(&s.end())
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn event_time(time: &EventTime) -> &str {
    time.display_value().unwrap_or("?")
}

pub fn events(events: &[EventDetails]) -> String {
    if events.is_empty() {
        return "No events.".to_string();
    }
    let mut out = Vec::with_capacity(events.len());
    for event in events {
        let summary = if event.summary.is_empty() {
            "(no title)"
        } else {
            &event.summary
        };
        let mut line = format!(
            "{} → {}  {}",
            event_time(&event.start),
            event_time(&event.end),
            summary
        );
        if !event.description.is_empty() {
            line.push_str("\n    ");
            line.push_str(&event.description);
        }
        out.push(line);
    }
    out.join("\n")
}

pub fn created(event: &CreatedEvent) -> String {
    let mut text = format!(
        "Created \"{}\" {} → {}",
        event.summary,
        event_time(&event.start),
        event_time(&event.end)
    );
    if !event.html_link.is_empty() {
        text.push('\n');
        text.push_str(&event.html_link);
    }
    text
}
