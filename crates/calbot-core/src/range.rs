//! Natural-language query ranges.
//!
//! [`parse_range`] turns phrases like "next week" or "tomorrow" into a
//! day-aligned UTC [`TimeWindow`]. The start comes from the date
//! interpreter (falling back to today when the phrase is not understood);
//! the length is picked from keywords in the phrase.

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tracing::{debug, warn};

use crate::dateparse;
use crate::time::{TimeWindow, format_utc, midnight};

/// Days covered by a range whose phrase mentions "week".
pub const WEEK_SPAN_DAYS: i64 = 7;
/// Days covered by a range whose phrase mentions "month".
pub const MONTH_SPAN_DAYS: i64 = 30;
/// Days covered by any other range.
pub const DEFAULT_SPAN_DAYS: i64 = 1;

/// Errors from [`parse_range`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeError {
    #[error("range '{0}' is outside the supported calendar")]
    OutOfRange(String),
}

/// Resolves `phrase` into a `[start, end)` window, both at 00:00:00 UTC.
///
/// The span is 7 days when the phrase contains "week", otherwise 30 days
/// when it contains "month", otherwise 1 day. Matching is a
/// case-insensitive substring test, so "weekend" also counts as a week.
/// Any time of day in the phrase is discarded. A blank phrase is treated
/// like any other unrecognized one and yields today.
pub fn parse_range(phrase: &str, now: DateTime<Utc>) -> Result<TimeWindow, RangeError> {
    let anchor = match dateparse::interpret(phrase, now) {
        Some(dt) => dt,
        None => {
            warn!(phrase, "could not interpret range, falling back to today");
            now
        }
    };
    let start = midnight(anchor);

    let lowered = phrase.to_lowercase();
    let days = span_days(&lowered);
    let end = Duration::try_days(days)
        .and_then(|span| anchor.checked_add_signed(span))
        .map(midnight)
        .ok_or_else(|| RangeError::OutOfRange(phrase.to_string()))?;

    debug!(phrase, start = %format_utc(&start), end = %format_utc(&end), "parsed range");
    Ok(TimeWindow::new(start, end))
}

/// Formats a window as two `Z`-suffixed ISO8601 strings.
pub fn format_range(window: &TimeWindow) -> (String, String) {
    window.to_rfc3339_pair()
}

fn span_days(lowered: &str) -> i64 {
    if lowered.contains("week") {
        WEEK_SPAN_DAYS
    } else if lowered.contains("month") {
        MONTH_SPAN_DAYS
    } else {
        DEFAULT_SPAN_DAYS
    }
}
