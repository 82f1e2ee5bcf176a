//! Time types for availability queries.
//!
//! This module provides [`Interval`] for busy periods and free slots, and
//! [`TimeWindow`] for defining query ranges. All values are UTC and are
//! rendered on the wire as ISO8601 with a literal `Z` suffix.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when building time values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntervalError {
    /// The interval does not satisfy `start < end`.
    #[error("interval start {start} must be before end {end}")]
    NotIncreasing { start: String, end: String },

    /// The window does not satisfy `start <= end`.
    #[error("window start {start} is after end {end}")]
    Inverted { start: String, end: String },

    /// A timestamp could not be parsed as RFC3339.
    #[error("invalid timestamp '{value}': {reason}")]
    InvalidTimestamp { value: String, reason: String },
}

/// Formats a UTC timestamp as ISO8601 with a `Z` suffix.
///
/// Sub-second precision is only emitted when present.
pub fn format_utc(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Parses an RFC3339 timestamp (any offset) into UTC.
pub fn parse_utc(value: &str) -> Result<DateTime<Utc>, IntervalError> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| IntervalError::InvalidTimestamp {
            value: value.to_string(),
            reason: e.to_string(),
        })
}

/// Truncates a timestamp to 00:00:00 UTC of the same day.
pub fn midnight(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.date_naive().and_time(NaiveTime::MIN).and_utc()
}

/// Returns 00:00:00 UTC of the given date.
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Serde adapter that writes `DateTime<Utc>` with a `Z` suffix and accepts
/// any RFC3339 offset on input.
pub mod utc_z {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_utc(dt))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_utc(&raw).map_err(serde::de::Error::custom)
    }
}

/// A half-open time range `[start, end)` with `start < end`.
///
/// Used both for busy periods reported by the calendar store and for the
/// free slots handed back to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "IntervalRepr")]
pub struct Interval {
    /// Start of the interval (inclusive).
    #[serde(with = "utc_z")]
    start: DateTime<Utc>,
    /// End of the interval (exclusive).
    #[serde(with = "utc_z")]
    end: DateTime<Utc>,
}

impl Interval {
    /// Creates a new interval, rejecting empty or inverted ranges.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, IntervalError> {
        if start >= end {
            return Err(IntervalError::NotIncreasing {
                start: format_utc(&start),
                end: format_utc(&end),
            });
        }
        Ok(Self { start, end })
    }

    /// Parses an interval from two RFC3339 strings.
    pub fn parse(start: &str, end: &str) -> Result<Self, IntervalError> {
        Self::new(parse_utc(start)?, parse_utc(end)?)
    }

    /// Start of the interval.
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// End of the interval.
    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Length of the interval.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Returns true if the two intervals share any instant.
    ///
    /// Touching intervals (`a.end == b.start`) do not overlap.
    pub fn overlaps(&self, other: &Interval) -> bool {
        !(self.end <= other.start || self.start >= other.end)
    }
}

#[derive(Deserialize)]
struct IntervalRepr {
    #[serde(with = "utc_z")]
    start: DateTime<Utc>,
    #[serde(with = "utc_z")]
    end: DateTime<Utc>,
}

impl TryFrom<IntervalRepr> for Interval {
    type Error = IntervalError;

    fn try_from(repr: IntervalRepr) -> Result<Self, Self::Error> {
        Interval::new(repr.start, repr.end)
    }
}

/// A time window for availability and event queries.
///
/// Represents a half-open interval `[start, end)` in UTC. Unlike
/// [`Interval`], a window may be empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Start of the window (inclusive).
    #[serde(with = "utc_z")]
    pub start: DateTime<Utc>,
    /// End of the window (exclusive).
    #[serde(with = "utc_z")]
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Creates a new time window.
    ///
    /// # Panics
    ///
    /// Panics if `start` is after `end`. Use [`TimeWindow::try_new`] for
    /// untrusted input.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        assert!(start <= end, "TimeWindow start must be <= end");
        Self { start, end }
    }

    /// Creates a new time window, returning an error if `start > end`.
    pub fn try_new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, IntervalError> {
        if start > end {
            return Err(IntervalError::Inverted {
                start: format_utc(&start),
                end: format_utc(&end),
            });
        }
        Ok(Self { start, end })
    }

    /// Parses a window from two RFC3339 strings.
    pub fn parse(start: &str, end: &str) -> Result<Self, IntervalError> {
        Self::try_new(parse_utc(start)?, parse_utc(end)?)
    }

    /// Creates a time window from a start time and duration.
    pub fn from_duration(start: DateTime<Utc>, duration: Duration) -> Self {
        Self::new(start, start + duration)
    }

    /// Creates a time window covering a single UTC day.
    pub fn for_date(date: NaiveDate) -> Self {
        let start = start_of_day(date);
        Self::new(start, start + Duration::days(1))
    }

    /// Returns the duration of this time window.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Checks if a datetime falls within this window.
    ///
    /// Uses half-open interval semantics: `[start, end)`.
    pub fn contains(&self, dt: DateTime<Utc>) -> bool {
        self.start <= dt && dt < self.end
    }

    /// Checks if an interval lies entirely inside this window.
    pub fn contains_interval(&self, interval: &Interval) -> bool {
        self.start <= interval.start() && interval.end() <= self.end
    }

    /// Returns the window boundaries as `Z`-suffixed strings.
    pub fn to_rfc3339_pair(&self) -> (String, String) {
        (format_utc(&self.start), format_utc(&self.end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    mod interval {
        use super::*;

        #[test]
        fn rejects_empty_and_inverted() {
            let t = utc(2025, 7, 3, 9, 0, 0);
            assert!(Interval::new(t, t).is_err());
            assert!(Interval::new(t, t - Duration::minutes(1)).is_err());
            assert!(Interval::new(t, t + Duration::minutes(1)).is_ok());
        }

        #[test]
        fn parse_accepts_offsets() {
            let interval = Interval::parse("2025-07-03T02:00:00+02:00", "2025-07-03T01:00:00Z").unwrap();
            assert_eq!(interval.start(), utc(2025, 7, 3, 0, 0, 0));
            assert_eq!(interval.duration(), Duration::hours(1));
        }

        #[test]
        fn overlap_rules() {
            let a = Interval::new(utc(2025, 7, 3, 9, 0, 0), utc(2025, 7, 3, 10, 0, 0)).unwrap();
            let touching = Interval::new(utc(2025, 7, 3, 10, 0, 0), utc(2025, 7, 3, 11, 0, 0)).unwrap();
            let partial = Interval::new(utc(2025, 7, 3, 9, 59, 0), utc(2025, 7, 3, 11, 0, 0)).unwrap();
            let inside = Interval::new(utc(2025, 7, 3, 9, 15, 0), utc(2025, 7, 3, 9, 30, 0)).unwrap();

            assert!(!a.overlaps(&touching));
            assert!(!touching.overlaps(&a));
            assert!(a.overlaps(&partial));
            assert!(a.overlaps(&inside));
            assert!(inside.overlaps(&a));
        }

        #[test]
        fn serializes_with_z_suffix() {
            let interval = Interval::new(utc(2025, 7, 3, 0, 0, 0), utc(2025, 7, 3, 0, 30, 0)).unwrap();
            let json = serde_json::to_string(&interval).unwrap();
            assert_eq!(json, r#"{"start":"2025-07-03T00:00:00Z","end":"2025-07-03T00:30:00Z"}"#);
        }

        #[test]
        fn deserialize_normalizes_offset() {
            let interval: Interval =
                serde_json::from_str(r#"{"start":"2025-07-03T01:00:00+01:00","end":"2025-07-03T00:30:00Z"}"#)
                    .unwrap();
            assert_eq!(format_utc(&interval.start()), "2025-07-03T00:00:00Z");
        }

        #[test]
        fn deserialize_enforces_ordering() {
            let result: Result<Interval, _> =
                serde_json::from_str(r#"{"start":"2025-07-03T01:00:00Z","end":"2025-07-03T00:30:00Z"}"#);
            assert!(result.is_err());
        }
    }

    mod time_window {
        use super::*;

        #[test]
        fn creation() {
            let start = utc(2025, 2, 5, 9, 0, 0);
            let end = utc(2025, 2, 5, 17, 0, 0);
            let window = TimeWindow::new(start, end);
            assert_eq!(window.start, start);
            assert_eq!(window.end, end);
            assert_eq!(window.duration(), Duration::hours(8));
        }

        #[test]
        #[should_panic(expected = "start must be <= end")]
        fn invalid_window() {
            TimeWindow::new(utc(2025, 2, 5, 17, 0, 0), utc(2025, 2, 5, 9, 0, 0));
        }

        #[test]
        fn try_new_reports_inversion() {
            let err = TimeWindow::try_new(utc(2025, 2, 5, 17, 0, 0), utc(2025, 2, 5, 9, 0, 0)).unwrap_err();
            assert!(matches!(err, IntervalError::Inverted { .. }));
            assert!(TimeWindow::try_new(utc(2025, 2, 5, 9, 0, 0), utc(2025, 2, 5, 9, 0, 0)).is_ok());
        }

        #[test]
        fn parse_rejects_garbage() {
            assert!(matches!(
                TimeWindow::parse("tomorrow", "2025-02-05T09:00:00Z"),
                Err(IntervalError::InvalidTimestamp { .. })
            ));
        }

        #[test]
        fn contains_datetime() {
            let window = TimeWindow::new(utc(2025, 2, 5, 9, 0, 0), utc(2025, 2, 5, 17, 0, 0));
            assert!(window.contains(utc(2025, 2, 5, 9, 0, 0)));
            assert!(window.contains(utc(2025, 2, 5, 16, 59, 59)));
            assert!(!window.contains(utc(2025, 2, 5, 17, 0, 0)));
            assert!(!window.contains(utc(2025, 2, 5, 8, 59, 59)));
        }

        #[test]
        fn for_date() {
            let window = TimeWindow::for_date(NaiveDate::from_ymd_opt(2025, 2, 5).unwrap());
            assert_eq!(window.start, utc(2025, 2, 5, 0, 0, 0));
            assert_eq!(window.end, utc(2025, 2, 6, 0, 0, 0));
        }

        #[test]
        fn rfc3339_pair_uses_z() {
            let window = TimeWindow::from_duration(utc(2025, 7, 3, 0, 0, 0), Duration::days(7));
            assert_eq!(
                window.to_rfc3339_pair(),
                ("2025-07-03T00:00:00Z".to_string(), "2025-07-10T00:00:00Z".to_string())
            );
        }
    }

    #[test]
    fn midnight_truncates_time_of_day() {
        assert_eq!(midnight(utc(2025, 7, 3, 15, 42, 7)), utc(2025, 7, 3, 0, 0, 0));
    }
}
