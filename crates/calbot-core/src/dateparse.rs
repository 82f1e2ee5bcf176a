//! Best-effort natural-language date interpretation.
//!
//! Turns phrases such as "tomorrow at 3pm", "next week", "in 2 days",
//! "friday" or "July 3rd 2025" into a concrete UTC instant. Every phrase is
//! interpreted in UTC relative to a caller-supplied `now`, so results are
//! deterministic under test.
//!
//! Supported forms:
//! - RFC3339 / ISO8601 timestamps and `YYYY-MM-DD` dates
//! - Keywords: "now", "today", "tonight", "tomorrow", "yesterday",
//!   "day after tomorrow"
//! - Offsets: "in 3 days", "2 weeks from now", "an hour ago",
//!   "next month", "last year"
//! - Weekdays: "monday", "next friday", "this sat"
//! - Month names: "july 3", "3rd of july", "jul 3, 2025"
//! - A time of day anywhere in the phrase: "3pm", "3:30 pm", "15:30",
//!   "noon", "midnight"
//!
//! Relative offsets keep the time of day of `now`; calendar dates
//! (weekdays, month names, ISO dates) resolve to midnight unless a time of
//! day is given.

use std::sync::LazyLock;

use chrono::{
    DateTime, Datelike, Duration, Months, NaiveDate, NaiveDateTime, NaiveTime, Utc, Weekday,
};
use regex::Regex;

const NUMBER: &str = r"(a|an|one|two|three|four|five|six|seven|eight|nine|ten|eleven|twelve|\d+)";
const UNIT: &str = r"(minute|min|hour|hr|day|week|month|year)s?";
const MONTH: &str = r"(jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)";

static TIME_12H: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{1,2})(?::([0-5]\d))?\s*(am|pm|a\.m\.|p\.m\.)").expect("Invalid 12h time regex")
});

static TIME_24H: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([01]?\d|2[0-3]):([0-5]\d)(?::([0-5]\d))?\b").expect("Invalid 24h time regex")
});

static TIME_NAMED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(noon|midday|midnight)\b").expect("Invalid named time regex"));

static IN_OFFSET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^in\s+{NUMBER}\s+{UNIT}$")).expect("Invalid offset regex")
});

static FROM_NOW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^{NUMBER}\s+{UNIT}\s+(?:from\s+now|from\s+today|later|hence)$"))
        .expect("Invalid from-now regex")
});

static AGO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^{NUMBER}\s+{UNIT}\s+ago$")).expect("Invalid ago regex")
});

static NEXT_LAST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(next|last|this|coming)\s+(week|month|year)$").expect("Invalid next/last regex")
});

static WEEKDAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:(?:next|this|coming)\s+)?(monday|mon|tuesday|tues|tue|wednesday|wed|thursday|thurs|thur|thu|friday|fri|saturday|sat|sunday|sun)$",
    )
    .expect("Invalid weekday regex")
});

static MONTH_DAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^{MONTH}\.?\s+(\d{{1,2}})(?:st|nd|rd|th)?(?:,?\s+(\d{{4}}))?$"
    ))
    .expect("Invalid month-day regex")
});

static DAY_MONTH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^(\d{{1,2}})(?:st|nd|rd|th)?\s+(?:of\s+)?{MONTH}\.?(?:,?\s+(\d{{4}}))?$"
    ))
    .expect("Invalid day-month regex")
});

/// Naive timestamp layouts accepted as UTC.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Interprets a natural-language phrase as a UTC instant.
///
/// Returns `None` when nothing in the phrase is recognized.
pub fn interpret(phrase: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let trimmed = phrase.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(dt) = parse_timestamp(trimmed) {
        return Some(dt);
    }

    let lowered = trimmed.to_lowercase();
    let (time, rest) = extract_time_of_day(&lowered);
    let rest = normalize_words(&rest);

    let base = if rest.is_empty() {
        // A bare time of day means today
        time?;
        Resolved::Relative(now)
    } else {
        resolve_date(&rest, now)?
    };

    match (base, time) {
        (Resolved::Relative(dt), None) => Some(dt),
        (Resolved::Date(date), None) => Some(date.and_time(NaiveTime::MIN).and_utc()),
        (Resolved::Relative(dt), Some(t)) => Some(dt.date_naive().and_time(t).and_utc()),
        (Resolved::Date(date), Some(t)) => Some(date.and_time(t).and_utc()),
    }
}

/// Outcome of resolving the date part of a phrase.
#[derive(Debug, Clone, Copy)]
enum Resolved {
    /// An instant derived from `now` that keeps its time of day.
    Relative(DateTime<Utc>),
    /// A calendar date without a time of day.
    Date(NaiveDate),
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }
    None
}

/// Pulls a time of day out of `text`, returning it with the remaining words.
fn extract_time_of_day(text: &str) -> (Option<NaiveTime>, String) {
    if let Some(caps) = TIME_12H.captures(text) {
        let hour: u32 = caps[1].parse().unwrap_or(99);
        let minute: u32 = caps.get(2).and_then(|m| m.as_str().parse().ok()).unwrap_or(0);
        let pm = caps[3].starts_with('p');
        let time = match (hour, pm) {
            (1..=11, false) => NaiveTime::from_hms_opt(hour, minute, 0),
            (12, false) => NaiveTime::from_hms_opt(0, minute, 0),
            (1..=11, true) => NaiveTime::from_hms_opt(hour + 12, minute, 0),
            (12, true) => NaiveTime::from_hms_opt(12, minute, 0),
            _ => None,
        };
        if let Some(t) = time {
            return (Some(t), remove_match(text, caps.get(0)));
        }
        return (None, text.to_string());
    }

    if let Some(caps) = TIME_24H.captures(text) {
        let hour: u32 = caps[1].parse().unwrap_or(99);
        let minute: u32 = caps[2].parse().unwrap_or(99);
        let second: u32 = caps.get(3).and_then(|m| m.as_str().parse().ok()).unwrap_or(0);
        if let Some(t) = NaiveTime::from_hms_opt(hour, minute, second) {
            return (Some(t), remove_match(text, caps.get(0)));
        }
    }

    if let Some(caps) = TIME_NAMED.captures(text) {
        let time = match &caps[1] {
            "midnight" => NaiveTime::MIN,
            _ => NaiveTime::from_hms_opt(12, 0, 0).unwrap_or(NaiveTime::MIN),
        };
        return (Some(time), remove_match(text, caps.get(0)));
    }

    (None, text.to_string())
}

fn remove_match(text: &str, m: Option<regex::Match<'_>>) -> String {
    match m {
        Some(m) => format!("{} {}", &text[..m.start()], &text[m.end()..]),
        None => text.to_string(),
    }
}

/// Collapses whitespace and drops filler words that carry no date meaning.
fn normalize_words(text: &str) -> String {
    text.split_whitespace()
        .map(|w| w.trim_matches(|c: char| c == ',' || c == '.' || c == '?' || c == '!'))
        .filter(|w| !w.is_empty() && !matches!(*w, "at" | "on" | "the" | "for" | "of" | "around"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn resolve_date(rest: &str, now: DateTime<Utc>) -> Option<Resolved> {
    let today = now.date_naive();

    match rest {
        "now" | "right now" => return Some(Resolved::Relative(now)),
        "today" => return Some(Resolved::Relative(now)),
        "tonight" => {
            let evening = NaiveTime::from_hms_opt(20, 0, 0)?;
            return Some(Resolved::Relative(today.and_time(evening).and_utc()));
        }
        "tomorrow" => return now.checked_add_signed(Duration::days(1)).map(Resolved::Relative),
        "yesterday" => return now.checked_sub_signed(Duration::days(1)).map(Resolved::Relative),
        "day after tomorrow" => {
            return now.checked_add_signed(Duration::days(2)).map(Resolved::Relative);
        }
        _ => {}
    }

    if let Ok(date) = NaiveDate::parse_from_str(rest, "%Y-%m-%d") {
        return Some(Resolved::Date(date));
    }

    if let Some(caps) = IN_OFFSET.captures(rest).or_else(|| FROM_NOW.captures(rest)) {
        let n = parse_number(&caps[1])?;
        return shift(now, n, &caps[2], true).map(Resolved::Relative);
    }

    if let Some(caps) = AGO.captures(rest) {
        let n = parse_number(&caps[1])?;
        return shift(now, n, &caps[2], false).map(Resolved::Relative);
    }

    if let Some(caps) = NEXT_LAST.captures(rest) {
        return match &caps[1] {
            "this" => Some(Resolved::Relative(now)),
            "last" => shift(now, 1, &caps[2], false).map(Resolved::Relative),
            _ => shift(now, 1, &caps[2], true).map(Resolved::Relative),
        };
    }

    if let Some(caps) = WEEKDAY.captures(rest) {
        let target = parse_weekday(&caps[1])?;
        return Some(Resolved::Date(next_weekday(today, target)));
    }

    if let Some(caps) = MONTH_DAY.captures(rest) {
        let month = parse_month(&caps[1])?;
        let day: u32 = caps[2].parse().ok()?;
        let year = year_or_current(caps.get(3), today)?;
        return NaiveDate::from_ymd_opt(year, month, day).map(Resolved::Date);
    }

    if let Some(caps) = DAY_MONTH.captures(rest) {
        let day: u32 = caps[1].parse().ok()?;
        let month = parse_month(&caps[2])?;
        let year = year_or_current(caps.get(3), today)?;
        return NaiveDate::from_ymd_opt(year, month, day).map(Resolved::Date);
    }

    None
}

fn parse_number(word: &str) -> Option<u32> {
    let n = match word {
        "a" | "an" | "one" => 1,
        "two" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        "seven" => 7,
        "eight" => 8,
        "nine" => 9,
        "ten" => 10,
        "eleven" => 11,
        "twelve" => 12,
        digits => digits.parse().ok()?,
    };
    Some(n)
}

/// Moves `now` forward (or back) by `n` units.
fn shift(now: DateTime<Utc>, n: u32, unit: &str, forward: bool) -> Option<DateTime<Utc>> {
    let months = match unit {
        "month" => Some(n),
        "year" => n.checked_mul(12),
        _ => None,
    };
    if let Some(months) = months {
        let months = Months::new(months);
        return if forward {
            now.checked_add_months(months)
        } else {
            now.checked_sub_months(months)
        };
    }

    let n = i64::from(n);
    let delta = match unit {
        "minute" | "min" => Duration::try_minutes(n)?,
        "hour" | "hr" => Duration::try_hours(n)?,
        "day" => Duration::try_days(n)?,
        "week" => Duration::try_weeks(n)?,
        _ => return None,
    };
    if forward {
        now.checked_add_signed(delta)
    } else {
        now.checked_sub_signed(delta)
    }
}

fn parse_weekday(word: &str) -> Option<Weekday> {
    let weekday = match word.get(..3)? {
        "mon" => Weekday::Mon,
        "tue" => Weekday::Tue,
        "wed" => Weekday::Wed,
        "thu" => Weekday::Thu,
        "fri" => Weekday::Fri,
        "sat" => Weekday::Sat,
        "sun" => Weekday::Sun,
        _ => return None,
    };
    Some(weekday)
}

/// Returns the first `target` weekday strictly after `today`.
fn next_weekday(today: NaiveDate, target: Weekday) -> NaiveDate {
    let current = today.weekday().num_days_from_monday() as i64;
    let wanted = target.num_days_from_monday() as i64;
    let mut ahead = (wanted - current).rem_euclid(7);
    if ahead == 0 {
        ahead = 7;
    }
    today + Duration::days(ahead)
}

fn parse_month(word: &str) -> Option<u32> {
    let month = match word.get(..3)? {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

fn year_or_current(m: Option<regex::Match<'_>>, today: NaiveDate) -> Option<i32> {
    match m {
        Some(m) => m.as_str().parse().ok(),
        None => Some(today.year()),
    }
}
