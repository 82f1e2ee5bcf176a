//! Free slot derivation.
//!
//! Splits a query window into a fixed grid of equally sized candidate slots
//! and keeps the ones that do not touch any busy interval. The scan never
//! merges slots and never jumps to the end of a busy period: every candidate
//! starts at `window.start + k * duration`.

use std::fmt;
use std::num::NonZeroU32;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::time::Interval;

/// Default slot length in minutes.
pub const DEFAULT_SLOT_MINUTES: u32 = 30;

/// Length of a candidate slot, in whole minutes. Never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct SlotDuration(NonZeroU32);

impl SlotDuration {
    /// Creates a slot duration, returning `None` for zero minutes.
    pub fn from_minutes(minutes: u32) -> Option<Self> {
        NonZeroU32::new(minutes).map(Self)
    }

    /// Number of minutes in one slot.
    pub fn minutes(&self) -> u32 {
        self.0.get()
    }

    /// The slot length as a chrono duration.
    pub fn as_duration(&self) -> Duration {
        Duration::minutes(i64::from(self.0.get()))
    }
}

impl Default for SlotDuration {
    fn default() -> Self {
        Self(NonZeroU32::new(DEFAULT_SLOT_MINUTES).expect("default slot length is non-zero"))
    }
}

impl fmt::Display for SlotDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}m", self.0)
    }
}

impl TryFrom<u32> for SlotDuration {
    type Error = String;

    fn try_from(minutes: u32) -> Result<Self, Self::Error> {
        Self::from_minutes(minutes).ok_or_else(|| "slot duration must be at least one minute".to_string())
    }
}

impl From<SlotDuration> for u32 {
    fn from(value: SlotDuration) -> Self {
        value.minutes()
    }
}

/// Returns the free slots of `slot` length between `start` and `end`.
///
/// A candidate `[current, current + slot)` is kept iff it does not overlap
/// any entry of `busy` (touching boundaries are not an overlap). `busy` may
/// be unsorted and may contain overlapping entries. A trailing period
/// shorter than one slot is dropped, and an empty or inverted window yields
/// no slots.
pub fn derive_free_slots(
    busy: &[Interval],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    slot: SlotDuration,
) -> Vec<Interval> {
    let step = slot.as_duration();
    let mut slots = Vec::new();
    let mut current = start;

    while let Some(slot_end) = current.checked_add_signed(step) {
        if slot_end > end {
            break;
        }

        let overlap = busy
            .iter()
            .any(|b| !(slot_end <= b.start() || current >= b.end()));
        if !overlap {
            // step is positive so current < slot_end always holds
            if let Ok(free) = Interval::new(current, slot_end) {
                slots.push(free);
            }
        }

        current = slot_end;
    }

    slots
}
