//! Core types for calbot: UTC intervals, free-slot derivation, natural
//! language date ranges, logging setup and shutdown signals.

pub mod dateparse;
pub mod range;
pub mod signals;
pub mod slots;
pub mod time;
pub mod tracing;

pub use range::{RangeError, format_range, parse_range};
pub use signals::{ShutdownSignal, SignalHandler};
pub use slots::{DEFAULT_SLOT_MINUTES, SlotDuration, derive_free_slots};
pub use time::{Interval, IntervalError, TimeWindow, format_utc, parse_utc};
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
