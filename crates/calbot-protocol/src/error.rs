//! Request validation errors.

use thiserror::Error;

/// A request body or query string that is well-formed JSON but not
/// acceptable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("title must not be empty")]
    EmptyTitle,

    #[error("start must not be empty")]
    EmptyStart,

    #[error("duration_minutes must be between 1 and {max}, got {value}")]
    Duration { value: i64, max: i64 },

    #[error("slot_minutes must be a positive number of minutes")]
    SlotMinutes,

    #[error("provide either both start and end, or range")]
    MissingWindow,
}
