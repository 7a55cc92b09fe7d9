//! Domain error types.

use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

/// Validation and domain errors raised by git-chrono.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ChronoError {
    /// A window must cover at least one day.
    #[error("Window must span at least one day")]
    EmptyWindow,

    /// The window end date cannot be represented.
    #[error("Window starting {start} with {days} days extends past the supported calendar range")]
    WindowOutOfRange {
        /// First day of the window.
        start: NaiveDate,
        /// Requested number of days.
        days: u32,
    },

    /// Hour bounds must satisfy `first <= last <= 23`.
    #[error("Invalid hour range {first}..={last}: expected first <= last <= 23")]
    InvalidHourRange {
        /// First allowed hour.
        first: u32,
        /// Last allowed hour.
        last: u32,
    },

    /// Per-day record bounds must satisfy `min <= max`.
    #[error("Invalid per-day bounds {min}..={max}: minimum exceeds maximum")]
    InvalidDailyBounds {
        /// Minimum records per day.
        min: u32,
        /// Maximum records per day.
        max: u32,
    },

    /// The lookback period reaches past the supported calendar range.
    #[error("Lookback of {days} days reaches past the supported calendar range")]
    LookbackOutOfRange {
        /// Requested lookback in days.
        days: u32,
    },

    /// The wall-clock time falls into a gap of the local timezone.
    #[error("Local time {0} does not exist in the current timezone")]
    NonexistentLocalTime(NaiveDateTime),

    /// The repository has no working directory to write the log artifact into.
    #[error("Repository has no working directory")]
    BareRepository,
}
