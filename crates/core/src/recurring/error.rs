//! Recurring payment error types.

use chrono::NaiveDate;
use thiserror::Error;

/// Errors raised by recurrence rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecurringError {
    /// Multiplier must be at least one.
    #[error("Frequency multiplier must be at least 1")]
    ZeroMultiplier,

    /// End date before start date.
    #[error("End date {end} is before start date {start}")]
    EndBeforeStart {
        /// Start date.
        start: NaiveDate,
        /// End date.
        end: NaiveDate,
    },

    /// Unknown frequency name.
    #[error("Invalid frequency: {0}")]
    InvalidFrequency(String),

    /// No due date within the matching window.
    #[error("No due date within {window_days} days of {date}")]
    NoDueDateInWindow {
        /// Payment date.
        date: NaiveDate,
        /// Window size in days.
        window_days: i64,
    },
}

impl RecurringError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::ZeroMultiplier => "ZERO_MULTIPLIER",
            Self::EndBeforeStart { .. } => "END_BEFORE_START",
            Self::InvalidFrequency(_) => "INVALID_FREQUENCY",
            Self::NoDueDateInWindow { .. } => "NO_DUE_DATE_IN_WINDOW",
        }
    }
}
