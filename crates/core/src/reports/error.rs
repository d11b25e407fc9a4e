//! Report error types.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur while building a report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReportError {
    /// Unknown calendar unit name.
    #[error("Invalid time unit: {0}")]
    InvalidTimeUnit(String),

    /// Window start after its end.
    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidDateRange {
        /// Start instant.
        start: DateTime<Utc>,
        /// End instant.
        end: DateTime<Utc>,
    },
}

impl ReportError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidTimeUnit(_) => "INVALID_TIME_UNIT",
            Self::InvalidDateRange { .. } => "INVALID_DATE_RANGE",
        }
    }
}
