//! Recurring payment schedules.
//!
//! A rule projects due dates from its start date; a payment matches a due
//! date when it falls within a window of days around it. Unlike installment
//! reconciliation the amount is not checked.

pub mod error;
pub mod service;

pub use error::RecurringError;
pub use service::{Frequency, RecurrenceRule};
