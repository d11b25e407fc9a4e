//! Reconciliation error types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised when linking or unlinking statements and installments.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    /// No schedule row with this number.
    #[error("Installment {0} does not exist in the schedule")]
    InstallmentNotFound(u32),

    /// Paid amount too far from the expected payment.
    #[error("Amount {actual} differs from expected {expected} by more than {tolerance}")]
    AmountOutOfTolerance {
        /// Statement amount.
        actual: Decimal,
        /// Expected total payment.
        expected: Decimal,
        /// Allowed difference.
        tolerance: Decimal,
    },

    /// Payment date too far from the due date.
    #[error("Date {actual} is more than {tolerance_days} days from due date {expected}")]
    DateOutOfTolerance {
        /// Statement date.
        actual: NaiveDate,
        /// Due date.
        expected: NaiveDate,
        /// Allowed distance in days.
        tolerance_days: i64,
    },

    /// Link requested for an installment other than the next expected one.
    #[error("Installment {requested} cannot be linked; next expected is {expected}")]
    NotNextInstallment {
        /// Installment requested.
        requested: u32,
        /// Installment expected.
        expected: u32,
    },

    /// Every installment is already linked.
    #[error("Every installment is already linked")]
    ScheduleComplete,

    /// Unlink requested for an installment that is not the highest linked one.
    #[error("Installment {installment} cannot be unlinked while {last_linked} is linked")]
    NotLastLinked {
        /// Installment requested.
        installment: u32,
        /// Highest linked installment.
        last_linked: u32,
    },

    /// Statement is already linked to an installment.
    #[error("Statement is already linked to installment {0}")]
    AlreadyLinked(u32),

    /// Statement is not linked to this EMI.
    #[error("Statement is not linked to an installment")]
    NotLinked,
}

impl ReconcileError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InstallmentNotFound(_) => "INSTALLMENT_NOT_FOUND",
            Self::AmountOutOfTolerance { .. } => "AMOUNT_OUT_OF_TOLERANCE",
            Self::DateOutOfTolerance { .. } => "DATE_OUT_OF_TOLERANCE",
            Self::NotNextInstallment { .. } => "NOT_NEXT_INSTALLMENT",
            Self::ScheduleComplete => "SCHEDULE_COMPLETE",
            Self::NotLastLinked { .. } => "NOT_LAST_LINKED",
            Self::AlreadyLinked(_) => "ALREADY_LINKED",
            Self::NotLinked => "NOT_LINKED",
        }
    }

    /// Returns true when the referenced installment does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::InstallmentNotFound(_))
    }
}
