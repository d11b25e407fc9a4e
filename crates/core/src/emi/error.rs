//! EMI error types.

use ledgerline_shared::types::FriendId;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised while solving or projecting an EMI schedule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmiError {
    /// Tenure must be at least one month.
    #[error("Tenure must be at least one month")]
    ZeroTenure,

    /// Principal, EMI or total must be positive.
    #[error("{field} must be positive, got {value}")]
    NonPositiveAmount {
        /// Name of the input.
        field: &'static str,
        /// Value supplied.
        value: Decimal,
    },

    /// Rates and fees cannot be negative.
    #[error("{field} cannot be negative, got {value}")]
    NegativeValue {
        /// Name of the input.
        field: &'static str,
        /// Value supplied.
        value: Decimal,
    },

    /// Intermediate result does not fit in a decimal.
    #[error("EMI calculation overflowed")]
    Overflow,

    /// Installment date falls outside the supported calendar.
    #[error("Installment {installment} date is out of range")]
    DateOutOfRange {
        /// Installment number.
        installment: u32,
    },

    /// Installment number past the end of the schedule.
    #[error("Installment {installment} is beyond tenure {tenure}")]
    InstallmentOutOfRange {
        /// Requested installment.
        installment: u32,
        /// Schedule tenure.
        tenure: u32,
    },

    /// Split percentage outside (0, 100].
    #[error("Split percentage for friend {friend_id} must be in (0, 100], got {percentage}")]
    InvalidSplitPercentage {
        /// Friend of the split.
        friend_id: FriendId,
        /// Percentage supplied.
        percentage: Decimal,
    },

    /// Same friend listed twice.
    #[error("Friend {0} appears more than once in the EMI splits")]
    DuplicateSplitFriend(FriendId),

    /// Split percentages add up to more than 100.
    #[error("EMI split percentages sum to {0}, which exceeds 100")]
    SplitsExceedHundred(Decimal),
}

impl EmiError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::ZeroTenure => "ZERO_TENURE",
            Self::NonPositiveAmount { .. } => "NON_POSITIVE_AMOUNT",
            Self::NegativeValue { .. } => "NEGATIVE_VALUE",
            Self::Overflow => "CALCULATION_OVERFLOW",
            Self::DateOutOfRange { .. } => "DATE_OUT_OF_RANGE",
            Self::InstallmentOutOfRange { .. } => "INSTALLMENT_OUT_OF_RANGE",
            Self::InvalidSplitPercentage { .. } => "INVALID_SPLIT_PERCENTAGE",
            Self::DuplicateSplitFriend(_) => "DUPLICATE_SPLIT_FRIEND",
            Self::SplitsExceedHundred(_) => "SPLITS_EXCEED_HUNDRED",
        }
    }

    /// Returns true for input problems, false for constraint violations.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::ZeroTenure
                | Self::NonPositiveAmount { .. }
                | Self::NegativeValue { .. }
                | Self::Overflow
                | Self::DateOutOfRange { .. }
                | Self::InvalidSplitPercentage { .. }
        )
    }
}
