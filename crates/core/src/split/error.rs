//! Split error types.

use ledgerline_shared::types::{FriendId, StatementId};
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised by split validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SplitError {
    /// Splits would exceed the statement amount.
    #[error("Splits would total {requested_total} of {statement_amount} on {statement_id}")]
    ExceedsStatement {
        /// The statement.
        statement_id: StatementId,
        /// Statement amount.
        statement_amount: Decimal,
        /// Existing splits plus the new one.
        requested_total: Decimal,
    },

    /// Bulk percentage exceeds what some statement can still take.
    #[error("Percentage {requested}% exceeds {max_allowed}% allowed on {statement_id}")]
    BulkExceedsMax {
        /// Requested percentage.
        requested: Decimal,
        /// Minimum of the per-statement maxima.
        max_allowed: Decimal,
        /// Statement with the lowest maximum.
        statement_id: StatementId,
    },

    /// The friend already has a split on the statement.
    #[error("Friend {friend_id} already has a split on statement {statement_id}")]
    DuplicateFriend {
        /// The statement.
        statement_id: StatementId,
        /// The friend.
        friend_id: FriendId,
    },

    /// Split amounts must be positive.
    #[error("Split amount must be positive, got {0}")]
    NonPositiveAmount(Decimal),

    /// Percentages must be in (0, 100].
    #[error("Split percentage must be in (0, 100], got {0}")]
    InvalidPercentage(Decimal),

    /// Statement amount cannot drop below its splits.
    #[error("Statement {statement_id} amount {amount} is below its splits total {splits_total}")]
    AmountBelowSplits {
        /// The statement.
        statement_id: StatementId,
        /// New amount.
        amount: Decimal,
        /// Existing splits.
        splits_total: Decimal,
    },

    /// Bulk request with no targets.
    #[error("Bulk split needs at least one statement")]
    EmptyBatch,
}

impl SplitError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::ExceedsStatement { .. } => "SPLIT_EXCEEDS_STATEMENT",
            Self::BulkExceedsMax { .. } => "BULK_SPLIT_EXCEEDS_MAX",
            Self::DuplicateFriend { .. } => "DUPLICATE_SPLIT",
            Self::NonPositiveAmount(_) => "NON_POSITIVE_AMOUNT",
            Self::InvalidPercentage(_) => "INVALID_PERCENTAGE",
            Self::AmountBelowSplits { .. } => "AMOUNT_BELOW_SPLITS",
            Self::EmptyBatch => "EMPTY_BATCH",
        }
    }

    /// Returns true for input problems, false for constraint violations.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::NonPositiveAmount(_) | Self::InvalidPercentage(_) | Self::EmptyBatch
        )
    }
}
