//! Split validation and bulk planning.

use ledgerline_shared::types::money::MoneyMath;
use ledgerline_shared::types::{FriendId, StatementId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::SplitError;

/// A statement targeted by a bulk percentage split.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitTarget {
    /// The statement.
    pub statement_id: StatementId,
    /// Statement amount.
    pub amount: Decimal,
    /// Sum of its existing splits.
    pub existing_split_total: Decimal,
    /// Friends that already have a split on it.
    pub friend_ids: Vec<FriendId>,
}

/// A split to create, produced by bulk planning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedSplit {
    /// The statement.
    pub statement_id: StatementId,
    /// The friend.
    pub friend_id: FriendId,
    /// Amount, rounded to cents.
    pub amount: Decimal,
}

/// Split allocation validator.
pub struct SplitValidator;

impl SplitValidator {
    /// Checks a new or updated split against the statement amount.
    ///
    /// `other_splits_total` excludes the split being updated.
    pub fn validate_split(
        statement_id: StatementId,
        statement_amount: Decimal,
        other_splits_total: Decimal,
        new_amount: Decimal,
    ) -> Result<(), SplitError> {
        if new_amount <= Decimal::ZERO {
            return Err(SplitError::NonPositiveAmount(new_amount));
        }
        let requested_total = MoneyMath::add(other_splits_total, new_amount);
        if requested_total > statement_amount {
            return Err(SplitError::ExceedsStatement {
                statement_id,
                statement_amount,
                requested_total,
            });
        }
        Ok(())
    }

    /// Rejects a second split for the same friend on one statement.
    pub fn ensure_no_duplicate<I>(
        statement_id: StatementId,
        existing_friends: I,
        friend_id: FriendId,
    ) -> Result<(), SplitError>
    where
        I: IntoIterator<Item = FriendId>,
    {
        if existing_friends.into_iter().any(|f| f == friend_id) {
            return Err(SplitError::DuplicateFriend {
                statement_id,
                friend_id,
            });
        }
        Ok(())
    }

    /// Checks that a statement's new amount still covers its splits.
    pub fn validate_statement_amount(
        statement_id: StatementId,
        amount: Decimal,
        splits_total: Decimal,
    ) -> Result<(), SplitError> {
        if splits_total > amount {
            return Err(SplitError::AmountBelowSplits {
                statement_id,
                amount,
                splits_total,
            });
        }
        Ok(())
    }

    /// `100 - existing / amount * 100`, floored at zero.
    ///
    /// A non-positive statement amount allows nothing.
    #[must_use]
    pub fn max_allowed_percentage(amount: Decimal, existing_split_total: Decimal) -> Decimal {
        if amount <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        MoneyMath::sub(
            Decimal::ONE_HUNDRED,
            MoneyMath::ratio_percent(existing_split_total, amount),
        )
        .max(Decimal::ZERO)
    }

    /// Plans a percentage split of every target for one friend.
    ///
    /// Either every split is returned or the whole batch is rejected: the
    /// percentage may not exceed the smallest per-statement maximum, and no
    /// target may already have a split for the friend.
    pub fn plan_bulk(
        friend_id: FriendId,
        percentage: Decimal,
        targets: &[SplitTarget],
    ) -> Result<Vec<PlannedSplit>, SplitError> {
        if percentage <= Decimal::ZERO || percentage > Decimal::ONE_HUNDRED {
            return Err(SplitError::InvalidPercentage(percentage));
        }
        if targets.is_empty() {
            return Err(SplitError::EmptyBatch);
        }

        for target in targets {
            Self::ensure_no_duplicate(
                target.statement_id,
                target.friend_ids.iter().copied(),
                friend_id,
            )?;
        }

        let tightest = targets
            .iter()
            .map(|t| {
                (
                    Self::max_allowed_percentage(t.amount, t.existing_split_total),
                    t.statement_id,
                )
            })
            .min_by(|a, b| a.0.cmp(&b.0));
        if let Some((max_allowed, statement_id)) = tightest
            && percentage > max_allowed
        {
            return Err(SplitError::BulkExceedsMax {
                requested: percentage,
                max_allowed,
                statement_id,
            });
        }

        targets
            .iter()
            .map(|target| {
                let amount =
                    MoneyMath::round_cents(MoneyMath::percent_of(target.amount, percentage));
                Self::validate_split(
                    target.statement_id,
                    target.amount,
                    target.existing_split_total,
                    amount,
                )?;
                Ok(PlannedSplit {
                    statement_id: target.statement_id,
                    friend_id,
                    amount,
                })
            })
            .collect()
    }
}
