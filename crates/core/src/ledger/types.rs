//! Ledger domain types shared by the summarizer, resolver and aggregator.
//!
//! The query layer hands the engine rows that are already grouped by entity
//! and kind; these types describe those rows.

use chrono::{DateTime, Utc};
use ledgerline_shared::types::money::lenient_decimal;
use ledgerline_shared::types::{AccountId, FriendId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Kind tag of a money movement, seen from an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Money spent on something.
    Expense,
    /// Money moving between an account and the outside world (salary, refunds).
    OutsideTransaction,
    /// Money moving between an account and a friend.
    FriendTransaction,
    /// One leg of a transfer between two of the user's own accounts.
    SelfTransfer,
}

/// Kind of a statement. Self transfers are stored separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementKind {
    /// Money spent on something.
    Expense,
    /// Money moving between an account and the outside world.
    OutsideTransaction,
    /// Money moving between an account and a friend.
    FriendTransaction,
}

impl StatementKind {
    /// Returns the account-side event kind for this statement kind.
    #[must_use]
    pub const fn event_kind(self) -> EventKind {
        match self {
            Self::Expense => EventKind::Expense,
            Self::OutsideTransaction => EventKind::OutsideTransaction,
            Self::FriendTransaction => EventKind::FriendTransaction,
        }
    }
}

/// Kind tag of a money movement, seen from a friend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FriendMovementKind {
    /// An expense the friend covered.
    PaidByFriend,
    /// A share of one of our expenses attributed to the friend.
    Split,
    /// Money moving between one of our accounts and the friend.
    FriendTransaction,
}

/// Kind of a per-category movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryMovementKind {
    /// Expense total in the category.
    Expense,
    /// Splits of expenses in the category.
    Split,
}

/// Grouped total of one account's movements of one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountMovementTotal {
    /// The account.
    pub account_id: AccountId,
    /// Movement kind.
    pub kind: EventKind,
    /// Signed total.
    #[serde(deserialize_with = "lenient_decimal")]
    pub total: Decimal,
}

/// Grouped total of one friend's movements of one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendMovementTotal {
    /// The friend.
    pub friend_id: FriendId,
    /// Movement kind.
    pub kind: FriendMovementKind,
    /// Signed total.
    #[serde(deserialize_with = "lenient_decimal")]
    pub total: Decimal,
}

/// Grouped total of one category's expenses or splits.
///
/// Split rows carry the category of the statement they split.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryMovementTotal {
    /// Category label.
    pub category: String,
    /// Expense or split.
    pub kind: CategoryMovementKind,
    /// Total.
    #[serde(deserialize_with = "lenient_decimal")]
    pub total: Decimal,
}

/// A grouped row tagged with the start of the bucket it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucketed<T> {
    /// Start of the bucket (UTC instant of the local bucket start).
    pub bucket_start: DateTime<Utc>,
    /// The grouped row.
    #[serde(flatten)]
    pub row: T,
}

impl<T> Bucketed<T> {
    /// Tags a row with its bucket.
    pub const fn new(bucket_start: DateTime<Utc>, row: T) -> Self {
        Self { bucket_start, row }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_statement_kind_maps_to_event_kind() {
        assert_eq!(StatementKind::Expense.event_kind(), EventKind::Expense);
        assert_eq!(
            StatementKind::OutsideTransaction.event_kind(),
            EventKind::OutsideTransaction
        );
        assert_eq!(
            StatementKind::FriendTransaction.event_kind(),
            EventKind::FriendTransaction
        );
    }

    #[test]
    fn test_grouped_row_coerces_malformed_total() {
        let account_id = AccountId::new();
        let json = format!(
            r#"{{"account_id": "{account_id}", "kind": "outside_transaction", "total": "12,5"}}"#
        );
        let row: AccountMovementTotal = serde_json::from_str(&json).unwrap();
        assert_eq!(row.kind, EventKind::OutsideTransaction);
        assert_eq!(row.total, Decimal::ZERO);

        let json =
            format!(r#"{{"account_id": "{account_id}", "kind": "expense", "total": "12.50"}}"#);
        let row: AccountMovementTotal = serde_json::from_str(&json).unwrap();
        assert_eq!(row.total, dec!(12.50));
    }
}
