//! Report data types.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use ledgerline_shared::types::{AccountId, FriendId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ledger::{
    AccountMovementTotal, AccountTransferSummary, Bucketed, CategoryMovementTotal, EntityBalance,
    FriendMovementTotal, FriendTransferSummary,
};

/// Balance row of one account.
pub type AccountBalanceRow = EntityBalance<AccountId, AccountTransferSummary>;

/// Balance row of one friend.
pub type FriendBalanceRow = EntityBalance<FriendId, FriendTransferSummary>;

/// Bucket-tagged grouped rows handed over by the query layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketedRows {
    /// Account movements.
    pub accounts: Vec<Bucketed<AccountMovementTotal>>,
    /// Friend movements.
    pub friends: Vec<Bucketed<FriendMovementTotal>>,
    /// Category expenses and splits.
    pub categories: Vec<Bucketed<CategoryMovementTotal>>,
}

/// One bucket of a time-series report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketReport {
    /// Bucket key.
    pub bucket_start: DateTime<Utc>,
    /// Every known account, carried from the previous bucket.
    pub accounts: Vec<AccountBalanceRow>,
    /// Every known friend, carried from the previous bucket.
    pub friends: Vec<FriendBalanceRow>,
    /// Sum of the category breakdown.
    pub total_expenses: Decimal,
    /// `expenses - splits` per category seen anywhere in the window.
    pub categories: BTreeMap<String, Decimal>,
}

/// Balances over a single window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowReport {
    /// Inclusive start, open when absent.
    pub start: Option<DateTime<Utc>>,
    /// Exclusive end, open when absent.
    pub end: Option<DateTime<Utc>>,
    /// Account balances.
    pub accounts: Vec<AccountBalanceRow>,
    /// Friend balances.
    pub friends: Vec<FriendBalanceRow>,
}
