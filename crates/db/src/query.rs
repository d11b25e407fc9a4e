//! Query layer over the ledger state.
//!
//! Turns records into the grouped `{entity, kind, total}` rows the engine
//! consumes. Movement rules:
//!
//! - A statement with an account moves that account by its kind.
//! - A self transfer moves its source by `-amount` and its destination by `+amount`.
//! - An expense with a friend and no account was paid by that friend.
//! - A friend transaction moves the friend as well as the account.
//! - A split moves its friend, dated at its parent statement.
//! - Category rows hold expense statements, and splits under the category
//!   of their parent statement.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use ledgerline_core::ledger::{
    AccountMovementTotal, Bucketed, CategoryMovementKind, CategoryMovementTotal, EventKind,
    FriendMovementKind, FriendMovementTotal, StartingBalanceResolver, StatementKind,
    TransferSummarizer,
};
use ledgerline_core::reports::{Bucketing, BucketedRows};
use ledgerline_shared::types::money::MoneyMath;
use ledgerline_shared::types::{AccountId, EmiId, FriendId, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::records::EmiRecord;
use crate::store::LedgerState;

/// Half-open window `[start, end)`; a missing bound is open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    /// Inclusive start.
    pub start: Option<DateTime<Utc>>,
    /// Exclusive end.
    pub end: Option<DateTime<Utc>>,
}

impl Window {
    /// Window over all time.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            start: None,
            end: None,
        }
    }

    /// Window `[start, end)`.
    #[must_use]
    pub const fn new(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        Self { start, end }
    }

    /// Everything strictly before `instant`.
    #[must_use]
    pub const fn before(instant: DateTime<Utc>) -> Self {
        Self {
            start: None,
            end: Some(instant),
        }
    }

    /// Returns true if `ts` falls inside the window.
    #[must_use]
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start.is_none_or(|start| ts >= start) && self.end.is_none_or(|end| ts < end)
    }
}

/// Resolved balances at a window start.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartingBalances {
    /// Accounts.
    pub accounts: BTreeMap<AccountId, Decimal>,
    /// Friends.
    pub friends: BTreeMap<FriendId, Decimal>,
}

/// Read operations the engine needs from storage.
pub trait LedgerQuery {
    /// Recorded starting balance of every account of `user`.
    fn account_baselines(&self, user_id: UserId) -> BTreeMap<AccountId, Decimal>;

    /// Every friend of `user`, at the zero baseline.
    fn friend_baselines(&self, user_id: UserId) -> BTreeMap<FriendId, Decimal>;

    /// Account movements inside `window`, grouped by account and kind.
    fn account_totals(&self, user_id: UserId, window: Window) -> Vec<AccountMovementTotal>;

    /// Friend movements inside `window`, grouped by friend and kind.
    fn friend_totals(&self, user_id: UserId, window: Window) -> Vec<FriendMovementTotal>;

    /// Category movements inside `window`, grouped by category and kind.
    fn category_totals(&self, user_id: UserId, window: Window) -> Vec<CategoryMovementTotal>;

    /// Movements inside `window`, grouped by bucket, entity and kind.
    fn bucketed_totals(
        &self,
        user_id: UserId,
        bucketing: &Bucketing,
        tz: Tz,
        window: Window,
    ) -> BucketedRows;

    /// The EMI, if it exists and belongs to `user`.
    fn emi_record(&self, emi_id: EmiId, user_id: UserId) -> Result<EmiRecord, StoreError>;

    /// Highest installment linked to the EMI.
    fn max_linked_installment(&self, emi_id: EmiId) -> Option<u32>;

    /// Balance of every account and friend at `as_of`.
    ///
    /// With no `as_of` every entity resolves to its baseline.
    fn starting_balances(
        &self,
        user_id: UserId,
        as_of: Option<DateTime<Utc>>,
    ) -> StartingBalances {
        let prior_accounts = as_of.map(|at| {
            TransferSummarizer::accounts(&self.account_totals(user_id, Window::before(at)))
        });
        let prior_friends = as_of.map(|at| {
            TransferSummarizer::friends(&self.friend_totals(user_id, Window::before(at)))
        });

        let accounts =
            StartingBalanceResolver::resolve_all(self.account_baselines(user_id), as_of, |id| {
                prior_accounts.as_ref().and_then(|m| m.get(&id).copied())
            });
        let friends =
            StartingBalanceResolver::resolve_all(self.friend_baselines(user_id), as_of, |id| {
                prior_friends.as_ref().and_then(|m| m.get(&id).copied())
            });

        StartingBalances {
            accounts: accounts.into_iter().collect(),
            friends: friends.into_iter().collect(),
        }
    }
}

/// One ungrouped account movement.
struct AccountMovement {
    at: DateTime<Utc>,
    account_id: AccountId,
    kind: EventKind,
    amount: Decimal,
}

/// One ungrouped friend movement.
struct FriendMovement {
    at: DateTime<Utc>,
    friend_id: FriendId,
    kind: FriendMovementKind,
    amount: Decimal,
}

/// One ungrouped category movement.
struct CategoryMovement<'a> {
    at: DateTime<Utc>,
    category: &'a str,
    kind: CategoryMovementKind,
    amount: Decimal,
}

impl LedgerState {
    fn account_movements(&self, user_id: UserId) -> Vec<AccountMovement> {
        let statements = self
            .statements
            .values()
            .filter(|s| s.user_id == user_id)
            .filter_map(|s| {
                s.account_id.map(|account_id| AccountMovement {
                    at: s.occurred_at,
                    account_id,
                    kind: s.kind.event_kind(),
                    amount: s.amount,
                })
            });
        let transfers = self
            .self_transfers
            .values()
            .filter(|t| t.user_id == user_id)
            .flat_map(|t| {
                [
                    AccountMovement {
                        at: t.occurred_at,
                        account_id: t.from_account_id,
                        kind: EventKind::SelfTransfer,
                        amount: -t.amount,
                    },
                    AccountMovement {
                        at: t.occurred_at,
                        account_id: t.to_account_id,
                        kind: EventKind::SelfTransfer,
                        amount: t.amount,
                    },
                ]
            });
        statements.chain(transfers).collect()
    }

    fn friend_movements(&self, user_id: UserId) -> Vec<FriendMovement> {
        let statements = self
            .statements
            .values()
            .filter(|s| s.user_id == user_id)
            .filter_map(|s| {
                let friend_id = s.friend_id?;
                let kind = match s.kind {
                    StatementKind::Expense if s.account_id.is_none() => {
                        FriendMovementKind::PaidByFriend
                    }
                    StatementKind::FriendTransaction => FriendMovementKind::FriendTransaction,
                    _ => return None,
                };
                Some(FriendMovement {
                    at: s.occurred_at,
                    friend_id,
                    kind,
                    amount: s.amount,
                })
            });
        let splits = self
            .splits
            .values()
            .filter(|sp| sp.user_id == user_id)
            .filter_map(|sp| {
                let parent = self.statements.get(&sp.statement_id)?;
                Some(FriendMovement {
                    at: parent.occurred_at,
                    friend_id: sp.friend_id,
                    kind: FriendMovementKind::Split,
                    amount: sp.amount,
                })
            });
        statements.chain(splits).collect()
    }

    fn category_movements(&self, user_id: UserId) -> Vec<CategoryMovement<'_>> {
        let expenses = self
            .statements
            .values()
            .filter(|s| s.user_id == user_id && s.kind == StatementKind::Expense)
            .map(|s| CategoryMovement {
                at: s.occurred_at,
                category: s.category.as_str(),
                kind: CategoryMovementKind::Expense,
                amount: s.amount,
            });
        let splits = self
            .splits
            .values()
            .filter(|sp| sp.user_id == user_id)
            .filter_map(|sp| {
                let parent = self.statements.get(&sp.statement_id)?;
                (parent.kind == StatementKind::Expense).then(|| CategoryMovement {
                    at: parent.occurred_at,
                    category: parent.category.as_str(),
                    kind: CategoryMovementKind::Split,
                    amount: sp.amount,
                })
            });
        expenses.chain(splits).collect()
    }
}

fn group<K: Ord>(entries: impl Iterator<Item = (K, Decimal)>) -> BTreeMap<K, Decimal> {
    let mut grouped: BTreeMap<K, Decimal> = BTreeMap::new();
    for (key, amount) in entries {
        let slot = grouped.entry(key).or_insert(Decimal::ZERO);
        *slot = MoneyMath::add(*slot, amount);
    }
    grouped
}

impl LedgerQuery for LedgerState {
    fn account_baselines(&self, user_id: UserId) -> BTreeMap<AccountId, Decimal> {
        self.accounts
            .values()
            .filter(|a| a.user_id == user_id)
            .map(|a| (a.id, a.starting_balance))
            .collect()
    }

    fn friend_baselines(&self, user_id: UserId) -> BTreeMap<FriendId, Decimal> {
        self.friends
            .values()
            .filter(|f| f.user_id == user_id)
            .map(|f| (f.id, Decimal::ZERO))
            .collect()
    }

    fn account_totals(&self, user_id: UserId, window: Window) -> Vec<AccountMovementTotal> {
        let movements = self.account_movements(user_id);
        let grouped = group(
            movements
                .iter()
                .filter(|m| window.contains(m.at))
                .map(|m| ((m.account_id, m.kind), m.amount)),
        );
        tracing::debug!(user_id = %user_id, rows = grouped.len(), "account totals");
        grouped
            .into_iter()
            .map(|((account_id, kind), total)| AccountMovementTotal {
                account_id,
                kind,
                total,
            })
            .collect()
    }

    fn friend_totals(&self, user_id: UserId, window: Window) -> Vec<FriendMovementTotal> {
        let movements = self.friend_movements(user_id);
        let grouped = group(
            movements
                .iter()
                .filter(|m| window.contains(m.at))
                .map(|m| ((m.friend_id, m.kind), m.amount)),
        );
        tracing::debug!(user_id = %user_id, rows = grouped.len(), "friend totals");
        grouped
            .into_iter()
            .map(|((friend_id, kind), total)| FriendMovementTotal {
                friend_id,
                kind,
                total,
            })
            .collect()
    }

    fn category_totals(&self, user_id: UserId, window: Window) -> Vec<CategoryMovementTotal> {
        let movements = self.category_movements(user_id);
        group(
            movements
                .iter()
                .filter(|m| window.contains(m.at))
                .map(|m| ((m.category, m.kind), m.amount)),
        )
        .into_iter()
        .map(|((category, kind), total)| CategoryMovementTotal {
            category: category.to_string(),
            kind,
            total,
        })
        .collect()
    }

    fn bucketed_totals(
        &self,
        user_id: UserId,
        bucketing: &Bucketing,
        tz: Tz,
        window: Window,
    ) -> BucketedRows {
        let accounts = group(
            self.account_movements(user_id)
                .into_iter()
                .filter(|m| window.contains(m.at))
                .map(|m| ((bucketing.bucket_start(m.at, tz), m.account_id, m.kind), m.amount)),
        );
        let friends = group(
            self.friend_movements(user_id)
                .into_iter()
                .filter(|m| window.contains(m.at))
                .map(|m| ((bucketing.bucket_start(m.at, tz), m.friend_id, m.kind), m.amount)),
        );
        let categories = group(
            self.category_movements(user_id)
                .into_iter()
                .filter(|m| window.contains(m.at))
                .map(|m| ((bucketing.bucket_start(m.at, tz), m.category, m.kind), m.amount)),
        );
        tracing::debug!(
            user_id = %user_id,
            account_rows = accounts.len(),
            friend_rows = friends.len(),
            category_rows = categories.len(),
            "bucketed totals"
        );

        BucketedRows {
            accounts: accounts
                .into_iter()
                .map(|((bucket, account_id, kind), total)| {
                    Bucketed::new(bucket, AccountMovementTotal { account_id, kind, total })
                })
                .collect(),
            friends: friends
                .into_iter()
                .map(|((bucket, friend_id, kind), total)| {
                    Bucketed::new(bucket, FriendMovementTotal { friend_id, kind, total })
                })
                .collect(),
            categories: categories
                .into_iter()
                .map(|((bucket, category, kind), total)| {
                    Bucketed::new(
                        bucket,
                        CategoryMovementTotal {
                            category: category.to_string(),
                            kind,
                            total,
                        },
                    )
                })
                .collect(),
        }
    }

    fn emi_record(&self, emi_id: EmiId, user_id: UserId) -> Result<EmiRecord, StoreError> {
        self.emis
            .get(&emi_id)
            .filter(|e| e.user_id == user_id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("emi", emi_id))
    }

    fn max_linked_installment(&self, emi_id: EmiId) -> Option<u32> {
        self.statements
            .values()
            .filter_map(|s| s.emi_link)
            .filter(|link| link.emi_id == emi_id)
            .map(|link| link.installment)
            .max()
    }
}
