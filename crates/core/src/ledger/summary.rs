//! Transfer summaries.
//!
//! Reduces grouped movement totals into a canonical per-entity summary.
//!
//! - Account: `total = self_transfers + outside + friend_transactions - expenses`
//! - Friend: `total = paid_by_friend - splits + friend_transactions`
//!
//! An expense paid from an account lowers that account's balance, while an
//! expense a friend covered raises what we owe that friend. Splits lower what
//! we owe (the friend owes us their share).

use std::collections::BTreeMap;

use ledgerline_shared::types::money::MoneyMath;
use ledgerline_shared::types::{AccountId, FriendId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::types::{AccountMovementTotal, EventKind, FriendMovementKind, FriendMovementTotal};

/// Anything that contributes a net transfer total to a balance.
pub trait TransferTotal {
    /// Net effect on the entity's balance.
    fn total_transfers(&self) -> Decimal;
}

/// Per-account transfer summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountTransferSummary {
    /// Expenses paid from the account.
    pub expenses: Decimal,
    /// Signed outside transactions.
    pub outside_transactions: Decimal,
    /// Signed transactions with friends.
    pub friend_transactions: Decimal,
    /// Signed self-transfer legs.
    pub self_transfers: Decimal,
    /// Net effect on the balance.
    pub total_transfers: Decimal,
}

impl AccountTransferSummary {
    /// Adds a grouped total of one kind.
    pub fn record(&mut self, kind: EventKind, amount: Decimal) {
        let slot = match kind {
            EventKind::Expense => &mut self.expenses,
            EventKind::OutsideTransaction => &mut self.outside_transactions,
            EventKind::FriendTransaction => &mut self.friend_transactions,
            EventKind::SelfTransfer => &mut self.self_transfers,
        };
        *slot = MoneyMath::add(*slot, amount);
        self.total_transfers = MoneyMath::sub(
            MoneyMath::sum([
                self.self_transfers,
                self.outside_transactions,
                self.friend_transactions,
            ]),
            self.expenses,
        );
    }

    /// Builds a summary from `(kind, amount)` pairs.
    pub fn from_totals<I>(totals: I) -> Self
    where
        I: IntoIterator<Item = (EventKind, Decimal)>,
    {
        let mut summary = Self::default();
        for (kind, amount) in totals {
            summary.record(kind, amount);
        }
        summary
    }

    /// Combines two summaries covering disjoint periods.
    #[must_use]
    pub fn combine(&self, other: &Self) -> Self {
        Self::from_totals([
            (EventKind::Expense, self.expenses),
            (EventKind::OutsideTransaction, self.outside_transactions),
            (EventKind::FriendTransaction, self.friend_transactions),
            (EventKind::SelfTransfer, self.self_transfers),
            (EventKind::Expense, other.expenses),
            (EventKind::OutsideTransaction, other.outside_transactions),
            (EventKind::FriendTransaction, other.friend_transactions),
            (EventKind::SelfTransfer, other.self_transfers),
        ])
    }
}

impl TransferTotal for AccountTransferSummary {
    fn total_transfers(&self) -> Decimal {
        self.total_transfers
    }
}

/// Per-friend transfer summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendTransferSummary {
    /// Expenses the friend covered.
    pub paid_by_friend: Decimal,
    /// Shares of our expenses the friend owes back.
    pub splits: Decimal,
    /// Signed transactions with the friend.
    pub friend_transactions: Decimal,
    /// Net effect on the balance.
    pub total_transfers: Decimal,
}

impl FriendTransferSummary {
    /// Adds a grouped total of one kind.
    pub fn record(&mut self, kind: FriendMovementKind, amount: Decimal) {
        let slot = match kind {
            FriendMovementKind::PaidByFriend => &mut self.paid_by_friend,
            FriendMovementKind::Split => &mut self.splits,
            FriendMovementKind::FriendTransaction => &mut self.friend_transactions,
        };
        *slot = MoneyMath::add(*slot, amount);
        self.total_transfers = MoneyMath::add(
            MoneyMath::sub(self.paid_by_friend, self.splits),
            self.friend_transactions,
        );
    }

    /// Builds a summary from `(kind, amount)` pairs.
    pub fn from_totals<I>(totals: I) -> Self
    where
        I: IntoIterator<Item = (FriendMovementKind, Decimal)>,
    {
        let mut summary = Self::default();
        for (kind, amount) in totals {
            summary.record(kind, amount);
        }
        summary
    }

    /// Combines two summaries covering disjoint periods.
    #[must_use]
    pub fn combine(&self, other: &Self) -> Self {
        Self::from_totals([
            (FriendMovementKind::PaidByFriend, self.paid_by_friend),
            (FriendMovementKind::Split, self.splits),
            (FriendMovementKind::FriendTransaction, self.friend_transactions),
            (FriendMovementKind::PaidByFriend, other.paid_by_friend),
            (FriendMovementKind::Split, other.splits),
            (FriendMovementKind::FriendTransaction, other.friend_transactions),
        ])
    }
}

impl TransferTotal for FriendTransferSummary {
    fn total_transfers(&self) -> Decimal {
        self.total_transfers
    }
}

/// Reduces grouped rows into per-entity summaries.
pub struct TransferSummarizer;

impl TransferSummarizer {
    /// Summarizes account rows. Accounts without rows are absent from the map.
    pub fn accounts<'a, I>(rows: I) -> BTreeMap<AccountId, AccountTransferSummary>
    where
        I: IntoIterator<Item = &'a AccountMovementTotal>,
    {
        let mut summaries: BTreeMap<AccountId, AccountTransferSummary> = BTreeMap::new();
        for row in rows {
            summaries
                .entry(row.account_id)
                .or_default()
                .record(row.kind, row.total);
        }
        summaries
    }

    /// Summarizes friend rows. Friends without rows are absent from the map.
    pub fn friends<'a, I>(rows: I) -> BTreeMap<FriendId, FriendTransferSummary>
    where
        I: IntoIterator<Item = &'a FriendMovementTotal>,
    {
        let mut summaries: BTreeMap<FriendId, FriendTransferSummary> = BTreeMap::new();
        for row in rows {
            summaries
                .entry(row.friend_id)
                .or_default()
                .record(row.kind, row.total);
        }
        summaries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_empty_input_is_zero_summary() {
        let summary = AccountTransferSummary::from_totals([]);
        assert_eq!(summary, AccountTransferSummary::default());
        assert_eq!(summary.total_transfers(), Decimal::ZERO);

        let summaries = TransferSummarizer::friends(&[]);
        assert!(summaries.is_empty());
    }

    #[test]
    fn test_account_total_formula() {
        let summary = AccountTransferSummary::from_totals([
            (EventKind::Expense, dec!(250)),
            (EventKind::OutsideTransaction, dec!(1000)),
            (EventKind::FriendTransaction, dec!(-40)),
            (EventKind::SelfTransfer, dec!(-100)),
        ]);
        assert_eq!(summary.expenses, dec!(250));
        assert_eq!(summary.total_transfers, dec!(610));
    }

    #[test]
    fn test_friend_total_formula() {
        let summary = FriendTransferSummary::from_totals([
            (FriendMovementKind::PaidByFriend, dec!(300)),
            (FriendMovementKind::Split, dec!(120)),
            (FriendMovementKind::FriendTransaction, dec!(-100)),
        ]);
        assert_eq!(summary.total_transfers, dec!(80));
    }

    #[test]
    fn test_self_transfer_legs_cancel() {
        let from = AccountId::new();
        let to = AccountId::new();
        let rows = [
            AccountMovementTotal {
                account_id: from,
                kind: EventKind::SelfTransfer,
                total: dec!(-75.50),
            },
            AccountMovementTotal {
                account_id: to,
                kind: EventKind::SelfTransfer,
                total: dec!(75.50),
            },
        ];
        let summaries = TransferSummarizer::accounts(&rows);
        assert_eq!(summaries[&from].total_transfers, dec!(-75.50));
        assert_eq!(summaries[&to].total_transfers, dec!(75.50));
        let net: Decimal = summaries.values().map(|s| s.total_transfers).sum();
        assert_eq!(net, Decimal::ZERO);
    }

    #[test]
    fn test_rows_of_same_kind_accumulate() {
        let account = AccountId::new();
        let rows = [
            AccountMovementTotal {
                account_id: account,
                kind: EventKind::Expense,
                total: dec!(10),
            },
            AccountMovementTotal {
                account_id: account,
                kind: EventKind::Expense,
                total: dec!(5),
            },
        ];
        let summaries = TransferSummarizer::accounts(&rows);
        assert_eq!(summaries[&account].expenses, dec!(15));
        assert_eq!(summaries[&account].total_transfers, dec!(-15));
    }

    fn amount() -> impl Strategy<Value = Decimal> {
        (-1_000_000i64..1_000_000i64).prop_map(|n| Decimal::new(n, 2))
    }

    proptest! {
        /// Combining summaries of two periods equals summarizing both periods at once.
        #[test]
        fn prop_account_combine_is_additive(
            a in prop::collection::vec((0usize..4, amount()), 0..10),
            b in prop::collection::vec((0usize..4, amount()), 0..10),
        ) {
            let kinds = [
                EventKind::Expense,
                EventKind::OutsideTransaction,
                EventKind::FriendTransaction,
                EventKind::SelfTransfer,
            ];
            let left = AccountTransferSummary::from_totals(a.iter().map(|(k, v)| (kinds[*k], *v)));
            let right = AccountTransferSummary::from_totals(b.iter().map(|(k, v)| (kinds[*k], *v)));
            let both = AccountTransferSummary::from_totals(
                a.iter().chain(b.iter()).map(|(k, v)| (kinds[*k], *v)),
            );
            prop_assert_eq!(left.combine(&right), both);
            prop_assert_eq!(
                left.total_transfers + right.total_transfers,
                both.total_transfers
            );
        }

        #[test]
        fn prop_friend_combine_is_additive(
            a in prop::collection::vec((0usize..3, amount()), 0..10),
            b in prop::collection::vec((0usize..3, amount()), 0..10),
        ) {
            let kinds = [
                FriendMovementKind::PaidByFriend,
                FriendMovementKind::Split,
                FriendMovementKind::FriendTransaction,
            ];
            let left = FriendTransferSummary::from_totals(a.iter().map(|(k, v)| (kinds[*k], *v)));
            let right = FriendTransferSummary::from_totals(b.iter().map(|(k, v)| (kinds[*k], *v)));
            let both = FriendTransferSummary::from_totals(
                a.iter().chain(b.iter()).map(|(k, v)| (kinds[*k], *v)),
            );
            prop_assert_eq!(left.combine(&right), both);
        }
    }
}
