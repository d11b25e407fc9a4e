//! Report generation.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use ledgerline_shared::types::money::MoneyMath;
use ledgerline_shared::types::{AccountId, FriendId};
use rust_decimal::Decimal;

use super::error::ReportError;
use super::types::{BucketReport, BucketedRows, WindowReport};
use crate::ledger::{
    AccountMovementTotal, CategoryMovementKind, CategoryMovementTotal, FriendMovementTotal,
    StartingBalanceResolver, TransferSummarizer,
};

/// Report service for window and time-series balances.
pub struct ReportService;

impl ReportService {
    /// Checks that a window is not inverted.
    pub fn validate_window(
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<(), ReportError> {
        match (start, end) {
            (Some(start), Some(end)) if start > end => {
                Err(ReportError::InvalidDateRange { start, end })
            }
            _ => Ok(()),
        }
    }

    /// Builds the balances of every entity over one window.
    ///
    /// `starting_*` holds the resolved balance of each entity at the window
    /// start; the rows hold the window's grouped movements.
    #[must_use]
    pub fn window_report(
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        starting_accounts: &BTreeMap<AccountId, Decimal>,
        starting_friends: &BTreeMap<FriendId, Decimal>,
        account_rows: &[AccountMovementTotal],
        friend_rows: &[FriendMovementTotal],
    ) -> WindowReport {
        let account_summaries = TransferSummarizer::accounts(account_rows);
        let friend_summaries = TransferSummarizer::friends(friend_rows);

        let accounts = StartingBalanceResolver::window_balances(
            with_row_entities(starting_accounts, account_summaries.keys().copied()),
            |id| account_summaries.get(id).copied(),
        );
        let friends = StartingBalanceResolver::window_balances(
            with_row_entities(starting_friends, friend_summaries.keys().copied()),
            |id| friend_summaries.get(id).copied(),
        );

        WindowReport {
            start,
            end,
            accounts,
            friends,
        }
    }

    /// Aggregates bucketed rows into a time series.
    ///
    /// Buckets are the distinct keys present in any row set, processed in
    /// ascending order. Each bucket starts from the previous bucket's final
    /// balances (the first from `starting_*`), and every known entity appears
    /// in every bucket.
    #[must_use]
    pub fn aggregate_buckets(
        starting_accounts: &BTreeMap<AccountId, Decimal>,
        starting_friends: &BTreeMap<FriendId, Decimal>,
        rows: &BucketedRows,
    ) -> Vec<BucketReport> {
        let mut account_groups: BTreeMap<DateTime<Utc>, Vec<&AccountMovementTotal>> =
            BTreeMap::new();
        for row in &rows.accounts {
            account_groups.entry(row.bucket_start).or_default().push(&row.row);
        }
        let mut friend_groups: BTreeMap<DateTime<Utc>, Vec<&FriendMovementTotal>> = BTreeMap::new();
        for row in &rows.friends {
            friend_groups.entry(row.bucket_start).or_default().push(&row.row);
        }
        let mut category_groups: BTreeMap<DateTime<Utc>, Vec<&CategoryMovementTotal>> =
            BTreeMap::new();
        for row in &rows.categories {
            category_groups.entry(row.bucket_start).or_default().push(&row.row);
        }

        let keys: BTreeSet<DateTime<Utc>> = account_groups
            .keys()
            .chain(friend_groups.keys())
            .chain(category_groups.keys())
            .copied()
            .collect();
        let categories: BTreeSet<&str> = rows
            .categories
            .iter()
            .map(|row| row.row.category.as_str())
            .collect();

        let mut account_carry = with_row_entities(
            starting_accounts,
            rows.accounts.iter().map(|row| row.row.account_id),
        );
        let mut friend_carry = with_row_entities(
            starting_friends,
            rows.friends.iter().map(|row| row.row.friend_id),
        );

        let mut reports = Vec::with_capacity(keys.len());
        for bucket_start in keys {
            let account_summaries = TransferSummarizer::accounts(
                account_groups.get(&bucket_start).into_iter().flatten().copied(),
            );
            let friend_summaries = TransferSummarizer::friends(
                friend_groups.get(&bucket_start).into_iter().flatten().copied(),
            );

            let accounts = StartingBalanceResolver::window_balances(
                account_carry.iter().map(|(id, balance)| (*id, *balance)),
                |id| account_summaries.get(id).copied(),
            );
            let friends = StartingBalanceResolver::window_balances(
                friend_carry.iter().map(|(id, balance)| (*id, *balance)),
                |id| friend_summaries.get(id).copied(),
            );
            for row in &accounts {
                account_carry.insert(row.entity_id, row.final_balance);
            }
            for row in &friends {
                friend_carry.insert(row.entity_id, row.final_balance);
            }

            let breakdown = category_breakdown(
                &categories,
                category_groups.get(&bucket_start).map_or(&[][..], Vec::as_slice),
            );
            let total_expenses = MoneyMath::sum(breakdown.values().copied());

            reports.push(BucketReport {
                bucket_start,
                accounts,
                friends,
                total_expenses,
                categories: breakdown,
            });
        }
        reports
    }
}

/// Starting balances extended with zero for entities that only show up in rows.
fn with_row_entities<Id, I>(starting: &BTreeMap<Id, Decimal>, row_ids: I) -> BTreeMap<Id, Decimal>
where
    Id: Ord + Copy,
    I: IntoIterator<Item = Id>,
{
    let mut balances = starting.clone();
    for id in row_ids {
        balances.entry(id).or_insert(Decimal::ZERO);
    }
    balances
}

/// `expenses - splits` per category for one bucket.
///
/// Every category seen in the window gets an entry, zero when idle.
fn category_breakdown(
    categories: &BTreeSet<&str>,
    rows: &[&CategoryMovementTotal],
) -> BTreeMap<String, Decimal> {
    let mut breakdown: BTreeMap<String, Decimal> = categories
        .iter()
        .map(|category| ((*category).to_string(), Decimal::ZERO))
        .collect();
    for row in rows {
        let slot = breakdown.entry(row.category.clone()).or_insert(Decimal::ZERO);
        *slot = match row.kind {
            CategoryMovementKind::Expense => MoneyMath::add(*slot, row.total),
            CategoryMovementKind::Split => MoneyMath::sub(*slot, row.total),
        };
    }
    breakdown
}

#[cfg(test)]
mod unit_tests {
    use super::*;
    use crate::ledger::{Bucketed, EventKind, FriendMovementKind};
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_validate_window() {
        assert!(ReportService::validate_window(None, Some(day(1))).is_ok());
        assert!(ReportService::validate_window(Some(day(1)), Some(day(1))).is_ok());
        assert_eq!(
            ReportService::validate_window(Some(day(2)), Some(day(1))),
            Err(ReportError::InvalidDateRange {
                start: day(2),
                end: day(1)
            })
        );
    }

    #[test]
    fn test_window_report_includes_idle_accounts() {
        let busy = AccountId::new();
        let idle = AccountId::new();
        let starting = BTreeMap::from([(busy, dec!(100)), (idle, dec!(25))]);
        let rows = [AccountMovementTotal {
            account_id: busy,
            kind: EventKind::Expense,
            total: dec!(40),
        }];

        let report =
            ReportService::window_report(None, None, &starting, &BTreeMap::new(), &rows, &[]);

        let busy_row = report.accounts.iter().find(|r| r.entity_id == busy).unwrap();
        let idle_row = report.accounts.iter().find(|r| r.entity_id == idle).unwrap();
        assert_eq!(busy_row.final_balance, dec!(60));
        assert_eq!(idle_row.final_balance, dec!(25));
        assert!(report.friends.is_empty());
    }

    #[test]
    fn test_buckets_carry_balance_forward() {
        let account = AccountId::new();
        let friend = FriendId::new();
        let rows = BucketedRows {
            accounts: vec![
                Bucketed::new(
                    day(1),
                    AccountMovementTotal {
                        account_id: account,
                        kind: EventKind::OutsideTransaction,
                        total: dec!(1000),
                    },
                ),
                Bucketed::new(
                    day(3),
                    AccountMovementTotal {
                        account_id: account,
                        kind: EventKind::Expense,
                        total: dec!(300),
                    },
                ),
            ],
            friends: vec![Bucketed::new(
                day(2),
                FriendMovementTotal {
                    friend_id: friend,
                    kind: FriendMovementKind::Split,
                    total: dec!(50),
                },
            )],
            categories: vec![
                Bucketed::new(
                    day(3),
                    CategoryMovementTotal {
                        category: "food".to_string(),
                        kind: CategoryMovementKind::Expense,
                        total: dec!(300),
                    },
                ),
                Bucketed::new(
                    day(3),
                    CategoryMovementTotal {
                        category: "food".to_string(),
                        kind: CategoryMovementKind::Split,
                        total: dec!(50),
                    },
                ),
            ],
        };
        let starting = BTreeMap::from([(account, dec!(200))]);

        let buckets = ReportService::aggregate_buckets(&starting, &BTreeMap::new(), &rows);

        assert_eq!(
            buckets.iter().map(|b| b.bucket_start).collect::<Vec<_>>(),
            vec![day(1), day(2), day(3)]
        );
        let balances: Vec<(Decimal, Decimal)> = buckets
            .iter()
            .map(|b| (b.accounts[0].starting_balance, b.accounts[0].final_balance))
            .collect();
        assert_eq!(
            balances,
            vec![
                (dec!(200), dec!(1200)),
                (dec!(1200), dec!(1200)),
                (dec!(1200), dec!(900)),
            ]
        );

        // A friend that only moves on day 2 still appears in every bucket.
        assert!(buckets.iter().all(|b| b.friends.len() == 1));
        assert_eq!(buckets[2].friends[0].final_balance, dec!(-50));

        assert_eq!(buckets[0].categories.get("food"), Some(&Decimal::ZERO));
        assert_eq!(buckets[2].categories.get("food"), Some(&dec!(250)));
        assert_eq!(buckets[2].total_expenses, dec!(250));
    }

    #[test]
    fn test_no_rows_no_buckets() {
        let buckets = ReportService::aggregate_buckets(
            &BTreeMap::new(),
            &BTreeMap::new(),
            &BucketedRows::default(),
        );
        assert!(buckets.is_empty());
    }
}
