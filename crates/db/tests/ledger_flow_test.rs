//! End-to-end repository tests over a shared store.
//!
//! These tests verify that:
//! - Window balances are additive across adjacent windows
//! - Self transfers net to zero across the user's accounts
//! - Bucketed reports carry balances and preserve category sums
//! - EMI links advance in order and unlink only from the top
//! - Linked statements cannot be deleted out of order
//! - EMI updates keep every linked installment on the schedule

#![allow(clippy::too_many_lines)]

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use ledgerline_core::emi::{EmiInput, EmiSplit, EmiTerms};
use ledgerline_core::ledger::StatementKind;
use ledgerline_core::reports::TimeUnit;
use ledgerline_db::repositories::{
    AccountRepository, BoundaryRepository, CreateAccountInput, CreateEmiInput, CreateFriendInput,
    CreateSelfTransferInput, CreateSplitInput, CreateStatementInput, EmiRepository, Grouping,
    ReportRepository, SplitRepository, StatementRepository, UpdateEmiInput,
};
use ledgerline_db::{MemoryStore, StoreError};
use ledgerline_shared::types::{AccountId, FriendId, StatementId, UserId};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn at(month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, month, day, 10, 0, 0).unwrap()
}

struct Ledger {
    store: MemoryStore,
    user: UserId,
    bank: AccountId,
    wallet: AccountId,
    friend: FriendId,
}

async fn ledger() -> Ledger {
    let store = MemoryStore::new();
    let accounts = AccountRepository::new(store.clone());
    let user = UserId::new();
    let bank = accounts
        .create_account(CreateAccountInput {
            user_id: user,
            name: "Bank".to_string(),
            starting_balance: dec!(1000),
        })
        .await
        .unwrap()
        .id;
    let wallet = accounts
        .create_account(CreateAccountInput {
            user_id: user,
            name: "Wallet".to_string(),
            starting_balance: Decimal::ZERO,
        })
        .await
        .unwrap()
        .id;
    let friend = accounts
        .create_friend(CreateFriendInput {
            user_id: user,
            name: "Alex".to_string(),
        })
        .await
        .unwrap()
        .id;
    Ledger {
        store,
        user,
        bank,
        wallet,
        friend,
    }
}

async fn expense(l: &Ledger, amount: Decimal, category: &str, when: DateTime<Utc>) -> StatementId {
    StatementRepository::new(l.store.clone())
        .create(CreateStatementInput {
            user_id: l.user,
            kind: StatementKind::Expense,
            amount,
            category: category.to_string(),
            tags: Vec::new(),
            account_id: Some(l.bank),
            friend_id: None,
            occurred_at: when,
        })
        .await
        .unwrap()
        .id
}

async fn populate(l: &Ledger) {
    let statements = StatementRepository::new(l.store.clone());
    let splits = SplitRepository::new(l.store.clone());

    let dinner = expense(l, dec!(90), "food", at(1, 10)).await;
    splits
        .create(CreateSplitInput {
            user_id: l.user,
            statement_id: dinner,
            friend_id: l.friend,
            amount: dec!(45),
        })
        .await
        .unwrap();
    expense(l, dec!(30), "travel", at(2, 3)).await;
    statements
        .create(CreateStatementInput {
            user_id: l.user,
            kind: StatementKind::OutsideTransaction,
            amount: dec!(400),
            category: "salary".to_string(),
            tags: vec!["income".to_string()],
            account_id: Some(l.bank),
            friend_id: None,
            occurred_at: at(2, 1),
        })
        .await
        .unwrap();
    statements
        .create(CreateStatementInput {
            user_id: l.user,
            kind: StatementKind::FriendTransaction,
            amount: dec!(45),
            category: "settle".to_string(),
            tags: Vec::new(),
            account_id: Some(l.bank),
            friend_id: Some(l.friend),
            occurred_at: at(2, 20),
        })
        .await
        .unwrap();
    statements
        .create_self_transfer(CreateSelfTransferInput {
            user_id: l.user,
            from_account_id: l.bank,
            to_account_id: l.wallet,
            amount: dec!(100),
            occurred_at: at(3, 5),
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn test_window_reports_are_additive() {
    let l = ledger().await;
    populate(&l).await;
    let reports = ReportRepository::new(l.store.clone(), chrono_tz::UTC);

    let cut = at(2, 15);
    let first = reports.window_report(l.user, None, Some(cut)).await.unwrap();
    let second = reports.window_report(l.user, Some(cut), None).await.unwrap();
    let whole = reports.window_report(l.user, None, None).await.unwrap();

    for row in &whole.accounts {
        let a = first.accounts.iter().find(|r| r.entity_id == row.entity_id).unwrap();
        let b = second.accounts.iter().find(|r| r.entity_id == row.entity_id).unwrap();
        assert_eq!(a.final_balance, b.starting_balance);
        assert_eq!(b.final_balance, row.final_balance);
    }

    let bank = whole.accounts.iter().find(|r| r.entity_id == l.bank).unwrap();
    // 1000 - 90 - 30 + 400 + 45 - 100
    assert_eq!(bank.final_balance, dec!(1225));

    let friend = whole.friends.iter().find(|r| r.entity_id == l.friend).unwrap();
    // split -45, paid back +45
    assert_eq!(friend.final_balance, Decimal::ZERO);
    assert_eq!(friend.summary.splits, dec!(45));
}

#[tokio::test]
async fn test_self_transfers_sum_to_zero() {
    let l = ledger().await;
    populate(&l).await;
    let reports = ReportRepository::new(l.store.clone(), chrono_tz::UTC);
    let window = reports.window_report(l.user, Some(at(3, 1)), Some(at(4, 1))).await.unwrap();

    let net: Decimal = window.accounts.iter().map(|r| r.summary.self_transfers).sum();
    assert_eq!(net, Decimal::ZERO);
    let wallet = window.accounts.iter().find(|r| r.entity_id == l.wallet).unwrap();
    assert_eq!(wallet.final_balance, dec!(100));
}

#[tokio::test]
async fn test_monthly_buckets_carry_balances_and_categories() {
    let l = ledger().await;
    populate(&l).await;
    let reports = ReportRepository::new(l.store.clone(), chrono_tz::UTC);

    let buckets = reports
        .bucketed_report(l.user, Grouping::Unit(TimeUnit::Month), None, None, at(6, 1))
        .await
        .unwrap();
    let starts: Vec<DateTime<Utc>> = buckets.iter().map(|b| b.bucket_start).collect();
    assert_eq!(
        starts,
        vec![
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
        ]
    );

    let january = &buckets[0];
    assert_eq!(january.categories["food"], dec!(45));
    assert_eq!(january.categories["travel"], Decimal::ZERO);
    assert_eq!(january.total_expenses, dec!(45));
    // Every known account appears in every bucket.
    assert_eq!(january.accounts.len(), 2);

    let total: Decimal = buckets.iter().map(|b| b.total_expenses).sum();
    assert_eq!(total, dec!(75));

    for pair in buckets.windows(2) {
        for row in &pair[1].accounts {
            let previous = pair[0].accounts.iter().find(|r| r.entity_id == row.entity_id).unwrap();
            assert_eq!(previous.final_balance, row.starting_balance);
        }
    }
}

#[tokio::test]
async fn test_custom_boundaries() {
    let l = ledger().await;
    populate(&l).await;
    let boundaries = BoundaryRepository::new(l.store.clone());
    boundaries.add(l.user, at(2, 15)).await;
    // Ignored: after now.
    boundaries.add(l.user, at(12, 1)).await;

    let buckets = ReportRepository::new(l.store.clone(), chrono_tz::UTC)
        .bucketed_report(l.user, Grouping::Boundaries, None, None, at(6, 1))
        .await
        .unwrap();
    let starts: Vec<DateTime<Utc>> = buckets.iter().map(|b| b.bucket_start).collect();
    assert_eq!(starts, vec![DateTime::<Utc>::UNIX_EPOCH, at(2, 15)]);
}

#[tokio::test]
async fn test_inverted_window_is_rejected() {
    let l = ledger().await;
    let err = ReportRepository::new(l.store.clone(), chrono_tz::UTC)
        .window_report(l.user, Some(at(3, 1)), Some(at(2, 1)))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Report(_)));
}

fn loan_terms() -> EmiTerms {
    EmiTerms {
        input: EmiInput::Principal(dec!(1200)),
        annual_rate: Decimal::ZERO,
        tenure: 3,
        gst_rate: Decimal::ZERO,
        processing_fees: dec!(100),
        processing_fees_gst_rate: Decimal::ZERO,
        iafe: Decimal::ZERO,
        first_installment_date: NaiveDate::from_ymd_opt(2024, 2, 5).unwrap(),
        processing_fees_date: Some(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()),
    }
}

#[tokio::test]
async fn test_emi_link_and_unlink_in_order() {
    let l = ledger().await;
    let emis = EmiRepository::new(l.store.clone());
    let emi = emis
        .create(CreateEmiInput {
            user_id: l.user,
            name: "Phone".to_string(),
            terms: loan_terms(),
            account_id: Some(l.bank),
            splits: Vec::new(),
        })
        .await
        .unwrap();
    assert_eq!(emi.emi, dec!(400));

    let fee = expense(&l, dec!(100), "loan", at(1, 5)).await;
    let first = expense(&l, dec!(405), "loan", at(2, 7)).await;
    let second = expense(&l, dec!(400), "loan", at(3, 5)).await;

    // Installment 1 is not next while the fee is unlinked.
    let err = emis.link(l.user, emi.id, first, Some(1)).await.unwrap_err();
    assert_eq!(err.error_code(), "NOT_NEXT_INSTALLMENT");

    assert_eq!(emis.link(l.user, emi.id, fee, None).await.unwrap().installment, 0);
    assert_eq!(emis.link(l.user, emi.id, first, None).await.unwrap().installment, 1);
    assert_eq!(emis.link(l.user, emi.id, second, Some(2)).await.unwrap().installment, 2);

    let status = emis.status(l.user, emi.id).await.unwrap();
    assert_eq!(status.next_installment, Some(3));
    assert_eq!(status.outstanding_balance, dec!(400));

    let err = emis.unlink(l.user, first).await.unwrap_err();
    assert_eq!(err.error_code(), "NOT_LAST_LINKED");

    let statements = StatementRepository::new(l.store.clone());
    assert!(statements.delete(l.user, fee).await.is_err());

    emis.unlink(l.user, second).await.unwrap();
    statements.delete(l.user, first).await.unwrap();
    let status = emis.status(l.user, emi.id).await.unwrap();
    assert_eq!(status.next_installment, Some(1));
}

#[tokio::test]
async fn test_emi_update_keeps_linked_installments_on_schedule() {
    let l = ledger().await;
    let emis = EmiRepository::new(l.store.clone());
    let emi = emis
        .create(CreateEmiInput {
            user_id: l.user,
            name: "Phone".to_string(),
            terms: loan_terms(),
            account_id: Some(l.bank),
            splits: Vec::new(),
        })
        .await
        .unwrap();

    let fee = expense(&l, dec!(100), "loan", at(1, 5)).await;
    let first = expense(&l, dec!(400), "loan", at(2, 5)).await;
    let second = expense(&l, dec!(400), "loan", at(3, 5)).await;
    for statement in [fee, first, second] {
        emis.link(l.user, emi.id, statement, None).await.unwrap();
    }

    let mut shorter = loan_terms();
    shorter.tenure = 1;
    let err = emis
        .update(
            l.user,
            emi.id,
            UpdateEmiInput {
                terms: Some(shorter),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "VALIDATION_ERROR");

    // Dropping the fee would renumber the linked installments.
    let mut no_fee = loan_terms();
    no_fee.processing_fees = Decimal::ZERO;
    let err = emis
        .update(
            l.user,
            emi.id,
            UpdateEmiInput {
                terms: Some(no_fee),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "VALIDATION_ERROR");

    // Rejected updates leave the loan as it was.
    assert_eq!(emis.schedule(l.user, emi.id).await.unwrap().tenure(), 3);
    let status = emis.status(l.user, emi.id).await.unwrap();
    assert_eq!(status.next_installment, Some(3));

    let mut longer = loan_terms();
    longer.tenure = 6;
    let updated = emis
        .update(
            l.user,
            emi.id,
            UpdateEmiInput {
                terms: Some(longer),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.emi, dec!(200));

    let status = emis.status(l.user, emi.id).await.unwrap();
    assert_eq!(status.next_installment, Some(3));
    assert_eq!(status.outstanding_balance, dec!(800));
    assert!(!status.fully_paid);
}

#[tokio::test]
async fn test_emi_friend_shares_sum_to_installment() {
    let l = ledger().await;
    let other = AccountRepository::new(l.store.clone())
        .create_friend(CreateFriendInput {
            user_id: l.user,
            name: "Sam".to_string(),
        })
        .await
        .unwrap()
        .id;
    let emis = EmiRepository::new(l.store.clone());
    let emi = emis
        .create(CreateEmiInput {
            user_id: l.user,
            name: "Sofa".to_string(),
            terms: loan_terms(),
            account_id: Some(l.bank),
            splits: vec![
                EmiSplit {
                    friend_id: l.friend,
                    percentage: dec!(60),
                },
                EmiSplit {
                    friend_id: other,
                    percentage: dec!(40),
                },
            ],
        })
        .await
        .unwrap();

    let shares = emis.friend_shares(l.user, emi.id).await.unwrap();
    assert_eq!(shares, vec![(l.friend, dec!(240)), (other, dec!(160))]);
    let total: Decimal = shares.iter().map(|(_, share)| *share).sum();
    assert_eq!(total, emi.emi);

    let stranger = UserId::new();
    let err = emis.friend_shares(stranger, emi.id).await.unwrap_err();
    assert_eq!(err.error_code(), "NOT_FOUND");
}

#[tokio::test]
async fn test_emi_link_rejects_mismatched_amount() {
    let l = ledger().await;
    let emis = EmiRepository::new(l.store.clone());
    let mut terms = loan_terms();
    terms.processing_fees = Decimal::ZERO;
    let emi = emis
        .create(CreateEmiInput {
            user_id: l.user,
            name: "Laptop".to_string(),
            terms,
            account_id: None,
            splits: Vec::new(),
        })
        .await
        .unwrap();

    let statement = expense(&l, dec!(420), "loan", at(2, 5)).await;
    let err = emis.link(l.user, emi.id, statement, None).await.unwrap_err();
    assert_eq!(err.error_code(), "AMOUNT_OUT_OF_TOLERANCE");

    let deleted = emis.delete(l.user, emi.id).await.unwrap();
    assert_eq!(deleted, 0);
}

#[tokio::test]
async fn test_delete_statement_cascades_splits() {
    let l = ledger().await;
    let dinner = expense(&l, dec!(60), "food", at(1, 1)).await;
    let splits = SplitRepository::new(l.store.clone());
    splits
        .create(CreateSplitInput {
            user_id: l.user,
            statement_id: dinner,
            friend_id: l.friend,
            amount: dec!(20),
        })
        .await
        .unwrap();

    StatementRepository::new(l.store.clone()).delete(l.user, dinner).await.unwrap();
    assert!(l.store.snapshot().await.splits.is_empty());
}

#[tokio::test]
async fn test_statement_amount_cannot_drop_below_splits() {
    let l = ledger().await;
    let dinner = expense(&l, dec!(60), "food", at(1, 1)).await;
    SplitRepository::new(l.store.clone())
        .create(CreateSplitInput {
            user_id: l.user,
            statement_id: dinner,
            friend_id: l.friend,
            amount: dec!(50),
        })
        .await
        .unwrap();

    let err = StatementRepository::new(l.store.clone())
        .update(
            l.user,
            dinner,
            ledgerline_db::repositories::UpdateStatementInput {
                amount: Some(dec!(40)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "AMOUNT_BELOW_SPLITS");
}
