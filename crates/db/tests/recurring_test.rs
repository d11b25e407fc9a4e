//! Recurring payment repository tests.
//!
//! These tests verify that:
//! - Due dates follow the rule and stop at its end date
//! - Payments match the nearest due date inside the configured window
//! - Invalid rules and foreign accounts are rejected
//! - Payments are only visible to their owner

use chrono::NaiveDate;
use ledgerline_core::recurring::Frequency;
use ledgerline_db::repositories::{
    AccountRepository, CreateAccountInput, CreateRecurringPaymentInput, RecurringPaymentRepository,
};
use ledgerline_db::{MemoryStore, StoreError};
use ledgerline_shared::RecurringConfig;
use ledgerline_shared::types::{AccountId, UserId};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn date(m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, m, d).unwrap()
}

async fn account(store: &MemoryStore, user: UserId) -> AccountId {
    AccountRepository::new(store.clone())
        .create_account(CreateAccountInput {
            user_id: user,
            name: "Current".to_string(),
            starting_balance: Decimal::ZERO,
        })
        .await
        .unwrap()
        .id
}

fn rent(user: UserId, account_id: Option<AccountId>) -> CreateRecurringPaymentInput {
    CreateRecurringPaymentInput {
        user_id: user,
        name: "Rent".to_string(),
        amount: dec!(1500),
        account_id,
        start_date: date(1, 15),
        end_date: Some(date(6, 15)),
        frequency: Frequency::Monthly,
        multiplier: 1,
    }
}

fn repository(store: &MemoryStore) -> RecurringPaymentRepository {
    let config = RecurringConfig::default();
    RecurringPaymentRepository::new(store.clone(), config.match_window_days)
}

#[tokio::test]
async fn test_due_dates_and_matching() {
    let store = MemoryStore::new();
    let user = UserId::new();
    let account_id = account(&store, user).await;
    let repo = repository(&store);

    let payment = repo.create(rent(user, Some(account_id))).await.unwrap();

    let due = repo.due_dates(user, payment.id, date(2, 1), date(4, 30)).await.unwrap();
    assert_eq!(due, vec![date(2, 15), date(3, 15), date(4, 15)]);

    // Nothing after the end date.
    let tail = repo.due_dates(user, payment.id, date(6, 1), date(12, 31)).await.unwrap();
    assert_eq!(tail, vec![date(6, 15)]);

    assert_eq!(repo.match_due_date(user, payment.id, date(3, 17)).await.unwrap(), date(3, 15));
    assert_eq!(repo.match_due_date(user, payment.id, date(4, 12)).await.unwrap(), date(4, 15));

    let err = repo.match_due_date(user, payment.id, date(3, 25)).await.unwrap_err();
    assert_eq!(err.error_code(), "NO_DUE_DATE_IN_WINDOW");
    let err = repo.match_due_date(user, payment.id, date(7, 15)).await.unwrap_err();
    assert_eq!(err.error_code(), "NO_DUE_DATE_IN_WINDOW");
}

#[tokio::test]
async fn test_wider_window_reaches_further() {
    let store = MemoryStore::new();
    let user = UserId::new();
    let repo = RecurringPaymentRepository::new(store.clone(), 10);
    let payment = repo.create(rent(user, None)).await.unwrap();

    assert_eq!(repo.match_due_date(user, payment.id, date(3, 25)).await.unwrap(), date(3, 15));
}

#[tokio::test]
async fn test_rejects_invalid_rules_and_foreign_accounts() {
    let store = MemoryStore::new();
    let user = UserId::new();
    let repo = repository(&store);

    let mut zero = rent(user, None);
    zero.multiplier = 0;
    let err = repo.create(zero).await.unwrap_err();
    assert_eq!(err.error_code(), "ZERO_MULTIPLIER");

    let mut backwards = rent(user, None);
    backwards.end_date = Some(date(1, 1));
    let err = repo.create(backwards).await.unwrap_err();
    assert_eq!(err.error_code(), "END_BEFORE_START");

    let foreign = account(&store, UserId::new()).await;
    let err = repo.create(rent(user, Some(foreign))).await.unwrap_err();
    assert!(matches!(err, StoreError::NotOwned { .. }));

    assert!(repo.list(user).await.is_empty());
}

#[tokio::test]
async fn test_payments_are_scoped_to_the_owner() {
    let store = MemoryStore::new();
    let user = UserId::new();
    let repo = repository(&store);
    let payment = repo.create(rent(user, None)).await.unwrap();

    let listed = repo.list(user).await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, payment.id);

    let stranger = UserId::new();
    assert!(repo.list(stranger).await.is_empty());
    let err = repo
        .due_dates(stranger, payment.id, date(1, 1), date(12, 31))
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "NOT_FOUND");
}
