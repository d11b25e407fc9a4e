//! Concurrent access tests for split allocation.
//!
//! These tests verify that:
//! - Racing split inserts on one statement never exceed its amount
//! - Exactly as many inserts succeed as the cap allows
//! - Balances computed afterwards match the committed splits

#![allow(clippy::uninlined_format_args)]

use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use ledgerline_core::ledger::StatementKind;
use ledgerline_db::repositories::{
    AccountRepository, CreateAccountInput, CreateFriendInput, CreateSplitInput,
    CreateStatementInput, SplitRepository, StatementRepository,
};
use ledgerline_db::{LedgerQuery, MemoryStore, StoreError, Window};
use ledgerline_shared::types::{FriendId, StatementId, UserId};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio::sync::Barrier;

struct ConcurrentTestData {
    store: MemoryStore,
    user_id: UserId,
    statement_id: StatementId,
    friend_ids: Vec<FriendId>,
}

async fn setup(statement_amount: Decimal, friends: usize) -> ConcurrentTestData {
    let store = MemoryStore::new();
    let accounts = AccountRepository::new(store.clone());
    let user_id = UserId::new();

    let account = accounts
        .create_account(CreateAccountInput {
            user_id,
            name: "Card".to_string(),
            starting_balance: Decimal::ZERO,
        })
        .await
        .unwrap();

    let mut friend_ids = Vec::with_capacity(friends);
    for i in 0..friends {
        let friend = accounts
            .create_friend(CreateFriendInput {
                user_id,
                name: format!("friend-{}", i),
            })
            .await
            .unwrap();
        friend_ids.push(friend.id);
    }

    let statement = StatementRepository::new(store.clone())
        .create(CreateStatementInput {
            user_id,
            kind: StatementKind::Expense,
            amount: statement_amount,
            category: "dinner".to_string(),
            tags: Vec::new(),
            account_id: Some(account.id),
            friend_id: None,
            occurred_at: Utc::now(),
        })
        .await
        .unwrap();

    ConcurrentTestData {
        store,
        user_id,
        statement_id: statement.id,
        friend_ids,
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_splits_never_exceed_statement() {
    const FRIENDS: usize = 50;
    let data = setup(dec!(1000), FRIENDS).await;
    let repo = SplitRepository::new(data.store.clone());
    let barrier = Arc::new(Barrier::new(FRIENDS));

    let handles = data.friend_ids.iter().map(|&friend_id| {
        let repo = repo.clone();
        let barrier = Arc::clone(&barrier);
        let user_id = data.user_id;
        let statement_id = data.statement_id;
        tokio::spawn(async move {
            barrier.wait().await;
            repo.create(CreateSplitInput {
                user_id,
                statement_id,
                friend_id,
                amount: dec!(30),
            })
            .await
        })
    });

    let results: Vec<Result<_, StoreError>> = join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.expect("task panicked"))
        .collect();

    let succeeded = results.iter().filter(|r| r.is_ok()).count();
    let rejected = results
        .iter()
        .filter(|r| matches!(r, Err(e) if e.error_code() == "SPLIT_EXCEEDS_STATEMENT"))
        .count();

    // 1000 / 30 = 33 splits fit.
    assert_eq!(succeeded, 33);
    assert_eq!(rejected, FRIENDS - 33);

    let state = data.store.snapshot().await;
    let total: Decimal = state
        .splits
        .values()
        .filter(|sp| sp.statement_id == data.statement_id)
        .map(|sp| sp.amount)
        .sum();
    assert_eq!(total, dec!(990));
    assert!(total <= dec!(1000));

    let friend_rows = state.friend_totals(data.user_id, Window::all());
    let friend_total: Decimal = friend_rows.iter().map(|r| r.total).sum();
    assert_eq!(friend_total, dec!(990));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_bulk_and_single_splits_respect_cap() {
    let data = setup(dec!(100), 2).await;
    let repo = SplitRepository::new(data.store.clone());
    let barrier = Arc::new(Barrier::new(2));

    let bulk = {
        let repo = repo.clone();
        let barrier = Arc::clone(&barrier);
        let (user_id, friend_id, statement_id) =
            (data.user_id, data.friend_ids[0], data.statement_id);
        tokio::spawn(async move {
            barrier.wait().await;
            repo.bulk_apply(user_id, friend_id, dec!(60), &[statement_id]).await.map(|_| ())
        })
    };
    let single = {
        let repo = repo.clone();
        let barrier = Arc::clone(&barrier);
        let (user_id, friend_id, statement_id) =
            (data.user_id, data.friend_ids[1], data.statement_id);
        tokio::spawn(async move {
            barrier.wait().await;
            repo.create(CreateSplitInput {
                user_id,
                statement_id,
                friend_id,
                amount: dec!(60),
            })
            .await
            .map(|_| ())
        })
    };

    let outcomes = [bulk.await.unwrap(), single.await.unwrap()];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);

    let splits = repo.list_for_statement(data.user_id, data.statement_id).await.unwrap();
    assert_eq!(splits.len(), 1);
    assert_eq!(splits[0].amount, dec!(60));
}
