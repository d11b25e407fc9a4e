//! Split repository.
//!
//! Splits are only allowed on expense statements. Every check runs under the
//! same write guard as the insert, so concurrent requests can never push a
//! statement's splits past its amount.

use std::collections::BTreeSet;

use ledgerline_core::ledger::StatementKind;
use ledgerline_core::split::{SplitTarget, SplitValidator};
use ledgerline_shared::types::{FriendId, SplitId, StatementId, UserId};
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::error::StoreError;
use crate::records::{SplitRecord, StatementRecord};
use crate::store::MemoryStore;

/// Input for creating a split.
#[derive(Debug, Clone, Copy)]
pub struct CreateSplitInput {
    /// Owner.
    pub user_id: UserId,
    /// Parent statement.
    pub statement_id: StatementId,
    /// Friend owing the share.
    pub friend_id: FriendId,
    /// Share amount.
    pub amount: Decimal,
}

fn ensure_expense(statement: &StatementRecord) -> Result<(), StoreError> {
    if statement.kind != StatementKind::Expense {
        return Err(StoreError::Validation(format!(
            "statement {} is not an expense and cannot be split",
            statement.id
        )));
    }
    Ok(())
}

/// Repository for splits.
#[derive(Debug, Clone)]
pub struct SplitRepository {
    store: MemoryStore,
}

impl SplitRepository {
    /// Creates a new split repository.
    #[must_use]
    pub const fn new(store: MemoryStore) -> Self {
        Self { store }
    }

    /// Creates a split.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a missing statement, `Validation` for a
    /// non-expense statement and a split error when the friend already has a
    /// split or the cap would be exceeded.
    pub async fn create(&self, input: CreateSplitInput) -> Result<SplitRecord, StoreError> {
        let mut state = self.store.write().await;
        let statement = state.owned_statement(input.user_id, input.statement_id)?;
        ensure_expense(statement)?;
        let statement_amount = statement.amount;
        state.ensure_friend(input.user_id, input.friend_id)?;

        let checked = SplitValidator::ensure_no_duplicate(
            input.statement_id,
            state.splits_of(input.statement_id).map(|sp| sp.friend_id),
            input.friend_id,
        )
        .and_then(|()| {
            SplitValidator::validate_split(
                input.statement_id,
                statement_amount,
                state.split_total(input.statement_id, None),
                input.amount,
            )
        });
        if let Err(e) = checked {
            warn!(statement_id = %input.statement_id, error = %e, "split rejected");
            return Err(e.into());
        }

        let record = SplitRecord {
            id: SplitId::new(),
            user_id: input.user_id,
            statement_id: input.statement_id,
            friend_id: input.friend_id,
            amount: input.amount,
        };
        state.splits.insert(record.id, record.clone());
        info!(
            split_id = %record.id,
            statement_id = %record.statement_id,
            amount = %record.amount,
            "split created"
        );
        Ok(record)
    }

    /// Changes a split's amount.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a missing split and a split error when the new
    /// amount breaks the cap.
    pub async fn update(
        &self,
        user_id: UserId,
        split_id: SplitId,
        amount: Decimal,
    ) -> Result<SplitRecord, StoreError> {
        let mut state = self.store.write().await;
        let split = state
            .splits
            .get(&split_id)
            .filter(|sp| sp.user_id == user_id)
            .ok_or_else(|| StoreError::not_found("split", split_id))?;
        let statement_id = split.statement_id;
        let statement_amount = state
            .statements
            .get(&statement_id)
            .map(|s| s.amount)
            .ok_or_else(|| StoreError::not_found("statement", statement_id))?;

        let others = state.split_total(statement_id, Some(split_id));
        let checked =
            SplitValidator::validate_split(statement_id, statement_amount, others, amount);
        if let Err(e) = checked {
            warn!(split_id = %split_id, error = %e, "split update rejected");
            return Err(e.into());
        }

        let split = state
            .splits
            .get_mut(&split_id)
            .ok_or_else(|| StoreError::not_found("split", split_id))?;
        split.amount = amount;
        info!(split_id = %split_id, amount = %amount, "split updated");
        Ok(split.clone())
    }

    /// Deletes a split.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the split is missing or not owned.
    pub async fn delete(&self, user_id: UserId, split_id: SplitId) -> Result<(), StoreError> {
        let mut state = self.store.write().await;
        let owned = state.splits.get(&split_id).is_some_and(|sp| sp.user_id == user_id);
        if !owned {
            return Err(StoreError::not_found("split", split_id));
        }
        state.splits.remove(&split_id);
        info!(split_id = %split_id, "split deleted");
        Ok(())
    }

    /// Splits every listed statement with one friend at `percentage`.
    ///
    /// Either all splits are created or none are.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`/`Validation` for a bad statement and a split error
    /// when the percentage is invalid, above some statement's maximum, or the
    /// friend already has a split on one of them.
    pub async fn bulk_apply(
        &self,
        user_id: UserId,
        friend_id: FriendId,
        percentage: Decimal,
        statement_ids: &[StatementId],
    ) -> Result<Vec<SplitRecord>, StoreError> {
        let unique: BTreeSet<StatementId> = statement_ids.iter().copied().collect();

        let mut state = self.store.write().await;
        state.ensure_friend(user_id, friend_id)?;

        let mut targets = Vec::with_capacity(unique.len());
        for statement_id in unique {
            let statement = state.owned_statement(user_id, statement_id)?;
            ensure_expense(statement)?;
            targets.push(SplitTarget {
                statement_id,
                amount: statement.amount,
                existing_split_total: state.split_total(statement_id, None),
                friend_ids: state.splits_of(statement_id).map(|sp| sp.friend_id).collect(),
            });
        }

        let planned = match SplitValidator::plan_bulk(friend_id, percentage, &targets) {
            Ok(planned) => planned,
            Err(e) => {
                warn!(
                    friend_id = %friend_id,
                    percentage = %percentage,
                    error = %e,
                    "bulk split rejected"
                );
                return Err(e.into());
            }
        };

        let records: Vec<SplitRecord> = planned
            .into_iter()
            .map(|p| SplitRecord {
                id: SplitId::new(),
                user_id,
                statement_id: p.statement_id,
                friend_id: p.friend_id,
                amount: p.amount,
            })
            .collect();
        for record in &records {
            state.splits.insert(record.id, record.clone());
        }
        info!(friend_id = %friend_id, count = records.len(), "bulk split applied");
        Ok(records)
    }

    /// Splits of one of the caller's statements.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the statement is missing or not owned.
    pub async fn list_for_statement(
        &self,
        user_id: UserId,
        statement_id: StatementId,
    ) -> Result<Vec<SplitRecord>, StoreError> {
        let state = self.store.read().await;
        state.owned_statement(user_id, statement_id)?;
        Ok(state.splits_of(statement_id).cloned().collect())
    }
}
