//! Statement and self-transfer repository.
//!
//! Reference rules per statement kind:
//!
//! | kind                  | account  | friend   |
//! |-----------------------|----------|----------|
//! | `expense`             | optional | optional, at least one of the two |
//! | `outside_transaction` | required | none     |
//! | `friend_transaction`  | required | required |

use chrono::{DateTime, Utc};
use ledgerline_core::ledger::StatementKind;
use ledgerline_core::reconcile::Reconciler;
use ledgerline_core::split::SplitValidator;
use ledgerline_shared::types::{AccountId, FriendId, SelfTransferId, SplitId, StatementId, UserId};
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::error::StoreError;
use crate::query::LedgerQuery;
use crate::records::{SelfTransferRecord, StatementRecord};
use crate::store::{LedgerState, MemoryStore};

/// Input for creating a statement.
#[derive(Debug, Clone)]
pub struct CreateStatementInput {
    /// Owner.
    pub user_id: UserId,
    /// Statement kind.
    pub kind: StatementKind,
    /// Signed amount.
    pub amount: Decimal,
    /// Category label.
    pub category: String,
    /// Free-form tags.
    pub tags: Vec<String>,
    /// Account the money moved through.
    pub account_id: Option<AccountId>,
    /// Friend involved.
    pub friend_id: Option<FriendId>,
    /// When it happened.
    pub occurred_at: DateTime<Utc>,
}

/// Input for updating a statement. Kind and references are fixed.
#[derive(Debug, Clone, Default)]
pub struct UpdateStatementInput {
    /// New amount; must still cover the statement's splits.
    pub amount: Option<Decimal>,
    /// New category.
    pub category: Option<String>,
    /// New tags.
    pub tags: Option<Vec<String>>,
    /// New timestamp.
    pub occurred_at: Option<DateTime<Utc>>,
}

/// Input for creating a self transfer.
#[derive(Debug, Clone)]
pub struct CreateSelfTransferInput {
    /// Owner.
    pub user_id: UserId,
    /// Source account.
    pub from_account_id: AccountId,
    /// Destination account.
    pub to_account_id: AccountId,
    /// Positive amount moved.
    pub amount: Decimal,
    /// When it happened.
    pub occurred_at: DateTime<Utc>,
}

fn check_references(
    state: &LedgerState,
    user_id: UserId,
    kind: StatementKind,
    account_id: Option<AccountId>,
    friend_id: Option<FriendId>,
) -> Result<(), StoreError> {
    match (kind, account_id, friend_id) {
        (StatementKind::Expense, None, None) => {
            return Err(StoreError::Validation(
                "expense needs an account or a friend".to_string(),
            ));
        }
        (StatementKind::OutsideTransaction, None, _) => {
            return Err(StoreError::Validation(
                "outside transaction needs an account".to_string(),
            ));
        }
        (StatementKind::OutsideTransaction, _, Some(_)) => {
            return Err(StoreError::Validation(
                "outside transaction cannot reference a friend".to_string(),
            ));
        }
        (StatementKind::FriendTransaction, None, _)
        | (StatementKind::FriendTransaction, _, None) => {
            return Err(StoreError::Validation(
                "friend transaction needs an account and a friend".to_string(),
            ));
        }
        _ => {}
    }
    if let Some(account_id) = account_id {
        state.ensure_account(user_id, account_id)?;
    }
    if let Some(friend_id) = friend_id {
        state.ensure_friend(user_id, friend_id)?;
    }
    Ok(())
}

/// Repository for statements and self transfers.
#[derive(Debug, Clone)]
pub struct StatementRepository {
    store: MemoryStore,
}

impl StatementRepository {
    /// Creates a new statement repository.
    #[must_use]
    pub const fn new(store: MemoryStore) -> Self {
        Self { store }
    }

    /// Records a statement.
    ///
    /// # Errors
    ///
    /// Returns `Validation` when the references do not fit the kind,
    /// `NotOwned` for another user's account or friend and `NotFound` for an
    /// unknown one.
    pub async fn create(&self, input: CreateStatementInput) -> Result<StatementRecord, StoreError> {
        let mut state = self.store.write().await;
        check_references(&state, input.user_id, input.kind, input.account_id, input.friend_id)?;

        let record = StatementRecord {
            id: StatementId::new(),
            user_id: input.user_id,
            kind: input.kind,
            amount: input.amount,
            category: input.category,
            tags: input.tags,
            account_id: input.account_id,
            friend_id: input.friend_id,
            occurred_at: input.occurred_at,
            emi_link: None,
        };
        state.statements.insert(record.id, record.clone());
        info!(
            statement_id = %record.id,
            kind = ?record.kind,
            amount = %record.amount,
            "statement created"
        );
        Ok(record)
    }

    /// Fetches one of the caller's statements.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the statement is missing or not owned.
    pub async fn get(
        &self,
        user_id: UserId,
        statement_id: StatementId,
    ) -> Result<StatementRecord, StoreError> {
        let state = self.store.read().await;
        state.owned_statement(user_id, statement_id).cloned()
    }

    /// Updates a statement.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a missing statement and a split error when the
    /// new amount is below the statement's splits.
    pub async fn update(
        &self,
        user_id: UserId,
        statement_id: StatementId,
        input: UpdateStatementInput,
    ) -> Result<StatementRecord, StoreError> {
        let mut state = self.store.write().await;
        state.owned_statement(user_id, statement_id)?;

        if let Some(amount) = input.amount {
            let splits_total = state.split_total(statement_id, None);
            let checked =
                SplitValidator::validate_statement_amount(statement_id, amount, splits_total);
            if let Err(e) = checked {
                warn!(statement_id = %statement_id, error = %e, "statement update rejected");
                return Err(e.into());
            }
        }

        let statement = state
            .statements
            .get_mut(&statement_id)
            .ok_or_else(|| StoreError::not_found("statement", statement_id))?;
        if let Some(amount) = input.amount {
            statement.amount = amount;
        }
        if let Some(category) = input.category {
            statement.category = category;
        }
        if let Some(tags) = input.tags {
            statement.tags = tags;
        }
        if let Some(occurred_at) = input.occurred_at {
            statement.occurred_at = occurred_at;
        }
        info!(statement_id = %statement_id, "statement updated");
        Ok(statement.clone())
    }

    /// Deletes a statement together with its splits.
    ///
    /// A statement linked to an EMI installment can only be deleted while it
    /// holds the highest linked installment.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a missing statement and `NotLastLinked` when a
    /// later installment is linked.
    pub async fn delete(
        &self,
        user_id: UserId,
        statement_id: StatementId,
    ) -> Result<(), StoreError> {
        let mut state = self.store.write().await;
        let statement = state.owned_statement(user_id, statement_id)?;

        if let Some(link) = statement.emi_link {
            let last = state.max_linked_installment(link.emi_id);
            if let Err(e) = Reconciler::ensure_unlinkable(link.installment, last) {
                warn!(statement_id = %statement_id, error = %e, "statement delete rejected");
                return Err(e.into());
            }
        }

        let split_ids: Vec<SplitId> = state.splits_of(statement_id).map(|sp| sp.id).collect();
        for id in &split_ids {
            state.splits.remove(id);
        }
        state.statements.remove(&statement_id);
        info!(statement_id = %statement_id, splits = split_ids.len(), "statement deleted");
        Ok(())
    }

    /// Records a transfer between two of the caller's accounts.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for identical accounts or a non-positive amount,
    /// and `NotOwned`/`NotFound` for a bad account reference.
    pub async fn create_self_transfer(
        &self,
        input: CreateSelfTransferInput,
    ) -> Result<SelfTransferRecord, StoreError> {
        if input.from_account_id == input.to_account_id {
            return Err(StoreError::Validation(
                "source and destination accounts must differ".to_string(),
            ));
        }
        if input.amount <= Decimal::ZERO {
            return Err(StoreError::Validation(format!(
                "transfer amount must be positive, got {}",
                input.amount
            )));
        }

        let mut state = self.store.write().await;
        state.ensure_account(input.user_id, input.from_account_id)?;
        state.ensure_account(input.user_id, input.to_account_id)?;

        let record = SelfTransferRecord {
            id: SelfTransferId::new(),
            user_id: input.user_id,
            from_account_id: input.from_account_id,
            to_account_id: input.to_account_id,
            amount: input.amount,
            occurred_at: input.occurred_at,
        };
        state.self_transfers.insert(record.id, record.clone());
        info!(transfer_id = %record.id, amount = %record.amount, "self transfer created");
        Ok(record)
    }

    /// Deletes a self transfer.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the transfer is missing or not owned.
    pub async fn delete_self_transfer(
        &self,
        user_id: UserId,
        transfer_id: SelfTransferId,
    ) -> Result<(), StoreError> {
        let mut state = self.store.write().await;
        let owned = state
            .self_transfers
            .get(&transfer_id)
            .is_some_and(|t| t.user_id == user_id);
        if !owned {
            return Err(StoreError::not_found("self_transfer", transfer_id));
        }
        state.self_transfers.remove(&transfer_id);
        info!(transfer_id = %transfer_id, "self transfer deleted");
        Ok(())
    }
}
