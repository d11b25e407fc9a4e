//! In-memory ledger store.
//!
//! All records live in one [`LedgerState`] behind a `tokio::sync::RwLock`.
//! Repositories run each validation and its mutation under a single write
//! guard, so concurrent check-then-act sequences are serialized. Reads take
//! a read guard and see a consistent snapshot.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use ledgerline_shared::types::money::MoneyMath;
use ledgerline_shared::types::{
    AccountId, EmiId, FriendId, RecurringPaymentId, ReportBoundaryId, SelfTransferId, SplitId,
    StatementId, UserId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::StoreError;
use crate::records::{
    AccountRecord, EmiRecord, FriendRecord, RecurringPaymentRecord, ReportBoundaryRecord,
    SelfTransferRecord, SplitRecord, StatementRecord,
};

/// Every record of every user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerState {
    /// Accounts.
    pub accounts: BTreeMap<AccountId, AccountRecord>,
    /// Friends.
    pub friends: BTreeMap<FriendId, FriendRecord>,
    /// Statements.
    pub statements: BTreeMap<StatementId, StatementRecord>,
    /// Splits.
    pub splits: BTreeMap<SplitId, SplitRecord>,
    /// Self transfers.
    pub self_transfers: BTreeMap<SelfTransferId, SelfTransferRecord>,
    /// EMIs.
    pub emis: BTreeMap<EmiId, EmiRecord>,
    /// Report boundaries.
    pub report_boundaries: BTreeMap<ReportBoundaryId, ReportBoundaryRecord>,
    /// Recurring payments.
    pub recurring_payments: BTreeMap<RecurringPaymentId, RecurringPaymentRecord>,
}

impl LedgerState {
    /// Checks that a referenced account exists and belongs to `user_id`.
    pub(crate) fn ensure_account(
        &self,
        user_id: UserId,
        id: AccountId,
    ) -> Result<&AccountRecord, StoreError> {
        match self.accounts.get(&id) {
            Some(account) if account.user_id == user_id => Ok(account),
            Some(_) => Err(StoreError::not_owned("account", id)),
            None => Err(StoreError::not_found("account", id)),
        }
    }

    /// Checks that a referenced friend exists and belongs to `user_id`.
    pub(crate) fn ensure_friend(
        &self,
        user_id: UserId,
        id: FriendId,
    ) -> Result<&FriendRecord, StoreError> {
        match self.friends.get(&id) {
            Some(friend) if friend.user_id == user_id => Ok(friend),
            Some(_) => Err(StoreError::not_owned("friend", id)),
            None => Err(StoreError::not_found("friend", id)),
        }
    }

    /// The caller's statement; another user's statement is reported as missing.
    pub(crate) fn owned_statement(
        &self,
        user_id: UserId,
        id: StatementId,
    ) -> Result<&StatementRecord, StoreError> {
        self.statements
            .get(&id)
            .filter(|s| s.user_id == user_id)
            .ok_or_else(|| StoreError::not_found("statement", id))
    }

    /// Splits of one statement.
    pub(crate) fn splits_of(
        &self,
        statement_id: StatementId,
    ) -> impl Iterator<Item = &SplitRecord> {
        self.splits.values().filter(move |sp| sp.statement_id == statement_id)
    }

    /// Sum of a statement's splits, leaving out `excluding`.
    pub(crate) fn split_total(
        &self,
        statement_id: StatementId,
        excluding: Option<SplitId>,
    ) -> Decimal {
        MoneyMath::sum(
            self.splits_of(statement_id)
                .filter(|sp| Some(sp.id) != excluding)
                .map(|sp| sp.amount),
        )
    }
}

/// Shared handle to the ledger state. Cloning shares the same state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<LedgerState>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding `state`.
    #[must_use]
    pub fn from_state(state: LedgerState) -> Self {
        Self {
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// Loads a JSON snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let bytes = tokio::fs::read(path.as_ref()).await?;
        let state: LedgerState = serde_json::from_slice(&bytes)?;
        tracing::debug!(
            path = %path.as_ref().display(),
            accounts = state.accounts.len(),
            statements = state.statements.len(),
            "loaded ledger snapshot"
        );
        Ok(Self::from_state(state))
    }

    /// Writes a JSON snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be serialized or written.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<(), StoreError> {
        let bytes = {
            let state = self.read().await;
            serde_json::to_vec_pretty(&*state)?
        };
        tokio::fs::write(path, bytes).await?;
        Ok(())
    }

    /// Acquires a read guard.
    pub async fn read(&self) -> RwLockReadGuard<'_, LedgerState> {
        self.state.read().await
    }

    /// Acquires the write guard; hold it across validation and mutation.
    pub async fn write(&self) -> RwLockWriteGuard<'_, LedgerState> {
        self.state.write().await
    }

    /// Clones the current state.
    pub async fn snapshot(&self) -> LedgerState {
        self.read().await.clone()
    }
}
