//! Account and friend repository.

use chrono::Utc;
use ledgerline_shared::types::{AccountId, FriendId, UserId};
use rust_decimal::Decimal;
use tracing::info;

use crate::error::StoreError;
use crate::records::{AccountRecord, FriendRecord};
use crate::store::MemoryStore;

/// Input for creating an account.
#[derive(Debug, Clone)]
pub struct CreateAccountInput {
    /// Owner.
    pub user_id: UserId,
    /// Display name.
    pub name: String,
    /// Balance before any recorded movement.
    pub starting_balance: Decimal,
}

/// Input for updating an account.
#[derive(Debug, Clone, Default)]
pub struct UpdateAccountInput {
    /// New name.
    pub name: Option<String>,
    /// New starting balance. Every later balance shifts by the difference.
    pub starting_balance: Option<Decimal>,
}

/// Input for creating a friend.
#[derive(Debug, Clone)]
pub struct CreateFriendInput {
    /// Owner.
    pub user_id: UserId,
    /// Display name.
    pub name: String,
}

fn validate_name(name: &str) -> Result<String, StoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(StoreError::Validation("name must not be empty".to_string()));
    }
    Ok(trimmed.to_string())
}

/// Repository for accounts and friends.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    store: MemoryStore,
}

impl AccountRepository {
    /// Creates a new account repository.
    #[must_use]
    pub const fn new(store: MemoryStore) -> Self {
        Self { store }
    }

    /// Creates an account.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if the name is blank.
    pub async fn create_account(
        &self,
        input: CreateAccountInput,
    ) -> Result<AccountRecord, StoreError> {
        let name = validate_name(&input.name)?;
        let record = AccountRecord {
            id: AccountId::new(),
            user_id: input.user_id,
            name,
            starting_balance: input.starting_balance,
            created_at: Utc::now(),
        };

        let mut state = self.store.write().await;
        state.accounts.insert(record.id, record.clone());
        info!(account_id = %record.id, user_id = %record.user_id, "account created");
        Ok(record)
    }

    /// Updates an account's name or starting balance.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the account is missing or not owned by the caller.
    pub async fn update_account(
        &self,
        user_id: UserId,
        account_id: AccountId,
        input: UpdateAccountInput,
    ) -> Result<AccountRecord, StoreError> {
        let name = input.name.as_deref().map(validate_name).transpose()?;

        let mut state = self.store.write().await;
        let account = state
            .accounts
            .get_mut(&account_id)
            .filter(|a| a.user_id == user_id)
            .ok_or_else(|| StoreError::not_found("account", account_id))?;

        if let Some(name) = name {
            account.name = name;
        }
        if let Some(balance) = input.starting_balance {
            account.starting_balance = balance;
        }
        info!(account_id = %account_id, "account updated");
        Ok(account.clone())
    }

    /// Lists the caller's accounts.
    pub async fn list_accounts(&self, user_id: UserId) -> Vec<AccountRecord> {
        let state = self.store.read().await;
        state
            .accounts
            .values()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect()
    }

    /// Creates a friend.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if the name is blank.
    pub async fn create_friend(
        &self,
        input: CreateFriendInput,
    ) -> Result<FriendRecord, StoreError> {
        let name = validate_name(&input.name)?;
        let record = FriendRecord {
            id: FriendId::new(),
            user_id: input.user_id,
            name,
            created_at: Utc::now(),
        };

        let mut state = self.store.write().await;
        state.friends.insert(record.id, record.clone());
        info!(friend_id = %record.id, user_id = %record.user_id, "friend created");
        Ok(record)
    }

    /// Renames a friend.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for a blank name and `NotFound` if the friend is
    /// missing or not owned by the caller.
    pub async fn rename_friend(
        &self,
        user_id: UserId,
        friend_id: FriendId,
        name: &str,
    ) -> Result<FriendRecord, StoreError> {
        let name = validate_name(name)?;

        let mut state = self.store.write().await;
        let friend = state
            .friends
            .get_mut(&friend_id)
            .filter(|f| f.user_id == user_id)
            .ok_or_else(|| StoreError::not_found("friend", friend_id))?;
        friend.name = name;
        info!(friend_id = %friend_id, "friend renamed");
        Ok(friend.clone())
    }

    /// Lists the caller's friends.
    pub async fn list_friends(&self, user_id: UserId) -> Vec<FriendRecord> {
        let state = self.store.read().await;
        state
            .friends
            .values()
            .filter(|f| f.user_id == user_id)
            .cloned()
            .collect()
    }
}
