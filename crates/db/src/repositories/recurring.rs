//! Recurring payment repository.

use chrono::NaiveDate;
use ledgerline_core::recurring::{Frequency, RecurrenceRule};
use ledgerline_shared::types::{AccountId, RecurringPaymentId, UserId};
use rust_decimal::Decimal;
use tracing::info;

use crate::error::StoreError;
use crate::records::RecurringPaymentRecord;
use crate::store::MemoryStore;

/// Input for creating a recurring payment.
#[derive(Debug, Clone)]
pub struct CreateRecurringPaymentInput {
    /// Owner.
    pub user_id: UserId,
    /// Display name.
    pub name: String,
    /// Expected amount.
    pub amount: Decimal,
    /// Account it is paid from.
    pub account_id: Option<AccountId>,
    /// First due date.
    pub start_date: NaiveDate,
    /// Last possible due date.
    pub end_date: Option<NaiveDate>,
    /// Recurrence frequency.
    pub frequency: Frequency,
    /// Frequency multiplier, at least 1.
    pub multiplier: u32,
}

/// Repository for recurring payments.
#[derive(Debug, Clone)]
pub struct RecurringPaymentRepository {
    store: MemoryStore,
    match_window_days: i64,
}

impl RecurringPaymentRepository {
    /// Creates a repository matching payments within `match_window_days` of a due date.
    #[must_use]
    pub const fn new(store: MemoryStore, match_window_days: i64) -> Self {
        Self {
            store,
            match_window_days,
        }
    }

    /// Creates a recurring payment.
    ///
    /// # Errors
    ///
    /// Returns a recurring error for an invalid rule and
    /// `NotOwned`/`NotFound` for a bad account reference.
    pub async fn create(
        &self,
        input: CreateRecurringPaymentInput,
    ) -> Result<RecurringPaymentRecord, StoreError> {
        let rule = RecurrenceRule::new(
            input.start_date,
            input.end_date,
            input.frequency,
            input.multiplier,
        )?;

        let mut state = self.store.write().await;
        if let Some(account_id) = input.account_id {
            state.ensure_account(input.user_id, account_id)?;
        }
        let record = RecurringPaymentRecord {
            id: RecurringPaymentId::new(),
            user_id: input.user_id,
            name: input.name,
            amount: input.amount,
            account_id: input.account_id,
            rule,
        };
        state.recurring_payments.insert(record.id, record.clone());
        info!(
            recurring_id = %record.id,
            frequency = %rule.frequency(),
            "recurring payment created"
        );
        Ok(record)
    }

    /// The caller's recurring payments.
    pub async fn list(&self, user_id: UserId) -> Vec<RecurringPaymentRecord> {
        let state = self.store.read().await;
        state
            .recurring_payments
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect()
    }

    async fn rule(
        &self,
        user_id: UserId,
        id: RecurringPaymentId,
    ) -> Result<RecurrenceRule, StoreError> {
        let state = self.store.read().await;
        state
            .recurring_payments
            .get(&id)
            .filter(|r| r.user_id == user_id)
            .map(|r| r.rule)
            .ok_or_else(|| StoreError::not_found("recurring_payment", id))
    }

    /// Due dates in `[from, to]`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the payment is missing or not owned.
    pub async fn due_dates(
        &self,
        user_id: UserId,
        id: RecurringPaymentId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<NaiveDate>, StoreError> {
        Ok(self.rule(user_id, id).await?.due_dates_between(from, to))
    }

    /// The due date a payment made on `date` settles.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a missing payment and `NoDueDateInWindow` when
    /// no due date is close enough.
    pub async fn match_due_date(
        &self,
        user_id: UserId,
        id: RecurringPaymentId,
        date: NaiveDate,
    ) -> Result<NaiveDate, StoreError> {
        let rule = self.rule(user_id, id).await?;
        Ok(rule.match_due_date(date, self.match_window_days)?)
    }
}
