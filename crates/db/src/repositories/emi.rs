//! EMI repository: loans, schedules and statement links.

use chrono_tz::Tz;
use ledgerline_core::emi::{EmiCalculator, EmiSchedule, EmiSplit, EmiTerms, InstallmentStatus};
use ledgerline_core::reconcile::{MatchTolerance, ReconcileError, Reconciler};
use ledgerline_shared::types::{AccountId, EmiId, FriendId, StatementId, UserId};
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::error::StoreError;
use crate::query::LedgerQuery;
use crate::records::{EmiLink, EmiRecord};
use crate::store::{LedgerState, MemoryStore};

/// Input for creating an EMI.
#[derive(Debug, Clone)]
pub struct CreateEmiInput {
    /// Owner.
    pub user_id: UserId,
    /// Display name.
    pub name: String,
    /// Loan terms.
    pub terms: EmiTerms,
    /// Account the installments are paid from.
    pub account_id: Option<AccountId>,
    /// Friends sharing the loan.
    pub splits: Vec<EmiSplit>,
}

/// Input for updating an EMI. Changed terms re-solve the principal and EMI.
#[derive(Debug, Clone, Default)]
pub struct UpdateEmiInput {
    /// New name.
    pub name: Option<String>,
    /// New terms.
    pub terms: Option<EmiTerms>,
    /// New paying account.
    pub account_id: Option<AccountId>,
    /// New friend splits.
    pub splits: Option<Vec<EmiSplit>>,
}

fn check_emi_references(
    state: &LedgerState,
    user_id: UserId,
    account_id: Option<AccountId>,
    splits: &[EmiSplit],
) -> Result<(), StoreError> {
    EmiCalculator::validate_splits(splits)?;
    if let Some(account_id) = account_id {
        state.ensure_account(user_id, account_id)?;
    }
    for split in splits {
        state.ensure_friend(user_id, split.friend_id)?;
    }
    Ok(())
}

/// Linked statements keep their installment numbers, so the new terms must
/// still contain `last_linked` and keep the fee row where it was.
fn check_linked_terms(
    current: &EmiTerms,
    terms: &EmiTerms,
    last_linked: u32,
) -> Result<(), StoreError> {
    if terms.tenure < last_linked {
        return Err(StoreError::Validation(format!(
            "tenure {} is below linked installment {last_linked}",
            terms.tenure
        )));
    }
    let had_fee = current.processing_fees > Decimal::ZERO;
    if had_fee != (terms.processing_fees > Decimal::ZERO) {
        return Err(StoreError::Validation(
            "processing fee cannot be added or removed while installments are linked".to_string(),
        ));
    }
    Ok(())
}

/// Repository for EMIs.
#[derive(Debug, Clone)]
pub struct EmiRepository {
    store: MemoryStore,
    tolerance: MatchTolerance,
    tz: Tz,
}

impl EmiRepository {
    /// Creates an EMI repository with the default match tolerance, in UTC.
    #[must_use]
    pub fn new(store: MemoryStore) -> Self {
        Self {
            store,
            tolerance: MatchTolerance::default(),
            tz: Tz::UTC,
        }
    }

    /// Creates an EMI repository with an explicit tolerance and timezone.
    ///
    /// Statement dates are compared to due dates in `tz`.
    #[must_use]
    pub const fn with_settings(store: MemoryStore, tolerance: MatchTolerance, tz: Tz) -> Self {
        Self { store, tolerance, tz }
    }

    /// Creates an EMI and solves its principal and monthly installment.
    ///
    /// # Errors
    ///
    /// Returns an EMI error for invalid terms or splits, and
    /// `NotOwned`/`NotFound` for a bad account or friend reference.
    pub async fn create(&self, input: CreateEmiInput) -> Result<EmiRecord, StoreError> {
        let schedule = EmiCalculator::schedule(&input.terms)?;

        let mut state = self.store.write().await;
        check_emi_references(&state, input.user_id, input.account_id, &input.splits)?;

        let record = EmiRecord {
            id: EmiId::new(),
            user_id: input.user_id,
            name: input.name,
            terms: input.terms,
            principal: schedule.solved.principal,
            emi: schedule.solved.emi,
            account_id: input.account_id,
            splits: input.splits,
        };
        state.emis.insert(record.id, record.clone());
        info!(emi_id = %record.id, principal = %record.principal, emi = %record.emi, "emi created");
        Ok(record)
    }

    /// Updates an EMI.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a missing EMI, the same errors as
    /// [`Self::create`] for the new values, and `Validation` when new terms
    /// would orphan linked statements: a tenure below the highest linked
    /// installment, or adding or removing the processing fee once anything
    /// is linked.
    pub async fn update(
        &self,
        user_id: UserId,
        emi_id: EmiId,
        input: UpdateEmiInput,
    ) -> Result<EmiRecord, StoreError> {
        let mut state = self.store.write().await;
        let current = state.emi_record(emi_id, user_id)?;

        let terms = input.terms.unwrap_or_else(|| current.terms.clone());
        let schedule = EmiCalculator::schedule(&terms)?;
        if let Some(last_linked) = state.max_linked_installment(emi_id)
            && let Err(e) = check_linked_terms(&current.terms, &terms, last_linked)
        {
            warn!(emi_id = %emi_id, last_linked, error = %e, "emi update rejected");
            return Err(e);
        }
        let account_id = input.account_id.or(current.account_id);
        let splits = input.splits.unwrap_or(current.splits);
        check_emi_references(&state, user_id, account_id, &splits)?;

        let record = EmiRecord {
            id: emi_id,
            user_id,
            name: input.name.unwrap_or(current.name),
            terms,
            principal: schedule.solved.principal,
            emi: schedule.solved.emi,
            account_id,
            splits,
        };
        state.emis.insert(emi_id, record.clone());
        info!(emi_id = %emi_id, principal = %record.principal, emi = %record.emi, "emi updated");
        Ok(record)
    }

    /// Deletes an EMI and clears every statement link to it.
    ///
    /// Returns the number of statements unlinked.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the EMI is missing or not owned.
    pub async fn delete(&self, user_id: UserId, emi_id: EmiId) -> Result<usize, StoreError> {
        let mut state = self.store.write().await;
        state.emi_record(emi_id, user_id)?;

        let mut cleared = 0;
        for statement in state.statements.values_mut() {
            if statement.emi_link.is_some_and(|link| link.emi_id == emi_id) {
                statement.emi_link = None;
                cleared += 1;
            }
        }
        state.emis.remove(&emi_id);
        info!(emi_id = %emi_id, cleared, "emi deleted");
        Ok(cleared)
    }

    /// Full amortization schedule of an EMI.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a missing EMI, or an EMI error if its terms no
    /// longer solve.
    pub async fn schedule(
        &self,
        user_id: UserId,
        emi_id: EmiId,
    ) -> Result<EmiSchedule, StoreError> {
        let record = self.store.read().await.emi_record(emi_id, user_id)?;
        Ok(EmiCalculator::schedule(&record.terms)?)
    }

    /// Outstanding state given the statements linked so far.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a missing EMI, or an EMI error if its terms no
    /// longer solve.
    pub async fn status(
        &self,
        user_id: UserId,
        emi_id: EmiId,
    ) -> Result<InstallmentStatus, StoreError> {
        let (record, last_linked) = {
            let state = self.store.read().await;
            (
                state.emi_record(emi_id, user_id)?,
                state.max_linked_installment(emi_id),
            )
        };
        let schedule = EmiCalculator::schedule(&record.terms)?;
        Ok(schedule.as_of_installment(last_linked)?)
    }

    /// Each friend's share of the monthly installment.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the EMI is missing or not owned.
    pub async fn friend_shares(
        &self,
        user_id: UserId,
        emi_id: EmiId,
    ) -> Result<Vec<(FriendId, Decimal)>, StoreError> {
        let record = self.store.read().await.emi_record(emi_id, user_id)?;
        Ok(EmiCalculator::split_shares(&record.splits, record.emi))
    }

    /// Links a statement to the next expected installment.
    ///
    /// `installment` is optional; when given it must be the next expected one.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a missing EMI or statement, `AlreadyLinked` for
    /// a linked statement, and a reconcile error when the statement does not
    /// match the installment within tolerance.
    pub async fn link(
        &self,
        user_id: UserId,
        emi_id: EmiId,
        statement_id: StatementId,
        installment: Option<u32>,
    ) -> Result<EmiLink, StoreError> {
        let mut state = self.store.write().await;
        let record = state.emi_record(emi_id, user_id)?;
        let statement = state.owned_statement(user_id, statement_id)?;
        if let Some(existing) = statement.emi_link {
            return Err(ReconcileError::AlreadyLinked(existing.installment).into());
        }
        let amount = statement.amount;
        let date = statement.occurred_at.with_timezone(&self.tz).date_naive();

        let schedule = EmiCalculator::schedule(&record.terms)?;
        let last_linked = state.max_linked_installment(emi_id);
        let planned = Reconciler::plan_link(
            &schedule,
            last_linked,
            installment,
            amount,
            date,
            self.tolerance,
        );
        let row = match planned {
            Ok(row) => row,
            Err(e) => {
                warn!(
                    emi_id = %emi_id,
                    statement_id = %statement_id,
                    error = %e,
                    "emi link rejected"
                );
                return Err(e.into());
            }
        };

        let link = EmiLink {
            emi_id,
            installment: row.installment,
        };
        let statement = state
            .statements
            .get_mut(&statement_id)
            .ok_or_else(|| StoreError::not_found("statement", statement_id))?;
        statement.emi_link = Some(link);
        info!(
            emi_id = %emi_id,
            statement_id = %statement_id,
            installment = link.installment,
            "statement linked"
        );
        Ok(link)
    }

    /// Removes a statement's installment link.
    ///
    /// # Errors
    ///
    /// Returns `NotLinked` for an unlinked statement and `NotLastLinked`
    /// unless it holds the highest linked installment.
    pub async fn unlink(
        &self,
        user_id: UserId,
        statement_id: StatementId,
    ) -> Result<EmiLink, StoreError> {
        let mut state = self.store.write().await;
        let link = state
            .owned_statement(user_id, statement_id)?
            .emi_link
            .ok_or(ReconcileError::NotLinked)?;

        let last_linked = state.max_linked_installment(link.emi_id);
        if let Err(e) = Reconciler::ensure_unlinkable(link.installment, last_linked) {
            warn!(statement_id = %statement_id, error = %e, "emi unlink rejected");
            return Err(e.into());
        }

        if let Some(statement) = state.statements.get_mut(&statement_id) {
            statement.emi_link = None;
        }
        info!(
            emi_id = %link.emi_id,
            statement_id = %statement_id,
            installment = link.installment,
            "statement unlinked"
        );
        Ok(link)
    }
}
