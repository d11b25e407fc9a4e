//! Matching statements against schedule rows.

use chrono::NaiveDate;
use ledgerline_shared::ReconciliationConfig;
use ledgerline_shared::types::money::MoneyMath;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::ReconcileError;
use crate::emi::{EmiSchedule, ScheduleRow};

/// Allowed differences between a statement and its installment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchTolerance {
    /// Maximum absolute amount difference.
    pub amount: Decimal,
    /// Maximum distance in days.
    pub days: i64,
}

impl Default for MatchTolerance {
    fn default() -> Self {
        Self {
            amount: Decimal::TEN,
            days: 3,
        }
    }
}

impl From<&ReconciliationConfig> for MatchTolerance {
    fn from(config: &ReconciliationConfig) -> Self {
        Self {
            amount: config.amount_tolerance,
            days: config.date_tolerance_days,
        }
    }
}

/// Statement to installment reconciler.
pub struct Reconciler;

impl Reconciler {
    /// Next installment a statement may be linked to.
    ///
    /// With nothing linked this is the fee row (0) when present, else 1.
    /// Returns `None` once the last installment is linked.
    #[must_use]
    pub fn next_expected_installment(
        schedule: &EmiSchedule,
        last_linked: Option<u32>,
    ) -> Option<u32> {
        let next = match last_linked {
            None if schedule.has_fee_row() => 0,
            None => 1,
            Some(last) => last.checked_add(1)?,
        };
        schedule.row(next).map(|row| row.installment)
    }

    /// Checks a candidate payment against the expected installment.
    ///
    /// The amount must be within `tolerance.amount` of the row's total
    /// payment. The date must be within `tolerance.days` of the due date,
    /// unless the row is undated.
    pub fn confirm_match<'a>(
        schedule: &'a EmiSchedule,
        amount: Decimal,
        date: NaiveDate,
        expected_installment: u32,
        tolerance: MatchTolerance,
    ) -> Result<&'a ScheduleRow, ReconcileError> {
        let row = schedule
            .row(expected_installment)
            .ok_or(ReconcileError::InstallmentNotFound(expected_installment))?;

        if !MoneyMath::within(amount, row.total_payment, tolerance.amount) {
            return Err(ReconcileError::AmountOutOfTolerance {
                actual: amount,
                expected: row.total_payment,
                tolerance: tolerance.amount,
            });
        }

        if let Some(due) = row.date
            && (date - due).num_days().abs() > tolerance.days
        {
            return Err(ReconcileError::DateOutOfTolerance {
                actual: date,
                expected: due,
                tolerance_days: tolerance.days,
            });
        }

        Ok(row)
    }

    /// Validates a link request and returns the matched row.
    ///
    /// `requested` defaults to the next expected installment; when given it
    /// must equal it.
    pub fn plan_link<'a>(
        schedule: &'a EmiSchedule,
        last_linked: Option<u32>,
        requested: Option<u32>,
        amount: Decimal,
        date: NaiveDate,
        tolerance: MatchTolerance,
    ) -> Result<&'a ScheduleRow, ReconcileError> {
        let expected = Self::next_expected_installment(schedule, last_linked)
            .ok_or(ReconcileError::ScheduleComplete)?;
        if let Some(requested) = requested
            && requested != expected
        {
            return Err(ReconcileError::NotNextInstallment { requested, expected });
        }
        Self::confirm_match(schedule, amount, date, expected, tolerance)
    }

    /// Only the highest linked installment may be unlinked.
    pub fn ensure_unlinkable(
        installment: u32,
        last_linked: Option<u32>,
    ) -> Result<(), ReconcileError> {
        match last_linked {
            None => Err(ReconcileError::NotLinked),
            Some(last) if last == installment => Ok(()),
            Some(last) => Err(ReconcileError::NotLastLinked {
                installment,
                last_linked: last,
            }),
        }
    }
}
