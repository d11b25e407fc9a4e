//! EMI solving, schedule generation and status projection.
//!
//! - `EMI = P * r * (1 + r)^n / ((1 + r)^n - 1)`, or `P / n` when `r = 0`
//! - `P = EMI * ((1 + r)^n - 1) / (r * (1 + r)^n)`, or `EMI * n` when `r = 0`
//!
//! where `r = annual_rate / 1200` and `n` is the tenure in months. Amounts are
//! kept at full decimal precision; use [`ScheduleRow::rounded`] to present them.

use std::collections::BTreeSet;

use chrono::Months;
use ledgerline_shared::types::money::MoneyMath;
use rust_decimal::prelude::*;

use super::error::EmiError;
use super::types::{
    EmiInput, EmiSchedule, EmiSplit, EmiTerms, InstallmentStatus, ScheduleRow, ScheduleSummary,
    SolvedEmi,
};
use ledgerline_shared::types::FriendId;

const MONTHLY_RATE_DIVISOR: Decimal = Decimal::from_parts(1200, 0, 0, false, 0);

/// EMI calculator.
pub struct EmiCalculator;

impl EmiCalculator {
    /// Converts an annual percentage rate to a monthly fraction.
    #[must_use]
    pub fn monthly_rate(annual_rate: Decimal) -> Decimal {
        annual_rate / MONTHLY_RATE_DIVISOR
    }

    /// Installment for a principal.
    pub fn emi_for(
        principal: Decimal,
        monthly_rate: Decimal,
        tenure: u32,
    ) -> Result<Decimal, EmiError> {
        if tenure == 0 {
            return Err(EmiError::ZeroTenure);
        }
        let n = Decimal::from(tenure);
        if monthly_rate.is_zero() {
            return principal.checked_div(n).ok_or(EmiError::Overflow);
        }
        let factor = growth_factor(monthly_rate, tenure)?;
        let denominator = factor - Decimal::ONE;
        if denominator.is_zero() {
            return principal.checked_div(n).ok_or(EmiError::Overflow);
        }
        principal
            .checked_mul(monthly_rate)
            .and_then(|v| v.checked_mul(factor))
            .and_then(|v| v.checked_div(denominator))
            .ok_or(EmiError::Overflow)
    }

    /// Principal for an installment.
    pub fn principal_for(
        emi: Decimal,
        monthly_rate: Decimal,
        tenure: u32,
    ) -> Result<Decimal, EmiError> {
        if tenure == 0 {
            return Err(EmiError::ZeroTenure);
        }
        let n = Decimal::from(tenure);
        if monthly_rate.is_zero() {
            return emi.checked_mul(n).ok_or(EmiError::Overflow);
        }
        let factor = growth_factor(monthly_rate, tenure)?;
        let denominator = monthly_rate.checked_mul(factor).ok_or(EmiError::Overflow)?;
        if (factor - Decimal::ONE).is_zero() {
            return emi.checked_mul(n).ok_or(EmiError::Overflow);
        }
        emi.checked_mul(factor - Decimal::ONE)
            .and_then(|v| v.checked_div(denominator))
            .ok_or(EmiError::Overflow)
    }

    /// Validates the terms and solves principal and EMI.
    pub fn solve(terms: &EmiTerms) -> Result<SolvedEmi, EmiError> {
        validate_terms(terms)?;
        let monthly_rate = Self::monthly_rate(terms.annual_rate);
        let (principal, emi) = match terms.input {
            EmiInput::Principal(principal) => {
                (principal, Self::emi_for(principal, monthly_rate, terms.tenure)?)
            }
            EmiInput::Emi(emi) => (Self::principal_for(emi, monthly_rate, terms.tenure)?, emi),
            EmiInput::TotalEmi(total) => {
                let emi = total
                    .checked_div(Decimal::from(terms.tenure))
                    .ok_or(EmiError::Overflow)?;
                (Self::principal_for(emi, monthly_rate, terms.tenure)?, emi)
            }
        };
        Ok(SolvedEmi {
            principal,
            emi,
            monthly_rate,
        })
    }

    /// Builds the full amortization schedule.
    pub fn schedule(terms: &EmiTerms) -> Result<EmiSchedule, EmiError> {
        let solved = Self::solve(terms)?;
        let SolvedEmi {
            principal,
            emi,
            monthly_rate,
        } = solved;

        let has_fee = terms.processing_fees > Decimal::ZERO;
        let mut rows = Vec::with_capacity(terms.tenure as usize + usize::from(has_fee));

        let fee_gst = MoneyMath::percent_of(terms.processing_fees, terms.processing_fees_gst_rate);
        if has_fee {
            rows.push(ScheduleRow {
                installment: 0,
                date: terms.processing_fees_date,
                emi: terms.processing_fees,
                principal: terms.processing_fees,
                interest: Decimal::ZERO,
                gst: fee_gst,
                total_payment: MoneyMath::add(terms.processing_fees, fee_gst),
                balance: principal,
            });
        }

        let mut balance = principal;
        let mut total_interest = Decimal::ZERO;
        let mut total_gst = Decimal::ZERO;
        for installment in 1..=terms.tenure {
            let base_interest = balance * monthly_rate;
            let iafe = if installment == 1 { terms.iafe } else { Decimal::ZERO };
            let interest = MoneyMath::add(base_interest, iafe);
            let principal_component = MoneyMath::sub(emi, base_interest);
            balance = MoneyMath::sub(balance, principal_component).max(Decimal::ZERO);
            let gst = MoneyMath::percent_of(interest, terms.gst_rate);
            let due = MoneyMath::add(emi, iafe);
            let date = terms
                .first_installment_date
                .checked_add_months(Months::new(installment - 1))
                .ok_or(EmiError::DateOutOfRange { installment })?;

            total_interest = MoneyMath::add(total_interest, interest);
            total_gst = MoneyMath::add(total_gst, gst);
            rows.push(ScheduleRow {
                installment,
                date: Some(date),
                emi: due,
                principal: principal_component,
                interest,
                gst,
                total_payment: MoneyMath::add(due, gst),
                balance,
            });
        }

        let total_emi = emi * Decimal::from(terms.tenure);
        let total_processing_fees = MoneyMath::add(terms.processing_fees, fee_gst);
        let summary = ScheduleSummary {
            emi,
            total_emi,
            total_interest,
            total_gst,
            total_processing_fees,
            total_amount: MoneyMath::sum([total_emi, terms.iafe, total_gst, total_processing_fees]),
            effective_principal: principal,
        };

        Ok(EmiSchedule {
            solved,
            rows,
            summary,
        })
    }

    /// Validates friend splits of an EMI.
    ///
    /// Each percentage must be in (0, 100], friends must be distinct, and
    /// the percentages must not add up to more than 100.
    pub fn validate_splits(splits: &[EmiSplit]) -> Result<(), EmiError> {
        let mut seen: BTreeSet<FriendId> = BTreeSet::new();
        for split in splits {
            if split.percentage <= Decimal::ZERO || split.percentage > Decimal::ONE_HUNDRED {
                return Err(EmiError::InvalidSplitPercentage {
                    friend_id: split.friend_id,
                    percentage: split.percentage,
                });
            }
            if !seen.insert(split.friend_id) {
                return Err(EmiError::DuplicateSplitFriend(split.friend_id));
            }
        }
        let total = MoneyMath::sum(splits.iter().map(|s| s.percentage));
        if total > Decimal::ONE_HUNDRED {
            return Err(EmiError::SplitsExceedHundred(total));
        }
        Ok(())
    }

    /// Each friend's share of `amount`, rounded to cents.
    #[must_use]
    pub fn split_shares(splits: &[EmiSplit], amount: Decimal) -> Vec<(FriendId, Decimal)> {
        splits
            .iter()
            .map(|s| {
                let share = MoneyMath::percent_of(amount, s.percentage);
                (s.friend_id, MoneyMath::round_cents(share))
            })
            .collect()
    }
}

impl EmiSchedule {
    /// Number of monthly installments.
    #[must_use]
    pub fn tenure(&self) -> u32 {
        self.rows.last().map_or(0, |row| row.installment)
    }

    /// Returns true when the schedule starts with a processing fee row.
    #[must_use]
    pub fn has_fee_row(&self) -> bool {
        self.rows.first().is_some_and(|row| row.installment == 0)
    }

    /// Looks up a row by installment number.
    #[must_use]
    pub fn row(&self, installment: u32) -> Option<&ScheduleRow> {
        self.rows.iter().find(|row| row.installment == installment)
    }

    /// Projects the outstanding state after installments up to `paid` are paid.
    ///
    /// `None` means nothing is paid yet (the fee row is next when present).
    /// `Some(0)` means only the processing fee is paid. `Some(tenure)` means
    /// the loan is closed and every amount is zero.
    pub fn as_of_installment(&self, paid: Option<u32>) -> Result<InstallmentStatus, EmiError> {
        let tenure = self.tenure();
        let emi = self.summary.emi;
        let principal = self.solved.principal;

        let next_installment = match paid {
            None if self.has_fee_row() => 0,
            None | Some(0) => 1,
            Some(n) if n > tenure => {
                return Err(EmiError::InstallmentOutOfRange {
                    installment: n,
                    tenure,
                });
            }
            Some(n) if n == tenure => {
                return Ok(InstallmentStatus {
                    outstanding_balance: Decimal::ZERO,
                    amount_left: Decimal::ZERO,
                    monthly_emi: Decimal::ZERO,
                    next_installment: None,
                    next_payment_date: None,
                    next_payment_amount: Decimal::ZERO,
                    fully_paid: true,
                });
            }
            Some(n) => n + 1,
        };

        let outstanding_balance = match paid {
            Some(n) if n > 0 => self.row(n).map_or(principal, |row| row.balance),
            _ => principal,
        };
        let amount_left = MoneyMath::sum(
            self.rows
                .iter()
                .filter(|row| row.installment >= next_installment)
                .map(|row| row.total_payment),
        );
        let next = self.row(next_installment);

        Ok(InstallmentStatus {
            outstanding_balance,
            amount_left,
            monthly_emi: emi,
            next_installment: Some(next_installment),
            next_payment_date: next.and_then(|row| row.date),
            next_payment_amount: next.map_or(Decimal::ZERO, |row| row.total_payment),
            fully_paid: false,
        })
    }
}

/// `(1 + r)^n`.
fn growth_factor(monthly_rate: Decimal, tenure: u32) -> Result<Decimal, EmiError> {
    (Decimal::ONE + monthly_rate)
        .checked_powu(u64::from(tenure))
        .ok_or(EmiError::Overflow)
}

fn validate_terms(terms: &EmiTerms) -> Result<(), EmiError> {
    if terms.tenure == 0 {
        return Err(EmiError::ZeroTenure);
    }
    let value = terms.input.value();
    if value <= Decimal::ZERO {
        return Err(EmiError::NonPositiveAmount {
            field: terms.input.field(),
            value,
        });
    }
    for (field, value) in [
        ("annual_rate", terms.annual_rate),
        ("gst_rate", terms.gst_rate),
        ("processing_fees", terms.processing_fees),
        ("processing_fees_gst_rate", terms.processing_fees_gst_rate),
        ("iafe", terms.iafe),
    ] {
        if value < Decimal::ZERO {
            return Err(EmiError::NegativeValue { field, value });
        }
    }
    Ok(())
}
