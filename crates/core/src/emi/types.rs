//! EMI data types.

use chrono::NaiveDate;
use ledgerline_shared::types::FriendId;
use ledgerline_shared::types::money::MoneyMath;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Which quantity the user supplied; the others are solved from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "value", rename_all = "snake_case")]
pub enum EmiInput {
    /// Principal known, solve the EMI.
    Principal(Decimal),
    /// EMI known, solve the principal.
    Emi(Decimal),
    /// Total of all EMIs known: `emi = total / tenure`, then solve the principal.
    TotalEmi(Decimal),
}

impl EmiInput {
    /// The supplied value.
    #[must_use]
    pub const fn value(&self) -> Decimal {
        match self {
            Self::Principal(v) | Self::Emi(v) | Self::TotalEmi(v) => *v,
        }
    }

    /// Input name used in error messages.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::Principal(_) => "principal",
            Self::Emi(_) => "emi",
            Self::TotalEmi(_) => "total_emi",
        }
    }
}

/// Loan terms. Rates are percentages (12 means 12%).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmiTerms {
    /// Calculation input.
    pub input: EmiInput,
    /// Annual interest rate in percent.
    pub annual_rate: Decimal,
    /// Number of monthly installments.
    pub tenure: u32,
    /// GST on interest, in percent.
    #[serde(default)]
    pub gst_rate: Decimal,
    /// One-time processing fee.
    #[serde(default)]
    pub processing_fees: Decimal,
    /// GST on the processing fee, in percent.
    #[serde(default)]
    pub processing_fees_gst_rate: Decimal,
    /// Extra interest charged with the first installment.
    #[serde(default)]
    pub iafe: Decimal,
    /// Due date of installment 1.
    pub first_installment_date: NaiveDate,
    /// Date the processing fee is charged, if known.
    #[serde(default)]
    pub processing_fees_date: Option<NaiveDate>,
}

/// Principal and EMI after solving the under-determined input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolvedEmi {
    /// Loan principal.
    pub principal: Decimal,
    /// Flat monthly installment.
    pub emi: Decimal,
    /// `annual_rate / 1200`.
    pub monthly_rate: Decimal,
}

/// One row of an amortization schedule.
///
/// Installment 0 is the processing fee row, present only when a fee is charged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRow {
    /// Installment number.
    pub installment: u32,
    /// Due date; the fee row may be undated.
    pub date: Option<NaiveDate>,
    /// Amount due before GST.
    pub emi: Decimal,
    /// Principal component.
    pub principal: Decimal,
    /// Interest component.
    pub interest: Decimal,
    /// GST component.
    pub gst: Decimal,
    /// `emi + gst`.
    pub total_payment: Decimal,
    /// Outstanding principal after this row.
    pub balance: Decimal,
}

impl ScheduleRow {
    /// Returns the row with every amount rounded to cents.
    #[must_use]
    pub fn rounded(&self) -> Self {
        Self {
            emi: MoneyMath::round_cents(self.emi),
            principal: MoneyMath::round_cents(self.principal),
            interest: MoneyMath::round_cents(self.interest),
            gst: MoneyMath::round_cents(self.gst),
            total_payment: MoneyMath::round_cents(self.total_payment),
            balance: MoneyMath::round_cents(self.balance),
            ..*self
        }
    }
}

/// Totals over a schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSummary {
    /// Flat monthly installment.
    pub emi: Decimal,
    /// `emi * tenure`.
    pub total_emi: Decimal,
    /// Interest over all installments, IAFE included.
    pub total_interest: Decimal,
    /// GST over all installments.
    pub total_gst: Decimal,
    /// Processing fee plus its GST.
    pub total_processing_fees: Decimal,
    /// `total_emi + iafe + total_gst + total_processing_fees`.
    pub total_amount: Decimal,
    /// Principal the schedule amortizes.
    pub effective_principal: Decimal,
}

/// A solved schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmiSchedule {
    /// Solved principal and EMI.
    pub solved: SolvedEmi,
    /// Rows in installment order, fee row first when present.
    pub rows: Vec<ScheduleRow>,
    /// Totals.
    pub summary: ScheduleSummary,
}

/// Outstanding state after a given number of paid installments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallmentStatus {
    /// Principal still owed.
    pub outstanding_balance: Decimal,
    /// Sum of `total_payment` over unpaid rows.
    pub amount_left: Decimal,
    /// Flat monthly installment, zero once fully paid.
    pub monthly_emi: Decimal,
    /// Next installment due.
    pub next_installment: Option<u32>,
    /// Date of the next installment.
    pub next_payment_date: Option<NaiveDate>,
    /// Amount of the next installment.
    pub next_payment_amount: Decimal,
    /// Every installment paid.
    pub fully_paid: bool,
}

/// Share of an EMI attributed to a friend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmiSplit {
    /// The friend.
    pub friend_id: FriendId,
    /// Share in percent.
    pub percentage: Decimal,
}
