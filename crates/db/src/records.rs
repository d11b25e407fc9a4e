//! Persisted records.
//!
//! Balances are never stored; every read recomputes them from these records.

use chrono::{DateTime, Utc};
use ledgerline_core::emi::{EmiSplit, EmiTerms};
use ledgerline_core::ledger::StatementKind;
use ledgerline_core::recurring::RecurrenceRule;
use ledgerline_shared::types::{
    AccountId, EmiId, FriendId, RecurringPaymentId, ReportBoundaryId, SelfTransferId, SplitId,
    StatementId, UserId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A user's account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    /// Account ID.
    pub id: AccountId,
    /// Owner.
    pub user_id: UserId,
    /// Display name.
    pub name: String,
    /// Balance before any recorded movement.
    pub starting_balance: Decimal,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// A counterparty. Its baseline balance is always zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendRecord {
    /// Friend ID.
    pub id: FriendId,
    /// Owner.
    pub user_id: UserId,
    /// Display name.
    pub name: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// Link between a statement and an EMI installment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmiLink {
    /// The EMI.
    pub emi_id: EmiId,
    /// Installment number; 0 is the processing fee.
    pub installment: u32,
}

/// A dated money movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementRecord {
    /// Statement ID.
    pub id: StatementId,
    /// Owner.
    pub user_id: UserId,
    /// Statement kind.
    pub kind: StatementKind,
    /// Signed amount.
    pub amount: Decimal,
    /// Category label.
    pub category: String,
    /// Free-form tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Account the money moved through.
    pub account_id: Option<AccountId>,
    /// Friend involved.
    pub friend_id: Option<FriendId>,
    /// When it happened.
    pub occurred_at: DateTime<Utc>,
    /// Installment this statement pays, if any.
    #[serde(default)]
    pub emi_link: Option<EmiLink>,
}

/// A friend's share of a statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitRecord {
    /// Split ID.
    pub id: SplitId,
    /// Owner.
    pub user_id: UserId,
    /// Parent statement.
    pub statement_id: StatementId,
    /// Friend owing the share.
    pub friend_id: FriendId,
    /// Share amount.
    pub amount: Decimal,
}

/// Money moved between two of the user's accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelfTransferRecord {
    /// Transfer ID.
    pub id: SelfTransferId,
    /// Owner.
    pub user_id: UserId,
    /// Source account (leg `-amount`).
    pub from_account_id: AccountId,
    /// Destination account (leg `+amount`).
    pub to_account_id: AccountId,
    /// Amount moved.
    pub amount: Decimal,
    /// When it happened.
    pub occurred_at: DateTime<Utc>,
}

/// A loan with its solved principal and EMI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmiRecord {
    /// EMI ID.
    pub id: EmiId,
    /// Owner.
    pub user_id: UserId,
    /// Display name.
    pub name: String,
    /// Loan terms as entered.
    pub terms: EmiTerms,
    /// Solved principal.
    pub principal: Decimal,
    /// Solved monthly installment.
    pub emi: Decimal,
    /// Account the installments are paid from.
    pub account_id: Option<AccountId>,
    /// Friends sharing the loan.
    #[serde(default)]
    pub splits: Vec<EmiSplit>,
}

/// A custom report boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportBoundaryRecord {
    /// Boundary ID.
    pub id: ReportBoundaryId,
    /// Owner.
    pub user_id: UserId,
    /// Boundary instant.
    pub at: DateTime<Utc>,
}

/// A recurring payment definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurringPaymentRecord {
    /// Recurring payment ID.
    pub id: RecurringPaymentId,
    /// Owner.
    pub user_id: UserId,
    /// Display name.
    pub name: String,
    /// Expected amount.
    pub amount: Decimal,
    /// Account it is paid from.
    pub account_id: Option<AccountId>,
    /// Due-date rule.
    pub rule: RecurrenceRule,
}
