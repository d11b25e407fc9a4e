//! Core engine for Ledgerline.
//!
//! This crate contains pure calculations with ZERO storage or transport
//! dependencies. Callers hand it grouped movement totals and records; it
//! hands back balances, bucketed reports and amortization schedules.
//!
//! # Modules
//!
//! - `ledger` - Movement kinds, transfer summaries and starting balances
//! - `reports` - Time-bucketed aggregation with carried balances
//! - `emi` - Loan amortization schedules and installment status
//! - `reconcile` - Matching statements against expected installments
//! - `split` - Split allocation validation
//! - `recurring` - Recurring payment due dates

pub mod emi;
pub mod ledger;
pub mod reconcile;
pub mod recurring;
pub mod reports;
pub mod split;
