//! Storage layer for the ledger engine.
//!
//! This crate provides:
//! - Persisted record types and a JSON-snapshot backed in-memory store
//! - The [`LedgerQuery`] layer that turns records into grouped engine rows
//! - Repositories that validate and mutate under a single write guard

pub mod error;
pub mod query;
pub mod records;
pub mod repositories;
pub mod store;

pub use error::StoreError;
pub use query::{LedgerQuery, StartingBalances, Window};
pub use repositories::{
    AccountRepository, BoundaryRepository, EmiRepository, RecurringPaymentRepository,
    ReportRepository, SplitRepository, StatementRepository,
};
pub use store::{LedgerState, MemoryStore};
