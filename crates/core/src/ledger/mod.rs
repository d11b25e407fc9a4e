//! Ledger movements, transfer summaries and balance resolution.

pub mod balance;
pub mod summary;
pub mod types;

pub use balance::{EntityBalance, StartingBalanceResolver};
pub use summary::{AccountTransferSummary, FriendTransferSummary, TransferSummarizer, TransferTotal};
pub use types::{
    AccountMovementTotal, Bucketed, CategoryMovementKind, CategoryMovementTotal, EventKind,
    FriendMovementKind, FriendMovementTotal, StatementKind,
};
