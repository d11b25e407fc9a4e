//! Repositories over the in-memory store.
//!
//! Each mutation takes the store's write guard, validates, and only then
//! changes state. A rejected request leaves the store untouched.

pub mod account;
pub mod boundary;
pub mod emi;
pub mod recurring;
pub mod report;
pub mod split;
pub mod statement;

pub use account::{AccountRepository, CreateAccountInput, CreateFriendInput, UpdateAccountInput};
pub use boundary::BoundaryRepository;
pub use emi::{CreateEmiInput, EmiRepository, UpdateEmiInput};
pub use recurring::{CreateRecurringPaymentInput, RecurringPaymentRepository};
pub use report::{Grouping, ReportRepository};
pub use split::{CreateSplitInput, SplitRepository};
pub use statement::{
    CreateSelfTransferInput, CreateStatementInput, StatementRepository, UpdateStatementInput,
};
