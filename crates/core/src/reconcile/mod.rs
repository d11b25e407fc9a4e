//! Statement to installment reconciliation.
//!
//! Links must be contiguous: the only installment that may be linked next is
//! the one after the highest linked installment, and only the highest linked
//! installment may be unlinked. The processing fee row is installment 0.

pub mod error;
pub mod service;

pub use error::ReconcileError;
pub use service::{MatchTolerance, Reconciler};
