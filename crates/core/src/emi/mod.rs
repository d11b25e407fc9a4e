//! Fixed-installment loan (EMI) amortization.
//!
//! Solves the under-determined loan terms, generates the schedule with GST
//! and processing fees, and projects outstanding state after N payments.

pub mod error;
pub mod service;
pub mod types;


pub use error::EmiError;
pub use service::EmiCalculator;
pub use types::*;
