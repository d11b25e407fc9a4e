//! Split allocation validation.
//!
//! The splits of a statement never add up to more than the statement's
//! amount. Checks run before every insert or update, and bulk percentage
//! splits are planned for the whole batch or rejected for all of it.

pub mod error;
pub mod service;

pub use error::SplitError;
pub use service::{PlannedSplit, SplitTarget, SplitValidator};
