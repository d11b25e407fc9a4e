//! Balance reports over windows and time buckets.
//!
//! This module provides pure logic for:
//! - Window balances (starting balance + movements)
//! - Time-series buckets with balances carried across bucket edges
//! - Per-category expense breakdown net of splits

pub mod bucketing;
pub mod error;
pub mod service;
pub mod types;


pub use bucketing::{BoundarySet, Bucketing, TimeUnit};
pub use error::ReportError;
pub use service::ReportService;
pub use types::*;
