//! Shared types, errors, and configuration for Ledgerline.
//!
//! This crate provides common types used across all other crates:
//! - Money arithmetic with decimal precision
//! - Typed IDs for type-safe entity references
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::{AppConfig, EngineConfig, ReconciliationConfig, RecurringConfig};
pub use error::AppError;
