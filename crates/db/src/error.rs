//! Storage error types.

use ledgerline_core::emi::EmiError;
use ledgerline_core::reconcile::ReconcileError;
use ledgerline_core::recurring::RecurringError;
use ledgerline_core::reports::ReportError;
use ledgerline_core::split::SplitError;
use ledgerline_shared::AppError;
use thiserror::Error;
use uuid::Uuid;

/// Errors returned by repositories.
///
/// A mutation that fails leaves the store untouched.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Record does not exist or belongs to another user.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Record kind.
        entity: &'static str,
        /// Record ID.
        id: Uuid,
    },

    /// Referenced account or friend belongs to another user.
    #[error("{entity} {id} is not owned by the caller")]
    NotOwned {
        /// Record kind.
        entity: &'static str,
        /// Record ID.
        id: Uuid,
    },

    /// Malformed input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Split constraint failed.
    #[error(transparent)]
    Split(#[from] SplitError),

    /// EMI input or split failed.
    #[error(transparent)]
    Emi(#[from] EmiError),

    /// Link or unlink rejected.
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    /// Recurrence rule failed.
    #[error(transparent)]
    Recurring(#[from] RecurringError),

    /// Report parameters rejected.
    #[error(transparent)]
    Report(#[from] ReportError),

    /// Snapshot file could not be read or written.
    #[error("Snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot file is not valid JSON for the ledger state.
    #[error("Snapshot format error: {0}")]
    Snapshot(#[from] serde_json::Error),
}

impl StoreError {
    /// Shorthand for a missing record.
    #[must_use]
    pub fn not_found(entity: &'static str, id: impl Into<Uuid>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Shorthand for a reference to another user's record.
    #[must_use]
    pub fn not_owned(entity: &'static str, id: impl Into<Uuid>) -> Self {
        Self::NotOwned {
            entity,
            id: id.into(),
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::NotOwned { .. } => "NOT_OWNED",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Split(e) => e.error_code(),
            Self::Emi(e) => e.error_code(),
            Self::Reconcile(e) => e.error_code(),
            Self::Recurring(e) => e.error_code(),
            Self::Report(e) => e.error_code(),
            Self::Io(_) | Self::Snapshot(_) => "SNAPSHOT_ERROR",
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        let message = err.to_string();
        match err {
            StoreError::NotFound { .. } => Self::NotFound(message),
            StoreError::NotOwned { .. } => Self::BusinessRule(message),
            StoreError::Validation(_) | StoreError::Report(_) => Self::Validation(message),
            StoreError::Split(SplitError::DuplicateFriend { .. })
            | StoreError::Reconcile(ReconcileError::AlreadyLinked(_)) => Self::Conflict(message),
            StoreError::Split(e) if e.is_validation() => Self::Validation(message),
            StoreError::Emi(e) if e.is_validation() => Self::Validation(message),
            StoreError::Reconcile(e) if e.is_not_found() => Self::NotFound(message),
            StoreError::Recurring(RecurringError::NoDueDateInWindow { .. })
            | StoreError::Split(_)
            | StoreError::Emi(_)
            | StoreError::Reconcile(_) => Self::BusinessRule(message),
            StoreError::Recurring(_) => Self::Validation(message),
            StoreError::Io(_) | StoreError::Snapshot(_) => Self::Internal(message),
        }
    }
}
