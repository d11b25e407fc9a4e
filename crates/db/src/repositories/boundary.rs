//! Report boundary repository.

use chrono::{DateTime, Utc};
use ledgerline_shared::types::{ReportBoundaryId, UserId};
use tracing::info;

use crate::error::StoreError;
use crate::records::ReportBoundaryRecord;
use crate::store::MemoryStore;

/// Repository for custom report boundaries.
#[derive(Debug, Clone)]
pub struct BoundaryRepository {
    store: MemoryStore,
}

impl BoundaryRepository {
    /// Creates a new boundary repository.
    #[must_use]
    pub const fn new(store: MemoryStore) -> Self {
        Self { store }
    }

    /// Adds a boundary. Adding an existing instant returns the stored record.
    pub async fn add(&self, user_id: UserId, at: DateTime<Utc>) -> ReportBoundaryRecord {
        let mut state = self.store.write().await;
        if let Some(existing) = state
            .report_boundaries
            .values()
            .find(|b| b.user_id == user_id && b.at == at)
        {
            return *existing;
        }

        let record = ReportBoundaryRecord {
            id: ReportBoundaryId::new(),
            user_id,
            at,
        };
        state.report_boundaries.insert(record.id, record);
        info!(boundary_id = %record.id, at = %at, "report boundary added");
        record
    }

    /// Removes a boundary.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the boundary is missing or not owned.
    pub async fn remove(
        &self,
        user_id: UserId,
        boundary_id: ReportBoundaryId,
    ) -> Result<(), StoreError> {
        let mut state = self.store.write().await;
        let owned = state
            .report_boundaries
            .get(&boundary_id)
            .is_some_and(|b| b.user_id == user_id);
        if !owned {
            return Err(StoreError::not_found("report_boundary", boundary_id));
        }
        state.report_boundaries.remove(&boundary_id);
        info!(boundary_id = %boundary_id, "report boundary removed");
        Ok(())
    }

    /// The caller's boundaries in ascending order.
    pub async fn list(&self, user_id: UserId) -> Vec<ReportBoundaryRecord> {
        let state = self.store.read().await;
        let mut boundaries: Vec<ReportBoundaryRecord> = state
            .report_boundaries
            .values()
            .filter(|b| b.user_id == user_id)
            .copied()
            .collect();
        boundaries.sort_by_key(|b| b.at);
        boundaries
    }
}
