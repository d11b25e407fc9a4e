//! Report reads: starting balances, window balances and time series.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use ledgerline_core::reports::{
    BoundarySet, BucketReport, Bucketing, ReportService, TimeUnit, WindowReport,
};
use ledgerline_shared::types::UserId;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::query::{LedgerQuery, StartingBalances, Window};
use crate::store::MemoryStore;

/// How a time-series report is bucketed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "unit", rename_all = "snake_case")]
pub enum Grouping {
    /// Calendar unit in the repository's timezone.
    Unit(TimeUnit),
    /// The caller's saved report boundaries.
    Boundaries,
}

/// Repository for balance reports.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    store: MemoryStore,
    tz: Tz,
}

impl ReportRepository {
    /// Creates a report repository that truncates calendar units in `tz`.
    #[must_use]
    pub const fn new(store: MemoryStore, tz: Tz) -> Self {
        Self { store, tz }
    }

    /// Balances of every account and friend at `as_of`.
    pub async fn starting_balances(
        &self,
        user_id: UserId,
        as_of: Option<DateTime<Utc>>,
    ) -> StartingBalances {
        self.store.read().await.starting_balances(user_id, as_of)
    }

    /// Starting balance, summary and final balance of every entity over
    /// `[start, end)`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDateRange` when `start` is after `end`.
    pub async fn window_report(
        &self,
        user_id: UserId,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<WindowReport, StoreError> {
        ReportService::validate_window(start, end)?;
        let window = Window::new(start, end);

        let state = self.store.read().await;
        let starting = state.starting_balances(user_id, start);
        let account_rows = state.account_totals(user_id, window);
        let friend_rows = state.friend_totals(user_id, window);
        drop(state);

        Ok(ReportService::window_report(
            start,
            end,
            &starting.accounts,
            &starting.friends,
            &account_rows,
            &friend_rows,
        ))
    }

    /// Time series of balances over `[start, end)`.
    ///
    /// `now` closes the custom boundary set; boundaries after it are ignored.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDateRange` when `start` is after `end`.
    pub async fn bucketed_report(
        &self,
        user_id: UserId,
        grouping: Grouping,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<Vec<BucketReport>, StoreError> {
        ReportService::validate_window(start, end)?;
        let window = Window::new(start, end);

        let state = self.store.read().await;
        let bucketing = match grouping {
            Grouping::Unit(unit) => Bucketing::Unit { unit },
            Grouping::Boundaries => {
                let user_boundaries = state
                    .report_boundaries
                    .values()
                    .filter(|b| b.user_id == user_id)
                    .map(|b| b.at);
                Bucketing::Boundaries {
                    set: BoundarySet::new(user_boundaries, now),
                }
            }
        };
        let starting = state.starting_balances(user_id, start);
        let rows = state.bucketed_totals(user_id, &bucketing, self.tz, window);
        drop(state);

        let buckets =
            ReportService::aggregate_buckets(&starting.accounts, &starting.friends, &rows);
        tracing::debug!(user_id = %user_id, buckets = buckets.len(), "bucketed report built");
        Ok(buckets)
    }
}
