//! Starting-balance resolution.
//!
//! A balance is never stored. It is always `baseline + movements` over some
//! range, so the balance at a window start is the baseline plus every
//! movement strictly before it, and the final balance of a window is the
//! starting balance plus the window's movements.

use chrono::{DateTime, Utc};
use ledgerline_shared::types::money::MoneyMath;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::summary::TransferTotal;

/// Starting and final balance of one entity over a window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityBalance<Id, S> {
    /// The account or friend.
    pub entity_id: Id,
    /// Balance at the window start.
    pub starting_balance: Decimal,
    /// Movements inside the window.
    pub summary: S,
    /// `starting_balance + summary.total_transfers`.
    pub final_balance: Decimal,
}

/// Resolves the balance of an entity at the start of a window.
pub struct StartingBalanceResolver;

impl StartingBalanceResolver {
    /// Returns the balance at `start`.
    ///
    /// With no start the window is open-ended and the baseline is returned
    /// as is. Otherwise `prior_totals` is asked for the summary of every
    /// movement strictly before `start`; it is not called for open windows.
    pub fn resolve<S, F>(
        baseline: Decimal,
        start: Option<DateTime<Utc>>,
        prior_totals: F,
    ) -> Decimal
    where
        S: TransferTotal,
        F: FnOnce(DateTime<Utc>) -> S,
    {
        match start {
            None => baseline,
            Some(start) => MoneyMath::add(baseline, prior_totals(start).total_transfers()),
        }
    }

    /// Resolves many entities at once from precomputed prior summaries.
    ///
    /// Entities with no prior movement keep their baseline exactly.
    pub fn resolve_all<Id, S, I, F>(
        baselines: I,
        start: Option<DateTime<Utc>>,
        mut prior: F,
    ) -> Vec<(Id, Decimal)>
    where
        Id: Copy,
        S: TransferTotal,
        I: IntoIterator<Item = (Id, Decimal)>,
        F: FnMut(Id) -> Option<S>,
    {
        baselines
            .into_iter()
            .map(|(id, baseline)| {
                let balance = Self::resolve(baseline, start, |_| PriorOrZero(prior(id)));
                (id, balance)
            })
            .collect()
    }

    /// Combines starting balances with the window's summaries.
    ///
    /// `starting` drives the output: every entity gets a row, with a default
    /// summary when it did not move inside the window.
    pub fn window_balances<Id, S, I, F>(starting: I, mut window: F) -> Vec<EntityBalance<Id, S>>
    where
        S: TransferTotal + Default,
        I: IntoIterator<Item = (Id, Decimal)>,
        F: FnMut(&Id) -> Option<S>,
    {
        starting
            .into_iter()
            .map(|(entity_id, starting_balance)| {
                let summary = window(&entity_id).unwrap_or_default();
                let final_balance = MoneyMath::add(starting_balance, summary.total_transfers());
                EntityBalance {
                    entity_id,
                    starting_balance,
                    summary,
                    final_balance,
                }
            })
            .collect()
    }
}

/// Missing prior summary counts as zero movement.
struct PriorOrZero<S>(Option<S>);

impl<S: TransferTotal> TransferTotal for PriorOrZero<S> {
    fn total_transfers(&self) -> Decimal {
        self.0.as_ref().map_or(Decimal::ZERO, TransferTotal::total_transfers)
    }
}
