//! Due-date projection for recurring payments.

use std::fmt;
use std::str::FromStr;

use chrono::{Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use super::error::RecurringError;

/// How often a payment recurs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    /// Every `multiplier` days.
    Daily,
    /// Every `multiplier` weeks.
    Weekly,
    /// Every `multiplier` calendar months.
    Monthly,
    /// Every `multiplier` years.
    Yearly,
}

impl FromStr for Frequency {
    type Err = RecurringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" | "day" => Ok(Self::Daily),
            "weekly" | "week" => Ok(Self::Weekly),
            "monthly" | "month" => Ok(Self::Monthly),
            "yearly" | "year" | "annual" => Ok(Self::Yearly),
            other => Err(RecurringError::InvalidFrequency(other.to_string())),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        })
    }
}

/// A validated recurrence.
///
/// Occurrence `i` is always computed from the start date, so monthly rules
/// started on the 31st land on the last day of shorter months without
/// drifting afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceRule {
    start_date: NaiveDate,
    end_date: Option<NaiveDate>,
    frequency: Frequency,
    multiplier: u32,
}

impl RecurrenceRule {
    /// Creates a rule.
    ///
    /// # Errors
    ///
    /// Rejects a zero multiplier and an end date before the start date.
    pub fn new(
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
        frequency: Frequency,
        multiplier: u32,
    ) -> Result<Self, RecurringError> {
        if multiplier == 0 {
            return Err(RecurringError::ZeroMultiplier);
        }
        if let Some(end) = end_date
            && end < start_date
        {
            return Err(RecurringError::EndBeforeStart {
                start: start_date,
                end,
            });
        }
        Ok(Self {
            start_date,
            end_date,
            frequency,
            multiplier,
        })
    }

    /// First due date.
    #[must_use]
    pub const fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    /// Last possible due date, if bounded.
    #[must_use]
    pub const fn end_date(&self) -> Option<NaiveDate> {
        self.end_date
    }

    /// Recurrence frequency.
    #[must_use]
    pub const fn frequency(&self) -> Frequency {
        self.frequency
    }

    /// Frequency multiplier.
    #[must_use]
    pub const fn multiplier(&self) -> u32 {
        self.multiplier
    }

    /// The `index`-th due date (0 is the start date), or `None` past the end.
    #[must_use]
    pub fn occurrence(&self, index: u32) -> Option<NaiveDate> {
        let steps = index.checked_mul(self.multiplier)?;
        let date = match self.frequency {
            Frequency::Daily => self.start_date.checked_add_days(Days::new(u64::from(steps))),
            Frequency::Weekly => self
                .start_date
                .checked_add_days(Days::new(u64::from(steps).checked_mul(7)?)),
            Frequency::Monthly => self.start_date.checked_add_months(Months::new(steps)),
            Frequency::Yearly => self
                .start_date
                .checked_add_months(Months::new(steps.checked_mul(12)?)),
        }?;
        match self.end_date {
            Some(end) if date > end => None,
            _ => Some(date),
        }
    }

    /// Due dates in `[from, to]`, ascending.
    #[must_use]
    pub fn due_dates_between(&self, from: NaiveDate, to: NaiveDate) -> Vec<NaiveDate> {
        let mut dates = Vec::new();
        let mut index = 0u32;
        while let Some(date) = self.occurrence(index) {
            if date > to {
                break;
            }
            if date >= from {
                dates.push(date);
            }
            index = match index.checked_add(1) {
                Some(next) => next,
                None => break,
            };
        }
        dates
    }

    /// First due date on or after `date`.
    #[must_use]
    pub fn next_due_on_or_after(&self, date: NaiveDate) -> Option<NaiveDate> {
        let mut index = 0u32;
        loop {
            let due = self.occurrence(index)?;
            if due >= date {
                return Some(due);
            }
            index = index.checked_add(1)?;
        }
    }

    /// The due date nearest to a payment made on `date`.
    ///
    /// Only due dates within `window_days` either side count; ties go to
    /// the earlier due date.
    pub fn match_due_date(
        &self,
        date: NaiveDate,
        window_days: i64,
    ) -> Result<NaiveDate, RecurringError> {
        let window = Days::new(window_days.unsigned_abs());
        let from = date.checked_sub_days(window).unwrap_or(NaiveDate::MIN);
        let to = date.checked_add_days(window).unwrap_or(NaiveDate::MAX);
        self.due_dates_between(from, to)
            .into_iter()
            .min_by_key(|due| (*due - date).num_days().abs())
            .ok_or(RecurringError::NoDueDateInWindow { date, window_days })
    }
}
