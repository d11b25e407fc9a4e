//! Bucket assignment for time-series reports.
//!
//! Fixed units truncate in the caller's timezone: an event at 23:30 local
//! time on the last day of a month belongs to that month even when the UTC
//! instant already falls in the next one. Bucket keys are the UTC instants
//! of the local bucket starts.

use std::fmt;
use std::str::FromStr;

use chrono::{
    DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc,
};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use super::error::ReportError;

/// Calendar unit used for fixed bucketing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeUnit {
    /// Calendar day.
    Day,
    /// ISO week starting on Monday.
    Week,
    /// Calendar month.
    Month,
    /// Calendar quarter (Jan, Apr, Jul, Oct).
    Quarter,
    /// Calendar year.
    Year,
}

impl TimeUnit {
    /// Truncates a local calendar date to the first day of its unit.
    #[must_use]
    pub fn truncate(self, date: NaiveDate) -> NaiveDate {
        match self {
            Self::Day => date,
            Self::Week => date - Duration::days(i64::from(date.weekday().num_days_from_monday())),
            Self::Month => date.with_day(1).unwrap_or(date),
            Self::Quarter => {
                let month = (date.month0() / 3) * 3 + 1;
                NaiveDate::from_ymd_opt(date.year(), month, 1).unwrap_or(date)
            }
            Self::Year => NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap_or(date),
        }
    }

    /// Returns the bucket key of an instant, truncating in `tz`.
    #[must_use]
    pub fn bucket_start(self, ts: DateTime<Utc>, tz: Tz) -> DateTime<Utc> {
        let local_date = ts.with_timezone(&tz).date_naive();
        local_midnight(self.truncate(local_date), tz)
    }
}

impl FromStr for TimeUnit {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "day" | "daily" => Ok(Self::Day),
            "week" | "weekly" => Ok(Self::Week),
            "month" | "monthly" => Ok(Self::Month),
            "quarter" | "quarterly" => Ok(Self::Quarter),
            "year" | "yearly" => Ok(Self::Year),
            other => Err(ReportError::InvalidTimeUnit(other.to_string())),
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Quarter => "quarter",
            Self::Year => "year",
        };
        f.write_str(name)
    }
}

/// UTC instant of local midnight on `date`.
///
/// Ambiguous midnights resolve to the earlier instant. Midnights skipped by a
/// DST jump resolve to the first valid local time an hour later.
fn local_midnight(date: NaiveDate, tz: Tz) -> DateTime<Utc> {
    let midnight = NaiveDateTime::new(date, NaiveTime::MIN);
    match tz.from_local_datetime(&midnight) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.with_timezone(&Utc),
        LocalResult::None => tz
            .from_local_datetime(&(midnight + Duration::hours(1)))
            .earliest()
            .map_or_else(|| Utc.from_utc_datetime(&midnight), |dt| dt.with_timezone(&Utc)),
    }
}

/// Sorted, deduplicated custom boundaries bracketed by the epoch and `now`.
///
/// Each consecutive pair is a bucket `[start, end)`. Boundaries after `now`
/// are dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoundarySet {
    boundaries: Vec<DateTime<Utc>>,
}

impl BoundarySet {
    /// Builds the set from user boundaries and the current instant.
    pub fn new<I>(user_boundaries: I, now: DateTime<Utc>) -> Self
    where
        I: IntoIterator<Item = DateTime<Utc>>,
    {
        let mut boundaries: Vec<DateTime<Utc>> = user_boundaries
            .into_iter()
            .filter(|b| *b <= now)
            .chain([DateTime::<Utc>::UNIX_EPOCH, now])
            .collect();
        boundaries.sort_unstable();
        boundaries.dedup();
        Self { boundaries }
    }

    /// Boundaries in ascending order.
    #[must_use]
    pub fn boundaries(&self) -> &[DateTime<Utc>] {
        &self.boundaries
    }

    /// Returns the greatest boundary at or before `ts`.
    ///
    /// Instants before the epoch belong to the epoch bucket.
    #[must_use]
    pub fn bucket_for(&self, ts: DateTime<Utc>) -> DateTime<Utc> {
        let idx = self.boundaries.partition_point(|b| *b <= ts);
        match idx.checked_sub(1) {
            Some(i) => self.boundaries[i],
            None => self.boundaries.first().copied().unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
        }
    }
}

/// How movements are assigned to buckets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Bucketing {
    /// Fixed calendar unit truncated in local time.
    Unit {
        /// The calendar unit.
        unit: TimeUnit,
    },
    /// User-defined boundaries.
    Boundaries {
        /// The boundary set.
        set: BoundarySet,
    },
}

impl Bucketing {
    /// Returns the bucket key of an instant.
    #[must_use]
    pub fn bucket_start(&self, ts: DateTime<Utc>, tz: Tz) -> DateTime<Utc> {
        match self {
            Self::Unit { unit } => unit.bucket_start(ts, tz),
            Self::Boundaries { set } => set.bucket_for(ts),
        }
    }
}
