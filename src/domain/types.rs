//! Shared domain types.
//!
//! These types are deliberately small and copyable so they can be passed
//! into per-date worker tasks without shared mutable state.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeDelta, Utc};
use serde::{Serialize, Serializer};

use crate::error::AppError;

/// Length of one interval on the canonical grid.
pub const INTERVAL_MINUTES: i64 = 15;

/// Number of 15-minute intervals in one market day.
pub const INTERVALS_PER_DAY: usize = 96;

/// Number of calendar days in `year` (365 or 366).
pub fn days_in_year(year: i32) -> u32 {
    if NaiveDate::from_ymd_opt(year, 2, 29).is_some() {
        366
    } else {
        365
    }
}

/// Expected row count of a year array.
pub fn intervals_in_year(year: i32) -> usize {
    days_in_year(year) as usize * INTERVALS_PER_DAY
}

/// Every calendar date of `year`, ascending.
pub fn year_dates(year: i32) -> Result<Vec<NaiveDate>, AppError> {
    let first = NaiveDate::from_ymd_opt(year, 1, 1)
        .ok_or_else(|| AppError::config(format!("Year {year} is outside the supported date range.")))?;
    let dates: Vec<NaiveDate> = first.iter_days().take_while(|d| d.year() == year).collect();
    if dates.len() != days_in_year(year) as usize {
        return Err(AppError::config(format!(
            "Year {year} is not fully representable (got {} dates).",
            dates.len()
        )));
    }
    Ok(dates)
}

/// Interval slot of `timestamp` within `date`, or `None` if the timestamp is
/// off the 15-minute grid or falls outside the day.
pub fn interval_index(date: NaiveDate, timestamp: NaiveDateTime) -> Option<usize> {
    let offset = timestamp - date.and_time(NaiveTime::MIN);
    let seconds = offset.num_seconds();
    if seconds < 0 || offset != TimeDelta::seconds(seconds) || seconds % (INTERVAL_MINUTES * 60) != 0 {
        return None;
    }
    let idx = (seconds / (INTERVAL_MINUTES * 60)) as usize;
    (idx < INTERVALS_PER_DAY).then_some(idx)
}

/// Which array layout to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DatasetKind {
    /// Actual generation for every production type.
    GenerationAll,
    /// Actual generation for a short, fixed list of production types.
    GenerationSubset,
    /// Physical cross-border flow between a zone and its counterpart.
    Flow,
}

impl DatasetKind {
    pub const ALL: [DatasetKind; 3] = [
        DatasetKind::GenerationAll,
        DatasetKind::GenerationSubset,
        DatasetKind::Flow,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            DatasetKind::GenerationAll => "generation-all",
            DatasetKind::GenerationSubset => "generation-subset",
            DatasetKind::Flow => "flow",
        }
    }

    /// Label used inside artifact file names.
    pub fn file_label(self) -> &'static str {
        match self {
            DatasetKind::GenerationAll => "generation_all",
            DatasetKind::GenerationSubset => "generation_subset",
            DatasetKind::Flow => "flow",
        }
    }

    pub fn is_generation(self) -> bool {
        matches!(self, DatasetKind::GenerationAll | DatasetKind::GenerationSubset)
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for DatasetKind {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase().replace('_', "-");
        DatasetKind::ALL
            .into_iter()
            .find(|kind| kind.slug() == normalized)
            .ok_or_else(|| {
                let known: Vec<&str> = DatasetKind::ALL.iter().map(|k| k.slug()).collect();
                AppError::config(format!(
                    "Unknown dataset kind '{raw}' (expected one of: {}).",
                    known.join(", ")
                ))
            })
    }
}

/// Market / bidding zone known to the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Zone {
    Dk,
    Dk1,
    Dk2,
    DeLu,
    Se3,
    Se4,
    No2,
    Nl,
}

impl Zone {
    pub const ALL: [Zone; 8] = [
        Zone::Dk,
        Zone::Dk1,
        Zone::Dk2,
        Zone::DeLu,
        Zone::Se3,
        Zone::Se4,
        Zone::No2,
        Zone::Nl,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Zone::Dk => "DK",
            Zone::Dk1 => "DK1",
            Zone::Dk2 => "DK2",
            Zone::DeLu => "DE-LU",
            Zone::Se3 => "SE3",
            Zone::Se4 => "SE4",
            Zone::No2 => "NO2",
            Zone::Nl => "NL",
        }
    }

    /// Energy Identification Code used in provider queries.
    pub fn eic(self) -> &'static str {
        match self {
            Zone::Dk => "10Y1001A1001A796",
            Zone::Dk1 => "10YDK-1--------W",
            Zone::Dk2 => "10YDK-2--------M",
            Zone::DeLu => "10Y1001A1001A82H",
            Zone::Se3 => "10Y1001A1001A46L",
            Zone::Se4 => "10Y1001A1001A47J",
            Zone::No2 => "10YNO-2--------T",
            Zone::Nl => "10YNL----------L",
        }
    }

    /// Label used inside artifact file names (`DE-LU` -> `DE_LU`).
    pub fn file_label(self) -> String {
        self.code().replace('-', "_")
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Zone {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_uppercase().replace('_', "-");
        Zone::ALL
            .into_iter()
            .find(|zone| zone.code() == normalized)
            .ok_or_else(|| {
                let known: Vec<&str> = Zone::ALL.iter().map(|z| z.code()).collect();
                AppError::config(format!("Unknown zone '{raw}' (expected one of: {}).", known.join(", ")))
            })
    }
}

impl Serialize for Zone {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

/// One normalized provider observation: average power over the 15-minute
/// interval starting at `timestamp` (market clock).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub timestamp: NaiveDateTime,
    pub value_mw: f64,
}

/// A date for which every category came back empty and the whole day was
/// zero-filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SkipRecord {
    pub zone: Zone,
    pub date: NaiveDate,
}

/// Fixed-offset clock that defines where market days begin.
///
/// A fixed offset (no DST) keeps every day at exactly `INTERVALS_PER_DAY`
/// intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarketClock {
    offset: FixedOffset,
}

impl MarketClock {
    pub fn from_offset_hours(hours: i32) -> Result<Self, AppError> {
        let offset = hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| AppError::config(format!("Invalid UTC offset: {hours} hours.")))?;
        Ok(Self { offset })
    }

    pub fn utc() -> Self {
        Self { offset: Utc.fix() }
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// UTC instant at which `date` starts on this clock.
    pub fn day_start_utc(&self, date: NaiveDate) -> DateTime<Utc> {
        let local = date.and_time(NaiveTime::MIN);
        (local - TimeDelta::seconds(i64::from(self.offset.local_minus_utc()))).and_utc()
    }

    pub fn to_market_time(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        instant.with_timezone(&self.offset).naive_local()
    }
}

impl Default for MarketClock {
    /// Central European Time without daylight saving.
    fn default() -> Self {
        Self {
            offset: FixedOffset::east_opt(3600).unwrap_or_else(|| Utc.fix()),
        }
    }
}

/// Bounded exponential backoff for one provider request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one (`1` disables retries).
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Wait applied after the provider answers "too many requests".
    pub rate_limit_cooldown: Duration,
}

impl RetryPolicy {
    /// Delay before retry number `attempt + 1` (attempt is zero-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(60),
            rate_limit_cooldown: Duration::from_secs(605),
        }
    }
}

/// A full `build` run as understood by the pipeline.
///
/// Derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct BuildConfig {
    pub zones: Vec<Zone>,
    pub year: i32,
    pub kind: DatasetKind,
    /// Other side of every flow; ignored for generation kinds.
    pub counterpart: Zone,
    pub out_dir: PathBuf,
    /// Worker threads for per-date assembly (`1` = sequential).
    pub jobs: usize,
    pub clock: MarketClock,
    pub retry: RetryPolicy,
    pub request_timeout: Duration,
    pub requests_per_minute: u32,
    pub summary_json: Option<PathBuf>,
}

impl BuildConfig {
    /// Reject configurations that can only fail later.
    ///
    /// Runs before any provider request is issued.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.zones.is_empty() {
            return Err(AppError::config("At least one --zone is required."));
        }
        if self.jobs == 0 {
            return Err(AppError::config("--jobs must be >= 1."));
        }
        if self.retry.max_attempts == 0 {
            return Err(AppError::config("--retries must be >= 1."));
        }
        if self.requests_per_minute == 0 {
            return Err(AppError::config("--requests-per-minute must be >= 1."));
        }
        year_dates(self.year)?;
        if self.kind == DatasetKind::Flow {
            if let Some(zone) = self.zones.iter().find(|z| **z == self.counterpart) {
                return Err(AppError::config(format!(
                    "Zone {zone} cannot be its own flow counterpart."
                )));
            }
        }
        Ok(())
    }
}
