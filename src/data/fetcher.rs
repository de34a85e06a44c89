//! Daily sample fetcher.
//!
//! Wraps a `SampleSource` with:
//! - bounded exponential backoff for transient failures
//! - normalization of provider series onto the 15-minute market grid
//! - per-sample validation (bad values are dropped, not fatal)
//!
//! Every failure mode ends in `FetchOutcome::NoData`; nothing here aborts a
//! build.

use std::thread;

use chrono::{NaiveDate, TimeDelta};
use log::{debug, warn};

use crate::data::source::{DayRequest, FetchError, ProviderSeries, SampleSource, SourceResponse};
use crate::domain::{DatasetKind, INTERVAL_MINUTES, MarketClock, RetryPolicy, Sample, Zone};
use crate::registry::Category;

/// Largest average power accepted from the provider for a single series.
pub const MAX_PLAUSIBLE_MW: f64 = 100_000.0;

/// `dropped` counts provider points discarded as malformed.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Samples { samples: Vec<Sample>, dropped: usize },
    NoData { dropped: usize },
}

impl FetchOutcome {
    pub fn is_no_data(&self) -> bool {
        matches!(self, FetchOutcome::NoData { .. })
    }

    pub fn dropped(&self) -> usize {
        match self {
            FetchOutcome::Samples { dropped, .. } | FetchOutcome::NoData { dropped } => *dropped,
        }
    }
}

pub struct DailyFetcher<S> {
    source: S,
    clock: MarketClock,
    retry: RetryPolicy,
}

impl<S: SampleSource> DailyFetcher<S> {
    pub fn new(source: S, clock: MarketClock, retry: RetryPolicy) -> Self {
        Self { source, clock, retry }
    }

    pub fn clock(&self) -> MarketClock {
        self.clock
    }

    /// Fetch one category for one zone on one market day.
    pub fn fetch(&self, zone: Zone, kind: DatasetKind, category: &Category, date: NaiveDate) -> FetchOutcome {
        let request = self.request_for(zone, kind, category, date);

        let series = match self.query_with_retry(&request) {
            Ok(SourceResponse::Series(series)) => series,
            Ok(SourceResponse::NoData) => {
                debug!("{zone} {date} {}: provider has no data", category.code);
                return FetchOutcome::NoData { dropped: 0 };
            }
            Err(err) => {
                warn!("{zone} {date} {}: giving up ({err}); treating as no data", category.code);
                return FetchOutcome::NoData { dropped: 0 };
            }
        };

        let (samples, dropped) = normalize_series(&series, &self.clock);
        if dropped > 0 {
            debug!(
                "{zone} {date} {}: dropped {dropped} malformed point(s)",
                category.code
            );
        }
        if samples.is_empty() {
            return FetchOutcome::NoData { dropped };
        }
        FetchOutcome::Samples { samples, dropped }
    }

    pub fn request_for(&self, zone: Zone, kind: DatasetKind, category: &Category, date: NaiveDate) -> DayRequest {
        let period_start = self.clock.day_start_utc(date);
        DayRequest {
            zone,
            kind,
            category: category.code.clone(),
            date,
            period_start,
            period_end: period_start + TimeDelta::days(1),
        }
    }

    fn query_with_retry(&self, request: &DayRequest) -> Result<SourceResponse, FetchError> {
        let mut attempt = 0u32;
        loop {
            match self.source.query(request) {
                Ok(response) => return Ok(response),
                Err(err) if err.is_retryable() && attempt + 1 < self.retry.max_attempts => {
                    let delay = match err {
                        FetchError::RateLimited => self.retry.rate_limit_cooldown,
                        _ => self.retry.backoff(attempt),
                    };
                    warn!(
                        "{} {} {}: attempt {} failed ({err}); retrying in {:.1}s",
                        request.zone,
                        request.date,
                        request.category,
                        attempt + 1,
                        delay.as_secs_f64()
                    );
                    thread::sleep(delay);
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// Expand provider series onto 15-minute samples in market time.
///
/// A point at position `p` of a series starting at `s` with resolution `r`
/// covers `[s + (p-1)*r, s + p*r)`; its value is an average power, so it is
/// copied to every 15-minute slot it covers.
///
/// Returns the samples plus the number of points dropped as malformed.
pub fn normalize_series(series: &[ProviderSeries], clock: &MarketClock) -> (Vec<Sample>, usize) {
    let mut samples = Vec::new();
    let mut dropped = 0usize;

    for s in series {
        let step = s.resolution.minutes();
        let slots = step / INTERVAL_MINUTES;
        for point in &s.points {
            let value = match point.quantity {
                Some(v) if is_plausible(v) => v,
                _ => {
                    dropped += 1;
                    continue;
                }
            };
            if point.position == 0 {
                dropped += 1;
                continue;
            }
            let offset = (i64::from(point.position) - 1) * step;
            let instants: Option<Vec<_>> = (0..slots)
                .map(|k| {
                    TimeDelta::try_minutes(offset + k * INTERVAL_MINUTES)
                        .and_then(|delta| s.start.checked_add_signed(delta))
                })
                .collect();
            // Positions far past the representable date range.
            let Some(instants) = instants else {
                dropped += 1;
                continue;
            };
            samples.extend(instants.into_iter().map(|instant| Sample {
                timestamp: clock.to_market_time(instant),
                value_mw: value,
            }));
        }
    }

    (samples, dropped)
}

fn is_plausible(value: f64) -> bool {
    value.is_finite() && (0.0..=MAX_PLAUSIBLE_MW).contains(&value)
}
