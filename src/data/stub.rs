//! Offline provider stand-ins shared by unit tests.

use std::time::Duration;

use chrono::Datelike;

use crate::data::fetcher::DailyFetcher;
use crate::data::source::{
    DayRequest, FetchError, ProviderPoint, ProviderSeries, Resolution, SampleSource, SourceResponse,
};
use crate::domain::{INTERVALS_PER_DAY, MarketClock, RetryPolicy};

pub fn no_wait_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 2,
        base_delay: Duration::ZERO,
        max_delay: Duration::ZERO,
        rate_limit_cooldown: Duration::ZERO,
    }
}

pub fn fetcher<S: SampleSource>(source: S) -> DailyFetcher<S> {
    DailyFetcher::new(source, MarketClock::default(), no_wait_retry())
}

/// A complete 15-minute day; `value(position)` gives each point's MW.
pub fn full_day(request: &DayRequest, value: impl Fn(u32) -> f64) -> SourceResponse {
    positions(request, 1..=INTERVALS_PER_DAY as u32, value)
}

/// A 15-minute day containing only the listed positions.
pub fn positions(
    request: &DayRequest,
    positions: impl IntoIterator<Item = u32>,
    value: impl Fn(u32) -> f64,
) -> SourceResponse {
    let points = positions
        .into_iter()
        .map(|position| ProviderPoint {
            position,
            quantity: Some(value(position)),
        })
        .collect();
    SourceResponse::Series(vec![ProviderSeries {
        start: request.period_start,
        resolution: Resolution::Pt15m,
        points,
    }])
}

/// Deterministic, non-zero value for a request's category/date/position.
pub fn signature(request: &DayRequest, position: u32) -> f64 {
    let category: u32 = request.category.bytes().map(u32::from).sum();
    f64::from(category % 97) + f64::from(position) / 100.0 + f64::from(request.date.ordinal())
}

pub type StubResult = Result<SourceResponse, FetchError>;
