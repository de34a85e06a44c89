//! Provider data access.
//!
//! - request/response types and the `SampleSource` seam (`source`)
//! - retrying, normalizing per-day fetcher (`fetcher`)
//! - ENTSO-E HTTP client (`entsoe`)

pub mod entsoe;
pub mod fetcher;
pub mod source;

pub use entsoe::EntsoeClient;
pub use fetcher::{DailyFetcher, FetchOutcome};
pub use source::{DayRequest, FetchError, ProviderPoint, ProviderSeries, Resolution, SampleSource, SourceResponse};

#[cfg(test)]
pub(crate) mod stub;
