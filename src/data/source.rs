//! Provider-facing request/response types and the `SampleSource` seam.
//!
//! A source performs exactly one request per call and reports failures as
//! `FetchError`; retries and normalization live in `fetcher`.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};

use crate::domain::{DatasetKind, Zone};

/// One provider query: a single category for a single zone on one market day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayRequest {
    pub zone: Zone,
    pub kind: DatasetKind,
    pub category: String,
    pub date: NaiveDate,
    /// Inclusive start of the market day in UTC.
    pub period_start: DateTime<Utc>,
    /// Exclusive end of the market day in UTC.
    pub period_end: DateTime<Utc>,
}

/// Native resolution of a provider series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Pt15m,
    Pt30m,
    Pt60m,
}

impl Resolution {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "PT15M" => Some(Resolution::Pt15m),
            "PT30M" => Some(Resolution::Pt30m),
            "PT60M" | "PT1H" => Some(Resolution::Pt60m),
            _ => None,
        }
    }

    pub fn minutes(self) -> i64 {
        match self {
            Resolution::Pt15m => 15,
            Resolution::Pt30m => 30,
            Resolution::Pt60m => 60,
        }
    }
}

/// A positional point as published: position 1 covers the first slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProviderPoint {
    pub position: u32,
    /// `None` when the published quantity could not be parsed.
    pub quantity: Option<f64>,
}

/// One contiguous provider period.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSeries {
    pub start: DateTime<Utc>,
    pub resolution: Resolution,
    pub points: Vec<ProviderPoint>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SourceResponse {
    Series(Vec<ProviderSeries>),
    /// The provider has nothing published for this request.
    NoData,
}

/// Why a single provider request failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Connection, timeout or body-read failure.
    Transport(String),
    /// HTTP 429.
    RateLimited,
    /// Any other non-success HTTP status.
    Status(u16),
    /// The response body could not be interpreted.
    Malformed(String),
}

impl FetchError {
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Transport(_) | FetchError::RateLimited => true,
            FetchError::Status(code) => *code >= 500,
            FetchError::Malformed(_) => false,
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Transport(msg) => write!(f, "transport error: {msg}"),
            FetchError::RateLimited => write!(f, "rate limited by provider (HTTP 429)"),
            FetchError::Status(code) => write!(f, "provider returned HTTP {code}"),
            FetchError::Malformed(msg) => write!(f, "malformed provider response: {msg}"),
        }
    }
}

impl std::error::Error for FetchError {}

/// Anything that can answer a `DayRequest`.
///
/// Sources are shared across per-date worker threads, hence `Sync`.
pub trait SampleSource: Sync {
    fn query(&self, request: &DayRequest) -> Result<SourceResponse, FetchError>;
}

impl<F> SampleSource for F
where
    F: Fn(&DayRequest) -> Result<SourceResponse, FetchError> + Sync,
{
    fn query(&self, request: &DayRequest) -> Result<SourceResponse, FetchError> {
        self(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_parsing() {
        assert_eq!(Resolution::parse("PT15M"), Some(Resolution::Pt15m));
        assert_eq!(Resolution::parse(" PT60M "), Some(Resolution::Pt60m));
        assert_eq!(Resolution::parse("P1D"), None);
        assert_eq!(Resolution::Pt30m.minutes(), 30);
    }

    #[test]
    fn only_transient_failures_are_retryable() {
        assert!(FetchError::Transport("reset".into()).is_retryable());
        assert!(FetchError::RateLimited.is_retryable());
        assert!(FetchError::Status(503).is_retryable());
        assert!(!FetchError::Status(401).is_retryable());
        assert!(!FetchError::Malformed("bad xml".into()).is_retryable());
    }
}
