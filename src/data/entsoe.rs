//! ENTSO-E transparency platform integration.
//!
//! - actual generation per production type (`A75` / `A16`)
//! - physical cross-border flows (`A11`)
//!
//! One HTTP request per `DayRequest`. The client owns a shared per-minute
//! request budget because every worker thread talks through the same
//! instance.

use std::sync::{Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use chrono::{DateTime, NaiveDateTime, Utc};
use log::{debug, warn};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use roxmltree::{Document, Node};

use crate::data::source::{
    DayRequest, FetchError, ProviderPoint, ProviderSeries, Resolution, SampleSource, SourceResponse,
};
use crate::domain::{DatasetKind, Zone};
use crate::error::AppError;
use crate::registry::{FLOW_EXPORT, FLOW_IMPORT};

const BASE_URL: &str = "https://web-api.tp.entsoe.eu/api";

const DOC_ACTUAL_GENERATION: &str = "A75";
const DOC_PHYSICAL_FLOW: &str = "A11";
const PROCESS_REALISED: &str = "A16";

const RATE_WINDOW: Duration = Duration::from_secs(60);

const API_KEY_VARS: [&str; 2] = ["ENTSOE_API_KEY", "API_KEY"];

pub struct EntsoeClient {
    client: Client,
    api_key: String,
    base_url: String,
    counterpart: Zone,
    limiter: RateLimiter,
}

impl EntsoeClient {
    /// Build a client from `ENTSOE_API_KEY` (or `API_KEY`), loading `.env`
    /// first if present.
    pub fn from_env(counterpart: Zone, timeout: Duration, requests_per_minute: u32) -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        let api_key = API_KEY_VARS
            .iter()
            .find_map(|var| std::env::var(var).ok().filter(|v| !v.trim().is_empty()))
            .ok_or_else(|| AppError::config("Missing ENTSOE_API_KEY (or API_KEY) in environment (.env)."))?;
        Self::new(api_key, counterpart, timeout, requests_per_minute)
    }

    pub fn new(
        api_key: impl Into<String>,
        counterpart: Zone,
        timeout: Duration,
        requests_per_minute: u32,
    ) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::provider(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: BASE_URL.to_string(),
            counterpart,
            limiter: RateLimiter::new(requests_per_minute),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Query parameters for `request`, excluding the security token.
    pub fn query_params(&self, request: &DayRequest) -> Result<Vec<(&'static str, String)>, FetchError> {
        let mut params = Vec::with_capacity(6);
        match request.kind {
            DatasetKind::GenerationAll | DatasetKind::GenerationSubset => {
                params.push(("documentType", DOC_ACTUAL_GENERATION.to_string()));
                params.push(("processType", PROCESS_REALISED.to_string()));
                params.push(("in_Domain", request.zone.eic().to_string()));
                params.push(("psrType", request.category.clone()));
            }
            DatasetKind::Flow => {
                let (into, out_of) = match request.category.as_str() {
                    FLOW_IMPORT => (request.zone, self.counterpart),
                    FLOW_EXPORT => (self.counterpart, request.zone),
                    other => {
                        return Err(FetchError::Malformed(format!("unknown flow direction '{other}'")));
                    }
                };
                params.push(("documentType", DOC_PHYSICAL_FLOW.to_string()));
                params.push(("in_Domain", into.eic().to_string()));
                params.push(("out_Domain", out_of.eic().to_string()));
            }
        }
        params.push(("periodStart", format_period(request.period_start)));
        params.push(("periodEnd", format_period(request.period_end)));
        Ok(params)
    }
}

impl SampleSource for EntsoeClient {
    fn query(&self, request: &DayRequest) -> Result<SourceResponse, FetchError> {
        let params = self.query_params(request)?;
        self.limiter.acquire();

        let resp = self
            .client
            .get(&self.base_url)
            .query(&params)
            .query(&[("securityToken", self.api_key.as_str())])
            .send()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = resp.status();
        let body = resp.text().map_err(|e| FetchError::Transport(e.to_string()))?;

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(FetchError::RateLimited);
        }
        if !status.is_success() {
            // "No matching data found" arrives as an acknowledgement document,
            // sometimes with a 400 status.
            if is_acknowledgement(&body) {
                return Ok(SourceResponse::NoData);
            }
            return Err(FetchError::Status(status.as_u16()));
        }

        parse_document(&body, request.kind)
    }
}

fn format_period(instant: DateTime<Utc>) -> String {
    instant.format("%Y%m%d%H%M").to_string()
}

/// Parse a market document into provider series.
///
/// Periods with an unreadable start or resolution are skipped; points with
/// an unreadable position or quantity are kept as invalid so the fetcher
/// can drop them individually.
pub fn parse_document(xml: &str, kind: DatasetKind) -> Result<SourceResponse, FetchError> {
    let doc = Document::parse(xml).map_err(|e| FetchError::Malformed(e.to_string()))?;
    let root = doc.root_element();
    if root.tag_name().name() == "Acknowledgement_MarketDocument" {
        return Ok(SourceResponse::NoData);
    }

    let mut series = Vec::new();
    for ts in children(root, "TimeSeries") {
        // Storage types publish a second, consumption-side series.
        if kind.is_generation() && child(ts, "outBiddingZone_Domain.mRID").is_some() {
            continue;
        }
        for period in children(ts, "Period") {
            match parse_period(period) {
                Some(s) => series.push(s),
                None => warn!("Skipping provider period with unreadable start or resolution"),
            }
        }
    }

    if series.is_empty() {
        return Ok(SourceResponse::NoData);
    }
    Ok(SourceResponse::Series(series))
}

fn parse_period(period: Node<'_, '_>) -> Option<ProviderSeries> {
    let start = child(period, "timeInterval")
        .and_then(|ti| child(ti, "start"))
        .and_then(|n| n.text())
        .and_then(parse_instant)?;
    let resolution = child(period, "resolution")
        .and_then(|n| n.text())
        .and_then(Resolution::parse)?;

    let points = children(period, "Point")
        .map(|point| ProviderPoint {
            position: child_text(point, "position")
                .and_then(|t| t.parse::<u32>().ok())
                .unwrap_or(0),
            quantity: child_text(point, "quantity").and_then(|t| t.parse::<f64>().ok()),
        })
        .collect();

    Some(ProviderSeries {
        start,
        resolution,
        points,
    })
}

fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%MZ")
        .map(|n| n.and_utc())
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|d| d.with_timezone(&Utc)))
}

fn is_acknowledgement(body: &str) -> bool {
    Document::parse(body)
        .map(|doc| doc.root_element().tag_name().name() == "Acknowledgement_MarketDocument")
        .unwrap_or(false)
}

fn children<'a, 'input: 'a>(node: Node<'a, 'input>, name: &'a str) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.children()
        .filter(move |n| n.is_element() && n.tag_name().name() == name)
}

fn child<'a, 'input: 'a>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|n| n.is_element() && n.tag_name().name() == name)
}

fn child_text<'a, 'input: 'a>(node: Node<'a, 'input>, name: &str) -> Option<&'a str> {
    child(node, name).and_then(|n| n.text()).map(str::trim)
}

/// Fixed-window request budget shared by all threads.
struct RateLimiter {
    per_window: u32,
    window: Mutex<Window>,
}

struct Window {
    started: Instant,
    count: u32,
}

impl RateLimiter {
    fn new(per_window: u32) -> Self {
        Self {
            per_window: per_window.max(1),
            window: Mutex::new(Window {
                started: Instant::now(),
                count: 0,
            }),
        }
    }

    /// Block until a request slot is available in the current window.
    fn acquire(&self) {
        loop {
            let wait = {
                let mut w = self.window.lock().unwrap_or_else(PoisonError::into_inner);
                let elapsed = w.started.elapsed();
                if elapsed >= RATE_WINDOW {
                    w.started = Instant::now();
                    w.count = 0;
                }
                if w.count < self.per_window {
                    w.count += 1;
                    return;
                }
                RATE_WINDOW.saturating_sub(elapsed)
            };
            debug!("Request budget exhausted; waiting {:.1}s", wait.as_secs_f64());
            thread::sleep(wait);
        }
    }
}
