//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - zones and dataset kinds (`Zone`, `DatasetKind`)
//! - the 15-minute interval grid and market clock (`MarketClock`)
//! - normalized observations and skip records (`Sample`, `SkipRecord`)
//! - run configuration (`BuildConfig`, `RetryPolicy`)

pub mod types;

pub use types::*;
