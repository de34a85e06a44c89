//! Time-series assembly and gap filling.
//!
//! Data flow: `YearArrayBuilder` drives `DayAssembler` (one per date), which
//! drives the `DailyFetcher` (one call per category). Whole-day gaps are
//! reported to the `SkipLogger`.

pub mod day;
pub mod skip;
pub mod year;

pub use day::{AssembledDay, DayAssembler, DayBlock, DayStatus};
pub use skip::SkipLogger;
pub use year::{YearArray, YearArrayBuilder, YearBuild};
