//! Machine-readable run summary (JSON).

use std::path::Path;

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::{DatasetKind, Zone};
use crate::error::AppError;
use crate::io::npy::write_atomic;

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub tool: String,
    pub year: i32,
    pub kind: DatasetKind,
    pub interval_minutes: i64,
    pub units: String,
    pub zones: Vec<ZoneSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ZoneSummary {
    pub zone: Zone,
    pub array_file: String,
    pub columns_file: String,
    pub skip_log_file: String,
    pub shape: [usize; 2],
    pub skipped_dates: Vec<NaiveDate>,
    pub partial_dates: Vec<NaiveDate>,
    pub dropped_samples: usize,
}

pub fn write_summary_json(path: &Path, summary: &RunSummary) -> Result<(), AppError> {
    let json = serde_json::to_vec_pretty(summary)
        .map_err(|e| AppError::io(format!("Failed to serialize run summary: {e}")))?;
    write_atomic(path, &json)
}
