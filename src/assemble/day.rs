//! Day assembler: one zone, one date, every category -> one row-block.

use chrono::NaiveDate;
use log::{debug, warn};

use crate::assemble::skip::SkipLogger;
use crate::data::{DailyFetcher, FetchOutcome, SampleSource};
use crate::domain::{INTERVALS_PER_DAY, Zone, interval_index};
use crate::registry::ColumnMapping;

/// `INTERVALS_PER_DAY` rows of `columns` values, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct DayBlock {
    date: NaiveDate,
    columns: usize,
    values: Vec<f64>,
}

impl DayBlock {
    pub fn zeros(date: NaiveDate, columns: usize) -> Self {
        Self {
            date,
            columns,
            values: vec![0.0; INTERVALS_PER_DAY * columns],
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.values.len() / self.columns.max(1)
    }

    pub fn row(&self, interval: usize) -> &[f64] {
        &self.values[interval * self.columns..(interval + 1) * self.columns]
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
    }

    pub fn is_all_zero(&self) -> bool {
        self.values.iter().all(|v| *v == 0.0)
    }
}

/// How complete a date turned out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayStatus {
    /// Every cell carries a provider value.
    Complete,
    /// Some cells are zero-filled; `missing_cells` counts them.
    Partial { missing_cells: usize },
    /// No category had data; the block is all zeros and the date was logged.
    Skipped,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssembledDay {
    pub block: DayBlock,
    pub status: DayStatus,
    /// Malformed provider points plus samples that could not be placed
    /// (off-grid, outside the day, duplicate).
    pub dropped_samples: usize,
}

pub struct DayAssembler<'a, S> {
    fetcher: &'a DailyFetcher<S>,
    skip_log: &'a SkipLogger,
}

impl<'a, S: SampleSource> DayAssembler<'a, S> {
    pub fn new(fetcher: &'a DailyFetcher<S>, skip_log: &'a SkipLogger) -> Self {
        Self { fetcher, skip_log }
    }

    /// Fetch every category of `mapping` for `date` and lay the samples
    /// out by interval and column.
    ///
    /// A category with no data leaves its column zero. If no category has
    /// data the date is recorded in the skip log.
    pub fn assemble(&self, zone: Zone, date: NaiveDate, mapping: &ColumnMapping) -> AssembledDay {
        let columns = mapping.len();
        let mut block = DayBlock::zeros(date, columns);
        let mut filled = vec![false; INTERVALS_PER_DAY * columns];
        let mut categories_with_data = 0usize;
        let mut dropped = 0usize;

        for (column, category) in mapping.iter() {
            let samples = match self.fetcher.fetch(zone, mapping.kind(), category, date) {
                FetchOutcome::Samples { samples, dropped: malformed } => {
                    dropped += malformed;
                    samples
                }
                FetchOutcome::NoData { dropped: malformed } => {
                    dropped += malformed;
                    continue;
                }
            };

            let mut placed = 0usize;
            for sample in samples {
                let Some(interval) = interval_index(date, sample.timestamp) else {
                    dropped += 1;
                    continue;
                };
                let cell = interval * columns + column;
                if filled[cell] {
                    dropped += 1;
                    continue;
                }
                block.values[cell] = sample.value_mw;
                filled[cell] = true;
                placed += 1;
            }
            if placed > 0 {
                categories_with_data += 1;
            }
        }

        if dropped > 0 {
            debug!("{zone} {date}: {dropped} sample(s) dropped as malformed or off-grid");
        }

        let status = if categories_with_data == 0 {
            warn!("{zone} {date}: no data for any {} category; zero-filling the day", mapping.kind());
            self.skip_log.record(zone, date);
            DayStatus::Skipped
        } else {
            match filled.iter().filter(|f| !**f).count() {
                0 => DayStatus::Complete,
                missing_cells => DayStatus::Partial { missing_cells },
            }
        };

        AssembledDay {
            block,
            status,
            dropped_samples: dropped,
        }
    }
}
