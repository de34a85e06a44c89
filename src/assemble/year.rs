//! Year array builder.
//!
//! Drives the day assembler over every date of a year, optionally on a
//! rayon pool, then reorders the blocks by date and concatenates them into
//! a `(days_in_year * 96, columns)` array. Any shape mismatch is fatal.

use chrono::NaiveDate;
use log::info;
use rayon::prelude::*;

use crate::assemble::day::{AssembledDay, DayAssembler, DayBlock, DayStatus};
use crate::assemble::skip::SkipLogger;
use crate::data::{DailyFetcher, SampleSource};
use crate::domain::{DatasetKind, INTERVALS_PER_DAY, SkipRecord, Zone, intervals_in_year, year_dates};
use crate::error::AppError;
use crate::registry::CategoryRegistry;

/// Dense, row-major year of 15-minute values for one zone and dataset kind.
#[derive(Debug, Clone, PartialEq)]
pub struct YearArray {
    zone: Zone,
    kind: DatasetKind,
    year: i32,
    rows: usize,
    cols: usize,
    values: Vec<f64>,
}

impl YearArray {
    /// Concatenate date-ordered day blocks, asserting the final shape.
    pub fn from_day_blocks(
        zone: Zone,
        kind: DatasetKind,
        year: i32,
        cols: usize,
        blocks: Vec<DayBlock>,
    ) -> Result<Self, AppError> {
        if let Some(pair) = blocks.windows(2).find(|w| w[0].date() >= w[1].date()) {
            return Err(AppError::shape(format!(
                "{zone} {kind} {year}: day blocks out of order ({} before {}).",
                pair[0].date(),
                pair[1].date()
            )));
        }
        if let Some(bad) = blocks
            .iter()
            .find(|b| b.columns() != cols || b.rows() != INTERVALS_PER_DAY)
        {
            return Err(AppError::shape(format!(
                "{zone} {kind} {year}: block for {} has shape ({}, {}), expected ({INTERVALS_PER_DAY}, {cols}).",
                bad.date(),
                bad.rows(),
                bad.columns()
            )));
        }

        let mut values = Vec::with_capacity(blocks.len() * INTERVALS_PER_DAY * cols);
        for block in blocks {
            values.extend(block.into_values());
        }

        let rows = if cols == 0 { 0 } else { values.len() / cols };
        let expected_rows = intervals_in_year(year);
        if rows != expected_rows || values.len() != expected_rows * cols {
            return Err(AppError::shape(format!(
                "{zone} {kind} {year}: assembled shape ({rows}, {cols}) does not match expected ({expected_rows}, {cols})."
            )));
        }

        Ok(Self {
            zone,
            kind,
            year,
            rows,
            cols,
            values,
        })
    }

    pub fn zone(&self) -> Zone {
        self.zone
    }

    pub fn kind(&self) -> DatasetKind {
        self.kind
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn row(&self, row: usize) -> &[f64] {
        &self.values[row * self.cols..(row + 1) * self.cols]
    }

    /// The `INTERVALS_PER_DAY` rows of the zero-based `day` of the year.
    pub fn day_rows(&self, day: usize) -> &[f64] {
        let width = INTERVALS_PER_DAY * self.cols;
        &self.values[day * width..(day + 1) * width]
    }
}

/// Result of one zone/year build.
#[derive(Debug, Clone)]
pub struct YearBuild {
    pub array: YearArray,
    /// Whole days zero-filled, ascending by date.
    pub skipped: Vec<SkipRecord>,
    /// Days with some, but not all, cells zero-filled.
    pub partial_days: Vec<NaiveDate>,
    pub dropped_samples: usize,
}

pub struct YearArrayBuilder<'a, S> {
    registry: &'a CategoryRegistry,
    fetcher: &'a DailyFetcher<S>,
    jobs: usize,
}

impl<'a, S: SampleSource> YearArrayBuilder<'a, S> {
    pub fn new(registry: &'a CategoryRegistry, fetcher: &'a DailyFetcher<S>) -> Self {
        Self {
            registry,
            fetcher,
            jobs: 1,
        }
    }

    /// Assemble up to `jobs` dates concurrently (`1` = sequential).
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    pub fn build(&self, zone: Zone, year: i32, kind: DatasetKind) -> Result<YearBuild, AppError> {
        // Configuration problems surface before the first request.
        let mapping = self.registry.columns_for(kind)?;
        let dates = year_dates(year)?;

        info!(
            "{zone} {kind} {year}: assembling {} days x {} categories ({} job(s))",
            dates.len(),
            mapping.len(),
            self.jobs
        );

        let skip_log = SkipLogger::new();
        let assembler = DayAssembler::new(self.fetcher, &skip_log);

        let mut days: Vec<AssembledDay> = if self.jobs == 1 {
            dates.iter().map(|&date| assembler.assemble(zone, date, mapping)).collect()
        } else {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.jobs)
                .build()
                .map_err(|e| AppError::config(format!("Failed to start {} worker threads: {e}", self.jobs)))?;
            pool.install(|| {
                dates
                    .par_iter()
                    .map(|&date| assembler.assemble(zone, date, mapping))
                    .collect()
            })
        };

        // Row position is date-determined, never completion-order-determined.
        days.sort_by_key(|d| d.block.date());

        let partial_days: Vec<NaiveDate> = days
            .iter()
            .filter(|d| matches!(d.status, DayStatus::Partial { .. }))
            .map(|d| d.block.date())
            .collect();
        let dropped_samples = days.iter().map(|d| d.dropped_samples).sum();

        let blocks = days.into_iter().map(|d| d.block).collect();
        let array = YearArray::from_day_blocks(zone, kind, year, mapping.len(), blocks)?;
        let skipped = skip_log.flush();

        info!(
            "{zone} {kind} {year}: shape {:?}, {} skipped day(s), {} partial day(s)",
            array.shape(),
            skipped.len(),
            partial_days.len()
        );

        Ok(YearBuild {
            array,
            skipped,
            partial_days,
            dropped_samples,
        })
    }
}
