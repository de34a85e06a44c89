//! Reporting utilities: array inspection and formatted terminal output.

use chrono::{Days, NaiveDate};

use crate::domain::{INTERVALS_PER_DAY, intervals_in_year};
use crate::error::AppError;
use crate::io::NpyArray;

pub mod format;

pub use format::*;

/// A whole day of all-zero rows found in an array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZeroDay {
    /// Day index within the array (row block `index * 96 ..`).
    pub index: usize,
    /// Calendar date, when the array's year is known.
    pub date: Option<NaiveDate>,
}

/// What `inspect` learned about an array file.
#[derive(Debug, Clone)]
pub struct Inspection {
    pub rows: usize,
    pub cols: usize,
    pub year: Option<i32>,
    pub zero_days: Vec<ZeroDay>,
    /// Cells equal to zero outside the all-zero days.
    pub scattered_zero_cells: usize,
    /// Dates from the matching skip log, if one was found.
    pub logged: Option<Vec<NaiveDate>>,
}

impl Inspection {
    pub fn days(&self) -> usize {
        self.rows / INTERVALS_PER_DAY
    }

    /// All-zero days that the skip log does not mention.
    pub fn unlogged_zero_days(&self) -> Vec<NaiveDate> {
        let Some(logged) = &self.logged else {
            return Vec::new();
        };
        self.zero_days
            .iter()
            .filter_map(|d| d.date)
            .filter(|date| !logged.contains(date))
            .collect()
    }

    /// Logged dates whose rows are not all zero.
    pub fn logged_days_with_data(&self) -> Vec<NaiveDate> {
        let Some(logged) = &self.logged else {
            return Vec::new();
        };
        logged
            .iter()
            .copied()
            .filter(|date| !self.zero_days.iter().any(|d| d.date == Some(*date)))
            .collect()
    }

    pub fn is_consistent(&self) -> bool {
        self.unlogged_zero_days().is_empty() && self.logged_days_with_data().is_empty()
    }
}

/// Scan an array for whole zero days.
///
/// The row count must be a whole number of days, and match the calendar
/// year when one is given.
pub fn inspect_array(
    array: &NpyArray,
    year: Option<i32>,
    logged: Option<Vec<NaiveDate>>,
) -> Result<Inspection, AppError> {
    if array.rows % INTERVALS_PER_DAY != 0 {
        return Err(AppError::shape(format!(
            "Array has {} rows, not a whole number of {INTERVALS_PER_DAY}-row days.",
            array.rows
        )));
    }
    if let Some(year) = year {
        let expected = intervals_in_year(year);
        if array.rows != expected {
            return Err(AppError::shape(format!(
                "Array has {} rows but {year} needs {expected}.",
                array.rows
            )));
        }
    }

    let first = year.and_then(|y| NaiveDate::from_ymd_opt(y, 1, 1));
    let day_len = INTERVALS_PER_DAY * array.cols;
    let mut zero_days = Vec::new();
    let mut scattered_zero_cells = 0usize;

    if day_len > 0 {
        for (index, block) in array.values.chunks_exact(day_len).enumerate() {
            if block.iter().all(|v| *v == 0.0) {
                let date = first.and_then(|d| d.checked_add_days(Days::new(index as u64)));
                zero_days.push(ZeroDay { index, date });
            } else {
                scattered_zero_cells += block.iter().filter(|v| **v == 0.0).count();
            }
        }
    }

    Ok(Inspection {
        rows: array.rows,
        cols: array.cols,
        year,
        zero_days,
        scattered_zero_cells,
        logged,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn array_with_zero_days(days: usize, cols: usize, zero: &[usize]) -> NpyArray {
        let mut values = vec![1.0; days * INTERVALS_PER_DAY * cols];
        for day in zero {
            let start = day * INTERVALS_PER_DAY * cols;
            values[start..start + INTERVALS_PER_DAY * cols].fill(0.0);
        }
        values[0] = 0.0;
        NpyArray {
            rows: days * INTERVALS_PER_DAY,
            cols,
            values,
        }
    }

    fn d(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, month, day).unwrap()
    }

    #[test]
    fn finds_zero_days_and_dates_them() {
        let array = array_with_zero_days(365, 2, &[3, 364]);
        let report = inspect_array(&array, Some(2025), Some(vec![d(1, 4), d(12, 31)])).unwrap();

        assert_eq!(report.days(), 365);
        assert_eq!(
            report.zero_days,
            vec![
                ZeroDay { index: 3, date: Some(d(1, 4)) },
                ZeroDay { index: 364, date: Some(d(12, 31)) },
            ]
        );
        assert_eq!(report.scattered_zero_cells, 1);
        assert!(report.is_consistent());
    }

    #[test]
    fn flags_disagreement_with_the_skip_log() {
        let array = array_with_zero_days(365, 1, &[3]);
        let report = inspect_array(&array, Some(2025), Some(vec![d(2, 1)])).unwrap();
        assert_eq!(report.unlogged_zero_days(), vec![d(1, 4)]);
        assert_eq!(report.logged_days_with_data(), vec![d(2, 1)]);
        assert!(!report.is_consistent());
    }

    #[test]
    fn rejects_rows_that_do_not_fit_the_year() {
        let array = array_with_zero_days(365, 1, &[]);
        assert!(inspect_array(&array, Some(2024), None).is_err());

        let ragged = NpyArray { rows: 100, cols: 1, values: vec![1.0; 100] };
        assert_eq!(inspect_array(&ragged, None, None).unwrap_err().exit_code(), crate::error::EXIT_SHAPE);
    }

    #[test]
    fn unknown_year_leaves_days_undated() {
        let array = array_with_zero_days(2, 1, &[1]);
        let report = inspect_array(&array, None, None).unwrap();
        assert_eq!(report.zero_days, vec![ZeroDay { index: 1, date: None }]);
        assert!(report.is_consistent());
    }
}
