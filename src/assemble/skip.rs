//! Skip log: whole days that were zero-filled.

use std::sync::{Mutex, PoisonError};

use chrono::NaiveDate;

use crate::domain::{SkipRecord, Zone};

/// Append-only collector, safe to share between per-date tasks.
///
/// `flush` always returns records sorted by date, so callers may `record`
/// in any order.
#[derive(Debug, Default)]
pub struct SkipLogger {
    records: Mutex<Vec<SkipRecord>>,
}

impl SkipLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, zone: Zone, date: NaiveDate) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(SkipRecord { zone, date });
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drain everything recorded since the previous flush, ascending by date.
    pub fn flush(&self) -> Vec<SkipRecord> {
        let mut out = std::mem::take(&mut *self.records.lock().unwrap_or_else(PoisonError::into_inner));
        out.sort_by_key(|r| (r.date, r.zone));
        out
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, day).unwrap()
    }

    #[test]
    fn flush_sorts_regardless_of_record_order() {
        let log = SkipLogger::new();
        log.record(Zone::Dk1, d(9));
        log.record(Zone::Dk1, d(2));
        log.record(Zone::Dk1, d(5));
        assert_eq!(log.len(), 3);

        let dates: Vec<NaiveDate> = log.flush().into_iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![d(2), d(5), d(9)]);
        assert!(log.is_empty());
        assert!(log.flush().is_empty());
    }

    #[test]
    fn concurrent_records_are_all_kept() {
        let log = SkipLogger::new();
        thread::scope(|scope| {
            for day in (1..=28).rev() {
                let log = &log;
                scope.spawn(move || log.record(Zone::Dk2, d(day)));
            }
        });
        let flushed = log.flush();
        assert_eq!(flushed.len(), 28);
        assert!(flushed.windows(2).all(|w| w[0].date < w[1].date));
    }
}
