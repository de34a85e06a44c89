//! Companion text artifacts: column documentation and skip logs.
//!
//! Both are regenerated from the registry and the build result on every
//! run, so they can never drift from the array they describe.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::domain::{DatasetKind, INTERVAL_MINUTES, INTERVALS_PER_DAY, MarketClock, SkipRecord, Zone};
use crate::io::npy::write_atomic;
use crate::registry::ColumnMapping;

/// Output files for one (zone, dataset kind, year).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub array: PathBuf,
    pub columns: PathBuf,
    pub skip_log: PathBuf,
}

impl ArtifactPaths {
    pub fn new(out_dir: &Path, zone: Zone, kind: DatasetKind, year: i32) -> Self {
        let stem = format!("{}_{}_{year}", zone.file_label(), kind.file_label());
        Self {
            array: out_dir.join(format!("{stem}.npy")),
            columns: out_dir.join(format!("{stem}_columns.txt")),
            skip_log: out_dir.join(format!("{stem}_skipped.txt")),
        }
    }
}

/// Facts about a produced array file that go into its column doc.
#[derive(Debug, Clone)]
pub struct ArrayContext<'a> {
    pub file_name: &'a str,
    pub zone: Zone,
    pub year: i32,
    pub shape: (usize, usize),
    pub clock: MarketClock,
    /// Flow counterpart, if the kind is a flow.
    pub counterpart: Option<Zone>,
}

/// Human-readable column mapping; `context` adds file-specific details.
pub fn render_column_doc(mapping: &ColumnMapping, context: Option<&ArrayContext<'_>>) -> String {
    let mut out = String::new();

    match context {
        Some(ctx) => out.push_str(&format!(
            "--- Data Explanation: {} {} {} ---\n",
            ctx.zone,
            mapping.kind(),
            ctx.year
        )),
        None => out.push_str(&format!("--- Data Explanation: {} ---\n", mapping.kind())),
    }

    out.push_str("\n--- General Information ---\n");
    out.push_str("- File format: NumPy array (.npy), little-endian float64, row-major\n");
    out.push_str(&format!(
        "- Time resolution: {INTERVAL_MINUTES}-minute intervals ({INTERVALS_PER_DAY} rows per day)\n"
    ));
    out.push_str("- Units: Average power in Megawatts (MW)\n");
    out.push_str("- Missing source data: zero-filled (see the matching _skipped.txt for whole days)\n");

    if let Some(ctx) = context {
        out.push_str(&format!("- File: {}\n", ctx.file_name));
        out.push_str(&format!("- Array shape: ({}, {})\n", ctx.shape.0, ctx.shape.1));
        out.push_str(&format!("- Data period: {}-01-01 to {}-12-31\n", ctx.year, ctx.year));
        out.push_str(&format!("- Day boundary: 00:00 at UTC{}\n", ctx.clock.offset()));
        if let Some(counterpart) = ctx.counterpart {
            out.push_str(&format!("- Flow counterpart: {counterpart}\n"));
        }
    }

    out.push_str("\n--- Column Mapping ---\n");
    for (column, category) in mapping.iter() {
        out.push_str(&format!("- Column {column}: {} ({})\n", category.code, category.description));
    }
    out
}

/// Skip log for one build: every whole day that was zero-filled.
pub fn render_skip_log(zone: Zone, kind: DatasetKind, year: i32, records: &[SkipRecord]) -> String {
    let mut out = format!("--- Zero-filled days: {zone} {kind} {year} ---\n");
    out.push_str(&format!(
        "Each listed date has {INTERVALS_PER_DAY} all-zero rows because the provider returned no data for any category.\n"
    ));
    out.push_str(&format!("Total: {}\n", records.len()));
    if !records.is_empty() {
        out.push('\n');
    }
    for record in records {
        out.push_str(&format!("{} {}\n", record.zone, record.date));
    }
    out
}

/// Dates listed in a skip log produced by `render_skip_log`.
pub fn parse_skip_log(contents: &str) -> Vec<NaiveDate> {
    contents
        .lines()
        .filter_map(|line| line.split_whitespace().nth(1))
        .filter_map(|token| NaiveDate::parse_from_str(token, "%Y-%m-%d").ok())
        .collect()
}

pub fn write_text(path: &Path, contents: &str) -> Result<(), crate::error::AppError> {
    write_atomic(path, contents.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::CategoryRegistry;

    #[test]
    fn artifact_names_follow_zone_kind_year() {
        let paths = ArtifactPaths::new(Path::new("out"), Zone::DeLu, DatasetKind::GenerationAll, 2024);
        assert_eq!(paths.array, Path::new("out/DE_LU_generation_all_2024.npy"));
        assert_eq!(paths.columns, Path::new("out/DE_LU_generation_all_2024_columns.txt"));
        assert_eq!(paths.skip_log, Path::new("out/DE_LU_generation_all_2024_skipped.txt"));
    }

    #[test]
    fn column_doc_lists_every_column_in_order() {
        let registry = CategoryRegistry::standard().unwrap();
        let mapping = registry.columns_for(DatasetKind::GenerationAll).unwrap();
        let ctx = ArrayContext {
            file_name: "DK1_generation_all_2025.npy",
            zone: Zone::Dk1,
            year: 2025,
            shape: (35040, 21),
            clock: MarketClock::default(),
            counterpart: None,
        };
        let doc = render_column_doc(mapping, Some(&ctx));
        assert!(doc.contains("- Array shape: (35040, 21)"));
        assert!(doc.contains("- Time resolution: 15-minute intervals"));
        assert!(doc.contains("- Units: Average power in Megawatts (MW)"));
        assert!(doc.contains("- Day boundary: 00:00 at UTC+01:00"));
        assert!(doc.contains("- Column 0: B02 (Fossil Brown coal/Lignite)"));
        assert!(doc.contains("- Column 20: B25 (Energy storage)"));
        assert!(!doc.contains("counterpart"));
        assert_eq!(doc.lines().filter(|l| l.starts_with("- Column ")).count(), 21);
    }

    #[test]
    fn skip_log_lists_dates_that_parse_back() {
        let d = |day| NaiveDate::from_ymd_opt(2025, 1, day).unwrap();
        let records = [
            SkipRecord { zone: Zone::Dk1, date: d(4) },
            SkipRecord { zone: Zone::Dk1, date: d(20) },
        ];
        let log = render_skip_log(Zone::Dk1, DatasetKind::Flow, 2025, &records);
        assert!(log.contains("Total: 2"));
        assert!(log.contains("DK1 2025-01-04"));
        assert_eq!(parse_skip_log(&log), vec![d(4), d(20)]);

        let empty = render_skip_log(Zone::Dk1, DatasetKind::Flow, 2025, &[]);
        assert!(empty.contains("Total: 0"));
        assert!(parse_skip_log(&empty).is_empty());
    }
}
