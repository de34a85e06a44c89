//! Formatted terminal output.
//!
//! Formatting lives here so the assembly code stays free of presentation
//! concerns and output changes stay local.

use crate::app::pipeline::ZoneOutcome;
use crate::domain::BuildConfig;
use crate::report::Inspection;

/// How many dates to print before eliding the rest.
const DATE_PREVIEW: usize = 10;

/// Per-zone result table for a finished build.
pub fn format_build_summary(outcomes: &[ZoneOutcome], config: &BuildConfig) -> String {
    let mut out = String::new();

    out.push_str("=== gridfill - ENTSO-E 15-minute arrays ===\n");
    out.push_str(&format!("Kind: {}\n", config.kind));
    out.push_str(&format!("Year: {}\n", config.year));
    out.push_str(&format!("Day boundary: 00:00 at UTC{}\n", config.clock.offset()));
    out.push_str(&format!("Output: {}\n\n", config.out_dir.display()));

    out.push_str(&format!(
        "{:<6}  {:>14}  {:>7}  {:>7}  {:>7}  {}\n",
        "Zone", "Shape", "Skipped", "Partial", "Dropped", "Array"
    ));
    for o in outcomes {
        let (rows, cols) = o.build.array.shape();
        out.push_str(&format!(
            "{:<6}  {:>14}  {:>7}  {:>7}  {:>7}  {}\n",
            o.build.array.zone().code(),
            format!("({rows}, {cols})"),
            o.build.skipped.len(),
            o.build.partial_days.len(),
            o.build.dropped_samples,
            o.paths.array.display()
        ));
    }

    for o in outcomes.iter().filter(|o| !o.build.skipped.is_empty()) {
        let dates: Vec<String> = o.build.skipped.iter().map(|s| s.date.to_string()).collect();
        out.push_str(&format!(
            "\n{} zero-filled days: {}\n",
            o.build.array.zone(),
            preview(&dates)
        ));
    }

    out
}

/// Human-readable inspection report.
pub fn format_inspection(report: &Inspection, file: &str) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== {file} ===\n"));
    out.push_str(&format!("Shape: ({}, {})\n", report.rows, report.cols));
    match report.year {
        Some(year) => out.push_str(&format!("Year: {year} ({} days)\n", report.days())),
        None => out.push_str(&format!("Year: unknown ({} days)\n", report.days())),
    }
    out.push_str(&format!("All-zero days: {}\n", report.zero_days.len()));

    let labels: Vec<String> = report
        .zero_days
        .iter()
        .map(|d| match d.date {
            Some(date) => date.to_string(),
            None => format!("day #{}", d.index),
        })
        .collect();
    if !labels.is_empty() {
        out.push_str(&format!("  {}\n", preview(&labels)));
    }
    out.push_str(&format!(
        "Zero cells outside those days: {}\n",
        report.scattered_zero_cells
    ));

    match &report.logged {
        None => out.push_str("Skip log: not found\n"),
        Some(logged) => {
            out.push_str(&format!("Skip log: {} date(s)\n", logged.len()));
            if report.is_consistent() {
                out.push_str("Skip log matches the zero days.\n");
            } else {
                let unlogged: Vec<String> = report.unlogged_zero_days().iter().map(|d| d.to_string()).collect();
                let with_data: Vec<String> = report
                    .logged_days_with_data()
                    .iter()
                    .map(|d| d.to_string())
                    .collect();
                if !unlogged.is_empty() {
                    out.push_str(&format!("Zero days missing from the log: {}\n", preview(&unlogged)));
                }
                if !with_data.is_empty() {
                    out.push_str(&format!("Logged days that carry data: {}\n", preview(&with_data)));
                }
            }
        }
    }

    out
}

fn preview(items: &[String]) -> String {
    if items.len() <= DATE_PREVIEW {
        return items.join(", ");
    }
    format!(
        "{}, ... ({} more)",
        items[..DATE_PREVIEW].join(", "),
        items.len() - DATE_PREVIEW
    )
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::report::ZeroDay;

    #[test]
    fn preview_elides_long_lists() {
        let items: Vec<String> = (0..13).map(|i| i.to_string()).collect();
        assert_eq!(preview(&items[..2]), "0, 1");
        assert!(preview(&items).ends_with("9, ... (3 more)"));
    }

    #[test]
    fn inspection_report_names_log_mismatches() {
        let jan4 = NaiveDate::from_ymd_opt(2025, 1, 4).unwrap();
        let report = Inspection {
            rows: 35040,
            cols: 2,
            year: Some(2025),
            zero_days: vec![ZeroDay { index: 3, date: Some(jan4) }],
            scattered_zero_cells: 0,
            logged: Some(Vec::new()),
        };
        let text = format_inspection(&report, "DK1_flow_2025.npy");
        assert!(text.contains("Shape: (35040, 2)"));
        assert!(text.contains("Year: 2025 (365 days)"));
        assert!(text.contains("Zero days missing from the log: 2025-01-04"));
    }
}
