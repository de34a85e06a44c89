//! Shared "build pipeline" logic.
//!
//! registry -> fetcher -> year builder (per zone) -> shape-checked array ->
//! NPY + column doc + skip log (+ optional JSON summary)
//!
//! Arrays are written only after the year builder's shape assertion passed,
//! and each write is atomic, so a failed or aborted run leaves no partial
//! array behind.

use std::fs;
use std::path::Path;

use log::info;

use crate::assemble::{YearArrayBuilder, YearBuild};
use crate::data::{DailyFetcher, EntsoeClient, SampleSource};
use crate::domain::{BuildConfig, DatasetKind, INTERVAL_MINUTES};
use crate::error::AppError;
use crate::io::{
    ArrayContext, ArtifactPaths, RunSummary, ZoneSummary, render_column_doc, render_skip_log, write_npy,
    write_summary_json, write_text,
};
use crate::registry::{CategoryRegistry, ColumnMapping};

/// Everything produced for one zone.
#[derive(Debug, Clone)]
pub struct ZoneOutcome {
    pub build: YearBuild,
    pub paths: ArtifactPaths,
}

/// Execute a full build against the live provider.
pub fn run_build(config: &BuildConfig) -> Result<Vec<ZoneOutcome>, AppError> {
    let registry = CategoryRegistry::standard()?;
    let client = EntsoeClient::from_env(config.counterpart, config.request_timeout, config.requests_per_minute)?;
    let fetcher = DailyFetcher::new(client, config.clock, config.retry.clone());

    run_build_with_fetcher(config, &registry, &fetcher)
}

/// Execute a build with a caller-supplied fetcher.
///
/// Useful for offline runs and tests.
pub fn run_build_with_fetcher<S: SampleSource>(
    config: &BuildConfig,
    registry: &CategoryRegistry,
    fetcher: &DailyFetcher<S>,
) -> Result<Vec<ZoneOutcome>, AppError> {
    config.validate()?;
    let mapping = registry.columns_for(config.kind)?;

    fs::create_dir_all(&config.out_dir).map_err(|e| {
        AppError::io(format!(
            "Failed to create output directory '{}': {e}",
            config.out_dir.display()
        ))
    })?;

    let builder = YearArrayBuilder::new(registry, fetcher).with_jobs(config.jobs);
    let mut outcomes = Vec::with_capacity(config.zones.len());

    for &zone in &config.zones {
        let build = builder.build(zone, config.year, config.kind)?;
        let paths = ArtifactPaths::new(&config.out_dir, zone, config.kind, config.year);
        persist(&build, &paths, mapping, config)?;
        outcomes.push(ZoneOutcome { build, paths });
    }

    if let Some(path) = &config.summary_json {
        write_summary_json(path, &summarize(config, &outcomes))?;
        info!("Wrote {}", path.display());
    }

    Ok(outcomes)
}

/// Companions first, array last: a build that exits with an error never
/// leaves an array without its column doc and skip log, nor companions
/// without an array.
fn persist(
    build: &YearBuild,
    paths: &ArtifactPaths,
    mapping: &ColumnMapping,
    config: &BuildConfig,
) -> Result<(), AppError> {
    let array = &build.array;
    let (rows, cols) = array.shape();

    let file_name = file_name_of(&paths.array);
    let context = ArrayContext {
        file_name: &file_name,
        zone: array.zone(),
        year: array.year(),
        shape: array.shape(),
        clock: config.clock,
        counterpart: (array.kind() == DatasetKind::Flow).then_some(config.counterpart),
    };

    let written = write_text(&paths.columns, &render_column_doc(mapping, Some(&context)))
        .and_then(|()| {
            write_text(
                &paths.skip_log,
                &render_skip_log(array.zone(), array.kind(), array.year(), &build.skipped),
            )
        })
        .and_then(|()| write_npy(&paths.array, rows, cols, array.values()));

    if let Err(err) = written {
        for companion in [&paths.columns, &paths.skip_log] {
            if companion.is_file() {
                let _ = fs::remove_file(companion);
            }
        }
        return Err(err);
    }

    info!("Wrote {}", paths.array.display());
    Ok(())
}

pub fn summarize(config: &BuildConfig, outcomes: &[ZoneOutcome]) -> RunSummary {
    let zones = outcomes
        .iter()
        .map(|o| {
            let (rows, cols) = o.build.array.shape();
            ZoneSummary {
                zone: o.build.array.zone(),
                array_file: file_name_of(&o.paths.array),
                columns_file: file_name_of(&o.paths.columns),
                skip_log_file: file_name_of(&o.paths.skip_log),
                shape: [rows, cols],
                skipped_dates: o.build.skipped.iter().map(|s| s.date).collect(),
                partial_dates: o.build.partial_days.clone(),
                dropped_samples: o.build.dropped_samples,
            }
        })
        .collect();

    RunSummary {
        tool: "gridfill".to_string(),
        year: config.year,
        kind: config.kind,
        interval_minutes: INTERVAL_MINUTES,
        units: "MW".to_string(),
        zones,
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::Duration;

    use chrono::NaiveDate;

    use super::*;
    use crate::data::stub::{self, StubResult};
    use crate::data::{DayRequest, SourceResponse};
    use crate::domain::{MarketClock, RetryPolicy, Zone};
    use crate::io::{parse_skip_log, read_npy};

    fn config(out_dir: PathBuf, zones: Vec<Zone>) -> BuildConfig {
        BuildConfig {
            zones,
            year: 2025,
            kind: DatasetKind::Flow,
            counterpart: Zone::DeLu,
            out_dir,
            jobs: 4,
            clock: MarketClock::default(),
            retry: RetryPolicy::default(),
            request_timeout: Duration::from_secs(1),
            requests_per_minute: 390,
            summary_json: None,
        }
    }

    fn jan4() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 4).unwrap()
    }

    fn source(r: &DayRequest) -> StubResult {
        if r.date == jan4() && r.zone == Zone::Dk1 {
            return Ok(SourceResponse::NoData);
        }
        Ok(stub::full_day(r, |p| stub::signature(r, p)))
    }

    #[test]
    fn writes_array_column_doc_skip_log_and_summary() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config(dir.path().join("out"), vec![Zone::Dk1, Zone::Dk2]);
        cfg.summary_json = Some(dir.path().join("summary.json"));

        let registry = CategoryRegistry::standard().unwrap();
        let fetcher = stub::fetcher(source);
        let outcomes = run_build_with_fetcher(&cfg, &registry, &fetcher).unwrap();
        assert_eq!(outcomes.len(), 2);

        let dk1 = &outcomes[0].paths;
        assert!(dk1.array.ends_with("DK1_flow_2025.npy"));
        let array = read_npy(&dk1.array).unwrap();
        assert_eq!((array.rows, array.cols), (35040, 2));
        assert!((288..384).all(|r| array.row(r) == [0.0, 0.0]));
        assert!(array.row(287).iter().all(|v| *v != 0.0));
        assert!(array.row(384).iter().all(|v| *v != 0.0));

        let skipped = fs::read_to_string(&dk1.skip_log).unwrap();
        assert_eq!(parse_skip_log(&skipped), vec![jan4()]);
        let dk2_skipped = fs::read_to_string(&outcomes[1].paths.skip_log).unwrap();
        assert!(parse_skip_log(&dk2_skipped).is_empty());

        let columns = fs::read_to_string(&dk1.columns).unwrap();
        assert!(columns.contains("- Array shape: (35040, 2)"));
        assert!(columns.contains("- Flow counterpart: DE-LU"));
        assert!(columns.contains("- Column 0: IMPORT"));

        let summary: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join("summary.json")).unwrap()).unwrap();
        assert_eq!(summary["zones"][0]["skipped_dates"][0], "2025-01-04");
        assert_eq!(summary["zones"][1]["skipped_dates"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn identical_responses_give_byte_identical_arrays() {
        let dir = tempfile::tempdir().unwrap();
        let registry = CategoryRegistry::standard().unwrap();
        let fetcher = stub::fetcher(source);

        let first = run_build_with_fetcher(&config(dir.path().join("a"), vec![Zone::Dk1]), &registry, &fetcher)
            .unwrap();
        let mut sequential = config(dir.path().join("b"), vec![Zone::Dk1]);
        sequential.jobs = 1;
        let second = run_build_with_fetcher(&sequential, &registry, &fetcher).unwrap();

        let a = fs::read(&first[0].paths.array).unwrap();
        let b = fs::read(&second[0].paths.array).unwrap();
        assert_eq!(a, b);
    }

    fn file_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn failed_skip_log_write_leaves_no_array() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        fs::create_dir_all(out.join("DK1_flow_2025_skipped.txt")).unwrap();

        let registry = CategoryRegistry::standard().unwrap();
        let fetcher = stub::fetcher(source);
        let err = run_build_with_fetcher(&config(out.clone(), vec![Zone::Dk1]), &registry, &fetcher).unwrap_err();

        assert_eq!(err.exit_code(), crate::error::EXIT_IO);
        assert_eq!(file_names(&out), vec!["DK1_flow_2025_skipped.txt".to_string()]);
    }

    #[test]
    fn failed_array_write_removes_its_companions() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        fs::create_dir_all(out.join("DK1_flow_2025.npy").join("occupied")).unwrap();

        let registry = CategoryRegistry::standard().unwrap();
        let fetcher = stub::fetcher(source);
        let err = run_build_with_fetcher(&config(out.clone(), vec![Zone::Dk1]), &registry, &fetcher).unwrap_err();

        assert_eq!(err.exit_code(), crate::error::EXIT_IO);
        assert_eq!(file_names(&out), vec!["DK1_flow_2025.npy".to_string()]);
        assert!(out.join("DK1_flow_2025.npy").is_dir());
    }

    #[test]
    fn configuration_errors_write_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let registry = CategoryRegistry::standard().unwrap();
        let fetcher = stub::fetcher(|_: &DayRequest| -> StubResult {
            panic!("no request may be issued for an invalid configuration")
        });

        let err = run_build_with_fetcher(&config(out.clone(), vec![Zone::DeLu]), &registry, &fetcher).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_CONFIG);
        assert!(!out.exists());
    }
}
