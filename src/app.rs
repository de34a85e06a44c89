//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and sets up logging
//! - turns raw arguments into a validated `BuildConfig`
//! - runs the build pipeline and prints the per-zone summary
//! - serves the `columns` and `inspect` helpers

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use log::{LevelFilter, info, warn};

use crate::cli::{BuildArgs, Command, ColumnsArgs, InspectArgs};
use crate::domain::{BuildConfig, DatasetKind, MarketClock, RetryPolicy, Zone};
use crate::error::AppError;
use crate::io::{parse_skip_log, read_npy, render_column_doc};
use crate::registry::CategoryRegistry;

pub mod pipeline;

/// Entry point for the `gridfill` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();
    init_logging();

    match cli.command {
        Command::Build(args) => handle_build(args),
        Command::Columns(args) => handle_columns(args),
        Command::Inspect(args) => handle_inspect(args),
    }
}

/// `RUST_LOG` overrides the default `info` level.
fn init_logging() {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(LevelFilter::Info).parse_default_env();
    let _ = builder.try_init();
}

fn handle_build(args: BuildArgs) -> Result<(), AppError> {
    let config = build_config_from_args(&args)?;
    info!(
        "Building {} {} for {} zone(s) with {} worker(s)",
        config.kind,
        config.year,
        config.zones.len(),
        config.jobs
    );

    let outcomes = pipeline::run_build(&config)?;
    println!("{}", crate::report::format_build_summary(&outcomes, &config));
    Ok(())
}

fn handle_columns(args: ColumnsArgs) -> Result<(), AppError> {
    let kind: DatasetKind = args.kind.parse()?;
    let registry = CategoryRegistry::standard()?;
    print!("{}", render_column_doc(registry.columns_for(kind)?, None));
    Ok(())
}

fn handle_inspect(args: InspectArgs) -> Result<(), AppError> {
    let array = read_npy(&args.file)?;
    let year = args.year.or_else(|| infer_year(&args.file));
    if year.is_none() {
        warn!(
            "Could not infer the year from '{}'; days are reported by index",
            args.file.display()
        );
    }

    let logged = fs::read_to_string(skip_log_for(&args.file))
        .ok()
        .map(|contents| parse_skip_log(&contents));

    let report = crate::report::inspect_array(&array, year, logged)?;
    let file = args.file.display().to_string();
    print!("{}", crate::report::format_inspection(&report, &file));
    Ok(())
}

pub fn build_config_from_args(args: &BuildArgs) -> Result<BuildConfig, AppError> {
    let zones = args
        .zones
        .iter()
        .map(|z| z.parse::<Zone>())
        .collect::<Result<Vec<_>, _>>()?;

    let config = BuildConfig {
        zones,
        year: args.year,
        kind: args.kind.parse()?,
        counterpart: args.counterpart.parse()?,
        out_dir: args.out_dir.clone(),
        jobs: args.jobs,
        clock: MarketClock::from_offset_hours(args.utc_offset_hours)?,
        retry: RetryPolicy {
            max_attempts: args.retries,
            base_delay: Duration::from_millis(args.backoff_ms),
            max_delay: Duration::from_millis(args.max_backoff_ms),
            rate_limit_cooldown: Duration::from_secs(args.rate_limit_cooldown_secs),
        },
        request_timeout: Duration::from_secs(args.timeout_secs),
        requests_per_minute: args.requests_per_minute,
        summary_json: args.summary_json.clone(),
    };
    config.validate()?;
    Ok(config)
}

/// Year token at the end of an artifact stem, e.g. `DK1_flow_2025.npy` -> 2025.
fn infer_year(path: &Path) -> Option<i32> {
    let stem = path.file_stem()?.to_str()?;
    let token = stem.rsplit('_').next()?;
    if token.len() != 4 {
        return None;
    }
    token.parse().ok()
}

/// `DK1_flow_2025.npy` -> `DK1_flow_2025_skipped.txt` in the same directory.
fn skip_log_for(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{stem}_skipped.txt"))
}
