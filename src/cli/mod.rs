//! Command-line parsing for the ENTSO-E gap-filling array builder.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! fetch/assembly code. Values stay as plain strings here; `app` turns them
//! into validated domain types so every configuration error exits the same way.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "gridfill",
    version,
    about = "Zero-filled 15-minute energy-market arrays from the ENTSO-E Transparency Platform"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch one calendar year for each zone and write the array, column doc and skip log.
    Build(BuildArgs),
    /// Print the column mapping of a dataset kind.
    Columns(ColumnsArgs),
    /// Summarize an array on disk and cross-check it against its skip log.
    Inspect(InspectArgs),
}

#[derive(Debug, Parser, Clone)]
pub struct BuildArgs {
    /// Zone(s) to build (DK, DK1, DK2, DE-LU, SE3, SE4, NO2, NL). Repeat or comma-separate.
    #[arg(short = 'z', long = "zone", required = true, value_delimiter = ',')]
    pub zones: Vec<String>,

    /// Calendar year.
    #[arg(short = 'y', long)]
    pub year: i32,

    /// Dataset kind (generation-all, generation-subset, flow).
    #[arg(short = 'k', long, default_value = "generation-all")]
    pub kind: String,

    /// Counterpart zone for flow datasets.
    #[arg(long, default_value = "DE-LU")]
    pub counterpart: String,

    /// Directory the artifacts are written to.
    #[arg(short = 'o', long, default_value = ".")]
    pub out_dir: PathBuf,

    /// Worker threads for day assembly (1 = sequential).
    #[arg(short = 'j', long, default_value_t = 4)]
    pub jobs: usize,

    /// Attempts per provider query (including the first).
    #[arg(long, default_value_t = 4)]
    pub retries: u32,

    /// Initial retry backoff in milliseconds (doubles per attempt).
    #[arg(long, default_value_t = 2000)]
    pub backoff_ms: u64,

    /// Upper bound on a single retry backoff in milliseconds.
    #[arg(long, default_value_t = 60_000)]
    pub max_backoff_ms: u64,

    /// HTTP request timeout in seconds.
    #[arg(long, default_value_t = 60)]
    pub timeout_secs: u64,

    /// Client-side request budget per rolling minute.
    #[arg(long, default_value_t = 390)]
    pub requests_per_minute: u32,

    /// Pause after the provider answers 429 Too Many Requests, in seconds.
    #[arg(long, default_value_t = 605)]
    pub rate_limit_cooldown_secs: u64,

    /// Market-time offset from UTC in whole hours; each day starts at local midnight.
    #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
    pub utc_offset_hours: i32,

    /// Also write a machine-readable run summary to this JSON file.
    #[arg(long)]
    pub summary_json: Option<PathBuf>,
}

#[derive(Debug, Parser, Clone)]
pub struct ColumnsArgs {
    /// Dataset kind (generation-all, generation-subset, flow).
    #[arg(short = 'k', long, default_value = "generation-all")]
    pub kind: String,
}

#[derive(Debug, Parser, Clone)]
pub struct InspectArgs {
    /// Array file (.npy) written by `build`.
    pub file: PathBuf,

    /// Calendar year of the array; inferred from the file name when omitted.
    #[arg(short = 'y', long)]
    pub year: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_accepts_repeated_and_comma_separated_zones() {
        let cli = Cli::try_parse_from([
            "gridfill", "build", "--zone", "DK1,DK2", "-z", "se3", "--year", "2025", "--kind", "flow",
        ])
        .unwrap();
        let Command::Build(args) = cli.command else {
            panic!("expected build");
        };
        assert_eq!(args.zones, vec!["DK1", "DK2", "se3"]);
        assert_eq!(args.year, 2025);
        assert_eq!(args.kind, "flow");
        assert_eq!(args.counterpart, "DE-LU");
        assert_eq!(args.jobs, 4);
        assert_eq!(args.utc_offset_hours, 1);
    }

    #[test]
    fn build_requires_zone_and_year() {
        assert!(Cli::try_parse_from(["gridfill", "build", "--year", "2025"]).is_err());
        assert!(Cli::try_parse_from(["gridfill", "build", "--zone", "DK1"]).is_err());
    }

    #[test]
    fn negative_offsets_parse() {
        let cli = Cli::try_parse_from([
            "gridfill", "build", "-z", "NL", "-y", "2024", "--utc-offset-hours", "-5",
        ])
        .unwrap();
        let Command::Build(args) = cli.command else {
            panic!("expected build");
        };
        assert_eq!(args.utc_offset_hours, -5);
    }

    #[test]
    fn inspect_takes_a_path() {
        let cli = Cli::try_parse_from(["gridfill", "inspect", "out/DK1_flow_2025.npy"]).unwrap();
        let Command::Inspect(args) = cli.command else {
            panic!("expected inspect");
        };
        assert_eq!(args.file, PathBuf::from("out/DK1_flow_2025.npy"));
        assert_eq!(args.year, None);
    }
}
