//! CLI argument parsing for the calltimer demo

use crate::report::{OutputFormat, SortOrder};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "calltimer")]
#[command(version)]
#[command(about = "Run a sleep-based workload under call instrumentation", long_about = None)]
pub struct Cli {
    /// Number of direct `run` calls
    #[arg(short = 'r', long = "runs", default_value = "2")]
    pub runs: u32,

    /// Number of block timings, each calling `run` once
    #[arg(short = 'b', long = "blocks", default_value = "0")]
    pub blocks: u32,

    /// Report every N completed `run` calls (requires --trigger)
    #[arg(short = 'n', long = "iterations", value_name = "N", allow_negative_numbers = true)]
    pub iterations: Option<i64>,

    /// Enable threshold-gated reports for `run`
    #[arg(short = 't', long = "trigger")]
    pub trigger: bool,

    /// Clear statistics after each triggered or block report
    #[arg(long = "reset-after-trigger")]
    pub reset_after_trigger: bool,

    /// Sleep unit in milliseconds (`a` sleeps 1 unit, `b` 2 units)
    #[arg(long = "unit-ms", value_name = "MS", default_value = "10")]
    pub unit_ms: u64,

    /// Seed for the random choice between `a` and `b`
    #[arg(long = "seed", default_value = "42")]
    pub seed: u64,

    /// Report format (overrides config file)
    #[arg(long = "format", value_enum)]
    pub format: Option<OutputFormat>,

    /// Row ordering (overrides config file)
    #[arg(long = "sort", value_enum)]
    pub sort: Option<SortOrder>,

    /// Include keys with zero calls in reports
    #[arg(long = "include-idle")]
    pub include_idle: bool,

    /// Hide the Seconds/Call column
    #[arg(long = "no-seconds-per-call")]
    pub no_seconds_per_call: bool,

    /// Only report keys matching this regular expression
    #[arg(long = "keys", value_name = "REGEX")]
    pub key_pattern: Option<String>,

    /// Load timer configuration from a TOML file
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable debug logging to stderr
    #[arg(long = "debug")]
    pub debug: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["calltimer"]);
        assert_eq!(cli.runs, 2);
        assert_eq!(cli.blocks, 0);
        assert_eq!(cli.unit_ms, 10);
        assert!(cli.iterations.is_none());
        assert!(!cli.trigger);
        assert!(cli.format.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_cli_parses_trigger_options() {
        let cli = Cli::parse_from([
            "calltimer",
            "--trigger",
            "-n",
            "3",
            "--reset-after-trigger",
            "--format",
            "json",
            "--sort",
            "total-time-desc",
        ]);
        assert!(cli.trigger);
        assert_eq!(cli.iterations, Some(3));
        assert!(cli.reset_after_trigger);
        assert_eq!(cli.format, Some(OutputFormat::Json));
        assert_eq!(cli.sort, Some(SortOrder::TotalTimeDesc));
    }

    #[test]
    fn test_cli_accepts_negative_iterations() {
        // Rejected later with a proper error, not by the parser
        let cli = Cli::parse_from(["calltimer", "--iterations", "-1"]);
        assert_eq!(cli.iterations, Some(-1));
    }

    #[test]
    fn test_cli_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["calltimer", "--format", "xml"]).is_err());
    }
}
