use anyhow::{Context, Result};
use calltimer::workload::{self, DemoPlan};
use calltimer::{cli::Cli, ResetScope, Timer, TimerConfig};
use clap::Parser;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const RUN_KEY: &str = "run";

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Merge the config file (if any) with command-line overrides
fn build_config(args: &Cli) -> Result<TimerConfig> {
    let mut config = match &args.config {
        Some(path) => TimerConfig::from_file(path)?,
        None => TimerConfig::default(),
    };

    if let Some(format) = args.format {
        config.report.format = format;
    }
    if let Some(sort) = args.sort {
        config.report.sort = sort;
    }
    if args.include_idle {
        config.report.include_idle = true;
    }
    if args.no_seconds_per_call {
        config.report.seconds_per_call = false;
    }
    if let Some(pattern) = &args.key_pattern {
        config.report.key_pattern = Some(pattern.clone());
    }

    Ok(config)
}

fn main() -> Result<()> {
    let args = Cli::parse();

    init_tracing(args.debug);

    let config = build_config(&args)?;
    let timer = Timer::from_config(&config).context("Failed to build timer")?;

    if let Some(n) = args.iterations {
        timer
            .set_iterations(RUN_KEY, n)
            .context("Invalid value for --iterations")?;
    }
    if args.trigger {
        timer.enable_trigger(RUN_KEY);
    }
    // Block reports of `sample_block` reset too, not only `run` triggers
    if args.reset_after_trigger {
        timer.enable_reset_after_trigger(ResetScope::All);
    }

    let plan = DemoPlan {
        runs: args.runs,
        blocks: args.blocks,
        unit: Duration::from_millis(args.unit_ms),
        seed: args.seed,
    };
    workload::run_demo(&timer, &plan)?;

    Ok(())
}
