use std::path::Path;

use chrono::{DateTime, Utc};
use clap::Args;
use rollcall_core::{AttendanceEngine, RunMode, RunOutcome};

use super::{discord, load_config, parse_instant, runtime, CmdResult};

#[derive(Args)]
pub struct RunArgs {
    /// Judge and render without publishing or committing anything
    #[arg(long)]
    pub dry_run: bool,
    /// Run as of this instant (RFC 3339) instead of now
    #[arg(long, value_parser = parse_instant)]
    pub at: Option<DateTime<Utc>>,
    /// Print the run outcome as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: RunArgs, config_path: Option<&Path>) -> CmdResult {
    let mode = if args.dry_run {
        RunMode::DryRun
    } else {
        RunMode::Publish
    };
    let outcome = execute(config_path, mode, args.at)?;
    print_outcome(&outcome, args.json)
}

/// Build an engine against Discord and run it once.
pub fn execute(
    config_path: Option<&Path>,
    mode: RunMode,
    at: Option<DateTime<Utc>>,
) -> Result<RunOutcome, Box<dyn std::error::Error>> {
    let config = load_config(config_path)?;
    let platform = discord(&config)?;
    let engine = AttendanceEngine::new(platform, config)?;
    let now = at.unwrap_or_else(Utc::now);
    Ok(runtime()?.block_on(engine.run(now, mode))?)
}

pub fn print_outcome(outcome: &RunOutcome, json: bool) -> CmdResult {
    if json {
        println!("{}", serde_json::to_string_pretty(outcome)?);
        return Ok(());
    }

    for name in &outcome.unmapped_names {
        eprintln!("warning: '{name}' appears in past reports but not in the roster");
    }
    if outcome.published.is_empty() {
        println!("{}", outcome.report);
    } else {
        println!(
            "published {} message(s) for {}",
            outcome.published.len(),
            outcome.summary.date
        );
    }
    Ok(())
}
