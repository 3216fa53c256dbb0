use std::path::{Path, PathBuf};

use clap::Subcommand;
use rollcall_core::{reconstruct, RunMode};

use super::run::{execute, print_outcome};
use super::{load_config, CmdResult};

#[derive(Subcommand)]
pub enum ReportAction {
    /// Rebuild accrual state from saved report messages and print it as JSON
    Parse {
        /// One file per message, oldest first
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Render today's report without publishing it
    Preview,
}

pub fn run(action: ReportAction, config_path: Option<&Path>) -> CmdResult {
    match action {
        ReportAction::Parse { files } => {
            let config = load_config(config_path)?;
            let roster = config.roster()?;

            let mut messages = Vec::with_capacity(files.len());
            for file in &files {
                messages.push(std::fs::read_to_string(file)?);
            }
            let rebuilt = reconstruct(messages.iter().map(String::as_str), &roster);
            for name in &rebuilt.unmapped_names {
                eprintln!("warning: '{name}' is not in the roster");
            }
            if rebuilt.skipped_parts > 0 {
                eprintln!("warning: ignored {} part(s) of an incomplete report", rebuilt.skipped_parts);
            }

            println!("{}", rebuilt.store.snapshot().to_json()?);
        }
        ReportAction::Preview => {
            let outcome = execute(config_path, RunMode::DryRun, None)?;
            print_outcome(&outcome, false)?;
        }
    }
    Ok(())
}
