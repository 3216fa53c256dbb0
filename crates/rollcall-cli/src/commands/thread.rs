use std::path::Path;

use chrono::{DateTime, Utc};
use clap::{Subcommand, ValueEnum};
use rollcall_core::{open_daily_thread, VerificationKind};

use super::{discord, load_config, parse_instant, runtime, CmdResult};

#[derive(Clone, Copy, ValueEnum)]
pub enum ThreadKind {
    Morning,
    CoreTime,
}

impl From<ThreadKind> for VerificationKind {
    fn from(kind: ThreadKind) -> Self {
        match kind {
            ThreadKind::Morning => VerificationKind::MorningCheck,
            ThreadKind::CoreTime => VerificationKind::CoreTimeCheck,
        }
    }
}

#[derive(Subcommand)]
pub enum ThreadAction {
    /// Post today's title message and open a thread from it
    Open {
        kind: ThreadKind,
        /// Open the thread for the day containing this instant (RFC 3339)
        #[arg(long, value_parser = parse_instant)]
        at: Option<DateTime<Utc>>,
    },
}

pub fn run(action: ThreadAction, config_path: Option<&Path>) -> CmdResult {
    match action {
        ThreadAction::Open { kind, at } => {
            let config = load_config(config_path)?;
            let platform = discord(&config)?;
            let now = at.unwrap_or_else(Utc::now);
            let opened = runtime()?.block_on(open_daily_thread(&platform, &config, kind.into(), now))?;
            match opened {
                Some(thread) => println!("{} ({})", thread.name, thread.id),
                None => return Err("channel for this thread is not configured".into()),
            }
        }
    }
    Ok(())
}
