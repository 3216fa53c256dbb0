use std::path::Path;

use clap::Subcommand;
use rollcall_core::Config;

use super::CmdResult;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g. "discord.report_channel_id", "thresholds.late_to_warning")
        key: String,
    },
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// New value
        value: String,
    },
    /// List all config values
    List,
    /// Reset config to defaults
    Reset,
}

fn load(path: Option<&Path>) -> Result<Config, rollcall_core::ConfigError> {
    match path {
        Some(p) => Config::load_from(p),
        None => Config::load(),
    }
}

fn save(config: &Config, path: Option<&Path>) -> Result<(), rollcall_core::ConfigError> {
    match path {
        Some(p) => config.save_to(p),
        None => config.save(),
    }
}

pub fn run(action: ConfigAction, config_path: Option<&Path>) -> CmdResult {
    match action {
        ConfigAction::Get { key } => {
            let config = load(config_path)?;
            match config.get(&key) {
                Some(value) => println!("{value}"),
                None => return Err(format!("unknown key: {key}").into()),
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = load(config_path)?;
            config.set_value(&key, &value)?;
            config.validate()?;
            save(&config, config_path)?;
            println!("ok");
        }
        ConfigAction::List => {
            let config = load(config_path)?;
            let json = serde_json::to_string_pretty(&config)?;
            println!("{json}");
        }
        ConfigAction::Reset => {
            save(&Config::default(), config_path)?;
            println!("config reset to defaults");
        }
    }
    Ok(())
}
