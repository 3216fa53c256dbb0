mod config;

pub use config::{
    Config, DiscordConfig, EngineConfig, FetchConfig, ScheduleConfig, StateBackend,
    CORE_TIME_CHANNEL_ENV, GUILD_ENV, MIN_MESSAGE_CHAR_LIMIT, MORNING_CHANNEL_ENV, PARTICIPANTS_ENV,
    REPORT_CHANNEL_ENV,
};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/rollcall[-dev]/` based on ROLLCALL_ENV.
///
/// Set ROLLCALL_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("ROLLCALL_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("rollcall-dev")
    } else {
        base_dir.join("rollcall")
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::SaveFailed {
        path: dir.clone(),
        message: e.to_string(),
    })?;
    Ok(dir)
}
