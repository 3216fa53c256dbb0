pub mod auth;
pub mod config;
pub mod report;
pub mod run;
pub mod thread;

use std::error::Error;
use std::path::Path;

use chrono::{DateTime, Utc};
use rollcall_core::platform::discord::BOT_TOKEN_ENV;
use rollcall_core::{Config, DiscordPlatform};

pub type CmdResult = Result<(), Box<dyn Error>>;

/// Load the config file, then apply `DISCORD_*` environment overrides.
pub fn load_config(path: Option<&Path>) -> Result<Config, Box<dyn Error>> {
    let mut config = match path {
        Some(p) => Config::load_from(p)?,
        None => Config::load()?,
    };
    config.apply_env_overrides()?;
    Ok(config)
}

pub fn discord(config: &Config) -> Result<DiscordPlatform, Box<dyn Error>> {
    let token = DiscordPlatform::resolve_token()?.ok_or_else(|| {
        format!("no Discord bot token; run `rollcall auth login --token <TOKEN>` or set {BOT_TOKEN_ENV}")
    })?;
    Ok(DiscordPlatform::new(
        &config.discord.api_base,
        &config.discord.guild_id,
        &token,
    )?)
}

pub fn runtime() -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new()
}

/// Parse an RFC 3339 instant for `--at`.
pub fn parse_instant(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("invalid RFC 3339 time '{s}': {e}"))
}
