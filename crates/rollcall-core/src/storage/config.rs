//! TOML-based application configuration.
//!
//! Stores:
//! - Discord channel and guild ids
//! - The participant roster
//! - Verification schedule (UTC offset, thread labels)
//! - Escalation thresholds and fetch limits
//! - Engine behavior (judgment policy, state backend, timeouts)
//!
//! Configuration is stored at `~/.config/rollcall/config.toml`. A handful of
//! environment variables override the file after loading, see
//! [`Config::apply_env_overrides`].

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::accrual::Thresholds;
use crate::clock::{VerificationKind, DEFAULT_UTC_OFFSET_HOURS};
use crate::error::{ConfigError, ValidationError};
use crate::judge::JudgmentPolicy;
use crate::platform::discord::DEFAULT_API_BASE;
use crate::roster::{Participant, Roster};

pub const PARTICIPANTS_ENV: &str = "DISCORD_PARTICIPANTS";
pub const MORNING_CHANNEL_ENV: &str = "DISCORD_MIMO_CHANNEL_ID";
pub const CORE_TIME_CHANNEL_ENV: &str = "DISCORD_CORE_TIME_CHANNEL_ID";
pub const REPORT_CHANNEL_ENV: &str = "DISCORD_ATTENDANCE_CHECK_CHANNEL_ID";
pub const GUILD_ENV: &str = "DISCORD_GUILD_ID";

/// Smallest report message size that still leaves room for a report line
/// after the split-part marker.
pub const MIN_MESSAGE_CHAR_LIMIT: usize = 60;

/// Discord connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default)]
    pub guild_id: String,
    /// Channel holding the daily morning (photo) threads
    #[serde(default)]
    pub morning_channel_id: String,
    /// Channel holding the daily core-time threads
    #[serde(default)]
    pub core_time_channel_id: String,
    /// Channel reports are published to and read back from
    #[serde(default)]
    pub report_channel_id: String,
    /// User id of the bot that publishes reports; empty accepts any bot
    #[serde(default)]
    pub bot_user_id: String,
}

/// Verification schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_utc_offset_hours")]
    pub utc_offset_hours: i32,
    #[serde(default = "default_morning_label")]
    pub morning_label: String,
    #[serde(default = "default_core_time_label")]
    pub core_time_label: String,
    #[serde(default = "default_auto_archive_minutes")]
    pub thread_auto_archive_minutes: u32,
}

/// Message page sizes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Messages read from each daily thread
    #[serde(default = "default_thread_message_limit")]
    pub thread_message_limit: usize,
    /// Prior report messages read during reconstruction
    #[serde(default = "default_report_history_limit")]
    pub report_history_limit: usize,
}

/// Where accrual state is recovered from between runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateBackend {
    /// Rebuild from published report text.
    #[default]
    ReportText,
    /// Load/store a JSON snapshot in the data directory.
    Snapshot,
}

/// Run pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub policy: JudgmentPolicy,
    #[serde(default)]
    pub state_backend: StateBackend,
    /// Snapshot file; defaults to `<data dir>/accrual.json`
    #[serde(default)]
    pub snapshot_path: Option<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_true")]
    pub require_image_for_morning: bool,
    #[serde(default = "default_message_char_limit")]
    pub message_char_limit: usize,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/rollcall/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub discord: DiscordConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub thresholds: Thresholds,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    /// Participants in report order.
    #[serde(default)]
    pub participants: Vec<Participant>,
}

// Default functions
fn default_api_base() -> String {
    DEFAULT_API_BASE.into()
}
fn default_utc_offset_hours() -> i32 {
    DEFAULT_UTC_OFFSET_HOURS
}
fn default_morning_label() -> String {
    "미모인증".into()
}
fn default_core_time_label() -> String {
    "코어타임".into()
}
fn default_auto_archive_minutes() -> u32 {
    60
}
fn default_thread_message_limit() -> usize {
    100
}
fn default_report_history_limit() -> usize {
    30
}
fn default_request_timeout_secs() -> u64 {
    15
}
fn default_true() -> bool {
    true
}
fn default_message_char_limit() -> usize {
    2000
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            guild_id: String::new(),
            morning_channel_id: String::new(),
            core_time_channel_id: String::new(),
            report_channel_id: String::new(),
            bot_user_id: String::new(),
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            utc_offset_hours: default_utc_offset_hours(),
            morning_label: default_morning_label(),
            core_time_label: default_core_time_label(),
            thread_auto_archive_minutes: default_auto_archive_minutes(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            thread_message_limit: default_thread_message_limit(),
            report_history_limit: default_report_history_limit(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            policy: JudgmentPolicy::default(),
            state_backend: StateBackend::default(),
            snapshot_path: None,
            request_timeout_secs: default_request_timeout_secs(),
            require_image_for_morning: true,
            message_char_limit: default_message_char_limit(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            discord: DiscordConfig::default(),
            schedule: ScheduleConfig::default(),
            thresholds: Thresholds::default(),
            fetch: FetchConfig::default(),
            engine: EngineConfig::default(),
            participants: Vec::new(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let unknown = || invalid("unknown config key".into());

        let mut parts = key.split('.').peekable();
        if parts.peek().map_or(true, |p| p.is_empty()) {
            return Err(invalid("config key is empty".into()));
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<i64>() {
                            serde_json::Value::Number(n.into())
                        } else {
                            return Err(invalid(format!("cannot parse '{value}' as integer")));
                        }
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// `<data dir>/config.toml`
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or create the default file.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key without saving. Returns error if key is unknown.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let mut json = serde_json::to_value(&*self).map_err(|e| invalid(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        Ok(())
    }

    /// Apply `DISCORD_*` overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<(), ValidationError> {
        self.apply_overrides_from(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary lookup (the environment in production).
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<(), ValidationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(entries) = non_empty(PARTICIPANTS_ENV) {
            self.participants = Roster::parse(&entries)?.participants().to_vec();
        }
        if let Some(v) = non_empty(MORNING_CHANNEL_ENV) {
            self.discord.morning_channel_id = v;
        }
        if let Some(v) = non_empty(CORE_TIME_CHANNEL_ENV) {
            self.discord.core_time_channel_id = v;
        }
        if let Some(v) = non_empty(REPORT_CHANNEL_ENV) {
            self.discord.report_channel_id = v;
        }
        if let Some(v) = non_empty(GUILD_ENV) {
            self.discord.guild_id = v;
        }
        Ok(())
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |key: &str, message: String| -> Result<(), ConfigError> {
            Err(ConfigError::InvalidValue {
                key: key.to_string(),
                message,
            })
        };

        if self.thresholds.late_to_warning == 0 {
            return invalid("thresholds.late_to_warning", "must be at least 1".into());
        }
        if self.thresholds.warnings_to_inactive == 0 {
            return invalid("thresholds.warnings_to_inactive", "must be at least 1".into());
        }
        if self.engine.message_char_limit < MIN_MESSAGE_CHAR_LIMIT {
            return invalid(
                "engine.message_char_limit",
                format!("must be at least {MIN_MESSAGE_CHAR_LIMIT}"),
            );
        }
        if self.engine.request_timeout_secs == 0 {
            return invalid("engine.request_timeout_secs", "must be at least 1".into());
        }
        if self.fetch.thread_message_limit == 0 {
            return invalid("fetch.thread_message_limit", "must be at least 1".into());
        }
        if self.fetch.report_history_limit == 0 {
            return invalid("fetch.report_history_limit", "must be at least 1".into());
        }
        Ok(())
    }

    /// The validated roster.
    pub fn roster(&self) -> Result<Roster, ValidationError> {
        Roster::new(self.participants.clone())
    }

    /// Channel id for a verification window, `None` when unset.
    pub fn channel_for(&self, kind: VerificationKind) -> Option<&str> {
        let id = match kind {
            VerificationKind::MorningCheck => &self.discord.morning_channel_id,
            VerificationKind::CoreTimeCheck => &self.discord.core_time_channel_id,
        };
        (!id.is_empty()).then_some(id.as_str())
    }

    /// Thread label for a verification window.
    pub fn label_for(&self, kind: VerificationKind) -> &str {
        match kind {
            VerificationKind::MorningCheck => &self.schedule.morning_label,
            VerificationKind::CoreTimeCheck => &self.schedule.core_time_label,
        }
    }

    /// Thread title `"{date} {label}"`.
    pub fn thread_title(&self, kind: VerificationKind, date: &str) -> String {
        format!("{date} {}", self.label_for(kind))
    }

    /// Snapshot file for the snapshot backend.
    pub fn snapshot_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.engine.snapshot_path {
            Some(p) => Ok(PathBuf::from(p)),
            None => Ok(data_dir()?.join("accrual.json")),
        }
    }
}
