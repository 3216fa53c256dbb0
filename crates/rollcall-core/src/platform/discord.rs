//! Discord integration -- bot REST API (v10) implementation of [`ChatPlatform`].

use chrono::{DateTime, Utc};
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::json;
use url::Url;

use super::keyring_store;
use super::traits::{Attachment, ChatMessage, ChatPlatform, MessageHandle, ThreadHandle};
use crate::error::PlatformError;

pub const DEFAULT_API_BASE: &str = "https://discord.com/api/v10/";
pub const BOT_TOKEN_ENV: &str = "DISCORD_BOT_TOKEN";
pub const BOT_TOKEN_KEY: &str = "discord_bot_token";

/// Discord caps a single message page at 100 entries.
const MAX_PAGE_SIZE: usize = 100;

pub struct DiscordPlatform {
    base: Url,
    guild_id: String,
    token: String,
    http_client: Client,
}

#[derive(Debug, Deserialize)]
struct RawAuthor {
    id: String,
    username: String,
    #[serde(default)]
    global_name: Option<String>,
    #[serde(default)]
    bot: bool,
}

#[derive(Debug, Deserialize)]
struct RawAttachment {
    filename: String,
    #[serde(default)]
    content_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    id: String,
    channel_id: String,
    author: RawAuthor,
    #[serde(default)]
    content: String,
    timestamp: DateTime<Utc>,
    #[serde(default)]
    attachments: Vec<RawAttachment>,
}

#[derive(Debug, Deserialize)]
struct RawChannel {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    parent_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ActiveThreads {
    threads: Vec<RawChannel>,
}

impl From<RawMessage> for ChatMessage {
    fn from(m: RawMessage) -> Self {
        ChatMessage {
            id: m.id,
            author_id: m.author.id,
            author_name: m.author.global_name.unwrap_or(m.author.username),
            author_is_bot: m.author.bot,
            timestamp: m.timestamp,
            content: m.content,
            attachments: m
                .attachments
                .into_iter()
                .map(|a| Attachment {
                    filename: a.filename,
                    content_type: a.content_type,
                })
                .collect(),
        }
    }
}

impl DiscordPlatform {
    /// Create a client against `api_base` (normally [`DEFAULT_API_BASE`]).
    pub fn new(api_base: &str, guild_id: &str, token: &str) -> Result<Self, PlatformError> {
        if token.is_empty() {
            return Err(PlatformError::NotAuthenticated {
                service: "discord".into(),
            });
        }
        let base = if api_base.ends_with('/') {
            Url::parse(api_base)?
        } else {
            Url::parse(&format!("{api_base}/"))?
        };
        Ok(Self {
            base,
            guild_id: guild_id.to_string(),
            token: token.to_string(),
            http_client: Client::new(),
        })
    }

    /// Bot token from `DISCORD_BOT_TOKEN`, falling back to the OS keyring.
    pub fn resolve_token() -> Result<Option<String>, PlatformError> {
        if let Ok(token) = std::env::var(BOT_TOKEN_ENV) {
            if !token.is_empty() {
                return Ok(Some(token));
            }
        }
        keyring_store::get(BOT_TOKEN_KEY)
    }

    /// Persist a bot token to the OS keyring.
    pub fn set_credentials(token: &str) -> Result<(), PlatformError> {
        keyring_store::set(BOT_TOKEN_KEY, token)
    }

    /// Remove the stored bot token.
    pub fn disconnect() -> Result<(), PlatformError> {
        keyring_store::delete(BOT_TOKEN_KEY)
    }

    fn endpoint(&self, path: &str) -> Result<Url, PlatformError> {
        Ok(self.base.join(path)?)
    }

    fn auth_header(&self) -> String {
        format!("Bot {}", self.token)
    }

    async fn check(endpoint: &str, resp: Response) -> Result<Response, PlatformError> {
        if resp.status().is_success() {
            return Ok(resp);
        }
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        Err(PlatformError::Api {
            endpoint: endpoint.to_string(),
            status,
            body,
        })
    }
}

impl ChatPlatform for DiscordPlatform {
    fn name(&self) -> &str {
        "discord"
    }

    async fn find_active_thread(
        &self,
        channel_id: &str,
        title: &str,
    ) -> Result<Option<ThreadHandle>, PlatformError> {
        let path = format!("guilds/{}/threads/active", self.guild_id);
        let resp = self
            .http_client
            .get(self.endpoint(&path)?)
            .header("Authorization", self.auth_header())
            .send()
            .await?;
        let active: ActiveThreads = Self::check(&path, resp).await?.json().await?;

        Ok(active
            .threads
            .into_iter()
            .find(|t| t.parent_id.as_deref() == Some(channel_id) && t.name.as_deref() == Some(title))
            .map(|t| ThreadHandle {
                id: t.id,
                name: title.to_string(),
            }))
    }

    async fn fetch_recent_messages(
        &self,
        target_id: &str,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, PlatformError> {
        let path = format!("channels/{target_id}/messages");
        let limit = limit.clamp(1, MAX_PAGE_SIZE).to_string();
        let resp = self
            .http_client
            .get(self.endpoint(&path)?)
            .header("Authorization", self.auth_header())
            .query(&[("limit", limit.as_str())])
            .send()
            .await?;
        let raw: Vec<RawMessage> = Self::check(&path, resp).await?.json().await?;
        Ok(raw.into_iter().map(ChatMessage::from).collect())
    }

    async fn send_message(
        &self,
        channel_id: &str,
        text: &str,
    ) -> Result<MessageHandle, PlatformError> {
        let path = format!("channels/{channel_id}/messages");
        let resp = self
            .http_client
            .post(self.endpoint(&path)?)
            .header("Authorization", self.auth_header())
            .json(&json!({ "content": text }))
            .send()
            .await?;
        let raw: RawMessage = Self::check(&path, resp).await?.json().await?;
        Ok(MessageHandle {
            id: raw.id,
            channel_id: raw.channel_id,
        })
    }

    async fn start_thread(
        &self,
        channel_id: &str,
        message_id: &str,
        name: &str,
        auto_archive_minutes: u32,
    ) -> Result<ThreadHandle, PlatformError> {
        let path = format!("channels/{channel_id}/messages/{message_id}/threads");
        let resp = self
            .http_client
            .post(self.endpoint(&path)?)
            .header("Authorization", self.auth_header())
            .json(&json!({
                "name": name,
                "auto_archive_duration": auto_archive_minutes,
            }))
            .send()
            .await?;
        let raw: RawChannel = Self::check(&path, resp).await?.json().await?;
        Ok(ThreadHandle {
            id: raw.id,
            name: raw.name.unwrap_or_else(|| name.to_string()),
        })
    }
}
