use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PlatformError;

/// A thread inside a text channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadHandle {
    pub id: String,
    pub name: String,
}

/// A message that was just posted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageHandle {
    pub id: String,
    pub channel_id: String,
}

/// File attached to a message. Only metadata is inspected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub filename: String,
    pub content_type: Option<String>,
}

impl Attachment {
    pub fn is_image(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.starts_with("image/"))
    }
}

/// A fetched chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub author_id: String,
    pub author_name: String,
    pub author_is_bot: bool,
    pub timestamp: DateTime<Utc>,
    pub content: String,
    pub attachments: Vec<Attachment>,
}

impl ChatMessage {
    pub fn has_image(&self) -> bool {
        self.attachments.iter().any(Attachment::is_image)
    }
}

/// The chat capabilities the attendance engine consumes.
///
/// Implementations do not retry; callers bound every call with a timeout.
#[allow(async_fn_in_trait)]
pub trait ChatPlatform: Send + Sync {
    /// Short identifier used in logs (e.g. "discord").
    fn name(&self) -> &str;

    /// Active (non-archived) thread under `channel_id` whose name equals `title`.
    async fn find_active_thread(
        &self,
        channel_id: &str,
        title: &str,
    ) -> Result<Option<ThreadHandle>, PlatformError>;

    /// Up to `limit` most recent messages of a channel or thread, newest first.
    async fn fetch_recent_messages(
        &self,
        target_id: &str,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, PlatformError>;

    /// Post a plain text message.
    async fn send_message(&self, channel_id: &str, text: &str)
        -> Result<MessageHandle, PlatformError>;

    /// Start a thread from an existing message.
    async fn start_thread(
        &self,
        channel_id: &str,
        message_id: &str,
        name: &str,
        auto_archive_minutes: u32,
    ) -> Result<ThreadHandle, PlatformError>;
}
