//! In-memory [`ChatPlatform`] for tests and offline previews.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};

use super::traits::{Attachment, ChatMessage, ChatPlatform, MessageHandle, ThreadHandle};
use crate::error::PlatformError;

#[derive(Default)]
struct State {
    /// Messages per channel/thread id, oldest first
    messages: HashMap<String, Vec<ChatMessage>>,
    /// (parent channel id, thread)
    threads: Vec<(String, ThreadHandle)>,
    next_id: u64,
    sends: usize,
}

/// A scriptable platform that keeps everything in process memory.
#[derive(Default)]
pub struct MemoryPlatform {
    state: Mutex<State>,
    fail_sends: bool,
    fail_send_at: Option<usize>,
    send_delay: Option<Duration>,
}

impl MemoryPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `send_message` call fails with HTTP 500.
    pub fn failing_sends(mut self) -> Self {
        self.fail_sends = true;
        self
    }

    /// Only the `n`th `send_message` call (1-based) fails with HTTP 500.
    pub fn failing_send_at(mut self, n: usize) -> Self {
        self.fail_send_at = Some(n);
        self
    }

    /// Every `send_message` call sleeps first.
    pub fn with_send_delay(mut self, delay: Duration) -> Self {
        self.send_delay = Some(delay);
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn next_id(state: &mut State) -> String {
        state.next_id += 1;
        format!("mem-{}", state.next_id)
    }

    /// Register an active thread under `parent_id`; returns the thread id.
    pub fn add_thread(&self, parent_id: &str, name: &str) -> String {
        let mut state = self.lock();
        let id = Self::next_id(&mut state);
        state.threads.push((
            parent_id.to_string(),
            ThreadHandle {
                id: id.clone(),
                name: name.to_string(),
            },
        ));
        id
    }

    fn push_message(
        &self,
        target_id: &str,
        author_id: &str,
        author_is_bot: bool,
        timestamp: DateTime<Utc>,
        content: &str,
        attachments: Vec<Attachment>,
    ) -> String {
        let mut state = self.lock();
        let id = Self::next_id(&mut state);
        state
            .messages
            .entry(target_id.to_string())
            .or_default()
            .push(ChatMessage {
                id: id.clone(),
                author_id: author_id.to_string(),
                author_name: author_id.to_string(),
                author_is_bot,
                timestamp,
                content: content.to_string(),
                attachments,
            });
        id
    }

    /// Append a message from a user to a channel or thread.
    pub fn post_as(
        &self,
        target_id: &str,
        author_id: &str,
        timestamp: DateTime<Utc>,
        content: &str,
        image: bool,
    ) {
        let attachments = if image {
            vec![Attachment {
                filename: "proof.jpg".into(),
                content_type: Some("image/jpeg".into()),
            }]
        } else {
            Vec::new()
        };
        self.push_message(target_id, author_id, false, timestamp, content, attachments);
    }

    /// Append a message as the bot itself, e.g. an earlier report.
    pub fn post_as_bot(&self, target_id: &str, timestamp: DateTime<Utc>, content: &str) {
        self.push_message(target_id, "bot", true, timestamp, content, Vec::new());
    }

    /// Texts of every message in `target_id`, oldest first.
    pub fn texts(&self, target_id: &str) -> Vec<String> {
        self.lock()
            .messages
            .get(target_id)
            .map(|ms| ms.iter().map(|m| m.content.clone()).collect())
            .unwrap_or_default()
    }

    /// Active threads under `parent_id`.
    pub fn threads(&self, parent_id: &str) -> Vec<ThreadHandle> {
        self.lock()
            .threads
            .iter()
            .filter(|(parent, _)| parent == parent_id)
            .map(|(_, t)| t.clone())
            .collect()
    }
}

impl ChatPlatform for MemoryPlatform {
    fn name(&self) -> &str {
        "memory"
    }

    async fn find_active_thread(
        &self,
        channel_id: &str,
        title: &str,
    ) -> Result<Option<ThreadHandle>, PlatformError> {
        Ok(self
            .lock()
            .threads
            .iter()
            .find(|(parent, t)| parent == channel_id && t.name == title)
            .map(|(_, t)| t.clone()))
    }

    async fn fetch_recent_messages(
        &self,
        target_id: &str,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, PlatformError> {
        Ok(self
            .lock()
            .messages
            .get(target_id)
            .map(|ms| ms.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn send_message(
        &self,
        channel_id: &str,
        text: &str,
    ) -> Result<MessageHandle, PlatformError> {
        if let Some(delay) = self.send_delay {
            tokio::time::sleep(delay).await;
        }
        let send_no = {
            let mut state = self.lock();
            state.sends += 1;
            state.sends
        };
        if self.fail_sends || self.fail_send_at == Some(send_no) {
            return Err(PlatformError::Api {
                endpoint: format!("channels/{channel_id}/messages"),
                status: 500,
                body: "send disabled".into(),
            });
        }

        let id = self.push_message(channel_id, "bot", true, Utc::now(), text, Vec::new());
        Ok(MessageHandle {
            id,
            channel_id: channel_id.to_string(),
        })
    }

    async fn start_thread(
        &self,
        channel_id: &str,
        _message_id: &str,
        name: &str,
        _auto_archive_minutes: u32,
    ) -> Result<ThreadHandle, PlatformError> {
        let id = self.add_thread(channel_id, name);
        Ok(ThreadHandle {
            id,
            name: name.to_string(),
        })
    }
}
