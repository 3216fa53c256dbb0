//! Opening the daily verification threads.

use chrono::{DateTime, Utc};

use crate::clock::{TimeWindowClassifier, VerificationKind};
use crate::engine::bounded;
use crate::error::Result;
use crate::platform::{ChatPlatform, ThreadHandle};
use crate::storage::Config;

/// Open today's thread for `kind` under its configured channel.
///
/// Posts the title message and starts a thread from it. When a thread with
/// the same title is already active it is returned as-is, so running this
/// twice on one day is harmless. Returns `None` when the channel is not
/// configured.
pub async fn open_daily_thread<P: ChatPlatform>(
    platform: &P,
    config: &Config,
    kind: VerificationKind,
    now: DateTime<Utc>,
) -> Result<Option<ThreadHandle>> {
    let Some(channel) = config.channel_for(kind) else {
        tracing::warn!(?kind, "channel not configured; no thread opened");
        return Ok(None);
    };

    let timeout = config.engine.request_timeout_secs;
    let date = TimeWindowClassifier::new(config.schedule.utc_offset_hours).date_label(now);
    let title = config.thread_title(kind, &date);

    if let Some(existing) =
        bounded("find thread", timeout, platform.find_active_thread(channel, &title)).await?
    {
        tracing::info!(%title, thread = %existing.id, "thread already open");
        return Ok(Some(existing));
    }

    let anchor = bounded("post thread title", timeout, platform.send_message(channel, &title)).await?;
    let thread = bounded(
        "start thread",
        timeout,
        platform.start_thread(
            channel,
            &anchor.id,
            &title,
            config.schedule.thread_auto_archive_minutes,
        ),
    )
    .await?;

    tracing::info!(%title, thread = %thread.id, "thread opened");
    Ok(Some(thread))
}
