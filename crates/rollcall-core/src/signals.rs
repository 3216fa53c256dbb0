//! Turns the messages of a daily thread into per-participant signals.

use crate::judge::SignalMap;
use crate::platform::ChatMessage;
use crate::roster::Roster;

/// Earliest qualifying message per roster participant.
///
/// Bot messages and authors outside the roster are ignored. When
/// `require_image` is set only messages with an image attachment count.
pub fn earliest_signals(messages: &[ChatMessage], roster: &Roster, require_image: bool) -> SignalMap {
    let mut signals = SignalMap::new();

    for m in messages {
        if m.author_is_bot || !roster.contains_id(&m.author_id) {
            continue;
        }
        if require_image && !m.has_image() {
            continue;
        }
        signals
            .entry(m.author_id.clone())
            .and_modify(|ts| {
                if m.timestamp < *ts {
                    *ts = m.timestamp;
                }
            })
            .or_insert(m.timestamp);
    }

    signals
}
