//! Change-notification channel for the bookmarks collection.
//!
//! The hosted service delivers change events as one JSON object per line over
//! a long-lived streaming response. A feed task parses the stream and fans
//! events out on a broadcast channel; [`Subscription`] is the receiving
//! handle. Events carry no detail the client acts on — any event means
//! "re-fetch the list".

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::types::change::ChangeEvent;

/// Events buffered per subscriber before the oldest are dropped. A dropped
/// event is harmless: the next one triggers the same whole-list re-fetch.
const CHANNEL_CAPACITY: usize = 64;

pub(crate) fn channel() -> (broadcast::Sender<ChangeEvent>, broadcast::Receiver<ChangeEvent>) {
    broadcast::channel(CHANNEL_CAPACITY)
}

/// Receiving end of a change-notification channel.
///
/// Dropping the subscription (or calling [`unsubscribe`](Self::unsubscribe))
/// closes it and stops the feed task, if one was spawned for it.
pub struct Subscription {
    rx: broadcast::Receiver<ChangeEvent>,
    feed: Option<JoinHandle<()>>,
}

impl Subscription {
    pub(crate) fn new(rx: broadcast::Receiver<ChangeEvent>, feed: Option<JoinHandle<()>>) -> Self {
        Self { rx, feed }
    }

    /// Waits for the next change event. `None` once the channel is closed.
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "change channel lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Non-blocking variant of [`recv`](Self::recv); `None` when nothing is
    /// pending.
    pub fn try_recv(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.rx.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "change channel lagged");
                }
                Err(_) => return None,
            }
        }
    }

    /// Closes the channel.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(handle) = self.feed.take() {
            handle.abort();
        }
    }
}

/// Moves completed lines out of the stream buffer, decoding each into an
/// event. A trailing partial line stays in the buffer for the next chunk.
pub(crate) fn drain_lines(buffer: &mut String, out: &mut Vec<ChangeEvent>) {
    while let Some(pos) = buffer.find('\n') {
        let line: String = buffer.drain(..=pos).collect();
        if let Some(event) = decode_line(line.trim()) {
            out.push(event);
        }
    }
}

/// Decodes a single feed line. Malformed lines are skipped, not fatal.
pub(crate) fn decode_line(line: &str) -> Option<ChangeEvent> {
    if line.is_empty() {
        return None;
    }
    match serde_json::from_str(line) {
        Ok(event) => Some(event),
        Err(e) => {
            tracing::warn!(error = %e, "discarding malformed change event");
            None
        }
    }
}
