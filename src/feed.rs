//! Room feed listener: the persistent push connection for one room.
//!
//! SYSTEM CONTEXT
//! ==============
//! `open` spawns a tokio task that connects through the room transport and
//! forwards every decoded stroke to the room view as a `RoomEvent`. The view
//! applies them to the store with insert-if-absent semantics, so duplicates
//! from resyncs or from the client's own commits are harmless.
//!
//! RECONNECT
//! =========
//! When the connection drops the task waits and reconnects with exponential
//! backoff (doubling, capped, reset on success). After every successful
//! connect, the first one included, it re-fetches the room and forwards the
//! full stroke list as a resync batch so strokes pushed while no feed was
//! attached (before the first connect or across a drop) are not lost.
//!
//! ERROR HANDLING
//! ==============
//! Malformed payloads are logged, counted, and dropped. Connection errors
//! only ever lead to a reconnect. The task exits when the view stops
//! listening (event channel closed) or when the handle is closed.

#[cfg(test)]
#[path = "feed_test.rs"]
mod feed_test;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures::StreamExt;
use strokes::{RoomId, Stroke};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::room::{ConnectionStatus, RoomEvent};
use crate::transport::{FeedStream, RoomTransport, TransportError};

pub const DEFAULT_INITIAL_BACKOFF_MS: u64 = 1000;
pub const DEFAULT_MAX_BACKOFF_MS: u64 = 10_000;

// =============================================================================
// SETTINGS & STATS
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FeedSettings {
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    /// Reconnect after the connection drops. Disabled, the task exits instead.
    pub reconnect: bool,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            initial_backoff: Duration::from_millis(DEFAULT_INITIAL_BACKOFF_MS),
            max_backoff: Duration::from_millis(DEFAULT_MAX_BACKOFF_MS),
            reconnect: true,
        }
    }
}

/// Counters shared between the listener task and its handle.
#[derive(Debug, Default)]
pub struct FeedStats {
    received: AtomicU64,
    malformed: AtomicU64,
    reconnects: AtomicU64,
}

impl FeedStats {
    /// Non-empty payloads received, malformed ones included.
    #[must_use]
    pub fn received(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn malformed(&self) -> u64 {
        self.malformed.load(Ordering::Relaxed)
    }

    /// Successful connects after the first one.
    #[must_use]
    pub fn reconnects(&self) -> u64 {
        self.reconnects.load(Ordering::Relaxed)
    }
}

// =============================================================================
// HANDLE
// =============================================================================

/// Owns the listener task. Closing (or dropping) the handle stops it.
#[derive(Debug)]
pub struct FeedHandle {
    room_id: RoomId,
    task: Option<JoinHandle<()>>,
    stats: Arc<FeedStats>,
}

impl FeedHandle {
    #[must_use]
    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    #[must_use]
    pub fn stats(&self) -> &FeedStats {
        &self.stats
    }

    /// True once the listener task has exited on its own.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(JoinHandle::is_finished)
    }

    pub fn close(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!(room_id = self.room_id, "room feed closed");
        }
    }
}

impl Drop for FeedHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Start listening to `room_id`; events go to `events` until the handle closes.
#[must_use]
pub fn open(
    transport: Arc<dyn RoomTransport>,
    room_id: RoomId,
    settings: FeedSettings,
    events: mpsc::UnboundedSender<RoomEvent>,
) -> FeedHandle {
    let stats = Arc::new(FeedStats::default());
    let task = tokio::spawn(run(transport, room_id, settings, Arc::clone(&stats), events));
    FeedHandle { room_id, task: Some(task), stats }
}

// =============================================================================
// LISTENER LOOP
// =============================================================================

enum StreamEnd {
    Closed,
    Failed(TransportError),
    ListenerGone,
}

async fn run(
    transport: Arc<dyn RoomTransport>,
    room_id: RoomId,
    settings: FeedSettings,
    stats: Arc<FeedStats>,
    events: mpsc::UnboundedSender<RoomEvent>,
) {
    let mut backoff = settings.initial_backoff;
    let mut connected_before = false;

    loop {
        if events.send(RoomEvent::FeedStatus(ConnectionStatus::Connecting)).is_err() {
            return;
        }

        match transport.open_feed(room_id).await {
            Ok(stream) => {
                backoff = settings.initial_backoff;
                info!(room_id, "room feed connected");
                if events.send(RoomEvent::FeedStatus(ConnectionStatus::Connected)).is_err() {
                    return;
                }
                if connected_before {
                    stats.reconnects.fetch_add(1, Ordering::Relaxed);
                }
                connected_before = true;
                if !resync(transport.as_ref(), room_id, &events).await {
                    return;
                }

                match pump(stream, room_id, &stats, &events).await {
                    StreamEnd::ListenerGone => return,
                    StreamEnd::Closed => info!(room_id, "room feed closed by server"),
                    StreamEnd::Failed(e) => warn!(error = %e, room_id, "room feed dropped"),
                }
            }
            Err(e) => warn!(error = %e, room_id, "room feed connect failed"),
        }

        if events.send(RoomEvent::FeedStatus(ConnectionStatus::Disconnected)).is_err() || !settings.reconnect {
            return;
        }
        tokio::time::sleep(backoff).await;
        backoff = (backoff * 2).min(settings.max_backoff);
    }
}

async fn pump(
    mut stream: FeedStream,
    room_id: RoomId,
    stats: &FeedStats,
    events: &mpsc::UnboundedSender<RoomEvent>,
) -> StreamEnd {
    while let Some(item) = stream.next().await {
        match item {
            Ok(payload) => {
                if !dispatch(&payload, room_id, stats, events) {
                    return StreamEnd::ListenerGone;
                }
            }
            Err(e) => return StreamEnd::Failed(e),
        }
    }
    StreamEnd::Closed
}

/// Decode one payload and forward it. Returns `false` once the view is gone.
fn dispatch(payload: &str, room_id: RoomId, stats: &FeedStats, events: &mpsc::UnboundedSender<RoomEvent>) -> bool {
    if payload.trim().is_empty() {
        return true;
    }
    stats.received.fetch_add(1, Ordering::Relaxed);
    match strokes::decode_stroke(payload) {
        Ok(stroke) => events.send(RoomEvent::RemoteStroke(stroke)).is_ok(),
        Err(e) => {
            stats.malformed.fetch_add(1, Ordering::Relaxed);
            warn!(error = %e, room_id, "dropping malformed feed payload");
            true
        }
    }
}

/// Re-fetch the room after a connect. A failed fetch is logged and skipped.
async fn resync(
    transport: &dyn RoomTransport,
    room_id: RoomId,
    events: &mpsc::UnboundedSender<RoomEvent>,
) -> bool {
    let envelope = match transport.fetch_room(room_id).await {
        Ok(envelope) => envelope,
        Err(e) => {
            warn!(error = %e, room_id, "resync fetch failed");
            return true;
        }
    };
    let strokes: Vec<Stroke> = envelope
        .room
        .strokes
        .into_iter()
        .filter(|stroke| match stroke.validate_committed() {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, room_id, "dropping invalid resync stroke");
                false
            }
        })
        .collect();
    debug!(room_id, count = strokes.len(), "room resynced");
    events.send(RoomEvent::Resync(strokes)).is_ok()
}
