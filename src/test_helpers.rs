//! Fixtures and in-memory doubles shared by the unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use strokes::{Point, RoomEnvelope, RoomId, RoomPayload, Stroke, StrokeId};
use tokio::sync::mpsc;

use crate::notify::{Notification, Notifier};
use crate::room::{ConnectionStatus, RoomEvent};
use crate::transport::{FeedStream, RoomTransport, TransportError};

pub type FeedSender = mpsc::UnboundedSender<Result<String, TransportError>>;

/// A valid committed stroke whose geometry is derived from `id`.
pub fn committed_stroke(id: StrokeId) -> Stroke {
    #[allow(clippy::cast_precision_loss)]
    let offset = id as f64;
    Stroke {
        id,
        red: 200,
        green: 10,
        blue: 10,
        alpha: 1.0,
        width: 4,
        points: vec![Point::new(offset, offset), Point::new(offset + 5.0, offset + 5.0)],
    }
}

pub fn stroke_ids<'a>(strokes: impl IntoIterator<Item = &'a Stroke>) -> Vec<StrokeId> {
    strokes.into_iter().map(|stroke| stroke.id).collect()
}

pub fn room_envelope(room_id: RoomId, ids: &[StrokeId], csrf_token: Option<&str>) -> RoomEnvelope {
    RoomEnvelope {
        room: RoomPayload {
            id: room_id,
            name: format!("room {room_id}"),
            canvas_width: 1028,
            canvas_height: 768,
            strokes: ids.iter().copied().map(committed_stroke).collect(),
        },
        csrf_token: csrf_token.map(str::to_owned),
    }
}

/// Receive the next event, failing the test if none arrives in time.
pub async fn recv_event(rx: &mut mpsc::UnboundedReceiver<RoomEvent>) -> RoomEvent {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timed out waiting for room event")
        .expect("event channel closed")
}

/// Receive events until one that is not a connection status update.
pub async fn recv_non_status(rx: &mut mpsc::UnboundedReceiver<RoomEvent>) -> RoomEvent {
    loop {
        let event = recv_event(rx).await;
        if !matches!(event, RoomEvent::FeedStatus(_)) {
            return event;
        }
    }
}

pub fn expect_status(event: RoomEvent) -> ConnectionStatus {
    match event {
        RoomEvent::FeedStatus(status) => status,
        other => panic!("expected a status update, got {other:?}"),
    }
}

pub fn expect_remote(event: RoomEvent) -> Stroke {
    match event {
        RoomEvent::RemoteStroke(stroke) => stroke,
        other => panic!("expected a remote stroke, got {other:?}"),
    }
}

// =============================================================================
// NOTIFIER
// =============================================================================

#[derive(Default)]
pub struct RecordingNotifier {
    notifications: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn all(&self) -> Vec<Notification> {
        self.notifications.lock().expect("notifier lock").clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.notifications.lock().expect("notifier lock").push(notification);
    }
}

// =============================================================================
// TRANSPORT
// =============================================================================

/// Scripted transport.
///
/// `fetch_room` returns the configured room (404 when unset). Each
/// `open_feed` call takes the next scripted feed; with none left it returns a
/// stream that never yields. Each `commit_stroke` takes the next scripted
/// result; with none left it never completes.
#[derive(Default)]
pub struct MockTransport {
    room: Mutex<Option<RoomEnvelope>>,
    feeds: Mutex<VecDeque<Result<mpsc::UnboundedReceiver<Result<String, TransportError>>, TransportError>>>,
    commits: Mutex<VecDeque<Result<Stroke, TransportError>>>,
    submitted: Mutex<Vec<(String, Stroke)>>,
    fetch_calls: AtomicUsize,
    feed_calls: AtomicUsize,
}

impl MockTransport {
    pub fn with_room(envelope: RoomEnvelope) -> Self {
        let transport = Self::default();
        transport.set_room(envelope);
        transport
    }

    pub fn set_room(&self, envelope: RoomEnvelope) {
        *self.room.lock().expect("room lock") = Some(envelope);
    }

    /// Script the next feed connection; the returned sender drives it and
    /// dropping it ends the stream.
    pub fn push_feed(&self) -> FeedSender {
        let (tx, rx) = mpsc::unbounded_channel();
        self.feeds.lock().expect("feeds lock").push_back(Ok(rx));
        tx
    }

    pub fn push_feed_error(&self) {
        self.feeds
            .lock()
            .expect("feeds lock")
            .push_back(Err(TransportError::Status { status: 503, body: "unavailable".into() }));
    }

    pub fn push_commit(&self, result: Result<Stroke, TransportError>) {
        self.commits.lock().expect("commits lock").push_back(result);
    }

    pub fn submitted(&self) -> Vec<(String, Stroke)> {
        self.submitted.lock().expect("submitted lock").clone()
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn feed_calls(&self) -> usize {
        self.feed_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl RoomTransport for MockTransport {
    async fn fetch_room(&self, room_id: RoomId) -> Result<RoomEnvelope, TransportError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let room = self.room.lock().expect("room lock").clone();
        room.ok_or_else(|| TransportError::Status { status: 404, body: format!("room {room_id} not found") })
    }

    async fn open_feed(&self, _room_id: RoomId) -> Result<FeedStream, TransportError> {
        self.feed_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.feeds.lock().expect("feeds lock").pop_front();
        match next {
            Some(Ok(rx)) => {
                let stream = futures::stream::unfold(rx, |mut rx| async move { rx.recv().await.map(|item| (item, rx)) });
                Ok(Box::pin(stream))
            }
            Some(Err(e)) => Err(e),
            None => Ok(Box::pin(futures::stream::pending())),
        }
    }

    async fn commit_stroke(
        &self,
        _room_id: RoomId,
        csrf_token: &str,
        stroke: &Stroke,
    ) -> Result<Stroke, TransportError> {
        self.submitted
            .lock()
            .expect("submitted lock")
            .push((csrf_token.to_owned(), stroke.clone()));
        let next = self.commits.lock().expect("commits lock").pop_front();
        match next {
            Some(result) => result,
            None => futures::future::pending().await,
        }
    }
}
