//! Room view: the single owner of a room's drawing state.
//!
//! SYSTEM CONTEXT
//! ==============
//! `RoomView::open` bootstraps the room over the transport, fills the stroke
//! store, and activates the feed listener. From then on the view is driven
//! from two directions:
//!
//! - pointer input (`pointer_down`/`pointer_move`/`pointer_up`) feeds the
//!   stroke builder; pointer-up hands the finished stroke to the commit
//!   coordinator
//! - background tasks (feed listener, commits) send `RoomEvent`s over an
//!   unbounded channel, applied by `process_pending` or `next_event`
//!
//! Every event is applied to completion on the owner's task, so the store
//! needs no locking and insert-if-absent keeps it convergent however feed and
//! commit results interleave.
//!
//! LIFECYCLE
//! =========
//! `activate` opens the feed exactly once; `deactivate` closes it, cancels
//! in-flight commits, and drops any stroke still being drawn. Both are
//! idempotent and `Drop` deactivates.

#[cfg(test)]
#[path = "room_test.rs"]
mod room_test;

use std::sync::Arc;

use strokes::{Point, RoomId, Stroke, StrokeId};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::builder::{BuilderError, StrokeBuilder};
use crate::commit::{CommitCoordinator, CommitError, CommitTicket};
use crate::config::{ClientConfig, ConfigError, RoomConfig};
use crate::feed::{self, FeedHandle, FeedSettings, FeedStats};
use crate::notify::{Notification, Notifier};
use crate::projector::project;
use crate::store::StrokeStore;
use crate::tools::ToolSettings;
use crate::transport::{RoomTransport, TransportError};

// =============================================================================
// EVENTS
// =============================================================================

/// Messages from background tasks to the owning view.
#[derive(Debug)]
pub enum RoomEvent {
    /// A stroke pushed by the room feed.
    RemoteStroke(Stroke),
    /// The full committed set, re-fetched after each feed connect.
    Resync(Vec<Stroke>),
    FeedStatus(ConnectionStatus),
    CommitSettled { ticket: CommitTicket, result: Result<Stroke, CommitError> },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("failed to load room: {0}")]
    Transport(#[from] TransportError),
    #[error("invalid room: {0}")]
    Config(#[from] ConfigError),
    #[error("requested room {requested} but the server returned room {returned}")]
    RoomMismatch { requested: RoomId, returned: RoomId },
}

// =============================================================================
// VIEW
// =============================================================================

pub struct RoomView {
    config: RoomConfig,
    transport: Arc<dyn RoomTransport>,
    feed_settings: FeedSettings,
    store: StrokeStore,
    builder: StrokeBuilder,
    tools: ToolSettings,
    commits: CommitCoordinator,
    feed: Option<FeedHandle>,
    connection: ConnectionStatus,
    notifier: Arc<dyn Notifier>,
    events_tx: mpsc::UnboundedSender<RoomEvent>,
    events_rx: mpsc::UnboundedReceiver<RoomEvent>,
}

impl RoomView {
    /// Bootstrap `room_id` and return an active view.
    ///
    /// # Errors
    ///
    /// A failed fetch, invalid room metadata, or a response for a different
    /// room. No view exists on error.
    pub async fn open(
        transport: Arc<dyn RoomTransport>,
        room_id: RoomId,
        client: &ClientConfig,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, BootstrapError> {
        let envelope = transport.fetch_room(room_id).await?;
        let (config, strokes) = RoomConfig::from_envelope(envelope, client.csrf_token.as_deref())?;
        if config.id() != room_id {
            return Err(BootstrapError::RoomMismatch { requested: room_id, returned: config.id() });
        }
        let mut view = Self::new(config, strokes, transport, client.feed, notifier);
        view.activate();
        Ok(view)
    }

    /// Build an inactive view from already-validated room metadata.
    #[must_use]
    pub fn new(
        config: RoomConfig,
        initial_strokes: Vec<Stroke>,
        transport: Arc<dyn RoomTransport>,
        feed_settings: FeedSettings,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let mut store = StrokeStore::new();
        let offered = initial_strokes.len();
        let loaded = store.initialize(initial_strokes);
        info!(room_id = config.id(), name = config.name(), loaded, offered, "room loaded");

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            commits: CommitCoordinator::new(Arc::clone(&transport)),
            config,
            transport,
            feed_settings,
            store,
            builder: StrokeBuilder::new(),
            tools: ToolSettings::default(),
            feed: None,
            connection: ConnectionStatus::Disconnected,
            notifier,
            events_tx,
            events_rx,
        }
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// Start the feed listener. No-op while already active.
    pub fn activate(&mut self) {
        if self.feed.is_some() {
            return;
        }
        let handle = feed::open(
            Arc::clone(&self.transport),
            self.config.id(),
            self.feed_settings,
            self.events_tx.clone(),
        );
        self.feed = Some(handle);
        info!(room_id = self.config.id(), "room view activated");
    }

    /// Close the feed, cancel in-flight commits, and drop the stroke being
    /// drawn. Safe to call repeatedly.
    pub fn deactivate(&mut self) {
        let cancelled = self.commits.cancel_all();
        let discarded = self.builder.discard().is_some();
        let Some(handle) = self.feed.take() else {
            return;
        };
        handle.close();
        self.connection = ConnectionStatus::Disconnected;
        info!(room_id = self.config.id(), cancelled, discarded, "room view deactivated");
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.feed.is_some()
    }

    // -------------------------------------------------------------------------
    // Pointer input
    // -------------------------------------------------------------------------

    /// # Errors
    ///
    /// [`BuilderError::AlreadyBuilding`] while a stroke is in progress.
    pub fn pointer_down(&mut self, point: Point) -> Result<(), BuilderError> {
        self.builder
            .start(&self.tools, point)
            .inspect_err(|e| warn!(error = %e, "pointer down rejected"))
    }

    /// # Errors
    ///
    /// [`BuilderError::NotBuilding`] without a preceding pointer-down.
    pub fn pointer_move(&mut self, point: Point) -> Result<(), BuilderError> {
        self.builder.move_to(point).inspect_err(|e| debug!(error = %e, "pointer move rejected"))
    }

    /// Finish the stroke and submit it. The builder is idle again on return.
    ///
    /// # Errors
    ///
    /// [`BuilderError::NotBuilding`] without a preceding pointer-down.
    pub fn pointer_up(&mut self, point: Point) -> Result<CommitTicket, BuilderError> {
        let stroke = self
            .builder
            .end(point)
            .inspect_err(|e| warn!(error = %e, "pointer up rejected"))?;
        Ok(self.commits.submit(self.config.id(), self.config.csrf_token(), stroke, self.events_tx.clone()))
    }

    // -------------------------------------------------------------------------
    // Events
    // -------------------------------------------------------------------------

    /// Apply one event. Returns whether the committed set changed.
    pub fn apply(&mut self, event: RoomEvent) -> bool {
        match event {
            RoomEvent::RemoteStroke(stroke) => self.store.insert_if_absent(stroke),
            RoomEvent::Resync(strokes) => {
                let mut added = 0_usize;
                for stroke in strokes {
                    if self.store.insert_if_absent(stroke) {
                        added += 1;
                    }
                }
                if added > 0 {
                    info!(room_id = self.config.id(), added, "resync recovered missed strokes");
                }
                added > 0
            }
            RoomEvent::FeedStatus(status) => {
                self.connection = status;
                false
            }
            RoomEvent::CommitSettled { ticket, result } => {
                let before = self.store.len();
                self.settle_commit(ticket, result);
                self.store.len() > before
            }
        }
    }

    /// Returns `None` for an untracked ticket, whose result is dropped.
    fn settle_commit(
        &mut self,
        ticket: CommitTicket,
        result: Result<Stroke, CommitError>,
    ) -> Option<Result<StrokeId, CommitError>> {
        if !self.commits.settle(ticket) {
            debug!(ticket, "ignoring result for untracked commit");
            return None;
        }
        match result {
            Ok(stroke) => {
                let id = stroke.id;
                let inserted = self.store.insert_if_absent(stroke);
                debug!(ticket, stroke_id = id, inserted, "stroke committed");
                Some(Ok(id))
            }
            Err(e) => {
                warn!(error = %e, ticket, room_id = self.config.id(), "stroke commit failed; discarding");
                self.notifier.notify(Notification::error(e.to_string()));
                Some(Err(e))
            }
        }
    }

    /// Apply events until `ticket` settles and return its outcome.
    ///
    /// Failures have already been notified when this returns. `None` means
    /// the ticket is not in flight (unknown, settled, or cancelled).
    pub async fn wait_for_commit(&mut self, ticket: CommitTicket) -> Option<Result<StrokeId, CommitError>> {
        while self.commits.is_pending(ticket) {
            match self.events_rx.recv().await? {
                RoomEvent::CommitSettled { ticket: settled, result } if settled == ticket => {
                    return self.settle_commit(settled, result);
                }
                other => {
                    self.apply(other);
                }
            }
        }
        None
    }

    /// Apply every event already queued without waiting. Returns the count.
    pub fn process_pending(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.apply(event);
            applied += 1;
        }
        applied
    }

    /// Wait for the next event and apply it. Returns whether the committed
    /// set changed.
    pub async fn next_event(&mut self) -> bool {
        match self.events_rx.recv().await {
            Some(event) => self.apply(event),
            None => false,
        }
    }

    // -------------------------------------------------------------------------
    // Read access
    // -------------------------------------------------------------------------

    /// Committed strokes in canonical order, then the stroke being drawn.
    #[must_use]
    pub fn render_list(&self) -> Vec<&Stroke> {
        project(self.store.iter(), self.builder.provisional())
    }

    #[must_use]
    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    #[must_use]
    pub fn store(&self) -> &StrokeStore {
        &self.store
    }

    #[must_use]
    pub fn builder(&self) -> &StrokeBuilder {
        &self.builder
    }

    #[must_use]
    pub fn tools(&self) -> &ToolSettings {
        &self.tools
    }

    /// Tool changes only affect strokes started afterwards.
    pub fn tools_mut(&mut self) -> &mut ToolSettings {
        &mut self.tools
    }

    #[must_use]
    pub fn pending_commits(&self) -> usize {
        self.commits.in_flight()
    }

    #[must_use]
    pub fn connection(&self) -> ConnectionStatus {
        self.connection
    }

    /// Feed counters while active.
    #[must_use]
    pub fn feed_stats(&self) -> Option<&FeedStats> {
        self.feed.as_ref().map(FeedHandle::stats)
    }
}

impl Drop for RoomView {
    fn drop(&mut self) {
        self.deactivate();
    }
}
