//! Commit coordinator: submits finished local strokes to the server.
//!
//! SYSTEM CONTEXT
//! ==============
//! Each completed stroke is submitted once on its own tokio task. The task
//! reports back to the room view with a `RoomEvent::CommitSettled` carrying
//! the submission ticket, so the view stays the single owner of the store.
//! On success the confirmed stroke goes through insert-if-absent; on failure
//! the attempt is discarded and the view raises a notification.
//!
//! There is no retry and no re-queue. Tearing down the view cancels every
//! in-flight commit; a result for a ticket that is no longer tracked is
//! ignored.

#[cfg(test)]
#[path = "commit_test.rs"]
mod commit_test;

use std::collections::HashMap;
use std::sync::Arc;

use strokes::{RoomId, Stroke, StrokeError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::room::RoomEvent;
use crate::transport::{RoomTransport, TransportError};

/// Identifies one submission.
pub type CommitTicket = u64;

#[derive(Debug, thiserror::Error)]
pub enum CommitError {
    #[error("could not save stroke: {0}")]
    Transport(#[from] TransportError),
    #[error("server confirmed an invalid stroke: {0}")]
    InvalidStroke(#[from] StrokeError),
}

pub struct CommitCoordinator {
    transport: Arc<dyn RoomTransport>,
    in_flight: HashMap<CommitTicket, JoinHandle<()>>,
    next_ticket: CommitTicket,
}

impl CommitCoordinator {
    #[must_use]
    pub fn new(transport: Arc<dyn RoomTransport>) -> Self {
        Self { transport, in_flight: HashMap::new(), next_ticket: 1 }
    }

    /// Submit `stroke` and return its ticket. The outcome arrives on `events`.
    pub fn submit(
        &mut self,
        room_id: RoomId,
        csrf_token: &str,
        stroke: Stroke,
        events: mpsc::UnboundedSender<RoomEvent>,
    ) -> CommitTicket {
        let ticket = self.next_ticket;
        self.next_ticket += 1;

        let transport = Arc::clone(&self.transport);
        let csrf_token = csrf_token.to_owned();
        let points = stroke.points.len();
        let task = tokio::spawn(async move {
            let result = commit_once(transport.as_ref(), room_id, &csrf_token, &stroke).await;
            if events.send(RoomEvent::CommitSettled { ticket, result }).is_err() {
                debug!(ticket, "commit settled after room view closed");
            }
        });
        self.in_flight.insert(ticket, task);
        info!(room_id, ticket, points, "stroke submitted");
        ticket
    }

    /// Stop tracking `ticket`. Returns `false` for unknown (cancelled or
    /// already settled) tickets, whose results must be ignored.
    pub fn settle(&mut self, ticket: CommitTicket) -> bool {
        self.in_flight.remove(&ticket).is_some()
    }

    /// Abort every in-flight commit.
    pub fn cancel_all(&mut self) -> usize {
        let count = self.in_flight.len();
        for (ticket, task) in self.in_flight.drain() {
            task.abort();
            debug!(ticket, "commit cancelled");
        }
        count
    }

    #[must_use]
    pub fn is_pending(&self, ticket: CommitTicket) -> bool {
        self.in_flight.contains_key(&ticket)
    }

    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }
}

impl Drop for CommitCoordinator {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

async fn commit_once(
    transport: &dyn RoomTransport,
    room_id: RoomId,
    csrf_token: &str,
    stroke: &Stroke,
) -> Result<Stroke, CommitError> {
    let confirmed = transport.commit_stroke(room_id, csrf_token, stroke).await?;
    confirmed.validate_committed()?;
    Ok(confirmed)
}
