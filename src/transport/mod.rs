//! Room transport: bootstrap, feed, and commit behind one async trait.
//!
//! DESIGN
//! ======
//! The room view and its tasks only talk to the server through
//! `RoomTransport`. `HttpTransport` is the production implementation (JSON
//! over HTTP plus a Server-Sent Events feed); tests substitute an in-memory
//! mock the same way the board services mock their LLM client.

pub mod http;
pub mod sse;

use std::pin::Pin;

use futures::Stream;
use strokes::{RoomEnvelope, RoomId, Stroke};

use crate::config::ConfigError;

pub use http::HttpTransport;

/// Stream of raw feed payloads (the `data` of each message event).
pub type FeedStream = Pin<Box<dyn Stream<Item = Result<String, TransportError>> + Send>>;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid payload: {0}")]
    Codec(#[from] strokes::CodecError),
    #[error("{0}")]
    Config(#[from] ConfigError),
    #[error("http client build failed: {0}")]
    ClientBuild(String),
}

#[async_trait::async_trait]
pub trait RoomTransport: Send + Sync {
    /// Load room metadata and the committed stroke history.
    ///
    /// # Errors
    ///
    /// Transport, status, or decode failures.
    async fn fetch_room(&self, room_id: RoomId) -> Result<RoomEnvelope, TransportError>;

    /// Open the push feed for `room_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    async fn open_feed(&self, room_id: RoomId) -> Result<FeedStream, TransportError>;

    /// Submit a provisional stroke and return the server-confirmed copy.
    ///
    /// # Errors
    ///
    /// Transport failures, non-success statuses, and malformed or invalid
    /// confirmations.
    async fn commit_stroke(
        &self,
        room_id: RoomId,
        csrf_token: &str,
        stroke: &Stroke,
    ) -> Result<Stroke, TransportError>;
}
