//! HTTP implementation of [`RoomTransport`].
//!
//! Bootstrap and commit are plain JSON requests with a per-request timeout.
//! The feed is a long-lived `text/event-stream` response, so the client
//! itself carries only a connect timeout and the body is decoded
//! incrementally with [`SseDecoder`].

#[cfg(test)]
#[path = "http_test.rs"]
mod http_test;

use std::time::Duration;

use futures::StreamExt;
use strokes::{RoomEnvelope, RoomId, Stroke};

use super::sse::{SseDecoder, SseEvent};
use super::{FeedStream, RoomTransport, TransportError};
use crate::config::{ClientConfig, normalize_base_url};

const CSRF_HEADER: &str = "x-csrf-token";

// =============================================================================
// CLIENT
// =============================================================================

pub struct HttpTransport {
    http: reqwest::Client,
    base_url: String,
    request_timeout: Duration,
}

impl HttpTransport {
    /// Build a transport rooted at `base_url` (`http://host:port`).
    ///
    /// # Errors
    ///
    /// [`TransportError::Config`] for a non-HTTP URL and
    /// [`TransportError::ClientBuild`] if the TLS backend fails to initialize.
    pub fn new(base_url: &str, request_timeout: Duration, connect_timeout: Duration) -> Result<Self, TransportError> {
        let base_url = normalize_base_url(base_url)?;
        let http = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| TransportError::ClientBuild(e.to_string()))?;
        Ok(Self { http, base_url, request_timeout })
    }

    /// # Errors
    ///
    /// Same as [`HttpTransport::new`].
    pub fn from_config(config: &ClientConfig) -> Result<Self, TransportError> {
        Self::new(&config.base_url, config.request_timeout, config.connect_timeout)
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn room_url(&self, room_id: RoomId) -> String {
        format!("{}/api/rooms/{room_id}", self.base_url)
    }

    fn strokes_url(&self, room_id: RoomId) -> String {
        format!("{}/api/strokes/rooms/{room_id}", self.base_url)
    }
}

#[async_trait::async_trait]
impl RoomTransport for HttpTransport {
    async fn fetch_room(&self, room_id: RoomId) -> Result<RoomEnvelope, TransportError> {
        let response = self
            .http
            .get(self.room_url(room_id))
            .timeout(self.request_timeout)
            .send()
            .await?;
        let text = success_body(response).await?;
        Ok(strokes::decode_room(&text)?)
    }

    async fn open_feed(&self, room_id: RoomId) -> Result<FeedStream, TransportError> {
        let response = self
            .http
            .get(self.strokes_url(room_id))
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            return Err(TransportError::Status { status: status.as_u16(), body });
        }

        let stream = response
            .bytes_stream()
            .scan(SseDecoder::new(), |decoder, chunk| {
                let items: Vec<Result<String, TransportError>> = match chunk {
                    Ok(bytes) => decoder
                        .push(&bytes)
                        .into_iter()
                        .filter(SseEvent::is_message)
                        .map(|event| Ok(event.data))
                        .collect(),
                    Err(e) => vec![Err(TransportError::Http(e))],
                };
                futures::future::ready(Some(futures::stream::iter(items)))
            })
            .flatten();
        Ok(Box::pin(stream))
    }

    async fn commit_stroke(
        &self,
        room_id: RoomId,
        csrf_token: &str,
        stroke: &Stroke,
    ) -> Result<Stroke, TransportError> {
        let response = self
            .http
            .post(self.strokes_url(room_id))
            .header(CSRF_HEADER, csrf_token)
            .json(stroke)
            .timeout(self.request_timeout)
            .send()
            .await?;
        let text = success_body(response).await?;
        Ok(strokes::decode_commit_response(&text)?)
    }
}

// =============================================================================
// HELPERS
// =============================================================================

async fn success_body(response: reqwest::Response) -> Result<String, TransportError> {
    let status = response.status();
    let text = response.text().await?;
    if !status.is_success() {
        return Err(TransportError::Status { status: status.as_u16(), body: text });
    }
    Ok(text)
}
