//! Client and room configuration.
//!
//! `ClientConfig` is read from environment variables with typed defaults.
//! `RoomConfig` is built from the bootstrap response and validated once, so
//! the rest of the crate never re-checks room metadata.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::time::Duration;

use strokes::{RoomEnvelope, RoomId, Stroke};

use crate::feed::{DEFAULT_INITIAL_BACKOFF_MS, DEFAULT_MAX_BACKOFF_MS, FeedSettings};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:3000";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("base URL must start with http:// or https://: {0}")]
    InvalidBaseUrl(String),
    #[error("{key} must be a positive integer, got {value:?}")]
    InvalidNumber { key: String, value: String },
    #[error("room id must be positive")]
    InvalidRoomId,
    #[error("canvas size {width}x{height} must be positive")]
    InvalidCanvas { width: u32, height: u32 },
    #[error("no CSRF token in the room response or the client config")]
    MissingCsrfToken,
}

// =============================================================================
// CLIENT
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    /// Used when the bootstrap response carries no token.
    pub csrf_token: Option<String>,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub feed: FeedSettings,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            csrf_token: None,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            feed: FeedSettings::default(),
        }
    }
}

impl ClientConfig {
    /// Build client config from environment variables.
    ///
    /// Optional:
    /// - `DRAWROOM_BASE_URL`: default `http://127.0.0.1:3000`
    /// - `DRAWROOM_CSRF_TOKEN`: fallback anti-forgery token
    /// - `DRAWROOM_REQUEST_TIMEOUT_SECS`: default 30
    /// - `DRAWROOM_CONNECT_TIMEOUT_SECS`: default 10
    /// - `DRAWROOM_FEED_BACKOFF_MS`: default 1000
    /// - `DRAWROOM_FEED_MAX_BACKOFF_MS`: default 10000
    ///
    /// # Errors
    ///
    /// Returns an error for a non-HTTP base URL or a malformed number.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| match std::env::var(key) {
            Ok(value) => Some(value),
            Err(_) => None,
        })
    }

    /// Same as [`ClientConfig::from_env`] with an injectable variable source.
    ///
    /// # Errors
    ///
    /// See [`ClientConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = normalize_base_url(&lookup("DRAWROOM_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_owned()))?;
        let csrf_token = non_blank(lookup("DRAWROOM_CSRF_TOKEN"));

        let request_secs = parse_positive(&lookup, "DRAWROOM_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)?;
        let connect_secs = parse_positive(&lookup, "DRAWROOM_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS)?;
        let backoff_ms = parse_positive(&lookup, "DRAWROOM_FEED_BACKOFF_MS", DEFAULT_INITIAL_BACKOFF_MS)?;
        let max_backoff_ms = parse_positive(&lookup, "DRAWROOM_FEED_MAX_BACKOFF_MS", DEFAULT_MAX_BACKOFF_MS)?;

        Ok(Self {
            base_url,
            csrf_token,
            request_timeout: Duration::from_secs(request_secs),
            connect_timeout: Duration::from_secs(connect_secs),
            feed: FeedSettings {
                initial_backoff: Duration::from_millis(backoff_ms),
                max_backoff: Duration::from_millis(max_backoff_ms.max(backoff_ms)),
                reconnect: true,
            },
        })
    }

    /// Replace the base URL, validating it.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidBaseUrl`] for a non-HTTP URL.
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, ConfigError> {
        self.base_url = normalize_base_url(base_url)?;
        Ok(self)
    }

    #[must_use]
    pub fn with_csrf_token(mut self, csrf_token: Option<String>) -> Self {
        if let Some(token) = non_blank(csrf_token) {
            self.csrf_token = Some(token);
        }
        self
    }
}

/// Trim whitespace and trailing slashes; only `http://` and `https://` pass.
pub(crate) fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Ok(trimmed.to_owned())
    } else {
        Err(ConfigError::InvalidBaseUrl(raw.to_owned()))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_owned()).filter(|v| !v.is_empty())
}

fn parse_positive(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: u64) -> Result<u64, ConfigError> {
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };
    match raw.trim().parse::<u64>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ConfigError::InvalidNumber { key: key.to_owned(), value: raw }),
    }
}

// =============================================================================
// ROOM
// =============================================================================

/// Validated room metadata. Fields are only readable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomConfig {
    id: RoomId,
    name: String,
    canvas_width: u32,
    canvas_height: u32,
    csrf_token: String,
}

impl RoomConfig {
    /// # Errors
    ///
    /// Rejects a zero room id, an empty canvas, or a blank token. The name
    /// may be empty.
    pub fn new(
        id: RoomId,
        name: impl Into<String>,
        canvas_width: u32,
        canvas_height: u32,
        csrf_token: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        if id == 0 {
            return Err(ConfigError::InvalidRoomId);
        }
        if canvas_width == 0 || canvas_height == 0 {
            return Err(ConfigError::InvalidCanvas { width: canvas_width, height: canvas_height });
        }
        let csrf_token = non_blank(Some(csrf_token.into())).ok_or(ConfigError::MissingCsrfToken)?;
        Ok(Self { id, name: name.into(), canvas_width, canvas_height, csrf_token })
    }

    /// Split a bootstrap response into validated metadata and the initial
    /// strokes. The response token wins over `fallback_token`.
    ///
    /// # Errors
    ///
    /// Same as [`RoomConfig::new`].
    pub fn from_envelope(
        envelope: RoomEnvelope,
        fallback_token: Option<&str>,
    ) -> Result<(Self, Vec<Stroke>), ConfigError> {
        let RoomEnvelope { room, csrf_token } = envelope;
        let token = non_blank(csrf_token)
            .or_else(|| non_blank(fallback_token.map(str::to_owned)))
            .ok_or(ConfigError::MissingCsrfToken)?;
        let config = Self::new(room.id, room.name, room.canvas_width, room.canvas_height, token)?;
        Ok((config, room.strokes))
    }

    #[must_use]
    pub fn id(&self) -> RoomId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn canvas_size(&self) -> (u32, u32) {
        (self.canvas_width, self.canvas_height)
    }

    #[must_use]
    pub fn csrf_token(&self) -> &str {
        &self.csrf_token
    }
}
