//! Shared stroke model and JSON codec for the drawing-room wire protocol.
//!
//! This crate owns the wire representation exchanged with the room server:
//! the `Stroke` record itself, the bootstrap envelope, and the commit
//! response envelope. Decoders validate committed strokes so that callers
//! never observe a stroke that breaks the id/points/width/alpha invariants.

use serde::{Deserialize, Serialize};

/// Server-assigned stroke identifier. `0` is reserved for provisional strokes.
pub type StrokeId = u64;

/// Room identifier used to scope bootstrap, feed, and commit requests.
pub type RoomId = u64;

/// Sentinel id carried by a stroke that the server has not confirmed yet.
pub const PROVISIONAL_ID: StrokeId = 0;

// =============================================================================
// ERRORS
// =============================================================================

/// Reasons a stroke fails committed-stroke validation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StrokeError {
    /// The stroke still carries the provisional id.
    #[error("stroke has provisional id 0")]
    ProvisionalId,
    /// The stroke has no points.
    #[error("stroke {0} has no points")]
    EmptyPoints(StrokeId),
    /// The stroke width is zero.
    #[error("stroke {0} has zero width")]
    ZeroWidth(StrokeId),
    /// Alpha is non-finite or outside `0.0..=1.0`.
    #[error("stroke {id} has alpha {alpha} outside 0.0..=1.0")]
    AlphaOutOfRange { id: StrokeId, alpha: f64 },
    /// A point coordinate is NaN or infinite.
    #[error("stroke {0} has a non-finite point")]
    NonFinitePoint(StrokeId),
}

/// Error returned by the decode/encode helpers.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The payload is not valid JSON for the expected shape.
    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),
    /// The payload parsed but describes an invalid committed stroke.
    #[error("invalid stroke: {0}")]
    Invalid(#[from] StrokeError),
}

// =============================================================================
// MODEL
// =============================================================================

/// A single sampled pointer location.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// True when both coordinates are finite.
    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// One continuous line drawn by a single participant.
///
/// Color, alpha and width are fixed when the stroke begins; only `points`
/// grows, and only while the stroke is still provisional.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub id: StrokeId,
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub alpha: f64,
    pub width: u32,
    pub points: Vec<Point>,
}

impl Stroke {
    /// True while the stroke has not been confirmed by the server.
    #[must_use]
    pub fn is_provisional(&self) -> bool {
        self.id == PROVISIONAL_ID
    }

    /// Check the invariants every server-confirmed stroke must satisfy.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate_committed(&self) -> Result<(), StrokeError> {
        if self.is_provisional() {
            return Err(StrokeError::ProvisionalId);
        }
        if self.points.is_empty() {
            return Err(StrokeError::EmptyPoints(self.id));
        }
        if self.width == 0 {
            return Err(StrokeError::ZeroWidth(self.id));
        }
        if !self.alpha.is_finite() || !(0.0..=1.0).contains(&self.alpha) {
            return Err(StrokeError::AlphaOutOfRange { id: self.id, alpha: self.alpha });
        }
        if !self.points.iter().all(|p| p.is_finite()) {
            return Err(StrokeError::NonFinitePoint(self.id));
        }
        Ok(())
    }
}

// =============================================================================
// ENVELOPES
// =============================================================================

/// Room metadata and history returned by the bootstrap endpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoomPayload {
    pub id: RoomId,
    pub name: String,
    pub canvas_width: u32,
    pub canvas_height: u32,
    #[serde(default)]
    pub strokes: Vec<Stroke>,
}

/// Top-level bootstrap response body.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoomEnvelope {
    pub room: RoomPayload,
    /// Anti-forgery token to echo on writes, when the server supplies one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csrf_token: Option<String>,
}

/// Commit response body: `{"stroke": {...}}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StrokeEnvelope {
    pub stroke: Stroke,
}

// =============================================================================
// CODEC
// =============================================================================

/// Decode one feed payload into a validated committed stroke.
///
/// # Errors
///
/// Returns [`CodecError::Json`] for malformed JSON or out-of-range channels
/// and [`CodecError::Invalid`] when the stroke breaks a committed invariant.
pub fn decode_stroke(text: &str) -> Result<Stroke, CodecError> {
    let stroke: Stroke = serde_json::from_str(text)?;
    stroke.validate_committed()?;
    Ok(stroke)
}

/// Encode a stroke as a JSON request body.
///
/// # Errors
///
/// Returns [`CodecError::Json`] if serialization fails (non-finite floats).
pub fn encode_stroke(stroke: &Stroke) -> Result<String, CodecError> {
    Ok(serde_json::to_string(stroke)?)
}

/// Decode a bootstrap response body.
///
/// Strokes inside the room are not validated here; the store decides what to
/// do with entries that break invariants.
///
/// # Errors
///
/// Returns [`CodecError::Json`] when the body does not match the envelope.
pub fn decode_room(text: &str) -> Result<RoomEnvelope, CodecError> {
    Ok(serde_json::from_str(text)?)
}

/// Decode a commit response body and validate the confirmed stroke.
///
/// # Errors
///
/// Returns [`CodecError`] for malformed bodies or invalid confirmed strokes.
pub fn decode_commit_response(text: &str) -> Result<Stroke, CodecError> {
    let envelope: StrokeEnvelope = serde_json::from_str(text)?;
    envelope.stroke.validate_committed()?;
    Ok(envelope.stroke)
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
