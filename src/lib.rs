//! Client for a shared drawing room.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every participant in a room draws freehand strokes. A finished stroke is
//! committed to the server, which assigns it an id and pushes it to every
//! participant over the room feed. Each client keeps its own copy of the
//! committed set and renders it in ascending id order, with the stroke
//! currently being drawn on top.
//!
//! `RoomView` ties the pieces together:
//!
//! - [`store`]: deduplicated, ordered committed strokes
//! - [`feed`]: the push connection, with reconnect and resync
//! - [`builder`]: the local stroke state machine
//! - [`commit`]: stroke submission and its outcome
//! - [`projector`]: the render list
//!
//! The wire model lives in the `strokes` crate.

pub mod builder;
pub mod commit;
pub mod config;
pub mod feed;
pub mod notify;
pub mod projector;
pub mod room;
pub mod store;
pub mod tools;
pub mod transport;

#[cfg(test)]
mod test_helpers;

pub use builder::{BuilderError, BuilderState, StrokeBuilder};
pub use commit::{CommitCoordinator, CommitError, CommitTicket};
pub use config::{ClientConfig, ConfigError, RoomConfig};
pub use feed::{FeedHandle, FeedSettings, FeedStats};
pub use notify::{Level, Notification, Notifier, Position, TracingNotifier};
pub use projector::project;
pub use room::{BootstrapError, ConnectionStatus, RoomEvent, RoomView};
pub use store::StrokeStore;
pub use tools::{Rgb, ToolSettings, parse_hex_color};
pub use transport::{HttpTransport, RoomTransport, TransportError};
