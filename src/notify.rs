//! User-visible notifications.
//!
//! The room view raises a notification when a commit fails. Rendering the
//! message is up to the host UI; `TracingNotifier` is the headless default.

#[cfg(test)]
#[path = "notify_test.rs"]
mod notify_test;

/// Severity of a notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    Info,
    Success,
    Warning,
    Error,
}

/// Screen anchor for a notification toast.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Position {
    TopLeft,
    TopCenter,
    TopRight,
    BottomLeft,
    #[default]
    BottomCenter,
    BottomRight,
}

impl Position {
    /// Two-letter anchor code understood by toast widgets (`"bc"`, `"tr"`, ...).
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::TopLeft => "tl",
            Self::TopCenter => "tc",
            Self::TopRight => "tr",
            Self::BottomLeft => "bl",
            Self::BottomCenter => "bc",
            Self::BottomRight => "br",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub level: Level,
    pub position: Position,
}

impl Notification {
    /// Error toast anchored bottom-center.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            title: "An error occurred".to_owned(),
            message: message.into(),
            level: Level::Error,
            position: Position::BottomCenter,
        }
    }
}

/// Sink for user-visible notifications.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Writes notifications to the tracing log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        let position = notification.position.code();
        match notification.level {
            Level::Error => tracing::error!(title = %notification.title, position, "{}", notification.message),
            Level::Warning => tracing::warn!(title = %notification.title, position, "{}", notification.message),
            Level::Info | Level::Success => {
                tracing::info!(title = %notification.title, position, "{}", notification.message);
            }
        }
    }
}
