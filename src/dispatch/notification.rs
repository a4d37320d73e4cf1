//! User-facing notifications.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use tokio::sync::mpsc;
use tracing::{error, info};

// ============================================================================
// NotificationLevel
// ============================================================================

/// Severity of a notification, mapped to toast styling by the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationLevel {
    /// Neutral information.
    Info,
    /// Positive outcome.
    Success,
    /// Failure reported by the server.
    Error,
}

// ============================================================================
// Notification
// ============================================================================

/// A toast-style notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Severity.
    pub level: NotificationLevel,
    /// Headline.
    pub title: String,
    /// Optional detail line.
    pub body: Option<String>,
}

impl Notification {
    /// Creates an info notification.
    #[inline]
    #[must_use]
    pub fn info(title: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            title: title.into(),
            body: None,
        }
    }

    /// Creates a success notification.
    #[inline]
    #[must_use]
    pub fn success(title: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            title: title.into(),
            body: None,
        }
    }

    /// Creates an error notification.
    #[inline]
    #[must_use]
    pub fn error(title: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            title: title.into(),
            body: None,
        }
    }

    /// Sets the detail line.
    #[inline]
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.body {
            Some(body) => write!(f, "{}: {}", self.title, body),
            None => f.write_str(&self.title),
        }
    }
}

// ============================================================================
// Notifier
// ============================================================================

/// Sink for built-in notifications.
pub trait Notifier: Send + Sync {
    /// Shows a notification to the user.
    fn notify(&self, notification: Notification);
}

impl<F> Notifier for F
where
    F: Fn(Notification) + Send + Sync,
{
    fn notify(&self, notification: Notification) {
        self(notification);
    }
}

/// Forwards notifications to a UI task; drops them once the receiver is gone.
impl Notifier for mpsc::UnboundedSender<Notification> {
    fn notify(&self, notification: Notification) {
        let _ = self.send(notification);
    }
}

/// Default sink: writes notifications to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Error => error!(%notification, "Notification"),
            NotificationLevel::Info | NotificationLevel::Success => {
                info!(%notification, "Notification")
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let plain = Notification::info("Connected");
        let detailed = Notification::info("New message from Alice").with_body("hi");

        assert_eq!(plain.to_string(), "Connected");
        assert_eq!(detailed.to_string(), "New message from Alice: hi");
    }

    #[test]
    fn test_channel_sink() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.notify(Notification::error("boom"));

        let received = rx.try_recv().expect("notification");
        assert_eq!(received.level, NotificationLevel::Error);
        assert_eq!(received.title, "boom");
    }

    #[test]
    fn test_closure_sink() {
        let seen = std::sync::Mutex::new(Vec::new());
        let sink = |n: Notification| seen.lock().expect("lock").push(n.title);

        sink.notify(Notification::info("Connected"));
        assert_eq!(*seen.lock().expect("lock"), vec!["Connected".to_string()]);
    }

    #[test]
    fn test_channel_sink_ignores_closed_receiver() {
        let (tx, rx) = mpsc::unbounded_channel::<Notification>();
        drop(rx);
        tx.notify(Notification::success("ignored"));
    }
}
