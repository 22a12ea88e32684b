// ── User activity log and notifications ──
//
// Two outbound channels from the controller. `ActivityLog` records what
// the user did and how it went; `Notifier` carries the subset that the
// presentation layer must surface (blocking alerts, passing toasts).

use std::sync::Arc;

use strum::{Display, IntoStaticStr};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::error::CoreError;

/// Tracing target for activity entries.
pub const ACTIVITY_TARGET: &str = "ssedge::activity";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Display, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// Sink for intent-level log lines ("Fetching devices from backend").
///
/// Injected into the controller rather than reached through a global.
pub trait ActivityLog: Send + Sync {
    fn log(&self, level: LogLevel, message: &str);

    fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, message);
    }

    fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }
}

/// Forwards activity to `tracing` under [`ACTIVITY_TARGET`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingActivityLog;

impl ActivityLog for TracingActivityLog {
    fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Debug => debug!(target: ACTIVITY_TARGET, "{message}"),
            LogLevel::Info => info!(target: ACTIVITY_TARGET, "{message}"),
            LogLevel::Warn => warn!(target: ACTIVITY_TARGET, "{message}"),
            LogLevel::Error => error!(target: ACTIVITY_TARGET, "{message}"),
        }
    }
}

impl<T: ActivityLog + ?Sized> ActivityLog for Arc<T> {
    fn log(&self, level: LogLevel, message: &str) {
        (**self).log(level, message);
    }
}

// ── Notifications ────────────────────────────────────────────────────

/// How the presentation layer should show a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Presentation {
    /// Blocking; needs acknowledgement.
    Alert,
    /// Passing; dismisses itself.
    Toast,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub level: NotificationLevel,
    pub presentation: Presentation,
    pub error: Option<CoreError>,
}

impl Notification {
    pub fn alert(error: CoreError) -> Self {
        Self {
            message: error.to_string(),
            level: NotificationLevel::Error,
            presentation: Presentation::Alert,
            error: Some(error),
        }
    }

    pub fn toast(level: NotificationLevel, error: CoreError) -> Self {
        Self {
            message: error.to_string(),
            level,
            presentation: Presentation::Toast,
            error: Some(error),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            level: NotificationLevel::Success,
            presentation: Presentation::Toast,
            error: None,
        }
    }
}

/// Fan-out of notifications to any number of subscribers.
///
/// Sending with no subscriber is not an error; the notification is dropped.
#[derive(Debug, Clone)]
pub(crate) struct Notifier {
    tx: broadcast::Sender<Arc<Notification>>,
}

impl Notifier {
    pub(crate) fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub(crate) fn send(&self, notification: Notification) {
        let _ = self.tx.send(Arc::new(notification));
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<Arc<Notification>> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DeviceId;

    #[test]
    fn alert_carries_error_text() {
        let n = Notification::alert(CoreError::NotFound { id: DeviceId(4) });
        assert_eq!(n.message, "Device not found: 4");
        assert_eq!(n.presentation, Presentation::Alert);
        assert_eq!(n.level, NotificationLevel::Error);
    }

    #[tokio::test]
    async fn notifier_fans_out() {
        let notifier = Notifier::new(8);
        let mut a = notifier.subscribe();
        let mut b = notifier.subscribe();
        notifier.send(Notification::success("Device added"));

        assert_eq!(a.recv().await.map(|n| n.message.clone()).ok(), Some("Device added".into()));
        assert_eq!(b.recv().await.map(|n| n.level).ok(), Some(NotificationLevel::Success));
    }

    #[test]
    fn send_without_subscribers_is_dropped() {
        Notifier::new(1).send(Notification::success("nobody listens"));
    }

    #[test]
    fn log_level_names() {
        assert_eq!(LogLevel::Warn.to_string(), "warn");
        let name: &'static str = LogLevel::Error.into();
        assert_eq!(name, "error");
    }
}
