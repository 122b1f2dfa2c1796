use std::time::{Duration, Instant};

/// Type of notification to display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationType {
    Info,
    Warning,
    Error,
}

impl NotificationType {
    fn timeout(&self) -> Duration {
        match self {
            NotificationType::Info => Duration::from_secs(3),
            NotificationType::Warning => Duration::from_secs(5),
            NotificationType::Error => Duration::from_secs(10),
        }
    }
}

/// A notification message. Toasts auto-dismiss after a per-type timeout;
/// alerts stay on screen until the user acknowledges them.
#[derive(Debug, Clone)]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub notification_type: NotificationType,
    pub requires_ack: bool,
    pub timestamp: Instant,
}

impl Notification {
    /// Info toast, auto-dismissed after 3s
    pub fn info(message: impl Into<String>) -> Self {
        Self::new("Info", message, NotificationType::Info, false)
    }

    /// Warning toast, auto-dismissed after 5s
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new("Warning", message, NotificationType::Warning, false)
    }

    /// Error toast, auto-dismissed after 10s
    pub fn error(message: impl Into<String>) -> Self {
        Self::new("Error", message, NotificationType::Error, false)
    }

    /// Info alert that waits for acknowledgement
    pub fn alert(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(title, message, NotificationType::Info, true)
    }

    /// Error alert that waits for acknowledgement
    pub fn error_alert(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(title, message, NotificationType::Error, true)
    }

    fn new(
        title: impl Into<String>,
        message: impl Into<String>,
        notification_type: NotificationType,
        requires_ack: bool,
    ) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            notification_type,
            requires_ack,
            timestamp: Instant::now(),
        }
    }

    /// Check if this notification should be auto-dismissed
    pub fn should_dismiss(&self) -> bool {
        !self.requires_ack && self.timestamp.elapsed() > self.notification_type.timeout()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the remaining time before auto-dismiss
    pub fn remaining_time(&self) -> Option<Duration> {
        match self.requires_ack {
            true => None,
            false => Some(
                self.notification_type
                    .timeout()
                    .saturating_sub(self.timestamp.elapsed()),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alerts_never_auto_dismiss() {
        let mut alert = Notification::error_alert("Collection failed", "RATE_LIMITED");
        alert.timestamp = Instant::now() - Duration::from_secs(60);
        assert!(!alert.should_dismiss());
        assert_eq!(alert.remaining_time(), None);
    }

    #[test]
    fn toasts_expire_after_timeout() {
        let mut toast = Notification::info("Filters cleared");
        assert!(!toast.should_dismiss());
        toast.timestamp = Instant::now() - Duration::from_secs(4);
        assert!(toast.should_dismiss());
        assert_eq!(toast.message(), "Filters cleared");
    }
}
