//! User-visible notifications.
//!
//! Views never print or raise: every outcome the user should see becomes a [`Notification`]
//! queued on the view, and the surface (REST response, CLI output) drains and renders them.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Success,
    Error,
}

/// A titled message with a free-text description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub kind: NotificationKind,
}

impl Notification {
    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(NotificationKind::Info, title, description)
    }

    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(NotificationKind::Success, title, description)
    }

    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(NotificationKind::Error, title, description)
    }

    fn new(kind: NotificationKind, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            kind,
        }
    }
}

impl std::fmt::Display for Notification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.title, self.description)
    }
}

/// Queue of notifications raised by one view.
#[derive(Debug, Default, Clone)]
pub struct Notifications(Vec<Notification>);

impl Notifications {
    pub fn push(&mut self, notification: Notification) {
        match notification.kind {
            NotificationKind::Error => tracing::warn!("{notification}"),
            _ => tracing::info!("{notification}"),
        }
        self.0.push(notification);
    }

    /// Removes and returns everything queued so far.
    pub fn take(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.0)
    }

    pub fn pending(&self) -> &[Notification] {
        &self.0
    }
}
