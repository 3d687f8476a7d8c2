//! Presentation surfaces.
//!
//! A surface shows a freshly pushed notification to the user outside the
//! list view, e.g. an OS notification or a toast. Presentation is fire and
//! forget: each surface runs on its own task and a failure is only logged.

use std::sync::Arc;

use async_trait::async_trait;
use herald_core::data::{Notification, NotificationType};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Error raised by a surface.
#[derive(Debug, Clone, Error)]
pub enum SurfaceError {
    /// The surface could not show the notification.
    #[error("[Surface] {surface}: {reason}")]
    Unavailable {
        /// Surface name.
        surface: String,
        /// Failure reason.
        reason: String,
    },
}

/// Somewhere a pushed notification can be shown.
#[async_trait]
pub trait NotificationSurface: Send + Sync {
    /// Returns the surface name.
    fn name(&self) -> &str;

    /// Shows one notification.
    ///
    /// # Errors
    ///
    /// Returns an error if the surface cannot show it.
    async fn present(&self, notification: &Notification) -> Result<(), SurfaceError>;
}

/// Presents `notification` on every surface without waiting.
///
/// Must be called inside a Tokio runtime.
pub fn present_all(surfaces: &[Arc<dyn NotificationSurface>], notification: &Notification) {
    for surface in surfaces {
        let surface = Arc::clone(surface);
        let notification = notification.clone();
        tokio::spawn(async move {
            if let Err(e) = surface.present(&notification).await {
                warn!(
                    surface = surface.name(),
                    id = %notification.id,
                    error = %e,
                    "Presentation failed"
                );
            }
        });
    }
}

/// Writes notifications to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSurface;

#[async_trait]
impl NotificationSurface for LogSurface {
    fn name(&self) -> &str {
        "log"
    }

    async fn present(&self, n: &Notification) -> Result<(), SurfaceError> {
        match n.notification_type {
            NotificationType::Error => error!(id = %n.id, title = %n.title, message = %n.message, "Notification"),
            NotificationType::Warning => warn!(id = %n.id, title = %n.title, message = %n.message, "Notification"),
            NotificationType::Info | NotificationType::Success => {
                info!(id = %n.id, kind = %n.notification_type, title = %n.title, message = %n.message, "Notification");
            }
        }
        Ok(())
    }
}

/// Forwards notifications into an mpsc channel.
#[derive(Debug, Clone)]
pub struct ChannelSurface {
    name: String,
    sender: mpsc::Sender<Notification>,
}

impl ChannelSurface {
    /// Creates a surface over an existing sender.
    #[must_use]
    pub fn new(name: impl Into<String>, sender: mpsc::Sender<Notification>) -> Self {
        Self {
            name: name.into(),
            sender,
        }
    }

    /// Creates a surface and the receiving end of its channel.
    #[must_use]
    pub fn with_channel(
        name: impl Into<String>,
        capacity: usize,
    ) -> (Self, mpsc::Receiver<Notification>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (Self::new(name, sender), receiver)
    }
}

#[async_trait]
impl NotificationSurface for ChannelSurface {
    fn name(&self) -> &str {
        &self.name
    }

    async fn present(&self, notification: &Notification) -> Result<(), SurfaceError> {
        self.sender
            .send(notification.clone())
            .await
            .map_err(|e| SurfaceError::Unavailable {
                surface: self.name.clone(),
                reason: e.to_string(),
            })?;
        debug!(surface = %self.name, id = %notification.id, "Notification forwarded");
        Ok(())
    }
}
