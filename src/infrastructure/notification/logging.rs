//! Notification dispatcher that only writes a log line

use tracing::info;

use crate::domain::notification::{NotificationDispatcher, NotificationEvent};

/// Used when no webhook is configured
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotificationDispatcher;

impl NotificationDispatcher for LogNotificationDispatcher {
    fn publish(&self, event: NotificationEvent) {
        match &event {
            NotificationEvent::RegistrationStatusChanged { email, from, to, at } => {
                info!(
                    event = event.kind(),
                    email = %email,
                    from = %from,
                    to = %to,
                    at = %at.to_rfc3339(),
                    "Notification"
                );
            }
        }
    }
}
