//! Outbound notifications

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::registration::RegistrationStatus;
use crate::domain::user::Email;

#[cfg(test)]
use mockall::automock;

/// Something worth telling the participant about
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationEvent {
    RegistrationStatusChanged {
        email: Email,
        from: RegistrationStatus,
        to: RegistrationStatus,
        at: DateTime<Utc>,
    },
}

impl NotificationEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RegistrationStatusChanged { .. } => "registration_status_changed",
        }
    }

    pub fn recipient(&self) -> &Email {
        match self {
            Self::RegistrationStatusChanged { email, .. } => email,
        }
    }
}

/// Fire-and-forget delivery; `publish` returns immediately and delivery
/// failures never reach the caller
#[cfg_attr(test, automock)]
pub trait NotificationDispatcher: Send + Sync + std::fmt::Debug {
    fn publish(&self, event: NotificationEvent);
}
