//! Notification dispatcher implementations

mod logging;
mod webhook;

pub use logging::LogNotificationDispatcher;
pub use webhook::{WebhookNotificationDispatcher, SIGNATURE_HEADER};
