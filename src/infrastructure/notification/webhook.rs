//! Webhook delivery of notification events

use std::time::Duration;

use hmac::{Hmac, Mac};
use reqwest::Client;
use sha2::Sha256;
use tracing::{debug, warn};

use crate::domain::notification::{NotificationDispatcher, NotificationEvent};
use crate::domain::DomainError;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying `sha256=<hex hmac>` of the request body
pub const SIGNATURE_HEADER: &str = "X-Signature";

/// POSTs each event as JSON on a background task; failures are logged and
/// never retried
#[derive(Debug, Clone)]
pub struct WebhookNotificationDispatcher {
    client: Client,
    url: String,
    secret: Option<String>,
}

impl WebhookNotificationDispatcher {
    pub fn new(
        url: impl Into<String>,
        secret: Option<String>,
        timeout: Duration,
    ) -> Result<Self, DomainError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: url.into(),
            secret,
        })
    }

    /// Generates HMAC-SHA256 signature for a payload
    fn generate_signature(secret: &str, payload: &str) -> Option<String> {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
        mac.update(payload.as_bytes());
        Some(hex::encode(mac.finalize().into_bytes()))
    }

    async fn deliver(self, kind: &'static str, payload: String) {
        let mut request = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .header("X-Event-Type", kind);

        if let Some(signature) = self
            .secret
            .as_deref()
            .and_then(|secret| Self::generate_signature(secret, &payload))
        {
            request = request.header(SIGNATURE_HEADER, format!("sha256={}", signature));
        }

        match request.body(payload).send().await {
            Ok(response) if response.status().is_success() => {
                debug!(event = kind, status = response.status().as_u16(), "Notification delivered");
            }
            Ok(response) => {
                warn!(event = kind, status = response.status().as_u16(), "Notification rejected by webhook");
            }
            Err(e) => {
                let error_msg = if e.is_timeout() {
                    "Request timed out".to_string()
                } else if e.is_connect() {
                    "Connection failed".to_string()
                } else {
                    format!("Request failed: {}", e)
                };

                warn!(event = kind, error = %error_msg, "Notification delivery failed");
            }
        }
    }
}

impl NotificationDispatcher for WebhookNotificationDispatcher {
    fn publish(&self, event: NotificationEvent) {
        let payload = match serde_json::to_string(&event) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(event = event.kind(), error = %e, "Failed to serialize notification");
                return;
            }
        };

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(event = event.kind(), "No async runtime, dropping notification");
            return;
        };

        runtime.spawn(self.clone().deliver(event.kind(), payload));
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use wiremock::matchers::{header, header_exists, method, path};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    use super::*;
    use crate::domain::registration::RegistrationStatus;
    use crate::domain::user::Email;

    fn event() -> NotificationEvent {
        NotificationEvent::RegistrationStatusChanged {
            email: Email::parse("ada@example.com").unwrap(),
            from: RegistrationStatus::Registered,
            to: RegistrationStatus::Waitlist,
            at: Utc::now(),
        }
    }

    async fn wait_for_requests(server: &MockServer, count: usize) -> Vec<Request> {
        for _ in 0..100 {
            let received = server.received_requests().await.unwrap_or_default();
            if received.len() >= count {
                return received;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("expected {} webhook requests", count);
    }

    #[test]
    fn test_generate_signature() {
        let first = WebhookNotificationDispatcher::generate_signature("secret", "{}").unwrap();
        let second = WebhookNotificationDispatcher::generate_signature("secret", "{}").unwrap();
        let other = WebhookNotificationDispatcher::generate_signature("other", "{}").unwrap();

        assert_eq!(first, second);
        assert_ne!(first, other);
        assert_eq!(first.len(), 64);
    }

    #[tokio::test]
    async fn test_publish_posts_signed_event() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hooks/registration"))
            .and(header("X-Event-Type", "registration_status_changed"))
            .and(header_exists(SIGNATURE_HEADER))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let dispatcher = WebhookNotificationDispatcher::new(
            format!("{}/hooks/registration", server.uri()),
            Some("shh".to_string()),
            Duration::from_secs(5),
        )
        .unwrap();

        dispatcher.publish(event());

        let requests = wait_for_requests(&server, 1).await;
        let body = String::from_utf8(requests[0].body.clone()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["type"], "registration_status_changed");
        assert_eq!(json["to"], "waitlist");

        let expected = format!(
            "sha256={}",
            WebhookNotificationDispatcher::generate_signature("shh", &body).unwrap()
        );
        let signature = requests[0].headers.get(SIGNATURE_HEADER).unwrap();
        assert_eq!(signature.to_str().unwrap(), expected);
    }

    #[tokio::test]
    async fn test_publish_without_secret_is_unsigned() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let dispatcher =
            WebhookNotificationDispatcher::new(server.uri(), None, Duration::from_secs(5)).unwrap();
        dispatcher.publish(event());

        let requests = wait_for_requests(&server, 1).await;
        assert!(requests[0].headers.get(SIGNATURE_HEADER).is_none());
    }

    #[tokio::test]
    async fn test_delivery_failure_does_not_reach_caller() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let dispatcher =
            WebhookNotificationDispatcher::new(server.uri(), None, Duration::from_secs(5)).unwrap();

        // Returns immediately whatever the webhook answers
        dispatcher.publish(event());
        dispatcher.publish(event());

        assert_eq!(wait_for_requests(&server, 2).await.len(), 2);
    }
}
