//! Account directory backed by a remote accounts service

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use tracing::{debug, warn};

use crate::domain::directory::AccountDirectory;
use crate::domain::user::Email;
use crate::domain::DomainError;

/// Looks accounts up with `GET {base_url}/users/{email}`
///
/// A 2xx answer means the account exists; anything else, including a
/// transport error, is treated as "does not exist".
#[derive(Debug, Clone)]
pub struct HttpAccountDirectory {
    client: Client,
    base_url: Url,
}

impl HttpAccountDirectory {
    pub fn new(base_url: impl AsRef<str>, timeout: Duration) -> Result<Self, DomainError> {
        let base_url = Url::parse(base_url.as_ref())
            .map_err(|e| DomainError::validation(format!("Invalid directory base URL: {}", e)))?;
        if base_url.cannot_be_a_base() {
            return Err(DomainError::validation("Directory base URL must be an http(s) URL"));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, base_url })
    }

    /// The email is pushed as one encoded segment so `/`, `?` or `#` in the
    /// local part cannot address another resource
    fn user_url(&self, email: &Email) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("users").push(email.as_str());
        }
        url
    }
}

#[async_trait]
impl AccountDirectory for HttpAccountDirectory {
    async fn exists(&self, email: &Email) -> bool {
        match self.client.get(self.user_url(email)).send().await {
            Ok(response) if response.status().is_success() => true,
            Ok(response) if response.status() == StatusCode::NOT_FOUND => {
                debug!(email = %email, "Account not found");
                false
            }
            Ok(response) => {
                warn!(email = %email, status = response.status().as_u16(), "Account lookup returned an error");
                false
            }
            Err(e) => {
                warn!(email = %email, error = %e, "Account lookup failed");
                false
            }
        }
    }
}
