//! Caller authentication collaborator

use async_trait::async_trait;

use crate::domain::user::Email;

#[cfg(test)]
use mockall::automock;

/// Verifies a bearer credential against the identity the caller claims
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CredentialVerifier: Send + Sync + std::fmt::Debug {
    /// True only if `token` is valid and was issued to `claimed`
    async fn verify(&self, token: &str, claimed: &Email) -> bool;
}
