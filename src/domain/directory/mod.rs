//! Account existence collaborator

use async_trait::async_trait;

use crate::domain::user::Email;

#[cfg(test)]
use mockall::automock;

/// Confirms whether an email belongs to a registered account
///
/// Implementations treat lookup failures as "does not exist".
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AccountDirectory: Send + Sync + std::fmt::Debug {
    async fn exists(&self, email: &Email) -> bool;
}
