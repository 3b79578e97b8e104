//! User repository trait

use async_trait::async_trait;

use super::entity::{Email, User};
use crate::domain::team::TeamId;
use crate::domain::DomainError;

/// Repository for user documents
#[async_trait]
pub trait UserRepository: Send + Sync + std::fmt::Debug {
    /// Get a user by email
    async fn get(&self, email: &Email) -> Result<Option<User>, DomainError>;

    /// Replace an existing user document
    async fn update(&self, user: User) -> Result<User, DomainError>;

    /// Check if a user exists
    async fn exists(&self, email: &Email) -> Result<bool, DomainError>;

    /// Users holding a pending invite for the team
    async fn list_invited_to(&self, team_id: &TeamId) -> Result<Vec<User>, DomainError>;

    /// Number of users holding a pending invite for the team
    async fn count_invited_to(&self, team_id: &TeamId) -> Result<usize, DomainError> {
        Ok(self.list_invited_to(team_id).await?.len())
    }
}
