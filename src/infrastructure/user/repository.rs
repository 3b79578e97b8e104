//! Storage-backed user repository implementation

use async_trait::async_trait;
use std::sync::Arc;

use serde_json::json;

use crate::domain::storage::{DocumentFilter, Storage};
use crate::domain::team::TeamId;
use crate::domain::user::{Email, User, UserRepository};
use crate::domain::DomainError;

/// Storage-backed implementation of UserRepository
#[derive(Debug)]
pub struct StorageUserRepository {
    storage: Arc<dyn Storage<User>>,
}

impl StorageUserRepository {
    pub fn new(storage: Arc<dyn Storage<User>>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl UserRepository for StorageUserRepository {
    async fn get(&self, email: &Email) -> Result<Option<User>, DomainError> {
        self.storage.get(email).await
    }

    async fn update(&self, user: User) -> Result<User, DomainError> {
        self.storage.update(user).await
    }

    async fn exists(&self, email: &Email) -> Result<bool, DomainError> {
        self.storage.exists(email).await
    }

    async fn list_invited_to(&self, team_id: &TeamId) -> Result<Vec<User>, DomainError> {
        self.storage.find(&invited_to(team_id)).await
    }

    async fn count_invited_to(&self, team_id: &TeamId) -> Result<usize, DomainError> {
        self.storage.count_matching(&invited_to(team_id)).await
    }
}

fn invited_to(team_id: &TeamId) -> DocumentFilter {
    DocumentFilter::new(json!({
        "team_info": { "pending_invites": [{ "team_id": team_id.as_str() }] }
    }))
}
