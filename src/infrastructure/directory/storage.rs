//! Account directory backed by the users collection

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::domain::directory::AccountDirectory;
use crate::domain::storage::Storage;
use crate::domain::user::{Email, User};

#[derive(Debug)]
pub struct StoreAccountDirectory {
    users: Arc<dyn Storage<User>>,
}

impl StoreAccountDirectory {
    pub fn new(users: Arc<dyn Storage<User>>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl AccountDirectory for StoreAccountDirectory {
    async fn exists(&self, email: &Email) -> bool {
        self.users.exists(email).await.unwrap_or_else(|e| {
            warn!(email = %email, error = %e, "Account lookup failed");
            false
        })
    }
}
