//! Storage factory for runtime backend selection

use std::sync::Arc;

use tracing::info;

use crate::domain::storage::DocumentStore;
use crate::domain::DomainError;

use super::handle::{DatabaseHandle, PostgresConfig};
use super::in_memory::InMemoryDocumentStore;
use super::postgres::PostgresDocumentStore;

/// Supported storage types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageType {
    /// In-memory storage (for testing/development)
    InMemory,
    /// PostgreSQL storage
    Postgres,
}

impl StorageType {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "memory" | "inmemory" | "in-memory" | "in_memory" => Some(Self::InMemory),
            "postgres" | "postgresql" | "pg" => Some(Self::Postgres),
            _ => None,
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone)]
pub enum StorageConfig {
    InMemory,
    Postgres(PostgresConfig),
}

impl StorageConfig {
    pub fn in_memory() -> Self {
        Self::InMemory
    }

    pub fn postgres(config: PostgresConfig) -> Self {
        Self::Postgres(config)
    }

    pub fn postgres_url(url: impl Into<String>) -> Self {
        Self::Postgres(PostgresConfig::new(url))
    }

    pub fn storage_type(&self) -> StorageType {
        match self {
            Self::InMemory => StorageType::InMemory,
            Self::Postgres(_) => StorageType::Postgres,
        }
    }
}

/// Factory for creating document stores
#[derive(Debug)]
pub struct StorageFactory;

impl StorageFactory {
    /// Creates the document store selected by the configuration; PostgreSQL
    /// stores are connected and have their tables created before returning
    pub async fn create_document_store(
        config: &StorageConfig,
    ) -> Result<Arc<dyn DocumentStore>, DomainError> {
        match config {
            StorageConfig::InMemory => {
                info!("Using in-memory document store");
                Ok(Arc::new(InMemoryDocumentStore::new()))
            }
            StorageConfig::Postgres(pg_config) => {
                info!("Using PostgreSQL document store");
                let db = Arc::new(DatabaseHandle::new(pg_config.clone()));
                db.connect().await?;

                let store = PostgresDocumentStore::new(db);
                store.ensure_tables().await?;
                Ok(Arc::new(store))
            }
        }
    }
}
