//! Generic collection trait

use std::fmt::Debug;

use async_trait::async_trait;

use crate::domain::DomainError;

use super::entity::StorageEntity;
use super::filter::DocumentFilter;

/// Single-document operations on one collection. Each call is atomic for
/// the document it touches; nothing here spans documents.
#[async_trait]
pub trait Storage<E>: Send + Sync + Debug
where
    E: StorageEntity + 'static,
{
    /// Retrieves a document by its key
    async fn get(&self, key: &E::Key) -> Result<Option<E>, DomainError>;

    /// Retrieves every document in the collection
    async fn list(&self) -> Result<Vec<E>, DomainError>;

    /// Inserts a new document, returns a conflict if the key is taken
    async fn create(&self, entity: E) -> Result<E, DomainError>;

    /// Replaces an existing document, returns not-found if the key is absent
    async fn update(&self, entity: E) -> Result<E, DomainError>;

    /// Deletes a document by its key, returns true if it existed
    async fn delete(&self, key: &E::Key) -> Result<bool, DomainError>;

    /// Checks if a document exists by its key
    async fn exists(&self, key: &E::Key) -> Result<bool, DomainError> {
        Ok(self.get(key).await?.is_some())
    }

    /// Returns the number of documents
    async fn count(&self) -> Result<usize, DomainError> {
        Ok(self.list().await?.len())
    }

    /// Documents containing the filter pattern; only matches are decoded
    async fn find(&self, filter: &DocumentFilter) -> Result<Vec<E>, DomainError>;

    /// Number of documents containing the filter pattern
    async fn count_matching(&self, filter: &DocumentFilter) -> Result<usize, DomainError> {
        Ok(self.find(filter).await?.len())
    }
}
