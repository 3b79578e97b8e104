//! In-memory document store

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::{Arc, RwLock, RwLockWriteGuard};

use async_trait::async_trait;

use crate::domain::storage::{
    DocumentFilter, DocumentStore, Storage, StorageEntity, StorageKey, WriteBatch, WriteOp,
};
use crate::domain::team::Team;
use crate::domain::user::User;
use crate::domain::DomainError;

type Collection<E> = HashMap<String, E>;

/// Thread-safe in-memory collection
///
/// Useful for testing and development. Data is lost when the process terminates.
#[derive(Debug)]
pub struct InMemoryStorage<E>
where
    E: StorageEntity,
{
    entities: RwLock<Collection<E>>,
}

impl<E> Default for InMemoryStorage<E>
where
    E: StorageEntity,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<E> InMemoryStorage<E>
where
    E: StorageEntity,
{
    /// Creates a new empty collection
    pub fn new() -> Self {
        Self {
            entities: RwLock::new(HashMap::new()),
        }
    }

    /// Creates a collection pre-populated with documents
    pub fn with_entities(entities: Vec<E>) -> Self {
        let map = entities
            .into_iter()
            .map(|entity| (entity.key().as_str().to_string(), entity))
            .collect();

        Self {
            entities: RwLock::new(map),
        }
    }

    fn read<T>(&self, f: impl FnOnce(&Collection<E>) -> T) -> Result<T, DomainError> {
        let entities = self.entities.read().map_err(|e| {
            DomainError::storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(f(&entities))
    }

    fn write_lock(&self) -> Result<RwLockWriteGuard<'_, Collection<E>>, DomainError> {
        self.entities.write().map_err(|e| {
            DomainError::storage(format!("Failed to acquire write lock: {}", e))
        })
    }
}

#[async_trait]
impl<E> Storage<E> for InMemoryStorage<E>
where
    E: StorageEntity + 'static,
{
    async fn get(&self, key: &E::Key) -> Result<Option<E>, DomainError> {
        self.read(|entities| entities.get(key.as_str()).cloned())
    }

    async fn list(&self) -> Result<Vec<E>, DomainError> {
        self.read(|entities| entities.values().cloned().collect())
    }

    async fn find(&self, filter: &DocumentFilter) -> Result<Vec<E>, DomainError> {
        self.read(|entities| {
            let mut matched = Vec::new();
            for entity in entities.values() {
                if filter.matches(&to_document(entity)?) {
                    matched.push(entity.clone());
                }
            }
            Ok::<_, DomainError>(matched)
        })?
    }

    async fn create(&self, entity: E) -> Result<E, DomainError> {
        let mut entities = self.write_lock()?;
        insert_new(&mut entities, entity.clone())?;
        Ok(entity)
    }

    async fn update(&self, entity: E) -> Result<E, DomainError> {
        let mut entities = self.write_lock()?;
        replace_existing(&mut entities, entity.clone())?;
        Ok(entity)
    }

    async fn delete(&self, key: &E::Key) -> Result<bool, DomainError> {
        let mut entities = self.write_lock()?;
        Ok(entities.remove(key.as_str()).is_some())
    }

    async fn count(&self) -> Result<usize, DomainError> {
        self.read(|entities| entities.len())
    }

    async fn exists(&self, key: &E::Key) -> Result<bool, DomainError> {
        self.read(|entities| entities.contains_key(key.as_str()))
    }
}

fn to_document<E: StorageEntity>(entity: &E) -> Result<serde_json::Value, DomainError> {
    serde_json::to_value(entity)
        .map_err(|e| DomainError::storage(format!("Failed to serialize document: {}", e)))
}

fn insert_new<E: StorageEntity>(entities: &mut Collection<E>, entity: E) -> Result<(), DomainError> {
    let key = entity.key().as_str().to_string();

    if entities.contains_key(&key) {
        return Err(DomainError::conflict(format!(
            "Document '{}' already exists in {}",
            key,
            E::COLLECTION
        )));
    }

    entities.insert(key, entity);
    Ok(())
}

fn replace_existing<E: StorageEntity>(
    entities: &mut Collection<E>,
    entity: E,
) -> Result<(), DomainError> {
    let key = entity.key().as_str().to_string();

    if !entities.contains_key(&key) {
        return Err(DomainError::not_found(format!(
            "Document '{}' not found in {}",
            key,
            E::COLLECTION
        )));
    }

    entities.insert(key, entity);
    Ok(())
}

/// Users and teams held in memory, with batches applied under both write
/// locks so readers never observe a half-applied batch
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    users: Arc<InMemoryStorage<User>>,
    teams: Arc<InMemoryStorage<Team>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with user accounts
    pub fn with_users(users: Vec<User>) -> Self {
        Self {
            users: Arc::new(InMemoryStorage::with_entities(users)),
            teams: Arc::new(InMemoryStorage::new()),
        }
    }

    fn apply(&self, batch: WriteBatch) -> Result<(), DomainError> {
        // Lock order: teams, then users
        let mut teams = self.teams.write_lock()?;
        let mut users = self.users.write_lock()?;

        let mut staged_teams = teams.clone();
        let mut staged_users = users.clone();

        for op in batch.into_ops() {
            match op {
                WriteOp::InsertTeam(team) => insert_new(&mut staged_teams, team)?,
                WriteOp::UpdateTeam(team) => replace_existing(&mut staged_teams, team)?,
                WriteOp::DeleteTeam(id) => {
                    staged_teams.remove(id.as_str());
                }
                WriteOp::UpdateUser(user) => replace_existing(&mut staged_users, user)?,
            }
        }

        *teams = staged_teams;
        *users = staged_users;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    fn users(&self) -> Arc<dyn Storage<User>> {
        self.users.clone()
    }

    fn teams(&self) -> Arc<dyn Storage<Team>> {
        self.teams.clone()
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), DomainError> {
        self.apply(batch)
    }

    async fn health_check(&self) -> Result<(), DomainError> {
        self.teams.count().await.map(|_| ())
    }

    async fn close(&self) {}
}
