//! PostgreSQL document store
//!
//! Each collection is a table of `(key, data JSONB, created_at, updated_at)`.

use std::fmt::Debug;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::Postgres;
use sqlx::{Executor, Row};

use super::handle::DatabaseHandle;
use crate::domain::storage::{
    DocumentFilter, DocumentStore, Storage, StorageEntity, StorageKey, WriteBatch, WriteOp,
};
use crate::domain::team::Team;
use crate::domain::user::User;
use crate::domain::DomainError;

/// One collection backed by a JSONB table named after `E::COLLECTION`
pub struct PostgresStorage<E>
where
    E: StorageEntity,
{
    db: Arc<DatabaseHandle>,
    _phantom: PhantomData<E>,
}

impl<E> Debug for PostgresStorage<E>
where
    E: StorageEntity,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresStorage")
            .field("table_name", &E::COLLECTION)
            .finish()
    }
}

impl<E> PostgresStorage<E>
where
    E: StorageEntity,
{
    pub fn new(db: Arc<DatabaseHandle>) -> Self {
        Self {
            db,
            _phantom: PhantomData,
        }
    }

    /// Ensures the collection table exists
    pub async fn ensure_table(&self) -> Result<(), DomainError> {
        let query = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                key VARCHAR(255) PRIMARY KEY,
                data JSONB NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
            E::COLLECTION
        );

        sqlx::query(&query)
            .execute(self.db.connect().await?)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to create table: {}", e)))?;

        Ok(())
    }
}

#[async_trait]
impl<E> Storage<E> for PostgresStorage<E>
where
    E: StorageEntity + 'static,
{
    async fn get(&self, key: &E::Key) -> Result<Option<E>, DomainError> {
        let query = format!("SELECT data FROM {} WHERE key = $1", E::COLLECTION);

        let row = sqlx::query(&query)
            .bind(key.as_str())
            .fetch_optional(self.db.connect().await?)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get document: {}", e)))?;

        row.map(|row| decode::<E>(row.get("data"))).transpose()
    }

    async fn list(&self) -> Result<Vec<E>, DomainError> {
        let query = format!("SELECT data FROM {} ORDER BY created_at", E::COLLECTION);

        let rows = sqlx::query(&query)
            .fetch_all(self.db.connect().await?)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to list documents: {}", e)))?;

        rows.into_iter()
            .map(|row| decode::<E>(row.get("data")))
            .collect()
    }

    async fn find(&self, filter: &DocumentFilter) -> Result<Vec<E>, DomainError> {
        let query = format!(
            "SELECT data FROM {} WHERE data @> $1 ORDER BY created_at",
            E::COLLECTION
        );

        let rows = sqlx::query(&query)
            .bind(filter.pattern())
            .fetch_all(self.db.connect().await?)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to query documents: {}", e)))?;

        rows.into_iter()
            .map(|row| decode::<E>(row.get("data")))
            .collect()
    }

    async fn count_matching(&self, filter: &DocumentFilter) -> Result<usize, DomainError> {
        let query = format!(
            "SELECT COUNT(*) as count FROM {} WHERE data @> $1",
            E::COLLECTION
        );

        let row = sqlx::query(&query)
            .bind(filter.pattern())
            .fetch_one(self.db.connect().await?)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to count documents: {}", e)))?;

        let count: i64 = row.get("count");
        Ok(count as usize)
    }

    async fn create(&self, entity: E) -> Result<E, DomainError> {
        insert_document(self.db.connect().await?, &entity).await?;
        Ok(entity)
    }

    async fn update(&self, entity: E) -> Result<E, DomainError> {
        update_document(self.db.connect().await?, &entity).await?;
        Ok(entity)
    }

    async fn delete(&self, key: &E::Key) -> Result<bool, DomainError> {
        delete_document::<E, _>(self.db.connect().await?, key).await
    }

    async fn count(&self) -> Result<usize, DomainError> {
        let query = format!("SELECT COUNT(*) as count FROM {}", E::COLLECTION);

        let row = sqlx::query(&query)
            .fetch_one(self.db.connect().await?)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to count documents: {}", e)))?;

        let count: i64 = row.get("count");
        Ok(count as usize)
    }

    async fn exists(&self, key: &E::Key) -> Result<bool, DomainError> {
        let query = format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE key = $1) as exists",
            E::COLLECTION
        );

        let row = sqlx::query(&query)
            .bind(key.as_str())
            .fetch_one(self.db.connect().await?)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to check existence: {}", e)))?;

        Ok(row.get("exists"))
    }
}

fn encode<E: StorageEntity>(entity: &E) -> Result<serde_json::Value, DomainError> {
    serde_json::to_value(entity)
        .map_err(|e| DomainError::storage(format!("Failed to serialize document: {}", e)))
}

fn decode<E: StorageEntity>(data: serde_json::Value) -> Result<E, DomainError> {
    serde_json::from_value(data)
        .map_err(|e| DomainError::storage(format!("Failed to deserialize document: {}", e)))
}

async fn insert_document<'e, E, X>(executor: X, entity: &E) -> Result<(), DomainError>
where
    E: StorageEntity,
    X: Executor<'e, Database = Postgres>,
{
    let key = entity.key().as_str().to_string();
    let data = encode(entity)?;
    let query = format!("INSERT INTO {} (key, data) VALUES ($1, $2)", E::COLLECTION);

    sqlx::query(&query)
        .bind(&key)
        .bind(&data)
        .execute(executor)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => DomainError::conflict(
                format!("Document '{}' already exists in {}", key, E::COLLECTION),
            ),
            _ => DomainError::storage(format!("Failed to insert document: {}", e)),
        })?;

    Ok(())
}

async fn update_document<'e, E, X>(executor: X, entity: &E) -> Result<(), DomainError>
where
    E: StorageEntity,
    X: Executor<'e, Database = Postgres>,
{
    let key = entity.key().as_str().to_string();
    let data = encode(entity)?;
    let query = format!(
        "UPDATE {} SET data = $2, updated_at = NOW() WHERE key = $1",
        E::COLLECTION
    );

    let result = sqlx::query(&query)
        .bind(&key)
        .bind(&data)
        .execute(executor)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to update document: {}", e)))?;

    if result.rows_affected() == 0 {
        return Err(DomainError::not_found(format!(
            "Document '{}' not found in {}",
            key,
            E::COLLECTION
        )));
    }

    Ok(())
}

async fn delete_document<'e, E, X>(executor: X, key: &E::Key) -> Result<bool, DomainError>
where
    E: StorageEntity,
    X: Executor<'e, Database = Postgres>,
{
    let query = format!("DELETE FROM {} WHERE key = $1", E::COLLECTION);

    let result = sqlx::query(&query)
        .bind(key.as_str())
        .execute(executor)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to delete document: {}", e)))?;

    Ok(result.rows_affected() > 0)
}

/// Users and teams in PostgreSQL; batches run inside one transaction
#[derive(Debug)]
pub struct PostgresDocumentStore {
    db: Arc<DatabaseHandle>,
    users: Arc<PostgresStorage<User>>,
    teams: Arc<PostgresStorage<Team>>,
}

impl PostgresDocumentStore {
    pub fn new(db: Arc<DatabaseHandle>) -> Self {
        Self {
            users: Arc::new(PostgresStorage::new(db.clone())),
            teams: Arc::new(PostgresStorage::new(db.clone())),
            db,
        }
    }

    /// Connects and creates both collection tables
    pub async fn ensure_tables(&self) -> Result<(), DomainError> {
        self.users.ensure_table().await?;
        self.teams.ensure_table().await
    }
}

#[async_trait]
impl DocumentStore for PostgresDocumentStore {
    fn users(&self) -> Arc<dyn Storage<User>> {
        self.users.clone()
    }

    fn teams(&self) -> Arc<dyn Storage<Team>> {
        self.teams.clone()
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), DomainError> {
        let pool = self.db.connect().await?;
        let mut tx = pool
            .begin()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to begin transaction: {}", e)))?;

        // Returning early drops `tx`, which rolls the transaction back
        for op in batch.into_ops() {
            match op {
                WriteOp::InsertTeam(team) => insert_document(&mut *tx, &team).await?,
                WriteOp::UpdateTeam(team) => update_document(&mut *tx, &team).await?,
                WriteOp::DeleteTeam(id) => {
                    delete_document::<Team, _>(&mut *tx, &id).await?;
                }
                WriteOp::UpdateUser(user) => update_document(&mut *tx, &user).await?,
            }
        }

        tx.commit()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to commit transaction: {}", e)))
    }

    async fn health_check(&self) -> Result<(), DomainError> {
        self.db.health_check().await
    }

    async fn close(&self) {
        self.db.close().await;
    }
}
