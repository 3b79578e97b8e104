//! Document store with a multi-document transaction scope

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::team::{Team, TeamId};
use crate::domain::user::User;
use crate::domain::DomainError;

use super::repository::Storage;

/// A single write inside a [`WriteBatch`]
#[derive(Debug, Clone)]
pub enum WriteOp {
    /// Insert a team that must not exist yet
    InsertTeam(Team),
    /// Replace a team that must already exist
    UpdateTeam(Team),
    /// Remove a team; removing a missing team is not an error
    DeleteTeam(TeamId),
    /// Replace a user that must already exist
    UpdateUser(User),
}

/// Ordered set of writes applied all-or-nothing by [`DocumentStore::commit`]
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_team(mut self, team: Team) -> Self {
        self.ops.push(WriteOp::InsertTeam(team));
        self
    }

    pub fn update_team(mut self, team: Team) -> Self {
        self.ops.push(WriteOp::UpdateTeam(team));
        self
    }

    pub fn delete_team(mut self, id: TeamId) -> Self {
        self.ops.push(WriteOp::DeleteTeam(id));
        self
    }

    pub fn update_user(mut self, user: User) -> Self {
        self.ops.push(WriteOp::UpdateUser(user));
        self
    }

    pub fn push(&mut self, op: WriteOp) {
        self.ops.push(op);
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// The backing document database: one collection per entity plus an atomic
/// commit for writes that must land together.
#[async_trait]
pub trait DocumentStore: Send + Sync + Debug {
    /// The users collection
    fn users(&self) -> Arc<dyn Storage<User>>;

    /// The teams collection
    fn teams(&self) -> Arc<dyn Storage<Team>>;

    /// Applies every op in the batch, or none of them
    async fn commit(&self, batch: WriteBatch) -> Result<(), DomainError>;

    /// Verifies the store is reachable
    async fn health_check(&self) -> Result<(), DomainError>;

    /// Releases connections; the store is unusable afterwards
    async fn close(&self);
}
