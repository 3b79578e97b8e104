//! Team repository trait

use async_trait::async_trait;

use super::entity::{Team, TeamId, TeamStatus};
use crate::domain::DomainError;

/// Query parameters for listing teams
#[derive(Debug, Clone, Default)]
pub struct TeamQuery {
    /// Filter by status
    pub status: Option<TeamStatus>,
    /// Maximum number of results
    pub limit: Option<usize>,
    /// Offset for pagination
    pub offset: Option<usize>,
}

impl TeamQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: TeamStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn matches(&self, team: &Team) -> bool {
        self.status.is_none_or(|status| team.status() == status)
    }

    /// Filter, order oldest first, then page
    pub fn apply(&self, teams: impl IntoIterator<Item = Team>) -> Vec<Team> {
        let mut result: Vec<Team> = teams.into_iter().filter(|team| self.matches(team)).collect();
        result.sort_by_key(|team| team.created());

        result
            .into_iter()
            .skip(self.offset.unwrap_or(0))
            .take(self.limit.unwrap_or(usize::MAX))
            .collect()
    }
}

/// Repository for team documents
#[async_trait]
pub trait TeamRepository: Send + Sync + std::fmt::Debug {
    /// Get a team by ID
    async fn get(&self, id: &TeamId) -> Result<Option<Team>, DomainError>;

    /// Replace an existing team document
    async fn update(&self, team: Team) -> Result<Team, DomainError>;

    /// List teams
    async fn list(&self, query: &TeamQuery) -> Result<Vec<Team>, DomainError>;
}
