//! Team entity and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validation::{validate_team_id, validate_team_name, TeamValidationError};
use crate::domain::storage::{StorageEntity, StorageKey};
use crate::domain::user::Email;

/// Maximum team size, leader included
pub const MAX_TEAM_SIZE: usize = 4;

/// Team identifier, generated as a UUID on creation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TeamId(String);

impl TeamId {
    /// Create a TeamId from an existing value after validation
    pub fn new(id: impl Into<String>) -> Result<Self, TeamValidationError> {
        let id = id.into();
        validate_team_id(&id)?;
        Ok(Self(id))
    }

    /// Generate a fresh identifier
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TeamId {
    type Error = TeamValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TeamId> for String {
    fn from(id: TeamId) -> Self {
        id.0
    }
}

impl std::fmt::Display for TeamId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl StorageKey for TeamId {
    fn as_str(&self) -> &str {
        &self.0
    }
}

/// Status of a team
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TeamStatus {
    #[default]
    Active,
    /// Terminal
    Disbanded,
}

impl TeamStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// Legal moves of the team state machine
    pub fn successors(&self) -> &'static [TeamStatus] {
        match self {
            Self::Active => &[Self::Disbanded],
            Self::Disbanded => &[],
        }
    }

    pub fn can_transition_to(&self, next: TeamStatus) -> bool {
        self.successors().contains(&next)
    }
}

impl std::fmt::Display for TeamStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "Active"),
            Self::Disbanded => write!(f, "Disbanded"),
        }
    }
}

/// Role of a user within a team
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamRole {
    Leader,
    Member,
}

impl std::fmt::Display for TeamRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Leader => write!(f, "leader"),
            Self::Member => write!(f, "member"),
        }
    }
}

/// Team entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    team_id: TeamId,
    leader_email: Email,
    /// Confirmed members in join order, leader excluded
    members: Vec<Email>,
    status: TeamStatus,
    team_name: String,
    created: DateTime<Utc>,
    updated: DateTime<Utc>,
}

impl Team {
    /// Create a new active team with no members
    pub fn new(
        team_id: TeamId,
        leader_email: Email,
        team_name: impl Into<String>,
    ) -> Result<Self, TeamValidationError> {
        let team_name = team_name.into();
        validate_team_name(&team_name)?;
        let now = Utc::now();

        Ok(Self {
            team_id,
            leader_email,
            members: Vec::new(),
            status: TeamStatus::Active,
            team_name,
            created: now,
            updated: now,
        })
    }

    // Getters

    pub fn id(&self) -> &TeamId {
        &self.team_id
    }

    pub fn leader_email(&self) -> &Email {
        &self.leader_email
    }

    pub fn members(&self) -> &[Email] {
        &self.members
    }

    pub fn status(&self) -> TeamStatus {
        self.status
    }

    pub fn team_name(&self) -> &str {
        &self.team_name
    }

    pub fn created(&self) -> DateTime<Utc> {
        self.created
    }

    pub fn updated(&self) -> DateTime<Utc> {
        self.updated
    }

    /// Leader plus confirmed members
    pub fn size(&self) -> usize {
        1 + self.members.len()
    }

    pub fn is_full(&self) -> bool {
        self.size() >= MAX_TEAM_SIZE
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    pub fn is_leader(&self, email: &Email) -> bool {
        &self.leader_email == email
    }

    /// Whether the email is a confirmed (non-leader) member
    pub fn is_member(&self, email: &Email) -> bool {
        self.members.contains(email)
    }

    /// Leader or confirmed member
    pub fn includes(&self, email: &Email) -> bool {
        self.is_leader(email) || self.is_member(email)
    }

    /// Leader first, then members in join order
    pub fn everyone(&self) -> impl Iterator<Item = &Email> {
        std::iter::once(&self.leader_email).chain(self.members.iter())
    }

    // Mutators

    /// Append a confirmed member, enforcing status and capacity
    pub fn add_member(&mut self, email: Email) -> Result<(), TeamValidationError> {
        if !self.is_active() {
            return Err(TeamValidationError::Disbanded);
        }

        if self.includes(&email) {
            return Err(TeamValidationError::AlreadyMember(email.to_string()));
        }

        if self.is_full() {
            return Err(TeamValidationError::Full(MAX_TEAM_SIZE));
        }

        self.members.push(email);
        self.touch();
        Ok(())
    }

    /// Remove a confirmed member, returns false if they were not one
    pub fn remove_member(&mut self, email: &Email) -> bool {
        let before = self.members.len();
        self.members.retain(|m| m != email);
        let removed = self.members.len() != before;

        if removed {
            self.touch();
        }

        removed
    }

    /// Move to Disbanded; only legal from Active
    pub fn disband(&mut self) -> Result<(), TeamValidationError> {
        if !self.status.can_transition_to(TeamStatus::Disbanded) {
            return Err(TeamValidationError::Disbanded);
        }

        self.status = TeamStatus::Disbanded;
        self.touch();
        Ok(())
    }

    fn touch(&mut self) {
        self.updated = Utc::now();
    }
}

impl StorageEntity for Team {
    type Key = TeamId;
    const COLLECTION: &'static str = "teams";

    fn key(&self) -> &Self::Key {
        &self.team_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email(raw: &str) -> Email {
        Email::parse(raw).unwrap()
    }

    fn team() -> Team {
        Team::new(TeamId::generate(), email("lead@example.com"), "Alpha Team").unwrap()
    }

    #[test]
    fn test_team_id_generate_is_valid() {
        let id = TeamId::generate();
        assert!(TeamId::new(id.as_str()).is_ok());
        assert_ne!(TeamId::generate(), id);
    }

    #[test]
    fn test_team_status_table() {
        assert!(TeamStatus::Active.can_transition_to(TeamStatus::Disbanded));
        assert!(!TeamStatus::Active.can_transition_to(TeamStatus::Active));
        assert!(!TeamStatus::Disbanded.can_transition_to(TeamStatus::Active));
        assert!(TeamStatus::Disbanded.successors().is_empty());
    }

    #[test]
    fn test_team_creation() {
        let team = team();
        assert_eq!(team.team_name(), "Alpha Team");
        assert!(team.members().is_empty());
        assert_eq!(team.status(), TeamStatus::Active);
        assert_eq!(team.size(), 1);
    }

    #[test]
    fn test_team_invalid_name() {
        assert!(Team::new(TeamId::generate(), email("lead@example.com"), "").is_err());
        assert!(Team::new(TeamId::generate(), email("lead@example.com"), "Bad#Name").is_err());
    }

    #[test]
    fn test_add_members_up_to_capacity() {
        let mut team = team();
        team.add_member(email("a@example.com")).unwrap();
        team.add_member(email("b@example.com")).unwrap();
        team.add_member(email("c@example.com")).unwrap();

        assert!(team.is_full());
        assert_eq!(
            team.add_member(email("d@example.com")),
            Err(TeamValidationError::Full(MAX_TEAM_SIZE))
        );
        assert_eq!(team.members().len(), 3);
    }

    #[test]
    fn test_add_member_rejects_duplicates_and_leader() {
        let mut team = team();
        team.add_member(email("a@example.com")).unwrap();

        assert!(matches!(
            team.add_member(email("a@example.com")),
            Err(TeamValidationError::AlreadyMember(_))
        ));
        assert!(matches!(
            team.add_member(email("lead@example.com")),
            Err(TeamValidationError::AlreadyMember(_))
        ));
    }

    #[test]
    fn test_remove_member() {
        let mut team = team();
        team.add_member(email("a@example.com")).unwrap();
        team.add_member(email("b@example.com")).unwrap();

        assert!(team.remove_member(&email("a@example.com")));
        assert!(!team.remove_member(&email("a@example.com")));
        assert_eq!(team.members(), &[email("b@example.com")]);
    }

    #[test]
    fn test_disband_is_terminal() {
        let mut team = team();
        team.disband().unwrap();

        assert_eq!(team.status(), TeamStatus::Disbanded);
        assert_eq!(team.disband(), Err(TeamValidationError::Disbanded));
        assert_eq!(
            team.add_member(email("a@example.com")),
            Err(TeamValidationError::Disbanded)
        );
    }

    #[test]
    fn test_everyone_lists_leader_first() {
        let mut team = team();
        team.add_member(email("a@example.com")).unwrap();

        let all: Vec<&Email> = team.everyone().collect();
        assert_eq!(all, vec![&email("lead@example.com"), &email("a@example.com")]);
    }

    #[test]
    fn test_document_shape() {
        let team = team();
        let doc = serde_json::to_value(&team).unwrap();

        assert_eq!(doc["leader_email"], "lead@example.com");
        assert_eq!(doc["status"], "Active");
        assert_eq!(doc["members"], serde_json::json!([]));
        assert!(doc.get("created").is_some());
    }
}
