//! User entity and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::role::Roles;
use super::validation::{validate_email, UserValidationError};
use crate::domain::registration::RegistrationStatus;
use crate::domain::storage::{StorageEntity, StorageKey};
use crate::domain::team::{TeamId, TeamRole};

/// Email address used as the user key, always lowercase
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Trim, lowercase and validate an address
    pub fn parse(raw: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let normalized = raw.as_ref().trim().to_lowercase();
        validate_email(&normalized)?;
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Email {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
    }
}

impl std::fmt::Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl StorageKey for Email {
    fn as_str(&self) -> &str {
        &self.0
    }
}

/// An outstanding offer to join a team, stored on the invitee
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingInvite {
    pub team_id: TeamId,
    pub invited_by: Email,
    pub invited_at: DateTime<Utc>,
    pub team_name: String,
}

/// Team membership state embedded in the user document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamInfo {
    #[serde(default)]
    pub team_id: Option<TeamId>,
    #[serde(default)]
    pub role: Option<TeamRole>,
    #[serde(default)]
    pub pending_invites: Vec<PendingInvite>,
}

/// Registered participant or staff account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    email: Email,
    #[serde(default)]
    role: Roles,
    #[serde(default)]
    registration_status: RegistrationStatus,
    #[serde(default)]
    confirmed_team: bool,
    #[serde(default)]
    team_info: TeamInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    registered_at: Option<DateTime<Utc>>,
    #[serde(default = "Utc::now")]
    created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    updated_at: DateTime<Utc>,
    /// Application form answers and any other caller-supplied fields
    #[serde(flatten)]
    profile: Map<String, Value>,
}

impl User {
    /// Create a new account in the `unregistered` state
    pub fn new(email: Email) -> Self {
        let now = Utc::now();

        Self {
            email,
            role: Roles::empty(),
            registration_status: RegistrationStatus::Unregistered,
            confirmed_team: false,
            team_info: TeamInfo::default(),
            registered_at: None,
            created_at: now,
            updated_at: now,
            profile: Map::new(),
        }
    }

    /// Set roles (builder pattern)
    pub fn with_roles(mut self, roles: Roles) -> Self {
        self.role = roles;
        self
    }

    /// Set registration status (builder pattern)
    pub fn with_status(mut self, status: RegistrationStatus) -> Self {
        self.registration_status = status;
        self
    }

    /// Set a profile field (builder pattern)
    pub fn with_profile_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.profile.insert(name.into(), value.into());
        self
    }

    // Getters

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn roles(&self) -> Roles {
        self.role
    }

    pub fn registration_status(&self) -> RegistrationStatus {
        self.registration_status
    }

    pub fn confirmed_team(&self) -> bool {
        self.confirmed_team
    }

    pub fn team_info(&self) -> &TeamInfo {
        &self.team_info
    }

    pub fn team_id(&self) -> Option<&TeamId> {
        self.team_info.team_id.as_ref()
    }

    pub fn team_role(&self) -> Option<TeamRole> {
        self.team_info.role
    }

    pub fn pending_invites(&self) -> &[PendingInvite] {
        &self.team_info.pending_invites
    }

    pub fn registered_at(&self) -> Option<DateTime<Utc>> {
        self.registered_at
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn profile(&self) -> &Map<String, Value> {
        &self.profile
    }

    pub fn profile_field(&self, name: &str) -> Option<&Value> {
        self.profile.get(name)
    }

    /// True when the field holds something other than null, blank text or
    /// an empty collection
    pub fn has_profile_value(&self, name: &str) -> bool {
        match self.profile.get(name) {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => !s.trim().is_empty(),
            Some(Value::Array(items)) => !items.is_empty(),
            Some(Value::Object(fields)) => !fields.is_empty(),
            Some(_) => true,
        }
    }

    pub fn is_team_leader(&self) -> bool {
        self.team_info.role == Some(TeamRole::Leader)
    }

    /// Whether this user is confirmed into the given team
    pub fn belongs_to(&self, team_id: &TeamId) -> bool {
        self.confirmed_team && self.team_info.team_id.as_ref() == Some(team_id)
    }

    pub fn pending_invite(&self, team_id: &TeamId) -> Option<&PendingInvite> {
        self.team_info
            .pending_invites
            .iter()
            .find(|invite| &invite.team_id == team_id)
    }

    pub fn has_invite(&self, team_id: &TeamId) -> bool {
        self.pending_invite(team_id).is_some()
    }

    // Mutators

    /// Record an invitation; the list keeps arrival order
    pub fn add_invite(&mut self, invite: PendingInvite) {
        self.team_info.pending_invites.push(invite);
        self.touch();
    }

    /// Remove the invitation for a team, leaving the others in place
    pub fn remove_invite(&mut self, team_id: &TeamId) -> Option<PendingInvite> {
        let position = self
            .team_info
            .pending_invites
            .iter()
            .position(|invite| &invite.team_id == team_id)?;
        let removed = self.team_info.pending_invites.remove(position);
        self.touch();
        Some(removed)
    }

    /// Confirm this user as the leader of a newly created team
    pub fn become_leader(&mut self, team_id: TeamId) {
        self.confirmed_team = true;
        self.team_info = TeamInfo {
            team_id: Some(team_id),
            role: Some(TeamRole::Leader),
            pending_invites: Vec::new(),
        };
        self.touch();
    }

    /// Confirm this user as a member; the accepted invite is consumed and
    /// invites for other teams are kept
    pub fn become_member(&mut self, team_id: TeamId) {
        let pending_invites = self
            .team_info
            .pending_invites
            .drain(..)
            .filter(|invite| invite.team_id != team_id)
            .collect();

        self.confirmed_team = true;
        self.team_info = TeamInfo {
            team_id: Some(team_id),
            role: Some(TeamRole::Member),
            pending_invites,
        };
        self.touch();
    }

    /// Drop all team state
    pub fn clear_team(&mut self) {
        self.confirmed_team = false;
        self.team_info = TeamInfo::default();
        self.touch();
    }

    pub fn set_roles(&mut self, roles: Roles) {
        self.role = roles;
        self.touch();
    }

    /// Move to a new registration status; entering `registered` stamps
    /// `registered_at`
    pub fn set_registration_status(&mut self, status: RegistrationStatus, at: DateTime<Utc>) {
        self.registration_status = status;
        if status == RegistrationStatus::Registered {
            self.registered_at = Some(at);
        }
        self.updated_at = at;
    }

    pub fn set_profile_field(&mut self, name: impl Into<String>, value: Value) {
        self.profile.insert(name.into(), value);
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl StorageEntity for User {
    type Key = Email;
    const COLLECTION: &'static str = "users";

    fn key(&self) -> &Self::Key {
        &self.email
    }
}
