//! Team lifecycle service
//!
//! Creation and disbanding change the team and every affected user in one
//! [`WriteBatch`]. Invites, joins, leaves and removals read a snapshot and
//! write documents one at a time, so two concurrent requests can both see a
//! free slot and overshoot the size cap.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::domain::directory::AccountDirectory;
use crate::domain::storage::{DocumentStore, WriteBatch};
use crate::domain::team::{
    validate_team_name, Team, TeamId, TeamQuery, TeamRepository, TeamValidationError,
    MAX_TEAM_SIZE,
};
use crate::domain::user::{Email, PendingInvite, User, UserRepository};
use crate::domain::DomainError;
use crate::infrastructure::observability::{record_team_operation, OperationOutcome};
use crate::infrastructure::team::StorageTeamRepository;
use crate::infrastructure::user::StorageUserRepository;

/// Most members a leader may invite while creating a team
pub const MAX_INITIAL_INVITES: usize = MAX_TEAM_SIZE - 1;

const REASON_INVALID_EMAIL: &str = "invalid email address";
const REASON_NO_ACCOUNT: &str = "user does not exist";
const REASON_ALREADY_TEAMED: &str = "user is already on a team";
const REASON_ALREADY_INVITED: &str = "user already has a pending invitation to this team";
const REASON_CAPACITY: &str = "team is at capacity";
const REASON_WRITE_FAILED: &str = "failed to record invitation";

/// An email that could not be invited, and why
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedInvite {
    pub email: String,
    pub reason: String,
}

/// Per-email result of an invite batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InviteOutcome {
    pub invited: Vec<Email>,
    pub failed: Vec<FailedInvite>,
}

impl InviteOutcome {
    fn fail(&mut self, email: impl Into<String>, reason: &str) {
        self.failed.push(FailedInvite {
            email: email.into(),
            reason: reason.to_string(),
        });
    }

    fn describe_failures(&self) -> String {
        self.failed
            .iter()
            .map(|f| format!("{} ({})", f.email, f.reason))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// A freshly created team together with the invitations sent for it
#[derive(Debug, Clone)]
pub struct CreatedTeam {
    pub team: Team,
    pub invites: InviteOutcome,
}

/// Result of a leader removing members or revoking invites
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RemovalOutcome {
    pub members_affected: usize,
}

/// Creates teams and moves users in and out of them
#[derive(Debug)]
pub struct TeamLifecycleService {
    store: Arc<dyn DocumentStore>,
    users: Arc<dyn UserRepository>,
    teams: Arc<dyn TeamRepository>,
    directory: Arc<dyn AccountDirectory>,
}

impl TeamLifecycleService {
    pub fn new(store: Arc<dyn DocumentStore>, directory: Arc<dyn AccountDirectory>) -> Self {
        Self {
            users: Arc::new(StorageUserRepository::new(store.users())),
            teams: Arc::new(StorageTeamRepository::new(store.teams())),
            store,
            directory,
        }
    }

    /// Create a team led by `leader` and invite the listed members
    ///
    /// The team and the leader's membership are committed together. Invites
    /// go out afterwards; if any requested member cannot be invited the team
    /// is deleted again and the leader's membership undone.
    pub async fn create_team(
        &self,
        leader: &Email,
        team_name: &str,
        members: &[String],
    ) -> Result<CreatedTeam, DomainError> {
        observe("create_team", self.try_create_team(leader, team_name, members).await)
    }

    /// Invite users into a team, in input order, until it is full
    pub async fn invite_members(
        &self,
        team_id: &str,
        leader: &Email,
        emails: &[String],
    ) -> Result<InviteOutcome, DomainError> {
        observe("invite_members", self.try_invite_members(team_id, leader, emails).await)
    }

    /// Join a team the user holds an invitation for
    pub async fn accept_invite(&self, user_email: &Email, team_id: &str) -> Result<Team, DomainError> {
        observe("accept_invite", self.try_accept_invite(user_email, team_id).await)
    }

    /// Drop the invitation for one team, keeping any others
    pub async fn decline_invite(&self, user_email: &Email, team_id: &str) -> Result<(), DomainError> {
        observe("decline_invite", self.try_decline_invite(user_email, team_id).await)
    }

    /// Leave a team; a leader leaving disbands it
    pub async fn leave_team(&self, user_email: &Email, team_id: &str) -> Result<Team, DomainError> {
        observe("leave_team", self.try_leave_team(user_email, team_id).await)
    }

    /// Disband a team as its leader or as staff
    pub async fn disband_team(&self, caller: &Email, team_id: &str) -> Result<Team, DomainError> {
        observe("disband_team", self.try_disband_team(caller, team_id).await)
    }

    /// Remove confirmed members and revoke pending invites
    ///
    /// Targets are handled one by one; a failure on one does not undo the
    /// others.
    pub async fn remove_members(
        &self,
        leader: &Email,
        team_id: &str,
        targets: &[String],
    ) -> Result<RemovalOutcome, DomainError> {
        observe("remove_members", self.try_remove_members(leader, team_id, targets).await)
    }

    pub async fn get_team(&self, team_id: &str) -> Result<Team, DomainError> {
        let team_id = parse_team_id(team_id)?;
        self.load_team(&team_id).await
    }

    pub async fn list_teams(&self, query: &TeamQuery) -> Result<Vec<Team>, DomainError> {
        self.teams.list(query).await
    }

    async fn try_create_team(
        &self,
        leader_email: &Email,
        team_name: &str,
        members: &[String],
    ) -> Result<CreatedTeam, DomainError> {
        info!(leader = %leader_email, team_name = %team_name, "Creating team");

        validate_team_name(team_name).map_err(|e| DomainError::validation(e.to_string()))?;

        let members = normalize_members(leader_email, members)?;

        let mut leader = self.load_user(leader_email).await?;
        if leader.is_team_leader() || leader.confirmed_team() {
            return Err(DomainError::conflict("You are already on a team"));
        }

        for member in &members {
            let user = self
                .users
                .get(member)
                .await?
                .ok_or_else(|| DomainError::not_found(format!("User '{}' not found", member)))?;

            if user.confirmed_team() {
                return Err(DomainError::conflict(format!("User '{}' is already on a team", member)));
            }
        }

        let team = Team::new(TeamId::generate(), leader_email.clone(), team_name)
            .map_err(|e| DomainError::validation(e.to_string()))?;
        leader.become_leader(team.id().clone());

        self.store
            .commit(WriteBatch::new().insert_team(team.clone()).update_user(leader))
            .await
            .map_err(|e| DomainError::internal(format!("Failed to create team: {}", e.message())))?;

        info!(team_id = %team.id(), leader = %leader_email, "Team created");

        if members.is_empty() {
            return Ok(CreatedTeam {
                team,
                invites: InviteOutcome::default(),
            });
        }

        let requested: Vec<String> = members.iter().map(|m| m.to_string()).collect();
        let failure = match self.issue_invites(&team, leader_email, &requested).await {
            Ok(invites) if invites.failed.is_empty() => {
                return Ok(CreatedTeam { team, invites });
            }
            Ok(invites) => {
                let failure = format!("Failed to invite members: {}", invites.describe_failures());
                self.roll_back_creation(&team, &invites.invited, &failure).await?;
                failure
            }
            Err(e) => {
                let failure = format!("Failed to invite members: {}", e.message());
                self.roll_back_creation(&team, &members, &failure).await?;
                failure
            }
        };

        Err(DomainError::internal(format!("{}; team creation was rolled back", failure)))
    }

    /// Delete the team, undo the leader's membership and revoke any invites
    /// that already went out
    async fn roll_back_creation(
        &self,
        team: &Team,
        invited: &[Email],
        reason: &str,
    ) -> Result<(), DomainError> {
        warn!(team_id = %team.id(), reason = %reason, "Rolling back team creation");

        let result = self.compensation_batch(team, invited).await;
        let result = match result {
            Ok(batch) => self.store.commit(batch).await,
            Err(e) => Err(e),
        };

        result.map_err(|e| {
            error!(team_id = %team.id(), error = %e, "Team creation rollback failed");
            DomainError::internal(format!(
                "{}; rolling back team creation also failed: {}",
                reason,
                e.message()
            ))
        })
    }

    async fn compensation_batch(
        &self,
        team: &Team,
        invited: &[Email],
    ) -> Result<WriteBatch, DomainError> {
        let mut batch = WriteBatch::new().delete_team(team.id().clone());

        if let Some(mut leader) = self.users.get(team.leader_email()).await? {
            leader.clear_team();
            batch = batch.update_user(leader);
        }

        for email in invited {
            if let Some(mut user) = self.users.get(email).await? {
                if user.remove_invite(team.id()).is_some() {
                    batch = batch.update_user(user);
                }
            }
        }

        Ok(batch)
    }

    async fn try_invite_members(
        &self,
        team_id: &str,
        leader_email: &Email,
        emails: &[String],
    ) -> Result<InviteOutcome, DomainError> {
        let team_id = parse_team_id(team_id)?;

        self.load_user(leader_email).await?;
        let team = self.load_team(&team_id).await?;

        if !team.is_leader(leader_email) {
            return Err(DomainError::forbidden("Only the team leader can invite members"));
        }

        if !team.is_active() {
            return Err(DomainError::validation(TeamValidationError::Disbanded.to_string()));
        }

        self.issue_invites(&team, leader_email, emails).await
    }

    async fn issue_invites(
        &self,
        team: &Team,
        leader_email: &Email,
        emails: &[String],
    ) -> Result<InviteOutcome, DomainError> {
        let pending = self.users.count_invited_to(team.id()).await?;
        let capacity = MAX_TEAM_SIZE.saturating_sub(team.size() + pending);

        if capacity == 0 {
            return Err(DomainError::capacity(format!(
                "Team is full: {} members and {} pending invitations",
                team.size(),
                pending
            )));
        }

        debug!(team_id = %team.id(), capacity, requested = emails.len(), "Issuing invitations");

        let mut outcome = InviteOutcome::default();

        for raw in emails {
            if outcome.invited.len() >= capacity {
                outcome.fail(raw.clone(), REASON_CAPACITY);
                continue;
            }

            let Ok(email) = Email::parse(raw) else {
                outcome.fail(raw.clone(), REASON_INVALID_EMAIL);
                continue;
            };

            match self.invite_one(team, leader_email, &email).await {
                Ok(()) => {
                    info!(team_id = %team.id(), email = %email, "Invitation sent");
                    outcome.invited.push(email);
                }
                Err(reason) => outcome.fail(email.to_string(), reason),
            }
        }

        Ok(outcome)
    }

    async fn invite_one(
        &self,
        team: &Team,
        leader_email: &Email,
        email: &Email,
    ) -> Result<(), &'static str> {
        if !self.directory.exists(email).await {
            return Err(REASON_NO_ACCOUNT);
        }

        let mut user = match self.users.get(email).await {
            Ok(Some(user)) => user,
            Ok(None) => return Err(REASON_NO_ACCOUNT),
            Err(e) => {
                warn!(email = %email, error = %e, "Failed to load invitee");
                return Err(REASON_WRITE_FAILED);
            }
        };

        if user.confirmed_team() {
            return Err(REASON_ALREADY_TEAMED);
        }

        if user.has_invite(team.id()) {
            return Err(REASON_ALREADY_INVITED);
        }

        user.add_invite(PendingInvite {
            team_id: team.id().clone(),
            invited_by: leader_email.clone(),
            invited_at: Utc::now(),
            team_name: team.team_name().to_string(),
        });

        self.users.update(user).await.map(|_| ()).map_err(|e| {
            warn!(email = %email, error = %e, "Failed to record invitation");
            REASON_WRITE_FAILED
        })
    }

    async fn try_accept_invite(&self, user_email: &Email, team_id: &str) -> Result<Team, DomainError> {
        let team_id = parse_team_id(team_id)?;
        let mut user = self.load_user(user_email).await?;

        if user.confirmed_team() {
            return Err(DomainError::conflict("You are already on a team"));
        }

        if !user.has_invite(&team_id) {
            return Err(DomainError::validation("No pending invitation for this team"));
        }

        let mut team = self.load_team(&team_id).await?;
        team.add_member(user_email.clone()).map_err(membership_error)?;
        user.become_member(team_id.clone());

        let team = self.teams.update(team).await?;
        self.users.update(user).await?;

        info!(team_id = %team_id, email = %user_email, size = team.size(), "Invitation accepted");
        Ok(team)
    }

    async fn try_decline_invite(&self, user_email: &Email, team_id: &str) -> Result<(), DomainError> {
        let team_id = parse_team_id(team_id)?;
        let mut user = self.load_user(user_email).await?;

        if user.remove_invite(&team_id).is_none() {
            return Err(DomainError::validation("No pending invitation for this team"));
        }

        self.users.update(user).await?;

        info!(team_id = %team_id, email = %user_email, "Invitation declined");
        Ok(())
    }

    async fn try_leave_team(&self, user_email: &Email, team_id: &str) -> Result<Team, DomainError> {
        let team_id = parse_team_id(team_id)?;
        let mut user = self.load_user(user_email).await?;
        let mut team = self.load_team(&team_id).await?;

        if !team.is_active() {
            return Err(DomainError::validation(TeamValidationError::Disbanded.to_string()));
        }

        if team.members().is_empty() {
            return Err(DomainError::validation("Team has no members"));
        }

        if !team.includes(user_email) {
            return Err(DomainError::validation("You are not a member of this team"));
        }

        if team.is_leader(user_email) {
            info!(team_id = %team_id, leader = %user_email, "Leader is leaving, disbanding team");
            return self.disband(team).await;
        }

        team.remove_member(user_email);
        user.clear_team();

        let team = self.teams.update(team).await?;
        self.users.update(user).await?;

        info!(team_id = %team_id, email = %user_email, "Member left team");
        Ok(team)
    }

    async fn try_disband_team(&self, caller_email: &Email, team_id: &str) -> Result<Team, DomainError> {
        let team_id = parse_team_id(team_id)?;
        let caller = self.load_user(caller_email).await?;
        let team = self.load_team(&team_id).await?;

        if !team.is_leader(caller_email) && !caller.roles().is_staff() {
            return Err(DomainError::forbidden("Only the team leader or staff can disband a team"));
        }

        self.disband(team).await
    }

    /// Mark the team disbanded and clear every user pointing at it
    async fn disband(&self, mut team: Team) -> Result<Team, DomainError> {
        team.disband()
            .map_err(|_| DomainError::conflict("Team has already been disbanded"))?;

        let mut affected: BTreeMap<Email, User> = BTreeMap::new();

        for email in team.everyone() {
            match self.users.get(email).await? {
                Some(mut user) if user.belongs_to(team.id()) => {
                    user.clear_team();
                    affected.insert(email.clone(), user);
                }
                Some(_) => warn!(team_id = %team.id(), email = %email, "Listed user does not point at team"),
                None => warn!(team_id = %team.id(), email = %email, "Listed user no longer exists"),
            }
        }

        for mut user in self.users.list_invited_to(team.id()).await? {
            user.remove_invite(team.id());
            affected.entry(user.email().clone()).or_insert(user);
        }

        let cleared = affected.len();
        let batch = affected
            .into_values()
            .fold(WriteBatch::new().update_team(team.clone()), |batch, user| {
                batch.update_user(user)
            });

        self.store.commit(batch).await.map_err(|e| {
            error!(team_id = %team.id(), error = %e, "Disband transaction failed");
            DomainError::internal(format!("Failed to disband team: {}", e.message()))
        })?;

        info!(team_id = %team.id(), users_cleared = cleared, "Team disbanded");
        Ok(team)
    }

    async fn try_remove_members(
        &self,
        leader_email: &Email,
        team_id: &str,
        targets: &[String],
    ) -> Result<RemovalOutcome, DomainError> {
        let team_id = parse_team_id(team_id)?;

        self.load_user(leader_email).await?;
        let mut team = self.load_team(&team_id).await?;

        if !team.is_leader(leader_email) {
            return Err(DomainError::forbidden("Only the team leader can remove members"));
        }

        if !team.is_active() {
            return Err(DomainError::validation(TeamValidationError::Disbanded.to_string()));
        }

        let targets: Vec<Email> = targets
            .iter()
            .filter_map(|raw| match Email::parse(raw) {
                Ok(email) => Some(email),
                Err(_) => {
                    warn!(team_id = %team_id, email = %raw, "Skipping invalid email");
                    None
                }
            })
            .collect();

        if targets.contains(leader_email) {
            return Err(DomainError::validation("The team leader cannot remove themselves"));
        }

        let mut affected = 0;

        for target in &targets {
            match self.remove_one(&mut team, target).await {
                Ok(true) => affected += 1,
                Ok(false) => debug!(team_id = %team_id, email = %target, "Nothing to remove"),
                Err(e) => warn!(team_id = %team_id, email = %target, error = %e, "Failed to remove target"),
            }
        }

        info!(team_id = %team_id, members_affected = affected, "Members removed");
        Ok(RemovalOutcome {
            members_affected: affected,
        })
    }

    /// Remove one member or revoke one invite; false when neither applied
    async fn remove_one(&self, team: &mut Team, target: &Email) -> Result<bool, DomainError> {
        let user = self.users.get(target).await?;

        if team.is_member(target) {
            let mut updated = team.clone();
            updated.remove_member(target);
            *team = self.teams.update(updated).await?;

            match user {
                Some(mut user) if user.belongs_to(team.id()) => {
                    user.clear_team();
                    self.users.update(user).await?;
                }
                Some(_) => {}
                None => warn!(team_id = %team.id(), email = %target, "Removed member has no user document"),
            }

            return Ok(true);
        }

        let Some(mut user) = user else {
            return Ok(false);
        };

        if user.remove_invite(team.id()).is_some() {
            self.users.update(user).await?;
            return Ok(true);
        }

        Ok(false)
    }

    async fn load_user(&self, email: &Email) -> Result<User, DomainError> {
        self.users
            .get(email)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("User '{}' not found", email)))
    }

    async fn load_team(&self, team_id: &TeamId) -> Result<Team, DomainError> {
        self.teams
            .get(team_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Team '{}' not found", team_id)))
    }
}

fn observe<T>(operation: &'static str, result: Result<T, DomainError>) -> Result<T, DomainError> {
    record_team_operation(operation, OperationOutcome::of(&result));
    result
}

/// Malformed ids can never name a stored team
fn parse_team_id(raw: &str) -> Result<TeamId, DomainError> {
    TeamId::new(raw).map_err(|_| DomainError::not_found(format!("Team '{}' not found", raw)))
}

fn normalize_members(leader: &Email, members: &[String]) -> Result<Vec<Email>, DomainError> {
    let mut normalized: Vec<Email> = Vec::with_capacity(members.len());

    for raw in members {
        let email = Email::parse(raw)
            .map_err(|e| DomainError::validation(format!("Invalid member email '{}': {}", raw, e)))?;

        if &email == leader {
            return Err(DomainError::validation("The team leader cannot be listed as a member"));
        }

        if !normalized.contains(&email) {
            normalized.push(email);
        }
    }

    if normalized.len() > MAX_INITIAL_INVITES {
        return Err(DomainError::validation(format!(
            "A team can invite at most {} members",
            MAX_INITIAL_INVITES
        )));
    }

    Ok(normalized)
}

fn membership_error(error: TeamValidationError) -> DomainError {
    match error {
        TeamValidationError::Full(_) => DomainError::capacity(error.to_string()),
        TeamValidationError::AlreadyMember(_) => DomainError::conflict(error.to_string()),
        _ => DomainError::validation(error.to_string()),
    }
}
