//! Team infrastructure implementations

mod repository;
mod service;

pub use repository::StorageTeamRepository;
pub use service::{
    CreatedTeam, FailedInvite, InviteOutcome, RemovalOutcome, TeamLifecycleService,
    MAX_INITIAL_INVITES,
};
