//! Versioned team and registration endpoints

pub mod registration;
pub mod teams;

use axum::{
    routing::{get, patch, post},
    Router,
};

use super::state::AppState;

/// Create v1 API router
pub fn create_v1_router() -> Router<AppState> {
    Router::new()
        .route("/teams", post(teams::create_team).get(teams::list_teams))
        .route("/teams/{team_id}", get(teams::get_team))
        .route("/teams/{team_id}/invites", post(teams::invite_members))
        .route("/teams/{team_id}/accept", post(teams::accept_invite))
        .route("/teams/{team_id}/decline", post(teams::decline_invite))
        .route("/teams/{team_id}/leave", post(teams::leave_team))
        .route("/teams/{team_id}/disband", post(teams::disband_team))
        .route("/teams/{team_id}/remove", post(teams::remove_members))
        .route(
            "/users/{user_email}/registration",
            patch(registration::update_registration),
        )
}
