//! Team lifecycle endpoint handlers

use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::middleware::Caller;
use crate::api::state::AppState;
use crate::api::types::{ApiError, ApiResponse, Empty, Json};
use crate::domain::team::{Team, TeamQuery, TeamStatus};
use crate::domain::user::Email;
use crate::infrastructure::team::{FailedInvite, InviteOutcome};

#[derive(Debug, Deserialize)]
pub struct CreateTeamRequest {
    pub team_name: String,
    #[serde(default)]
    pub members: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct InviteMembersRequest {
    pub emails: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct RemoveMembersRequest {
    pub member_emails: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListTeamsParams {
    pub status: Option<TeamStatus>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct CreateTeamResponse {
    pub team_id: String,
    pub invited: Vec<Email>,
    pub failed: Vec<FailedInvite>,
}

#[derive(Debug, Serialize)]
pub struct TeamIdResponse {
    pub team_id: String,
}

#[derive(Debug, Serialize)]
pub struct TeamResponse {
    pub team: Team,
}

#[derive(Debug, Serialize)]
pub struct TeamsResponse {
    pub teams: Vec<Team>,
}

#[derive(Debug, Serialize)]
pub struct RemoveMembersResponse {
    pub members_affected: usize,
}

fn team_id_of(team: &Team) -> TeamIdResponse {
    TeamIdResponse {
        team_id: team.id().as_str().to_string(),
    }
}

/// POST /v1/teams
pub async fn create_team(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Json(request): Json<CreateTeamRequest>,
) -> Result<ApiResponse<CreateTeamResponse>, ApiError> {
    debug!(leader = %caller, team_name = %request.team_name, "Creating team");

    let created = state
        .teams
        .create_team(&caller, &request.team_name, &request.members)
        .await?;

    Ok(ApiResponse::ok(
        "Team created",
        CreateTeamResponse {
            team_id: created.team.id().as_str().to_string(),
            invited: created.invites.invited,
            failed: created.invites.failed,
        },
    ))
}

/// GET /v1/teams
pub async fn list_teams(
    State(state): State<AppState>,
    Caller(_caller): Caller,
    Query(params): Query<ListTeamsParams>,
) -> Result<ApiResponse<TeamsResponse>, ApiError> {
    let query = TeamQuery {
        status: params.status,
        limit: params.limit,
        offset: params.offset,
    };

    let teams = state.teams.list_teams(&query).await?;
    Ok(ApiResponse::ok("Teams retrieved", TeamsResponse { teams }))
}

/// GET /v1/teams/{team_id}
pub async fn get_team(
    State(state): State<AppState>,
    Caller(_caller): Caller,
    Path(team_id): Path<String>,
) -> Result<ApiResponse<TeamResponse>, ApiError> {
    let team = state.teams.get_team(&team_id).await?;
    Ok(ApiResponse::ok("Team retrieved", TeamResponse { team }))
}

/// POST /v1/teams/{team_id}/invites
pub async fn invite_members(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(team_id): Path<String>,
    Json(request): Json<InviteMembersRequest>,
) -> Result<ApiResponse<InviteOutcome>, ApiError> {
    let outcome = state
        .teams
        .invite_members(&team_id, &caller, &request.emails)
        .await?;

    Ok(ApiResponse::ok("Invitations processed", outcome))
}

/// POST /v1/teams/{team_id}/accept
pub async fn accept_invite(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(team_id): Path<String>,
) -> Result<ApiResponse<TeamIdResponse>, ApiError> {
    let team = state.teams.accept_invite(&caller, &team_id).await?;
    Ok(ApiResponse::ok("Joined team", team_id_of(&team)))
}

/// POST /v1/teams/{team_id}/decline
pub async fn decline_invite(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(team_id): Path<String>,
) -> Result<ApiResponse<Empty>, ApiError> {
    state.teams.decline_invite(&caller, &team_id).await?;
    Ok(ApiResponse::message("Invitation declined"))
}

/// POST /v1/teams/{team_id}/leave
pub async fn leave_team(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(team_id): Path<String>,
) -> Result<ApiResponse<TeamIdResponse>, ApiError> {
    let team = state.teams.leave_team(&caller, &team_id).await?;
    let message = if team.is_active() {
        "Left team"
    } else {
        "Left team; the team was disbanded"
    };

    Ok(ApiResponse::ok(message, team_id_of(&team)))
}

/// POST /v1/teams/{team_id}/disband
pub async fn disband_team(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(team_id): Path<String>,
) -> Result<ApiResponse<TeamIdResponse>, ApiError> {
    let team = state.teams.disband_team(&caller, &team_id).await?;
    Ok(ApiResponse::ok("Team disbanded", team_id_of(&team)))
}

/// POST /v1/teams/{team_id}/remove
pub async fn remove_members(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(team_id): Path<String>,
    Json(request): Json<RemoveMembersRequest>,
) -> Result<ApiResponse<RemoveMembersResponse>, ApiError> {
    let outcome = state
        .teams
        .remove_members(&caller, &team_id, &request.member_emails)
        .await?;

    Ok(ApiResponse::ok(
        "Members removed",
        RemoveMembersResponse {
            members_affected: outcome.members_affected,
        },
    ))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        Router,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::api::middleware::AUTH_EMAIL_HEADER;
    use crate::api::router::create_router;
    use crate::api::state::test_support::{test_app, TestApp};
    use crate::domain::user::{Capability, Email, Roles, User};

    const LEADER: &str = "leader@example.com";

    fn user(email: &str) -> User {
        User::new(Email::parse(email).unwrap())
    }

    fn setup() -> (TestApp, Router) {
        let app = test_app(vec![
            user(LEADER),
            user("a@example.com"),
            user("b@example.com"),
            user("c@example.com"),
            user("outsider@example.com"),
            user("staff@example.com").with_roles(Roles::of(Capability::Organizer)),
        ]);
        let router = create_router(app.state.clone(), None);
        (app, router)
    }

    async fn call(
        app: &TestApp,
        router: &Router,
        method: &str,
        uri: &str,
        caller: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("authorization", app.bearer(caller))
            .header(AUTH_EMAIL_HEADER, caller);

        let body = match body {
            Some(body) => {
                builder = builder.header("content-type", "application/json");
                Body::from(body.to_string())
            }
            None => Body::empty(),
        };

        let response = router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        (status, json)
    }

    async fn create(app: &TestApp, router: &Router, members: Value) -> String {
        let (status, body) = call(
            app,
            router,
            "POST",
            "/v1/teams",
            LEADER,
            Some(json!({"team_name": "Alpha Team", "members": members})),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        body["team_id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_create_and_read_team() {
        let (app, router) = setup();
        let team_id = create(&app, &router, json!([])).await;

        let (status, body) = call(&app, &router, "GET", &format!("/v1/teams/{}", team_id), "a@example.com", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], 200);
        assert_eq!(body["team"]["leader_email"], LEADER);
        assert_eq!(body["team"]["members"], json!([]));
        assert_eq!(body["team"]["status"], "Active");
        assert_eq!(body["team"]["team_name"], "Alpha Team");
    }

    #[tokio::test]
    async fn test_create_reports_invites() {
        let (app, router) = setup();
        let (status, body) = call(
            &app,
            &router,
            "POST",
            "/v1/teams",
            LEADER,
            Some(json!({"team_name": "Alpha Team", "members": ["A@example.com", "b@example.com"]})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["invited"], json!(["a@example.com", "b@example.com"]));
        assert_eq!(body["failed"], json!([]));
    }

    #[tokio::test]
    async fn test_requires_authentication() {
        let (_app, router) = setup();
        let request = Request::builder()
            .method("POST")
            .uri("/v1/teams")
            .header("content-type", "application/json")
            .body(Body::from(json!({"team_name": "Alpha Team"}).to_string()))
            .unwrap();

        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], 401);
    }

    #[tokio::test]
    async fn test_invalid_team_name_is_bad_request() {
        let (app, router) = setup();
        let (status, body) = call(&app, &router, "POST", "/v1/teams", LEADER, Some(json!({"team_name": ""}))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], 400);
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn test_malformed_body_uses_error_envelope() {
        let (app, router) = setup();
        let (status, body) = call(&app, &router, "POST", "/v1/teams", LEADER, Some(json!({"members": []}))).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["status"], 422);
    }

    #[tokio::test]
    async fn test_unknown_team_is_not_found() {
        let (app, router) = setup();
        let (status, _) = call(&app, &router, "GET", "/v1/teams/does-not-exist", LEADER, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_invite_accept_and_leave() {
        let (app, router) = setup();
        let team_id = create(&app, &router, json!([])).await;

        let (status, body) = call(
            &app,
            &router,
            "POST",
            &format!("/v1/teams/{}/invites", team_id),
            LEADER,
            Some(json!({"emails": ["a@example.com", "nobody@example.com"]})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["invited"], json!(["a@example.com"]));
        assert_eq!(body["failed"][0]["email"], "nobody@example.com");

        let (status, body) =
            call(&app, &router, "POST", &format!("/v1/teams/{}/accept", team_id), "a@example.com", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["team_id"], team_id);

        let (_, body) = call(&app, &router, "GET", &format!("/v1/teams/{}", team_id), LEADER, None).await;
        assert_eq!(body["team"]["members"], json!(["a@example.com"]));

        let (status, body) =
            call(&app, &router, "POST", &format!("/v1/teams/{}/leave", team_id), "a@example.com", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Left team");
    }

    #[tokio::test]
    async fn test_invite_by_non_leader_is_forbidden() {
        let (app, router) = setup();
        let team_id = create(&app, &router, json!([])).await;

        let (status, body) = call(
            &app,
            &router,
            "POST",
            &format!("/v1/teams/{}/invites", team_id),
            "outsider@example.com",
            Some(json!({"emails": ["b@example.com"]})),
        )
        .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["status"], 403);
    }

    #[tokio::test]
    async fn test_decline_twice() {
        let (app, router) = setup();
        let team_id = create(&app, &router, json!(["b@example.com"])).await;
        let uri = format!("/v1/teams/{}/decline", team_id);

        let (status, body) = call(&app, &router, "POST", &uri, "b@example.com", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"message": "Invitation declined", "status": 200}));

        let (status, _) = call(&app, &router, "POST", &uri, "b@example.com", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_remove_members() {
        let (app, router) = setup();
        let team_id = create(&app, &router, json!(["a@example.com", "b@example.com"])).await;
        call(&app, &router, "POST", &format!("/v1/teams/{}/accept", team_id), "a@example.com", None).await;

        let uri = format!("/v1/teams/{}/remove", team_id);
        let (status, body) = call(
            &app,
            &router,
            "POST",
            &uri,
            LEADER,
            Some(json!({"member_emails": ["a@example.com", "b@example.com"]})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["members_affected"], 2);

        let (status, _) =
            call(&app, &router, "POST", &uri, LEADER, Some(json!({"member_emails": [LEADER]}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_disband_by_staff_then_again() {
        let (app, router) = setup();
        let team_id = create(&app, &router, json!([])).await;
        let uri = format!("/v1/teams/{}/disband", team_id);

        let (status, _) = call(&app, &router, "POST", &uri, "outsider@example.com", None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = call(&app, &router, "POST", &uri, "staff@example.com", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["team_id"], team_id);

        let (status, _) = call(&app, &router, "POST", &uri, LEADER, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_list_teams_by_status() {
        let (app, router) = setup();
        let team_id = create(&app, &router, json!([])).await;
        call(&app, &router, "POST", &format!("/v1/teams/{}/disband", team_id), LEADER, None).await;

        let (status, body) = call(&app, &router, "GET", "/v1/teams?status=Active", LEADER, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["teams"], json!([]));

        let (_, body) = call(&app, &router, "GET", "/v1/teams?status=Disbanded", LEADER, None).await;
        assert_eq!(body["teams"][0]["team_id"], team_id);
    }
}
