//! Registration update endpoint

use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::api::middleware::Caller;
use crate::api::state::AppState;
use crate::api::types::{ApiError, ApiResponse, Json};
use crate::domain::user::User;

/// Mongo-style partial update: `{"$set": {...}}`
#[derive(Debug, Deserialize)]
pub struct UpdateRegistrationRequest {
    #[serde(rename = "$set")]
    pub set: Map<String, Value>,
}

#[derive(Debug, Serialize)]
pub struct UpdateRegistrationResponse {
    pub user: User,
}

/// PATCH /v1/users/{user_email}/registration
pub async fn update_registration(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(user_email): Path<String>,
    Json(request): Json<UpdateRegistrationRequest>,
) -> Result<ApiResponse<UpdateRegistrationResponse>, ApiError> {
    let user = state
        .registration
        .update_registration(&caller, &user_email, request.set)
        .await?;

    Ok(ApiResponse::ok(
        "Registration updated",
        UpdateRegistrationResponse { user },
    ))
}
