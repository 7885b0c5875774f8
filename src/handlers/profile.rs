//! Own-profile handlers.

use axum::{extract::State, response::IntoResponse, Json};

use crate::dtos::admin::UpdateProfileRequest;
use crate::error::AppError;
use crate::middleware::auth::AuthUser;
use crate::models::ProfileResponse;
use crate::utils::ValidatedJson;
use crate::AppState;

/// Fetch the current user's profile
#[utoipa::path(
    get,
    path = "/api/profile/me",
    responses((status = 200, description = "Current profile", body = ProfileResponse)),
    tag = "Profile"
)]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<ProfileResponse>, AppError> {
    let profile = state
        .sessions
        .refresh_profile(user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Profile not found")))?;

    Ok(Json(ProfileResponse::from(profile)))
}

/// Update the current user's display name or avatar
#[utoipa::path(
    patch,
    path = "/api/profile/me",
    request_body = UpdateProfileRequest,
    responses((status = 200, description = "Updated profile", body = ProfileResponse)),
    tag = "Profile"
)]
pub async fn update_me(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ValidatedJson(req): ValidatedJson<UpdateProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    let profile = state
        .db
        .update_profile(
            user.user_id,
            req.display_name.as_deref(),
            req.avatar_url.as_deref(),
        )
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Profile not found")))?;

    Ok(Json(ProfileResponse::from(profile)))
}
