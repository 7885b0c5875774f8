//! Administrative handlers: one-time admin bootstrap and user management.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::config::Environment;
use crate::dtos::admin::{AdminSetupRequest, AdminSetupResponse, UpdateRoleRequest};
use crate::dtos::ErrorResponse;
use crate::error::AppError;
use crate::middleware::auth::AuthUser;
use crate::models::ProfileResponse;
use crate::utils::ValidatedJson;
use crate::AppState;

/// One-time setup: promote an existing identity to admin. Gated by the
/// server-held setup key, not by a session - it exists to mint the first
/// admin.
#[utoipa::path(
    post,
    path = "/api/admin/setup",
    request_body = AdminSetupRequest,
    responses(
        (status = 200, description = "User promoted", body = AdminSetupResponse),
        (status = 403, description = "Invalid setup key", body = ErrorResponse),
        (status = 404, description = "User has not signed up yet", body = ErrorResponse)
    ),
    tag = "Admin"
)]
pub async fn setup(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<AdminSetupRequest>,
) -> Result<impl IntoResponse, AppError> {
    if req.setup_key != state.config.security.admin_setup_key {
        tracing::warn!(email = %req.email, "Admin setup attempted with invalid key");
        return Err(AppError::Forbidden(anyhow::anyhow!("Invalid setup key")));
    }

    let message = state.sessions.promote_to_admin(&req.email).await?;

    Ok(Json(AdminSetupResponse {
        success: true,
        message,
    }))
}

/// Development-only variant of the setup endpoint.
pub async fn simple_setup(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<AdminSetupRequest>,
) -> Result<impl IntoResponse, AppError> {
    if state.config.environment == Environment::Prod {
        return Err(AppError::Forbidden(anyhow::anyhow!(
            "Not available in production"
        )));
    }

    if req.setup_key != state.config.security.admin_setup_key {
        return Err(AppError::Forbidden(anyhow::anyhow!("Invalid setup key")));
    }

    let message = state.sessions.promote_to_admin(&req.email).await?;

    Ok(Json(AdminSetupResponse {
        success: true,
        message,
    }))
}

/// List all profiles, newest first
#[utoipa::path(
    get,
    path = "/api/admin/users",
    responses((status = 200, description = "All users", body = [ProfileResponse])),
    tag = "Admin"
)]
pub async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProfileResponse>>, AppError> {
    let profiles = state.db.list_profiles().await?;
    Ok(Json(profiles.into_iter().map(ProfileResponse::from).collect()))
}

/// Change a user's role
#[utoipa::path(
    patch,
    path = "/api/admin/users/{user_id}/role",
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Role updated"),
        (status = 404, description = "Unknown user", body = ErrorResponse)
    ),
    tag = "Admin"
)]
#[tracing::instrument(skip_all, fields(admin = %admin.user_id))]
pub async fn update_user_role(
    State(state): State<AppState>,
    AuthUser(admin): AuthUser,
    Path(user_id): Path<Uuid>,
    Json(req): Json<UpdateRoleRequest>,
) -> Result<impl IntoResponse, AppError> {
    let updated = state.db.update_profile_role(user_id, req.role).await?;
    if !updated {
        return Err(AppError::NotFound(anyhow::anyhow!("User not found")));
    }

    tracing::info!(user_id = %user_id, role = %req.role, "Role updated");
    Ok(Json(serde_json::json!({ "success": true })))
}

/// Delete a user (identity first, then the profile)
#[utoipa::path(
    delete,
    path = "/api/admin/users/{user_id}",
    responses(
        (status = 200, description = "User deleted"),
        (status = 400, description = "Cannot delete own account", body = ErrorResponse)
    ),
    tag = "Admin"
)]
pub async fn delete_user(
    State(state): State<AppState>,
    AuthUser(admin): AuthUser,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    if admin.user_id == user_id {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Cannot delete your own account"
        )));
    }

    state.sessions.delete_user(user_id).await?;

    tracing::info!(user_id = %user_id, admin = %admin.user_id, "User deleted");
    Ok((StatusCode::OK, Json(serde_json::json!({ "success": true }))))
}
