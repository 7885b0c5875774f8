//! Admin invite management: reusable codes and single-recipient tokens.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::dtos::invite::{
    CreateInviteCodeRequest, CreateInviteTokenRequest, CreateInviteTokenResponse,
    InviteCodeResponse, ToggleInviteCodeRequest,
};
use crate::dtos::ErrorResponse;
use crate::error::AppError;
use crate::middleware::auth::AuthUser;
use crate::models::InviteCode;
use crate::utils::{normalize_invite_code, ValidatedJson};
use crate::AppState;

/// Create a reusable invite code
#[utoipa::path(
    post,
    path = "/api/admin/invite-codes",
    request_body = CreateInviteCodeRequest,
    responses(
        (status = 201, description = "Code created", body = InviteCodeResponse),
        (status = 409, description = "Code already exists", body = ErrorResponse)
    ),
    tag = "Invites"
)]
#[tracing::instrument(skip_all, fields(admin = %user.user_id))]
pub async fn create_invite_code(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ValidatedJson(req): ValidatedJson<CreateInviteCodeRequest>,
) -> Result<impl IntoResponse, AppError> {
    let invite = InviteCode::new(
        normalize_invite_code(&req.code),
        req.role,
        req.max_uses,
        req.expires_at,
        Some(user.user_id),
    );

    state.db.insert_invite_code(&invite).await?;

    tracing::info!(code = %invite.code, role = %invite.role, "Invite code created");

    Ok((StatusCode::CREATED, Json(InviteCodeResponse::from(invite))))
}

/// List all invite codes, newest first
#[utoipa::path(
    get,
    path = "/api/admin/invite-codes",
    responses((status = 200, description = "All codes", body = [InviteCodeResponse])),
    tag = "Invites"
)]
pub async fn list_invite_codes(
    State(state): State<AppState>,
) -> Result<Json<Vec<InviteCodeResponse>>, AppError> {
    let codes = state.db.list_invite_codes().await?;
    Ok(Json(codes.into_iter().map(InviteCodeResponse::from).collect()))
}

/// Enable or disable an invite code
#[utoipa::path(
    patch,
    path = "/api/admin/invite-codes/{code_id}",
    request_body = ToggleInviteCodeRequest,
    responses(
        (status = 200, description = "Code updated"),
        (status = 404, description = "Unknown code", body = ErrorResponse)
    ),
    tag = "Invites"
)]
pub async fn toggle_invite_code(
    State(state): State<AppState>,
    Path(code_id): Path<Uuid>,
    Json(req): Json<ToggleInviteCodeRequest>,
) -> Result<impl IntoResponse, AppError> {
    let updated = state.db.set_invite_code_active(code_id, req.is_active).await?;
    if !updated {
        return Err(AppError::NotFound(anyhow::anyhow!("Invite code not found")));
    }
    Ok(Json(serde_json::json!({ "success": true })))
}

/// Generate a single-recipient invite token
#[utoipa::path(
    post,
    path = "/api/admin/invites",
    request_body = CreateInviteTokenRequest,
    responses((status = 201, description = "Invite generated", body = CreateInviteTokenResponse)),
    tag = "Invites"
)]
#[tracing::instrument(skip_all, fields(admin = %user.user_id))]
pub async fn create_invite_token(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ValidatedJson(req): ValidatedJson<CreateInviteTokenRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (token, record) = state
        .sessions
        .generate_invite_token(&req.email, req.role, req.display_name, Some(user.email))
        .await?;

    // Same join URL shape the frontend's invite emails use.
    let invite_url = format!("{}/join/{}/{}", state.config.app_url, record.role, token);

    tracing::info!(email = %record.email, role = %record.role, "Invite token generated");

    Ok((
        StatusCode::CREATED,
        Json(CreateInviteTokenResponse {
            token,
            invite_url,
            email: record.email,
            role: record.role,
            expires_at: record.expires_at,
        }),
    ))
}
