//! Authentication handlers: signup, login, logout, invite validation, and
//! the auth callback flows.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Serialize;
use utoipa::ToSchema;

use crate::dtos::auth::{
    CallbackQuery, LoginRequest, SessionResponse, SignupRequest, SignupResponse,
    ValidateCodeQuery, ValidateCodeResponse,
};
use crate::dtos::ErrorResponse;
use crate::error::AppError;
use crate::middleware::auth::{session_token, SESSION_COOKIE};
use crate::models::Role;
use crate::utils::ValidatedJson;
use crate::AppState;

fn session_cookie(token: &str, max_age_seconds: i64) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(max_age_seconds.max(60)))
        .build()
}

/// Sign up with an invite code
#[utoipa::path(
    post,
    path = "/api/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Identity created", body = SignupResponse),
        (status = 400, description = "Invalid invite code", body = ErrorResponse),
        (status = 401, description = "Auth platform rejected the signup", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn signup(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<SignupRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .sessions
        .sign_up_with_invite(&req.email, &req.password, &req.display_name, &req.invite_code)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            user_id: user.id.to_string(),
            message: "Signup successful. Check your email to confirm your account.".to_string(),
        }),
    ))
}

/// Sign in with email and password
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session established", body = SessionResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let session = state.sessions.sign_in(&req.email, &req.password).await?;

    let jar = jar.add(session_cookie(&session.access_token, session.expires_in));

    Ok((
        jar,
        Json(SessionResponse {
            access_token: session.access_token,
            token_type: "Bearer".to_string(),
            expires_in: session.expires_in,
        }),
    ))
}

/// Sign out
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses((status = 200, description = "Session cleared")),
    tag = "Authentication"
)]
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: axum::http::HeaderMap,
) -> impl IntoResponse {
    // Best effort at the platform; the local cookie is cleared regardless.
    if let Some(token) = session_token(&headers) {
        if let Err(err) = state.sessions.sign_out(&token).await {
            tracing::warn!(error = %err, "Platform sign-out failed");
        }
    }

    let jar = jar.remove(Cookie::build((SESSION_COOKIE, "")).path("/").build());
    (jar, Json(serde_json::json!({ "success": true })))
}

/// Validate an invite code before signup
#[utoipa::path(
    get,
    path = "/api/auth/validate-code",
    params(ValidateCodeQuery),
    responses((status = 200, description = "Validation outcome", body = ValidateCodeResponse)),
    tag = "Authentication"
)]
pub async fn validate_code(
    State(state): State<AppState>,
    Query(query): Query<ValidateCodeQuery>,
) -> Result<Json<ValidateCodeResponse>, AppError> {
    let outcome = state.sessions.validate_invite_code(&query.code).await?;
    Ok(Json(ValidateCodeResponse {
        valid: outcome.valid,
        role: outcome.role,
        error: outcome.error,
    }))
}

#[derive(Debug, serde::Deserialize)]
pub struct VerifyInviteQuery {
    pub token: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VerifyInviteResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// Verify a single-recipient invite token (join page pre-check).
pub async fn verify_invite(
    State(state): State<AppState>,
    Query(query): Query<VerifyInviteQuery>,
) -> Result<Json<VerifyInviteResponse>, AppError> {
    match state.sessions.verify_invite_token(&query.token).await? {
        Some(invite) => Ok(Json(VerifyInviteResponse {
            valid: true,
            email: Some(invite.email),
            role: Some(invite.role),
            display_name: invite.display_name,
        })),
        None => Ok(Json(VerifyInviteResponse {
            valid: false,
            email: None,
            role: None,
            display_name: None,
        })),
    }
}

/// Auth callback: exchange the one-time code, apply an invite token when
/// present, materialize the profile, and land on the dashboard. Failures
/// redirect back to the login page with an error marker.
pub async fn callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<CallbackQuery>,
) -> Response {
    let Some(code) = query.code else {
        return Redirect::to("/login").into_response();
    };

    match state
        .sessions
        .complete_callback(&code, query.invite_token.as_deref())
        .await
    {
        Ok((session, profile)) => {
            tracing::info!(user_id = %profile.user_id, "Callback completed");
            let jar = jar.add(session_cookie(&session.access_token, session.expires_in));
            (jar, Redirect::to("/dashboard")).into_response()
        }
        Err(failure) => {
            tracing::error!(error = %failure.error, marker = failure.marker, "Callback failed");
            Redirect::to(&format!("/login?error={}", failure.marker)).into_response()
        }
    }
}

/// Legacy alias for the callback kept for older magic-link emails.
pub async fn simple_callback(
    state: State<AppState>,
    jar: CookieJar,
    query: Query<CallbackQuery>,
) -> Response {
    callback(state, jar, query).await
}
