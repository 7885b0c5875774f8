//! Session authentication for the JSON API.
//!
//! Accepts the session either as a bearer token or as the session cookie the
//! login handler sets. Resolved identity is stored in request extensions for
//! handlers to extract.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use uuid::Uuid;

use crate::dtos::ErrorResponse;
use crate::models::Role;
use crate::AppState;

/// Name of the session cookie carrying the platform access token.
pub const SESSION_COOKIE: &str = "lb_session";

/// Resolved request identity available to handlers behind `auth_middleware`.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
    pub display_name: String,
    pub access_token: String,
}

/// Pull the session token from the Authorization header or the session
/// cookie.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
    {
        return Some(token.to_string());
    }

    CookieJar::from_headers(headers)
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
}

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

/// Middleware to require an authenticated session with a materialized
/// profile.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, Response> {
    let Some(token) = session_token(req.headers()) else {
        return Err(unauthorized("Missing session"));
    };

    let Some(profile) = state.sessions.current_profile(&token).await else {
        return Err(unauthorized("Invalid or expired session"));
    };

    req.extensions_mut().insert(CurrentUser {
        user_id: profile.user_id,
        email: profile.email,
        role: profile.role,
        display_name: profile.display_name,
        access_token: token,
    });

    Ok(next.run(req).await)
}

/// Middleware gating admin-only routes; must run behind `auth_middleware`.
/// Admin capability is what the permission table says it is, not a hardcoded
/// role comparison.
pub async fn require_admin_middleware(req: Request, next: Next) -> Result<Response, Response> {
    use crate::services::permissions::{has_permission, Permission};

    let user = req.extensions().get::<CurrentUser>().cloned();
    match user {
        Some(user) if has_permission(Some(user.role), Permission::CanManageUsers, None, false) => {
            Ok(next.run(req).await)
        }
        Some(user) => {
            tracing::warn!(user_id = %user.user_id, "Non-admin attempted admin route");
            Err((
                StatusCode::FORBIDDEN,
                Json(ErrorResponse {
                    error: "Admin access required".to_string(),
                }),
            )
                .into_response())
        }
        None => Err(unauthorized("Missing session")),
    }
}

/// Extractor to easily get the current user in handlers.
pub struct AuthUser(pub CurrentUser);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts.extensions.get::<CurrentUser>().ok_or_else(|| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Identity missing from request extensions".to_string(),
                }),
            )
                .into_response()
        })?;

        Ok(AuthUser(user.clone()))
    }
}
