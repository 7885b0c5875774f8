//! Route guard for page navigation.
//!
//! Evaluates every non-API request against the route access tiers and either
//! passes it through (annotated with the resolved identity) or redirects.
//! Guard outcomes are never error responses; denial always looks like a
//! redirect.

use axum::{
    extract::{Request, State},
    http::HeaderValue,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::middleware::auth::{session_token, CurrentUser};
use crate::services::permissions::{evaluate_route, RequestIdentity, RouteDecision};
use crate::services::provider::verify_access_token;
use crate::AppState;

/// Paths the guard leaves alone: the JSON API and service endpoints carry
/// their own auth.
fn is_guard_exempt(path: &str) -> bool {
    path.starts_with("/api/")
        || path.starts_with("/docs")
        || path.starts_with("/.well-known/")
        || path == "/health"
}

pub async fn route_guard_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let path = req.uri().path().to_string();

    if is_guard_exempt(&path) {
        return next.run(req).await;
    }

    // Resolve the caller: token validity and profile presence are separate
    // facts - a valid session whose profile has not materialized yet is still
    // authenticated, just roleless.
    let mut current: Option<CurrentUser> = None;
    let identity = match session_token(req.headers()) {
        Some(token) => match verify_access_token(&token, &state.config.provider.jwt_secret) {
            Ok(claims) => {
                let profile = match claims.user_id() {
                    Ok(user_id) => state.sessions.refresh_profile(user_id).await.ok().flatten(),
                    Err(_) => None,
                };
                match profile {
                    Some(profile) => {
                        let role = profile.role;
                        current = Some(CurrentUser {
                            user_id: profile.user_id,
                            email: profile.email,
                            role,
                            display_name: profile.display_name,
                            access_token: token,
                        });
                        RequestIdentity::Authenticated(Some(role))
                    }
                    None => RequestIdentity::Authenticated(None),
                }
            }
            Err(_) => RequestIdentity::Anonymous,
        },
        None => RequestIdentity::Anonymous,
    };

    match evaluate_route(&path, identity) {
        RouteDecision::Allow => {
            let annotation = current.clone();
            if let Some(user) = current {
                req.extensions_mut().insert(user);
            }
            let mut response = next.run(req).await;
            if let Some(user) = annotation {
                annotate(&mut response, "x-user-id", &user.user_id.to_string());
                annotate(&mut response, "x-user-role", user.role.as_str());
                annotate(&mut response, "x-user-name", &user.display_name);
            }
            response
        }
        RouteDecision::RedirectToLogin { redirect_to } => {
            Redirect::to(&format!("/login?redirectTo={}", redirect_to)).into_response()
        }
        RouteDecision::RedirectToDashboard => Redirect::to("/dashboard").into_response(),
    }
}

fn annotate(response: &mut Response, name: &'static str, value: &str) {
    if let Ok(value) = HeaderValue::from_str(value) {
        response.headers_mut().insert(name, value);
    }
}
