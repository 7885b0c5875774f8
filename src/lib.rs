pub mod config;
pub mod db;
pub mod dtos;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::middleware::rate_limit::{ip_rate_limit_middleware, IpRateLimiter};
use crate::services::{AuthProvider, Database, SessionService};

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        handlers::auth::signup,
        handlers::auth::login,
        handlers::auth::logout,
        handlers::auth::validate_code,
        handlers::profile::get_me,
        handlers::profile::update_me,
        handlers::admin::setup,
        handlers::admin::list_users,
        handlers::admin::update_user_role,
        handlers::admin::delete_user,
        handlers::invite::create_invite_code,
        handlers::invite::list_invite_codes,
        handlers::invite::toggle_invite_code,
        handlers::invite::create_invite_token,
    ),
    components(
        schemas(
            dtos::ErrorResponse,
            dtos::auth::SignupRequest,
            dtos::auth::SignupResponse,
            dtos::auth::LoginRequest,
            dtos::auth::SessionResponse,
            dtos::auth::ValidateCodeResponse,
            dtos::admin::AdminSetupRequest,
            dtos::admin::AdminSetupResponse,
            dtos::admin::UpdateRoleRequest,
            dtos::admin::UpdateProfileRequest,
            dtos::invite::CreateInviteCodeRequest,
            dtos::invite::InviteCodeResponse,
            dtos::invite::ToggleInviteCodeRequest,
            dtos::invite::CreateInviteTokenRequest,
            dtos::invite::CreateInviteTokenResponse,
            models::Role,
            models::ProfileResponse,
        )
    ),
    tags(
        (name = "Authentication", description = "Signup, login, and session management"),
        (name = "Invites", description = "Invite code and invite token administration"),
        (name = "Profile", description = "Own profile management"),
        (name = "Admin", description = "Administrative operations"),
        (name = "Observability", description = "Service health")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub db: Database,
    pub provider: Arc<dyn AuthProvider>,
    pub sessions: SessionService,
    pub login_rate_limiter: IpRateLimiter,
    pub signup_rate_limiter: IpRateLimiter,
    pub ip_rate_limiter: IpRateLimiter,
}

pub fn build_router(state: AppState) -> Router {
    // Admin management routes: session + admin role required.
    let admin_routes = Router::new()
        .route(
            "/api/admin/invite-codes",
            post(handlers::invite::create_invite_code).get(handlers::invite::list_invite_codes),
        )
        .route(
            "/api/admin/invite-codes/:code_id",
            patch(handlers::invite::toggle_invite_code),
        )
        .route("/api/admin/invites", post(handlers::invite::create_invite_token))
        .route("/api/admin/users", get(handlers::admin::list_users))
        .route(
            "/api/admin/users/:user_id/role",
            patch(handlers::admin::update_user_role),
        )
        .route(
            "/api/admin/users/:user_id",
            axum::routing::delete(handlers::admin::delete_user),
        )
        .layer(from_fn(middleware::auth::require_admin_middleware))
        .layer(from_fn_with_state(
            state.clone(),
            middleware::auth::auth_middleware,
        ));

    // Own-profile routes: any authenticated session.
    let profile_routes = Router::new()
        .route(
            "/api/profile/me",
            get(handlers::profile::get_me).patch(handlers::profile::update_me),
        )
        .layer(from_fn_with_state(
            state.clone(),
            middleware::auth::auth_middleware,
        ));

    // Login/signup carry their own tighter IP limits.
    let login_route = Router::new()
        .route("/api/auth/login", post(handlers::auth::login))
        .layer(from_fn_with_state(
            state.login_rate_limiter.clone(),
            ip_rate_limit_middleware,
        ));

    let signup_route = Router::new()
        .route("/api/auth/signup", post(handlers::auth::signup))
        .layer(from_fn_with_state(
            state.signup_rate_limiter.clone(),
            ip_rate_limit_middleware,
        ));

    let mut app = Router::new().route("/health", get(health_check));

    let swagger_enabled = match state.config.environment {
        config::Environment::Dev => true,
        config::Environment::Prod => state.config.swagger.enabled == config::SwaggerMode::Public,
    };

    if swagger_enabled {
        app = app.merge(SwaggerUi::new("/docs").url("/.well-known/openapi.json", ApiDoc::openapi()));
    }

    app.route("/api/auth/callback", get(handlers::auth::callback))
        .route(
            "/api/auth/simple-callback",
            get(handlers::auth::simple_callback),
        )
        .route("/api/auth/validate-code", get(handlers::auth::validate_code))
        .route("/api/auth/verify-invite", get(handlers::auth::verify_invite))
        // Logout clears the cookie even when the session is already dead, so
        // it sits outside the auth middleware.
        .route("/api/auth/logout", post(handlers::auth::logout))
        .route("/api/admin/setup", post(handlers::admin::setup))
        .route("/api/auth/simple-setup", post(handlers::admin::simple_setup))
        .merge(login_route)
        .merge(signup_route)
        .merge(admin_routes)
        .merge(profile_routes)
        .fallback(handlers::pages::shell)
        .layer(from_fn_with_state(
            state.clone(),
            middleware::guard::route_guard_middleware,
        ))
        .layer(from_fn_with_state(
            state.ip_rate_limiter.clone(),
            ip_rate_limit_middleware,
        ))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(
                    state
                        .config
                        .security
                        .allowed_origins
                        .iter()
                        .filter_map(|o| o.parse::<axum::http::HeaderValue>().ok())
                        .collect::<Vec<axum::http::HeaderValue>>(),
                )
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::PATCH,
                    axum::http::Method::DELETE,
                    axum::http::Method::OPTIONS,
                ])
                .allow_headers([
                    axum::http::header::AUTHORIZATION,
                    axum::http::header::CONTENT_TYPE,
                ])
                .allow_credentials(true),
        )
        .with_state(state)
}

/// Service health check
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy"),
        (status = 500, description = "Service is unhealthy")
    ),
    tag = "Observability"
)]
pub async fn health_check(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Result<axum::Json<serde_json::Value>, AppError> {
    state.db.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "Database health check failed");
        e
    })?;

    Ok(axum::Json(serde_json::json!({
        "status": "healthy",
        "service": state.config.service_name,
        "version": state.config.service_version,
        "environment": format!("{:?}", state.config.environment),
        "checks": {
            "postgres": "up"
        }
    })))
}
