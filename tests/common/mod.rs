//! Test helper module for logbook-service integration tests.
//!
//! Tests that need PostgreSQL read TEST_DATABASE_URL; when it is not set,
//! `TestApp::try_spawn` returns None and the test skips itself. The auth
//! platform is always the in-memory mock.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::postgres::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

use logbook_service::{
    build_router,
    config::{
        AppConfig, DatabaseConfig, Environment, ProviderConfig, RateLimitConfig, SecurityConfig,
        SwaggerConfig, SwaggerMode,
    },
    db,
    middleware::rate_limit::create_ip_rate_limiter,
    models::{Profile, Role},
    services::{AuthProvider, Database, MockAuthProvider, SessionService},
    AppState,
};

pub const TEST_JWT_SECRET: &str = "test-jwt-secret";
pub const TEST_SETUP_KEY: &str = "test-setup-key-0123456789";

/// Test application with an in-process router and a mock auth platform.
pub struct TestApp {
    pub state: AppState,
    pub provider: Arc<MockAuthProvider>,
    pub router: Router,
}

impl TestApp {
    /// Spawn the test application, or None when no test database is
    /// configured.
    pub async fn try_spawn() -> Option<Self> {
        let pool = match create_test_pool().await {
            Some(pool) => pool,
            None => {
                eprintln!("TEST_DATABASE_URL not set; skipping database-backed test");
                return None;
            }
        };

        let config = create_test_config();
        let database = Database::new(pool);
        let provider = Arc::new(MockAuthProvider::new(TEST_JWT_SECRET));
        let sessions = SessionService::new(
            database.clone(),
            provider.clone(),
            TEST_JWT_SECRET.to_string(),
        );

        let state = AppState {
            config: config.clone(),
            db: database,
            provider: provider.clone(),
            sessions,
            login_rate_limiter: create_ip_rate_limiter(
                config.rate_limit.login_attempts,
                config.rate_limit.login_window_seconds,
            ),
            signup_rate_limiter: create_ip_rate_limiter(
                config.rate_limit.signup_attempts,
                config.rate_limit.signup_window_seconds,
            ),
            ip_rate_limiter: create_ip_rate_limiter(
                config.rate_limit.global_ip_limit,
                config.rate_limit.global_ip_window_seconds,
            ),
        };

        let router = build_router(state.clone());

        Some(TestApp {
            state,
            provider,
            router,
        })
    }

    /// Seed an identity plus a materialized profile and return a session
    /// token for it.
    pub async fn seed_session(&self, email: &str, role: Role) -> (Uuid, String) {
        let user_id = self.provider.seed_user(email, serde_json::json!({}));
        let profile = Profile::new(
            user_id,
            email.to_string(),
            role,
            "Test User".to_string(),
            None,
            None,
        );
        self.state
            .db
            .insert_profile_if_absent(&profile)
            .await
            .expect("profile insert failed");

        let user = self
            .provider
            .list_users()
            .await
            .unwrap()
            .into_iter()
            .find(|u| u.id == user_id)
            .unwrap();
        (user_id, self.provider.issue_token(&user))
    }

    /// Drive one request through the router.
    pub async fn request(&self, req: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(req)
            .await
            .expect("router request failed")
    }

    /// GET helper with an optional bearer token.
    pub async fn get(&self, path: &str, token: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().uri(path);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        self.request(builder.body(Body::empty()).unwrap()).await
    }

    /// POST JSON helper with an optional bearer token.
    pub async fn post_json(
        &self,
        path: &str,
        body: serde_json::Value,
        token: Option<&str>,
    ) -> Response<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        self.request(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }
}

/// Connect to the test database, or None when TEST_DATABASE_URL is unset.
pub async fn create_test_pool() -> Option<PgPool> {
    let url = std::env::var("TEST_DATABASE_URL").ok()?;
    let config = DatabaseConfig {
        url,
        max_connections: 5,
        min_connections: 1,
    };

    let pool = db::create_pool(&config)
        .await
        .expect("Failed to connect to test database");
    db::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    Some(pool)
}

/// Create a test configuration. Tests never read the process environment so
/// each value is fixed here.
pub fn create_test_config() -> AppConfig {
    AppConfig {
        environment: Environment::Dev,
        service_name: "logbook-service-test".to_string(),
        service_version: "0.0.0".to_string(),
        log_level: "debug".to_string(),
        port: 0,
        app_url: "http://localhost:3000".to_string(),
        database: DatabaseConfig {
            url: std::env::var("TEST_DATABASE_URL").unwrap_or_default(),
            max_connections: 5,
            min_connections: 1,
        },
        provider: ProviderConfig {
            url: "http://localhost:9999".to_string(),
            service_role_key: "test-service-key".to_string(),
            jwt_secret: TEST_JWT_SECRET.to_string(),
            timeout_seconds: 5,
        },
        security: SecurityConfig {
            allowed_origins: vec!["http://localhost:3000".to_string()],
            admin_setup_key: TEST_SETUP_KEY.to_string(),
        },
        swagger: SwaggerConfig {
            enabled: SwaggerMode::Disabled,
        },
        rate_limit: RateLimitConfig {
            login_attempts: 1000,
            login_window_seconds: 60,
            signup_attempts: 1000,
            signup_window_seconds: 60,
            global_ip_limit: 10_000,
            global_ip_window_seconds: 60,
        },
    }
}

/// Read a JSON response body.
pub async fn read_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("failed to read body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("response was not JSON")
}

/// Unique suffix so concurrently running tests never collide on codes or
/// emails.
pub fn unique(prefix: &str) -> String {
    format!("{}{}", prefix, &Uuid::new_v4().simple().to_string()[..8])
}

/// Unique invite code in stored (uppercase) form.
pub fn unique_code(prefix: &str) -> String {
    unique(prefix).to_uppercase()
}
