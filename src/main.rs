use std::net::SocketAddr;
use std::sync::Arc;

use tokio::signal;
use tracing_subscriber::EnvFilter;

use logbook_service::{
    build_router,
    config::AppConfig,
    db,
    middleware::rate_limit::create_ip_rate_limiter,
    services::{Database, HttpAuthProvider, SessionService},
    AppState,
};

#[tokio::main]
async fn main() -> Result<(), logbook_service::error::AppError> {
    dotenvy::dotenv().ok();

    // Load configuration - fail fast if invalid
    let config = AppConfig::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .init();

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        "Starting logbook service"
    );

    // Initialize database connection and schema
    let pool = db::create_pool(&config.database).await?;
    db::run_migrations(&pool).await?;
    let database = Database::new(pool);

    // Auth platform client
    let provider = Arc::new(HttpAuthProvider::new(&config.provider)?);
    tracing::info!(url = %config.provider.url, "Auth platform client initialized");

    let sessions = SessionService::new(
        database.clone(),
        provider.clone(),
        config.provider.jwt_secret.clone(),
    );

    // Rate limiters
    let login_rate_limiter = create_ip_rate_limiter(
        config.rate_limit.login_attempts,
        config.rate_limit.login_window_seconds,
    );
    let signup_rate_limiter = create_ip_rate_limiter(
        config.rate_limit.signup_attempts,
        config.rate_limit.signup_window_seconds,
    );
    let ip_rate_limiter = create_ip_rate_limiter(
        config.rate_limit.global_ip_limit,
        config.rate_limit.global_ip_window_seconds,
    );
    tracing::info!("Rate limiters initialized: Login, Signup, and Global IP");

    let state = AppState {
        config: config.clone(),
        db: database,
        provider,
        sessions,
        login_rate_limiter,
        signup_rate_limiter,
        ip_rate_limiter,
    };

    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Service shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
