//! Application error type shared across handlers, services, and middleware.
//!
//! Every fallible operation at a component boundary returns `AppError`; the
//! `IntoResponse` impl renders the uniform `{"error", "details"?}` JSON body.
//! Guard failures are never rendered as errors (they redirect instead).

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Bad request: {0}")]
    BadRequest(anyhow::Error),

    #[error("Not found: {0}")]
    NotFound(anyhow::Error),

    #[error("Authentication error: {0}")]
    AuthError(anyhow::Error),

    #[error("Forbidden: {0}")]
    Forbidden(anyhow::Error),

    #[error("Conflict: {0}")]
    Conflict(anyhow::Error),

    #[error("Too many requests: {0}")]
    TooManyRequests(String, Option<u64>),

    #[error("Upstream timeout: {0}")]
    Timeout(String),

    #[error("Upstream error: {0}")]
    Transport(String),

    #[error("Database error: {0}")]
    DatabaseError(anyhow::Error),

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),

    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        // Unique violations are caller-visible conflicts (duplicate invite
        // code, duplicate profile); everything else stays a database error.
        if let sqlx::Error::Database(ref db) = err {
            if db.code().as_deref() == Some("23505") {
                return AppError::Conflict(anyhow::anyhow!("Record already exists"));
            }
        }
        AppError::DatabaseError(anyhow::Error::new(err))
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        AppError::DatabaseError(anyhow::Error::new(err))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::Timeout(err.to_string())
        } else {
            AppError::Transport(err.to_string())
        }
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        AppError::AuthError(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: String,
            #[serde(skip_serializing_if = "Option::is_none")]
            details: Option<String>,
        }

        let (status, error_message, details, retry_after) = match self {
            AppError::ValidationError(err) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "Validation error".to_string(),
                Some(err.to_string()),
                None,
            ),
            AppError::BadRequest(err) => (StatusCode::BAD_REQUEST, err.to_string(), None, None),
            AppError::NotFound(err) => (StatusCode::NOT_FOUND, err.to_string(), None, None),
            AppError::AuthError(err) => (StatusCode::UNAUTHORIZED, err.to_string(), None, None),
            AppError::Forbidden(err) => (StatusCode::FORBIDDEN, err.to_string(), None, None),
            AppError::Conflict(err) => (StatusCode::CONFLICT, err.to_string(), None, None),
            AppError::TooManyRequests(msg, retry) => {
                (StatusCode::TOO_MANY_REQUESTS, msg, None, retry)
            }
            AppError::Timeout(msg) => (
                StatusCode::GATEWAY_TIMEOUT,
                "Upstream timeout".to_string(),
                Some(msg),
                None,
            ),
            AppError::Transport(msg) => (
                StatusCode::BAD_GATEWAY,
                "Upstream error".to_string(),
                Some(msg),
                None,
            ),
            AppError::DatabaseError(err) => {
                tracing::error!(error = %err, "Database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                    None,
                    None,
                )
            }
            AppError::ConfigError(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Configuration error".to_string(),
                Some(err.to_string()),
                None,
            ),
            AppError::InternalError(err) => {
                tracing::error!(error = %err, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                    None,
                )
            }
        };

        let mut res = (
            status,
            Json(ErrorResponse {
                error: error_message,
                details,
            }),
        )
            .into_response();

        if let Some(retry) = retry_after {
            res.headers_mut()
                .insert(axum::http::header::RETRY_AFTER, retry.into());
        }

        res
    }
}
