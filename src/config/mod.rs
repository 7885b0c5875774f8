use serde::Deserialize;
use std::env;

use crate::error::AppError;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub port: u16,
    /// Public base URL of the application, used to build redirect and invite
    /// URLs.
    pub app_url: String,
    pub database: DatabaseConfig,
    pub provider: ProviderConfig,
    pub security: SecurityConfig,
    pub swagger: SwaggerConfig,
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    Prod,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Connection settings for the external auth platform.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    pub url: String,
    pub service_role_key: String,
    /// Secret the platform signs access tokens with; used for verification
    /// only.
    pub jwt_secret: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    pub allowed_origins: Vec<String>,
    /// Gates the one-time admin promotion endpoint.
    pub admin_setup_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SwaggerConfig {
    pub enabled: SwaggerMode,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum SwaggerMode {
    Public,
    Disabled,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    pub login_attempts: u32,
    pub login_window_seconds: u64,
    pub signup_attempts: u32,
    pub signup_window_seconds: u64,
    pub global_ip_limit: u32,
    pub global_ip_window_seconds: u64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let env_str = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string());
        let environment: Environment = env_str
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let is_prod = environment == Environment::Prod;

        let config = AppConfig {
            environment: environment.clone(),
            service_name: get_env("SERVICE_NAME", Some("logbook-service"), is_prod)?,
            service_version: get_env("SERVICE_VERSION", Some(env!("CARGO_PKG_VERSION")), is_prod)?,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            port: get_env("PORT", Some("8080"), is_prod)?
                .parse()
                .map_err(|e: std::num::ParseIntError| {
                    AppError::ConfigError(anyhow::anyhow!(e.to_string()))
                })?,
            app_url: get_env("APP_URL", Some("http://localhost:3000"), is_prod)?,
            database: DatabaseConfig {
                url: get_env("DATABASE_URL", None, is_prod)?,
                max_connections: get_env("DATABASE_MAX_CONNECTIONS", Some("10"), is_prod)?
                    .parse()
                    .unwrap_or(10),
                min_connections: get_env("DATABASE_MIN_CONNECTIONS", Some("1"), is_prod)?
                    .parse()
                    .unwrap_or(1),
            },
            provider: ProviderConfig {
                url: get_env("AUTH_PLATFORM_URL", None, is_prod)?,
                service_role_key: get_env("AUTH_SERVICE_ROLE_KEY", None, is_prod)?,
                jwt_secret: get_env("AUTH_JWT_SECRET", None, is_prod)?,
                timeout_seconds: get_env("PROVIDER_TIMEOUT_SECONDS", Some("10"), is_prod)?
                    .parse()
                    .unwrap_or(10),
            },
            security: SecurityConfig {
                allowed_origins: get_env("ALLOWED_ORIGINS", Some("http://localhost:3000"), is_prod)?
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .collect(),
                admin_setup_key: get_env("ADMIN_SETUP_KEY", None, true)?,
            },
            swagger: SwaggerConfig {
                enabled: get_env("ENABLE_SWAGGER", Some("public"), is_prod)?
                    .parse()
                    .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?,
            },
            rate_limit: RateLimitConfig {
                login_attempts: get_env("RATE_LIMIT_LOGIN_ATTEMPTS", Some("5"), is_prod)?
                    .parse()
                    .unwrap_or(5),
                login_window_seconds: get_env(
                    "RATE_LIMIT_LOGIN_WINDOW_SECONDS",
                    Some("900"),
                    is_prod,
                )?
                .parse()
                .unwrap_or(900),
                signup_attempts: get_env("RATE_LIMIT_SIGNUP_ATTEMPTS", Some("3"), is_prod)?
                    .parse()
                    .unwrap_or(3),
                signup_window_seconds: get_env(
                    "RATE_LIMIT_SIGNUP_WINDOW_SECONDS",
                    Some("3600"),
                    is_prod,
                )?
                .parse()
                .unwrap_or(3600),
                global_ip_limit: get_env("RATE_LIMIT_GLOBAL_IP_LIMIT", Some("100"), is_prod)?
                    .parse()
                    .unwrap_or(100),
                global_ip_window_seconds: get_env(
                    "RATE_LIMIT_GLOBAL_IP_WINDOW_SECONDS",
                    Some("60"),
                    is_prod,
                )?
                .parse()
                .unwrap_or(60),
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.port == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "PORT must be greater than 0"
            )));
        }

        if self.provider.timeout_seconds == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "PROVIDER_TIMEOUT_SECONDS must be positive"
            )));
        }

        if self.security.admin_setup_key.len() < 16 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "ADMIN_SETUP_KEY must be at least 16 characters"
            )));
        }

        if self.environment == Environment::Prod {
            if self.security.allowed_origins.iter().any(|o| o == "*") {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "Wildcard CORS origin not allowed in production"
                )));
            }

            if self.swagger.enabled == SwaggerMode::Public {
                tracing::warn!(
                    "Swagger is publicly accessible in production - consider disabling it"
                );
            }
        }

        Ok(())
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required in production but not set",
                    key
                ))))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required but not set",
                    key
                ))))
            }
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}

impl std::str::FromStr for SwaggerMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "public" => Ok(SwaggerMode::Public),
            "disabled" => Ok(SwaggerMode::Disabled),
            _ => Err(format!("Invalid swagger mode: {}", s)),
        }
    }
}
