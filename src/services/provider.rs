//! External auth platform client.
//!
//! Identity records, credentials, and token issuance are owned by the managed
//! auth platform; this module wraps its HTTP API behind the `AuthProvider`
//! trait. Access tokens are verified locally with the platform's published
//! HS256 secret - the service never issues tokens of its own.

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use crate::config::ProviderConfig;
use crate::error::AppError;
use crate::models::Role;

/// Identity record as the platform reports it.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderUser {
    pub id: Uuid,
    pub email: String,
    /// Opaque signup metadata; treated as untrusted input on every read.
    #[serde(default)]
    pub user_metadata: serde_json::Value,
}

/// Token bundle returned by sign-in / code exchange.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderSession {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: i64,
    pub user: ProviderUser,
}

/// Metadata attached to an identity at signup, consumed later by profile
/// upsert. This is the write side; reads go through `SignupHints`.
#[derive(Debug, Clone, Serialize)]
pub struct SignupMetadata {
    pub display_name: String,
    pub role: Role,
    pub invite_code: Option<String>,
    pub invited_by: Option<Uuid>,
}

/// Claims carried by a platform-issued access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: String,
    #[serde(default)]
    pub email: String,
    pub exp: i64,
}

impl AccessClaims {
    pub fn user_id(&self) -> Result<Uuid, AppError> {
        self.sub
            .parse()
            .map_err(|_| AppError::AuthError(anyhow::anyhow!("Malformed subject claim")))
    }
}

/// Verify a platform-issued access token and return its claims.
pub fn verify_access_token(token: &str, jwt_secret: &str) -> Result<AccessClaims, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_aud = false;

    let data = jsonwebtoken::decode::<AccessClaims>(
        token,
        &DecodingKey::from_secret(jwt_secret.as_bytes()),
        &validation,
    )?;
    Ok(data.claims)
}

/// Operations delegated to the auth platform.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Create an identity carrying signup metadata.
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: &SignupMetadata,
    ) -> Result<ProviderUser, AppError>;

    /// Password grant.
    async fn sign_in(&self, email: &str, password: &str) -> Result<ProviderSession, AppError>;

    /// Exchange a one-time auth code (magic link / OAuth) for a session.
    async fn exchange_code(&self, code: &str) -> Result<ProviderSession, AppError>;

    /// Fetch the identity a token belongs to.
    async fn get_user(&self, access_token: &str) -> Result<ProviderUser, AppError>;

    /// Administrative listing of all identities.
    async fn list_users(&self) -> Result<Vec<ProviderUser>, AppError>;

    /// Delete an identity (cascades to the profile via the caller).
    async fn delete_user(&self, user_id: Uuid) -> Result<(), AppError>;

    /// Revoke the session behind a token.
    async fn sign_out(&self, access_token: &str) -> Result<(), AppError>;
}

// ============================================================================
// HTTP implementation
// ============================================================================

pub struct HttpAuthProvider {
    client: reqwest::Client,
    base_url: String,
    service_role_key: String,
}

impl HttpAuthProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!(e)))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            service_role_key: config.service_role_key.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Map a non-success platform response to an error kind.
    async fn error_from_response(response: reqwest::Response) -> AppError {
        let status = response.status();
        let message = response
            .json::<serde_json::Value>()
            .await
            .ok()
            .and_then(|body| {
                body.get("error_description")
                    .or_else(|| body.get("msg"))
                    .or_else(|| body.get("message"))
                    .or_else(|| body.get("error"))
                    .and_then(|v| v.as_str())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| format!("Auth platform returned {}", status));

        if status == reqwest::StatusCode::NOT_FOUND {
            AppError::NotFound(anyhow::anyhow!(message))
        } else if status.is_client_error() {
            AppError::AuthError(anyhow::anyhow!(message))
        } else {
            AppError::Transport(message)
        }
    }

    async fn parse<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, AppError> {
        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }
        response
            .json::<T>()
            .await
            .map_err(|e| AppError::Transport(format!("Malformed platform response: {}", e)))
    }
}

#[async_trait]
impl AuthProvider for HttpAuthProvider {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: &SignupMetadata,
    ) -> Result<ProviderUser, AppError> {
        let response = self
            .client
            .post(self.url("/auth/v1/signup"))
            .header("apikey", &self.service_role_key)
            .json(&serde_json::json!({
                "email": email,
                "password": password,
                "data": metadata,
            }))
            .send()
            .await?;

        Self::parse(response).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<ProviderSession, AppError> {
        let response = self
            .client
            .post(self.url("/auth/v1/token?grant_type=password"))
            .header("apikey", &self.service_role_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;

        Self::parse(response).await
    }

    async fn exchange_code(&self, code: &str) -> Result<ProviderSession, AppError> {
        let response = self
            .client
            .post(self.url("/auth/v1/token?grant_type=authorization_code"))
            .header("apikey", &self.service_role_key)
            .json(&serde_json::json!({ "auth_code": code }))
            .send()
            .await?;

        Self::parse(response).await
    }

    async fn get_user(&self, access_token: &str) -> Result<ProviderUser, AppError> {
        let response = self
            .client
            .get(self.url("/auth/v1/user"))
            .header("apikey", &self.service_role_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        Self::parse(response).await
    }

    async fn list_users(&self) -> Result<Vec<ProviderUser>, AppError> {
        #[derive(Deserialize)]
        struct UserList {
            users: Vec<ProviderUser>,
        }

        let response = self
            .client
            .get(self.url("/auth/v1/admin/users"))
            .header("apikey", &self.service_role_key)
            .bearer_auth(&self.service_role_key)
            .send()
            .await?;

        Self::parse::<UserList>(response).await.map(|l| l.users)
    }

    async fn delete_user(&self, user_id: Uuid) -> Result<(), AppError> {
        let response = self
            .client
            .delete(self.url(&format!("/auth/v1/admin/users/{}", user_id)))
            .header("apikey", &self.service_role_key)
            .bearer_auth(&self.service_role_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }
        Ok(())
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AppError> {
        let response = self
            .client
            .post(self.url("/auth/v1/logout"))
            .header("apikey", &self.service_role_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }
        Ok(())
    }
}

// ============================================================================
// Mock implementation for tests
// ============================================================================

/// In-memory provider used by the test suite. Issues real HS256 tokens so the
/// verification path in middleware is exercised end to end.
pub struct MockAuthProvider {
    jwt_secret: String,
    users: dashmap::DashMap<String, ProviderUser>,
    codes: dashmap::DashMap<String, String>,
}

impl MockAuthProvider {
    pub fn new(jwt_secret: &str) -> Self {
        Self {
            jwt_secret: jwt_secret.to_string(),
            users: dashmap::DashMap::new(),
            codes: dashmap::DashMap::new(),
        }
    }

    /// Seed an identity directly, bypassing signup.
    pub fn seed_user(&self, email: &str, metadata: serde_json::Value) -> Uuid {
        let id = Uuid::new_v4();
        self.users.insert(
            email.to_lowercase(),
            ProviderUser {
                id,
                email: email.to_string(),
                user_metadata: metadata,
            },
        );
        id
    }

    /// Register an exchangeable one-time code for an existing identity.
    pub fn seed_code(&self, code: &str, email: &str) {
        self.codes.insert(code.to_string(), email.to_lowercase());
    }

    /// Mint a token for an identity the way the platform would.
    pub fn issue_token(&self, user: &ProviderUser) -> String {
        let claims = AccessClaims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            exp: (chrono::Utc::now() + chrono::Duration::hours(1)).timestamp(),
        };
        jsonwebtoken::encode(
            &jsonwebtoken::Header::new(Algorithm::HS256),
            &claims,
            &jsonwebtoken::EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .expect("mock token encoding cannot fail")
    }

    fn session_for(&self, user: ProviderUser) -> ProviderSession {
        ProviderSession {
            access_token: self.issue_token(&user),
            expires_in: 3600,
            user,
        }
    }
}

#[async_trait]
impl AuthProvider for MockAuthProvider {
    async fn sign_up(
        &self,
        email: &str,
        _password: &str,
        metadata: &SignupMetadata,
    ) -> Result<ProviderUser, AppError> {
        let key = email.to_lowercase();
        if self.users.contains_key(&key) {
            return Err(AppError::AuthError(anyhow::anyhow!(
                "User already registered"
            )));
        }
        let user = ProviderUser {
            id: Uuid::new_v4(),
            email: email.to_string(),
            user_metadata: serde_json::to_value(metadata)
                .map_err(|e| AppError::InternalError(anyhow::anyhow!(e)))?,
        };
        self.users.insert(key, user.clone());
        Ok(user)
    }

    async fn sign_in(&self, email: &str, _password: &str) -> Result<ProviderSession, AppError> {
        let user = self
            .users
            .get(&email.to_lowercase())
            .map(|u| u.clone())
            .ok_or_else(|| AppError::AuthError(anyhow::anyhow!("Invalid login credentials")))?;
        Ok(self.session_for(user))
    }

    async fn exchange_code(&self, code: &str) -> Result<ProviderSession, AppError> {
        let email = self
            .codes
            .remove(code)
            .map(|(_, email)| email)
            .ok_or_else(|| AppError::AuthError(anyhow::anyhow!("Invalid auth code")))?;
        let user = self
            .users
            .get(&email)
            .map(|u| u.clone())
            .ok_or_else(|| AppError::AuthError(anyhow::anyhow!("Unknown identity")))?;
        Ok(self.session_for(user))
    }

    async fn get_user(&self, access_token: &str) -> Result<ProviderUser, AppError> {
        let claims = verify_access_token(access_token, &self.jwt_secret)?;
        let user_id = claims.user_id()?;
        self.users
            .iter()
            .find(|u| u.id == user_id)
            .map(|u| u.clone())
            .ok_or_else(|| AppError::AuthError(anyhow::anyhow!("Unknown identity")))
    }

    async fn list_users(&self) -> Result<Vec<ProviderUser>, AppError> {
        Ok(self.users.iter().map(|u| u.clone()).collect())
    }

    async fn delete_user(&self, user_id: Uuid) -> Result<(), AppError> {
        let email = self
            .users
            .iter()
            .find(|u| u.id == user_id)
            .map(|u| u.email.to_lowercase());
        match email {
            Some(email) => {
                self.users.remove(&email);
                Ok(())
            }
            None => Err(AppError::NotFound(anyhow::anyhow!("User not found"))),
        }
    }

    async fn sign_out(&self, _access_token: &str) -> Result<(), AppError> {
        Ok(())
    }
}
