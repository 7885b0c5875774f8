//! Auth session facade.
//!
//! The single entry point UI-facing handlers use for signup, login, logout,
//! and profile resolution. Wraps the auth platform and the store; returns
//! uniform results and never panics across the public boundary.

use std::sync::Arc;

use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{InviteToken, Profile, Role};
use crate::services::provider::{
    verify_access_token, AuthProvider, ProviderSession, ProviderUser, SignupMetadata,
};
use crate::services::Database;
use crate::utils::{display_name_from_email, normalize_invite_code};

/// Outcome of a read-only invite-code validation (form pre-check; grants
/// nothing).
#[derive(Debug, Clone)]
pub struct CodeValidation {
    pub valid: bool,
    pub role: Option<Role>,
    pub error: Option<String>,
}

/// A callback failure, tagged with the redirect error marker the login page
/// understands.
#[derive(Debug)]
pub struct CallbackError {
    pub marker: &'static str,
    pub error: AppError,
}

#[derive(Clone)]
pub struct SessionService {
    db: Database,
    provider: Arc<dyn AuthProvider>,
    jwt_secret: String,
}

impl SessionService {
    pub fn new(db: Database, provider: Arc<dyn AuthProvider>, jwt_secret: String) -> Self {
        Self {
            db,
            provider,
            jwt_secret,
        }
    }

    // ==================== Invite codes ====================

    /// Validate an invite code without consuming it.
    pub async fn validate_invite_code(&self, code: &str) -> Result<CodeValidation, AppError> {
        let normalized = normalize_invite_code(code);
        if normalized.is_empty() {
            return Ok(CodeValidation {
                valid: false,
                role: None,
                error: Some("Invite code is required".to_string()),
            });
        }

        match self.db.find_invite_code(&normalized).await? {
            Some(invite) if invite.is_valid() => Ok(CodeValidation {
                valid: true,
                role: Some(invite.role),
                error: None,
            }),
            _ => Ok(CodeValidation {
                valid: false,
                role: None,
                error: Some("Invalid or expired invite code".to_string()),
            }),
        }
    }

    // ==================== Signup / login / logout ====================

    /// Sign up a new identity with an invite code.
    ///
    /// The code is consumed atomically before the identity is created; if
    /// identity creation then fails, the consumed use is released so the code
    /// is not burned by a failed attempt.
    pub async fn sign_up_with_invite(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
        invite_code: &str,
    ) -> Result<ProviderUser, AppError> {
        let normalized = normalize_invite_code(invite_code);

        let Some(consumed) = self.db.consume_invite_code(&normalized).await? else {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Invalid or expired invite code"
            )));
        };

        let metadata = SignupMetadata {
            display_name: display_name.to_string(),
            role: consumed.role,
            invite_code: Some(consumed.code.clone()),
            invited_by: consumed.created_by,
        };

        match self.provider.sign_up(email, password, &metadata).await {
            Ok(user) => {
                tracing::info!(user_id = %user.id, role = %consumed.role, "Signup completed");
                Ok(user)
            }
            Err(err) => {
                // Compensation: the use was taken but no identity exists.
                if let Err(release_err) = self.db.release_invite_code(&consumed.code).await {
                    tracing::warn!(
                        code = %consumed.code,
                        error = %release_err,
                        "Failed to release invite code after signup failure"
                    );
                }
                Err(err)
            }
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<ProviderSession, AppError> {
        self.provider.sign_in(email, password).await
    }

    pub async fn sign_out(&self, access_token: &str) -> Result<(), AppError> {
        self.provider.sign_out(access_token).await
    }

    // ==================== Profile resolution ====================

    /// Resolve the profile behind an access token. None on any failure - an
    /// invalid token and a missing profile look the same to callers.
    pub async fn current_profile(&self, access_token: &str) -> Option<Profile> {
        let claims = match verify_access_token(access_token, &self.jwt_secret) {
            Ok(claims) => claims,
            Err(err) => {
                tracing::debug!(error = %err, "Access token rejected");
                return None;
            }
        };
        let user_id = claims.user_id().ok()?;
        self.refresh_profile(user_id).await.ok().flatten()
    }

    /// Re-fetch a profile by identity id.
    pub async fn refresh_profile(&self, user_id: Uuid) -> Result<Option<Profile>, AppError> {
        self.db.find_profile_by_id(user_id).await
    }

    // ==================== Callback / profile upsert ====================

    /// Complete an auth callback: exchange the one-time code, apply an invite
    /// token when present, and materialize the profile.
    pub async fn complete_callback(
        &self,
        code: &str,
        invite_token: Option<&str>,
    ) -> Result<(ProviderSession, Profile), CallbackError> {
        let session = self
            .provider
            .exchange_code(code)
            .await
            .map_err(|error| CallbackError {
                marker: "auth_error",
                error,
            })?;

        // An invalid or spent token is not fatal; the signup metadata (or the
        // friend default) still applies.
        let token_hints = match invite_token {
            Some(token) => self.consume_invite_token(token).await.unwrap_or_else(|err| {
                tracing::warn!(error = %err.error, "Invite token lookup failed during callback");
                None
            }),
            None => None,
        };

        let profile = self
            .upsert_profile_from_identity(&session.user, token_hints.as_ref())
            .await
            .map_err(|error| CallbackError {
                marker: "profile_error",
                error,
            })?;

        Ok((session, profile))
    }

    /// Materialize a profile for an authenticated identity. Idempotent: an
    /// existing profile is returned untouched.
    pub async fn upsert_profile_from_identity(
        &self,
        user: &ProviderUser,
        token_hints: Option<&InviteToken>,
    ) -> Result<Profile, AppError> {
        if let Some(existing) = self.db.find_profile_by_id(user.id).await? {
            return Ok(existing);
        }

        let metadata = &user.user_metadata;
        let meta_str = |key: &str| {
            metadata
                .get(key)
                .and_then(|v| v.as_str())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        // Role strings from metadata are untrusted; anything unparseable
        // degrades to the lowest-privilege role.
        let role = token_hints
            .map(|t| t.role)
            .or_else(|| meta_str("role").and_then(|s| s.parse().ok()))
            .unwrap_or(Role::Friend);

        let display_name = token_hints
            .and_then(|t| t.display_name.clone())
            .or_else(|| meta_str("display_name"))
            .unwrap_or_else(|| display_name_from_email(&user.email));

        let invited_by = meta_str("invited_by").and_then(|s| s.parse().ok());
        let invited_with_code = meta_str("invite_code");

        let profile = Profile::new(
            user.id,
            user.email.clone(),
            role,
            display_name,
            invited_by,
            invited_with_code,
        );

        let inserted = self.db.insert_profile_if_absent(&profile).await?;
        if inserted {
            tracing::info!(user_id = %user.id, role = %role, "Profile created");
        }

        // Whether we won the insert or lost a race, the stored row is the
        // truth.
        self.db
            .find_profile_by_id(user.id)
            .await?
            .ok_or_else(|| AppError::InternalError(anyhow::anyhow!("Profile vanished after upsert")))
    }

    // ==================== Invite tokens ====================

    /// Generate a single-recipient invite token; returns the opaque value
    /// (stored only as a hash) and its record.
    pub async fn generate_invite_token(
        &self,
        email: &str,
        role: Role,
        display_name: Option<String>,
        created_by_email: Option<String>,
    ) -> Result<(String, InviteToken), AppError> {
        let opaque = generate_opaque_token();
        let record = InviteToken::new(
            hash_token(&opaque),
            email.to_string(),
            role,
            display_name,
            created_by_email,
        );
        self.db.insert_invite_token(&record).await?;
        Ok((opaque, record))
    }

    /// Verify an invite token without consuming it.
    pub async fn verify_invite_token(&self, token: &str) -> Result<Option<InviteToken>, AppError> {
        let record = self.db.find_invite_token_by_hash(&hash_token(token)).await?;
        Ok(record.filter(|t| t.is_valid()))
    }

    /// Consume an invite token (at most once).
    async fn consume_invite_token(
        &self,
        token: &str,
    ) -> Result<Option<InviteToken>, CallbackError> {
        self.db
            .consume_invite_token(&hash_token(token))
            .await
            .map_err(|error| CallbackError {
                marker: "user_error",
                error,
            })
    }

    // ==================== Admin ====================

    /// Look up an identity by email at the provider and promote it to admin.
    /// Gated by the setup key at the handler.
    pub async fn promote_to_admin(&self, email: &str) -> Result<String, AppError> {
        let users = self.provider.list_users().await?;
        let user = users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .ok_or_else(|| {
                AppError::NotFound(anyhow::anyhow!(
                    "User not found. Make sure they have signed up first."
                ))
            })?;

        let display_name = user
            .user_metadata
            .get("display_name")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| display_name_from_email(&user.email));

        self.db
            .promote_profile_to_admin(user.id, &user.email, &display_name)
            .await?;

        Ok(format!("Successfully made {} an admin!", email))
    }

    /// Delete an identity at the provider, then its profile row.
    pub async fn delete_user(&self, user_id: Uuid) -> Result<(), AppError> {
        self.provider.delete_user(user_id).await?;
        self.db.delete_profile(user_id).await?;
        Ok(())
    }
}

/// Hash a token for storage.
fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Random 32-character alphanumeric opaque token.
fn generate_opaque_token() -> String {
    use rand::distributions::Alphanumeric;
    use rand::Rng;

    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opaque_tokens_are_long_and_distinct() {
        let a = generate_opaque_token();
        let b = generate_opaque_token();
        assert_eq!(a.len(), 32);
        assert_ne!(a, b);
    }

    #[test]
    fn token_hashing_is_stable_and_hex() {
        let h = hash_token("abc");
        assert_eq!(h, hash_token("abc"));
        assert_eq!(h.len(), 64);
        assert!(h.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
