//! PostgreSQL data access for profiles, invite codes, and invite tokens.
//!
//! Every mutation is a single-row statement keyed by a unique id or code.
//! Invite consumption is a conditional update so racing signups can never
//! overrun a code's remaining uses.

use sqlx::postgres::PgPool;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{InviteCode, InviteToken, Profile, Role};

/// PostgreSQL database wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database wrapper from a connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Health check - ping the database.
    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Database health check failed: {}", e);
                AppError::DatabaseError(anyhow::anyhow!("Database health check failed: {}", e))
            })?;
        Ok(())
    }

    // ==================== Profile Operations ====================

    /// Find profile by identity id.
    pub async fn find_profile_by_id(&self, user_id: Uuid) -> Result<Option<Profile>, AppError> {
        sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from)
    }

    /// Find profile by email (case-insensitive).
    pub async fn find_profile_by_email(&self, email: &str) -> Result<Option<Profile>, AppError> {
        sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE LOWER(email) = LOWER($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from)
    }

    /// Insert a profile unless one already exists for the identity.
    ///
    /// Returns true when a row was inserted, false when the identity already
    /// had a profile; attributes of an existing row are never touched.
    pub async fn insert_profile_if_absent(&self, profile: &Profile) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO profiles (user_id, email, role, display_name, avatar_url, invited_by, invited_with_code, created_utc, updated_utc)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(profile.user_id)
        .bind(&profile.email)
        .bind(profile.role)
        .bind(&profile.display_name)
        .bind(&profile.avatar_url)
        .bind(profile.invited_by)
        .bind(&profile.invited_with_code)
        .bind(profile.created_utc)
        .bind(profile.updated_utc)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(result.rows_affected() == 1)
    }

    /// Promote an identity to admin, creating the profile if it is missing.
    /// Used only by the one-time setup endpoint.
    pub async fn promote_profile_to_admin(
        &self,
        user_id: Uuid,
        email: &str,
        display_name: &str,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO profiles (user_id, email, role, display_name, created_utc, updated_utc)
            VALUES ($1, $2, 'admin', $3, NOW(), NOW())
            ON CONFLICT (user_id)
            DO UPDATE SET role = 'admin', updated_utc = NOW()
            "#,
        )
        .bind(user_id)
        .bind(email)
        .bind(display_name)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(())
    }

    /// Update own display name / avatar. Returns the updated row.
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        display_name: Option<&str>,
        avatar_url: Option<&str>,
    ) -> Result<Option<Profile>, AppError> {
        sqlx::query_as::<_, Profile>(
            r#"
            UPDATE profiles
            SET display_name = COALESCE($2, display_name),
                avatar_url = COALESCE($3, avatar_url),
                updated_utc = NOW()
            WHERE user_id = $1
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(display_name)
        .bind(avatar_url)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)
    }

    /// Update a profile's role (admin operation).
    pub async fn update_profile_role(&self, user_id: Uuid, role: Role) -> Result<bool, AppError> {
        let result =
            sqlx::query("UPDATE profiles SET role = $1, updated_utc = NOW() WHERE user_id = $2")
                .bind(role)
                .bind(user_id)
                .execute(&self.pool)
                .await
                .map_err(AppError::from)?;
        Ok(result.rows_affected() == 1)
    }

    /// All profiles, newest first.
    pub async fn list_profiles(&self) -> Result<Vec<Profile>, AppError> {
        sqlx::query_as::<_, Profile>("SELECT * FROM profiles ORDER BY created_utc DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::from)
    }

    /// Remove a profile after its identity was deleted at the provider.
    pub async fn delete_profile(&self, user_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM profiles WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(AppError::from)?;
        Ok(result.rows_affected() == 1)
    }

    // ==================== Invite Code Operations ====================

    /// Find an invite code by its (already normalized) code string.
    pub async fn find_invite_code(&self, code: &str) -> Result<Option<InviteCode>, AppError> {
        sqlx::query_as::<_, InviteCode>("SELECT * FROM invite_codes WHERE code = $1")
            .bind(code)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from)
    }

    /// Insert a new invite code. A duplicate code surfaces as a conflict.
    pub async fn insert_invite_code(&self, invite: &InviteCode) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO invite_codes (code_id, code, role, is_active, max_uses, current_uses, expires_at, created_by, created_utc, updated_utc)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(invite.code_id)
        .bind(&invite.code)
        .bind(invite.role)
        .bind(invite.is_active)
        .bind(invite.max_uses)
        .bind(invite.current_uses)
        .bind(invite.expires_at)
        .bind(invite.created_by)
        .bind(invite.created_utc)
        .bind(invite.updated_utc)
        .execute(&self.pool)
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Conflict(_) => {
                AppError::Conflict(anyhow::anyhow!("Invite code already exists"))
            }
            other => other,
        })?;
        Ok(())
    }

    /// All invite codes, newest first.
    pub async fn list_invite_codes(&self) -> Result<Vec<InviteCode>, AppError> {
        sqlx::query_as::<_, InviteCode>("SELECT * FROM invite_codes ORDER BY created_utc DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::from)
    }

    /// Flip a code's active flag.
    pub async fn set_invite_code_active(
        &self,
        code_id: Uuid,
        is_active: bool,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE invite_codes SET is_active = $1, updated_utc = NOW() WHERE code_id = $2",
        )
        .bind(is_active)
        .bind(code_id)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(result.rows_affected() == 1)
    }

    /// Atomically consume one use of a code if it is still valid.
    ///
    /// The guard re-checks active/expiry/remaining-uses inside the UPDATE, so
    /// two signups racing for a code with one remaining use cannot both
    /// succeed. Returns the consumed code row, or None when the code was not
    /// available.
    pub async fn consume_invite_code(&self, code: &str) -> Result<Option<InviteCode>, AppError> {
        sqlx::query_as::<_, InviteCode>(
            r#"
            UPDATE invite_codes
            SET current_uses = current_uses + 1, updated_utc = NOW()
            WHERE code = $1
              AND is_active
              AND (expires_at IS NULL OR expires_at > NOW())
              AND (max_uses IS NULL OR current_uses < max_uses)
            RETURNING *
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)
    }

    /// Give back a use consumed by a signup whose identity creation failed.
    pub async fn release_invite_code(&self, code: &str) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE invite_codes
            SET current_uses = current_uses - 1, updated_utc = NOW()
            WHERE code = $1 AND current_uses > 0
            "#,
        )
        .bind(code)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(())
    }

    // ==================== Invite Token Operations ====================

    /// Insert an invite token record.
    pub async fn insert_invite_token(&self, token: &InviteToken) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO invite_tokens (token_id, token_hash, email, role, display_name, created_by_email, expires_at, used_at, created_utc)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(token.token_id)
        .bind(&token.token_hash)
        .bind(&token.email)
        .bind(token.role)
        .bind(&token.display_name)
        .bind(&token.created_by_email)
        .bind(token.expires_at)
        .bind(token.used_at)
        .bind(token.created_utc)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(())
    }

    /// Find an invite token by the hash of its opaque value. Validity
    /// (unused, unexpired) is the caller's check; expired rows stay in place.
    pub async fn find_invite_token_by_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<InviteToken>, AppError> {
        sqlx::query_as::<_, InviteToken>("SELECT * FROM invite_tokens WHERE token_hash = $1")
            .bind(token_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from)
    }

    /// Atomically mark a token used if it is still unused and unexpired.
    /// Returns the consumed record, or None when the token was not available.
    pub async fn consume_invite_token(
        &self,
        token_hash: &str,
    ) -> Result<Option<InviteToken>, AppError> {
        sqlx::query_as::<_, InviteToken>(
            r#"
            UPDATE invite_tokens
            SET used_at = NOW()
            WHERE token_hash = $1 AND used_at IS NULL AND expires_at > NOW()
            RETURNING *
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)
    }
}
