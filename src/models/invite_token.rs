//! Invite token model - single-use, single-recipient, time-boxed invites.
//!
//! Only the SHA-256 hash of the opaque token value is stored.

use chrono::{DateTime, Duration, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::Role;

/// Fixed validity window from creation.
pub const INVITE_TOKEN_EXPIRY_HOURS: i64 = 72;

/// Invite token entity.
#[derive(Debug, Clone, FromRow)]
pub struct InviteToken {
    pub token_id: Uuid,
    pub token_hash: String,
    pub email: String,
    pub role: Role,
    pub display_name: Option<String>,
    pub created_by_email: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
    pub created_utc: DateTime<Utc>,
}

impl InviteToken {
    /// Create a new unused token record bound to one email address.
    pub fn new(
        token_hash: String,
        email: String,
        role: Role,
        display_name: Option<String>,
        created_by_email: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            token_id: Uuid::new_v4(),
            token_hash,
            email,
            role,
            display_name,
            created_by_email,
            expires_at: now + Duration::hours(INVITE_TOKEN_EXPIRY_HOURS),
            used_at: None,
            created_utc: now,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// Valid only while unused and unexpired.
    pub fn is_valid(&self) -> bool {
        self.used_at.is_none() && !self.is_expired()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token() -> InviteToken {
        InviteToken::new(
            "deadbeef".to_string(),
            "aunt@example.com".to_string(),
            Role::Family,
            Some("Aunt Jo".to_string()),
            None,
        )
    }

    #[test]
    fn fresh_token_is_valid_for_72_hours() {
        let t = token();
        assert!(t.is_valid());
        assert_eq!(
            (t.expires_at - t.created_utc).num_hours(),
            INVITE_TOKEN_EXPIRY_HOURS
        );
    }

    #[test]
    fn used_token_is_invalid() {
        let mut t = token();
        t.used_at = Some(Utc::now());
        assert!(!t.is_valid());
    }

    #[test]
    fn expired_token_is_invalid_even_if_never_used() {
        let mut t = token();
        t.expires_at = Utc::now() - Duration::minutes(1);
        assert!(t.used_at.is_none());
        assert!(!t.is_valid());
    }
}
