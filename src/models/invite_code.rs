//! Invite code model - reusable, human-chosen codes granting a fixed role on
//! signup.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::Role;

/// Invite code entity. Codes are stored uppercase and never hard-deleted in
/// normal flow; admins soft-disable them via `is_active`.
#[derive(Debug, Clone, FromRow)]
pub struct InviteCode {
    pub code_id: Uuid,
    pub code: String,
    pub role: Role,
    pub is_active: bool,
    pub max_uses: Option<i32>,
    pub current_uses: i32,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_by: Option<Uuid>,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

impl InviteCode {
    /// Create a new active code with zero uses. The caller is responsible for
    /// normalizing `code` to uppercase.
    pub fn new(
        code: String,
        role: Role,
        max_uses: Option<i32>,
        expires_at: Option<DateTime<Utc>>,
        created_by: Option<Uuid>,
    ) -> Self {
        let now = Utc::now();
        Self {
            code_id: Uuid::new_v4(),
            code,
            role,
            is_active: true,
            max_uses,
            current_uses: 0,
            expires_at,
            created_by,
            created_utc: now,
            updated_utc: now,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Utc::now() >= at)
    }

    pub fn is_exhausted(&self) -> bool {
        self.max_uses.is_some_and(|max| self.current_uses >= max)
    }

    /// Check whether the code can still be used for a new signup.
    pub fn is_valid(&self) -> bool {
        self.is_active && !self.is_expired() && !self.is_exhausted()
    }
}
