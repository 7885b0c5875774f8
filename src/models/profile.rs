//! Profile model - the application-side record mirroring an external
//! identity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use super::Role;

/// Profile entity. Exactly one per identity id; role is never null.
#[derive(Debug, Clone, FromRow)]
pub struct Profile {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub invited_by: Option<Uuid>,
    pub invited_with_code: Option<String>,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

impl Profile {
    /// Create a new profile for a freshly authenticated identity.
    pub fn new(
        user_id: Uuid,
        email: String,
        role: Role,
        display_name: String,
        invited_by: Option<Uuid>,
        invited_with_code: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            email,
            role,
            display_name,
            avatar_url: None,
            invited_by,
            invited_with_code,
            created_utc: now,
            updated_utc: now,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Profile response for API.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProfileResponse {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
    pub role_label: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub invited_by: Option<Uuid>,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

impl From<Profile> for ProfileResponse {
    fn from(p: Profile) -> Self {
        Self {
            user_id: p.user_id,
            email: p.email,
            role: p.role,
            role_label: p.role.label().to_string(),
            display_name: p.display_name,
            avatar_url: p.avatar_url,
            invited_by: p.invited_by,
            created_utc: p.created_utc,
            updated_utc: p.updated_utc,
        }
    }
}
