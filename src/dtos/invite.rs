use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::{InviteCode, Role};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateInviteCodeRequest {
    #[validate(length(min = 4, max = 32, message = "Code must be 4-32 characters"))]
    #[schema(example = "FAMILY2024")]
    pub code: String,

    pub role: Role,

    #[validate(range(min = 1, message = "max_uses must be positive"))]
    pub max_uses: Option<i32>,

    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ToggleInviteCodeRequest {
    pub is_active: bool,
}

/// Invite code response for the admin listing.
#[derive(Debug, Serialize, ToSchema)]
pub struct InviteCodeResponse {
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

impl From<InviteCode> for InviteCodeResponse {
    fn from(c: InviteCode) -> Self {
        Self {
            code_id: c.code_id,
            code: c.code,
            role: c.role,
            is_active: c.is_active,
            max_uses: c.max_uses,
            current_uses: c.current_uses,
            expires_at: c.expires_at,
            created_by: c.created_by,
            created_utc: c.created_utc,
            updated_utc: c.updated_utc,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateInviteTokenRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "grandpa@example.com")]
    pub email: String,

    pub role: Role,

    #[validate(length(max = 80, message = "Display name too long"))]
    pub display_name: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreateInviteTokenResponse {
    /// The opaque token value; shown once, only a hash is stored.
    pub token: String,
    /// Join URL to hand to the recipient.
    pub invite_url: String,
    pub email: String,
    pub role: Role,
    pub expires_at: DateTime<Utc>,
}
