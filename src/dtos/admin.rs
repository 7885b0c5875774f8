use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::Role;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AdminSetupRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "parent@example.com")]
    pub email: String,

    #[serde(rename = "setupKey")]
    #[validate(length(min = 1, message = "Setup key is required"))]
    pub setup_key: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdminSetupResponse {
    pub success: bool,
    #[schema(example = "Successfully made parent@example.com an admin!")]
    pub message: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRoleRequest {
    pub role: Role,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 80, message = "Display name must be 1-80 characters"))]
    pub display_name: Option<String>,

    #[validate(url(message = "avatar_url must be a valid URL"))]
    pub avatar_url: Option<String>,
}
