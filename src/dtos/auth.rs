use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::models::Role;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SignupRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "aunt.jo@example.com")]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    #[schema(example = "password123", min_length = 8)]
    pub password: String,

    #[validate(length(min = 1, max = 80, message = "Display name is required"))]
    #[schema(example = "Aunt Jo")]
    pub display_name: String,

    #[validate(length(min = 1, message = "Invite code is required"))]
    #[schema(example = "FAMILY2024")]
    pub invite_code: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SignupResponse {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub user_id: String,
    #[schema(example = "Signup successful. Check your email to confirm your account.")]
    pub message: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "aunt.jo@example.com")]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    #[schema(example = "password123")]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    pub access_token: String,
    #[schema(example = "Bearer")]
    pub token_type: String,
    #[schema(example = 3600)]
    pub expires_in: i64,
}

#[derive(Debug, Deserialize, Validate, ToSchema, IntoParams)]
pub struct ValidateCodeQuery {
    #[validate(length(min = 1, message = "Code is required"))]
    #[param(example = "FAMILY2024")]
    pub code: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ValidateCodeResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub invite_token: Option<String>,
}
