pub mod admin;
pub mod auth;
pub mod invite;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    #[schema(example = "Invalid or expired invite code")]
    pub error: String,
}
