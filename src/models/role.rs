//! Role model - the closed set of application roles.
//!
//! Role strings cross process boundaries (identity metadata, database rows,
//! request bodies) and are always re-validated through this enum; an
//! unrecognized string never becomes a role.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Family,
    Friend,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Family => "family",
            Role::Friend => "friend",
        }
    }

    /// Human-facing label.
    pub fn label(&self) -> &'static str {
        match self {
            Role::Admin => "Administrator",
            Role::Family => "Family Member",
            Role::Friend => "Friend",
        }
    }

    /// Family-or-admin check used by the family+ route tier.
    pub fn is_family_plus(&self) -> bool {
        matches!(self, Role::Admin | Role::Family)
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "family" => Ok(Role::Family),
            "friend" => Ok(Role::Friend),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(Role::from_str("Admin").unwrap(), Role::Admin);
        assert_eq!(Role::from_str("FAMILY").unwrap(), Role::Family);
        assert_eq!(Role::from_str("friend").unwrap(), Role::Friend);
    }

    #[test]
    fn unknown_role_is_rejected() {
        assert!(Role::from_str("superuser").is_err());
        assert!(Role::from_str("").is_err());
    }

    #[test]
    fn family_plus_tier() {
        assert!(Role::Admin.is_family_plus());
        assert!(Role::Family.is_family_plus());
        assert!(!Role::Friend.is_family_plus());
    }
}
