//! User model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use strum_macros::EnumIter;
use utoipa::ToSchema;

/// User role enum.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, EnumIter, ToSchema,
)]
pub enum UserRole {
    Admin,
    Developer,
    ReadOnly,
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserRole::Admin => write!(f, "Admin"),
            UserRole::Developer => write!(f, "Developer"),
            UserRole::ReadOnly => write!(f, "ReadOnly"),
        }
    }
}

/// User account status enum.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, EnumIter, ToSchema,
)]
pub enum UserStatus {
    Active,
    Inactive,
    Locked,
}

impl std::fmt::Display for UserStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserStatus::Active => write!(f, "Active"),
            UserStatus::Inactive => write!(f, "Inactive"),
            UserStatus::Locked => write!(f, "Locked"),
        }
    }
}

/// User entity.
///
/// Initials and avatar color are derived at creation time when the client
/// does not supply them.
#[derive(Debug, Clone, FromRow, Serialize, ToSchema)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub role: UserRole,
    pub status: UserStatus,
    #[serde(rename = "group")]
    pub group_name: String,
    pub initials: String,
    pub color_code: String,
    pub last_activity: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Derive display initials from a full name: first letter of each word,
    /// uppercased ("John Doe" -> "JD").
    pub fn derive_initials(full_name: &str) -> String {
        full_name
            .split_whitespace()
            .filter_map(|word| word.chars().next())
            .collect::<String>()
            .to_uppercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initials_from_two_part_name() {
        assert_eq!(User::derive_initials("John Doe"), "JD");
    }

    #[test]
    fn initials_collapse_extra_whitespace() {
        assert_eq!(User::derive_initials("  ada   lovelace "), "AL");
    }

    #[test]
    fn initials_single_name() {
        assert_eq!(User::derive_initials("Prince"), "P");
    }

    #[test]
    fn initials_empty_name() {
        assert_eq!(User::derive_initials(""), "");
    }
}
