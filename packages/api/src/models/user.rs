//! # User model for authenticated users
//!
//! [`User`] (server only) is the full `users` row including the Argon2 hash.
//! [`UserInfo`] is the client-safe projection sent through server functions:
//! no hash, no timestamps, ids as strings so it works in WASM. It also carries
//! the profile's username and avatar so the navigation can render without a
//! second request.

use serde::{Deserialize, Serialize};

#[cfg(feature = "server")]
use chrono::{DateTime, Utc};
#[cfg(feature = "server")]
use sqlx::FromRow;
#[cfg(feature = "server")]
use uuid::Uuid;

/// Full user record from the database.
#[cfg(feature = "server")]
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(feature = "server")]
impl User {
    /// Convert to UserInfo for client consumption.
    pub fn to_info(&self, profile: Option<&store::UserProfile>) -> UserInfo {
        UserInfo {
            id: self.id.to_string(),
            email: self.email.clone(),
            username: profile.and_then(|p| p.username.clone()),
            avatar_url: profile.and_then(|p| p.avatar_url.clone()),
        }
    }
}

/// User information safe to send to the client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserInfo {
    pub id: String,
    pub email: String,
    pub username: Option<String>,
    pub avatar_url: Option<String>,
}

impl UserInfo {
    /// Get display name, falling back to email if no username is set.
    pub fn display_name(&self) -> &str {
        self.username
            .as_deref()
            .filter(|u| !u.is_empty())
            .unwrap_or(&self.email)
    }

    /// Single character shown when there is no avatar image.
    pub fn initial(&self) -> String {
        self.display_name()
            .chars()
            .next()
            .map(|c| c.to_uppercase().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(username: Option<&str>) -> UserInfo {
        UserInfo {
            id: "1".into(),
            email: "me@example.com".into(),
            username: username.map(Into::into),
            avatar_url: None,
        }
    }

    #[test]
    fn test_display_name_falls_back_to_email() {
        assert_eq!(info(None).display_name(), "me@example.com");
        assert_eq!(info(Some("")).display_name(), "me@example.com");
        assert_eq!(info(Some("lin")).display_name(), "lin");
    }

    #[test]
    fn test_initial() {
        assert_eq!(info(Some("lin")).initial(), "L");
        assert_eq!(info(None).initial(), "M");
    }
}
