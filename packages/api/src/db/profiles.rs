//! Queries against `user_profiles`. A profile shares its id with the user.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use store::{ProfileUpdate, UserProfile};
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
struct ProfileRow {
    id: Uuid,
    username: Option<String>,
    avatar_url: Option<String>,
    bio: Option<String>,
    location: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProfileRow> for UserProfile {
    fn from(row: ProfileRow) -> Self {
        UserProfile {
            id: row.id.to_string(),
            username: row.username,
            avatar_url: row.avatar_url,
            bio: row.bio,
            location: row.location,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Blank optional fields are stored as NULL.
fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

pub async fn get_profile(pool: &PgPool, user_id: Uuid) -> Result<Option<UserProfile>, sqlx::Error> {
    let row: Option<ProfileRow> = sqlx::query_as("SELECT * FROM user_profiles WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(Into::into))
}

/// Create the profile row for a freshly registered user.
pub async fn create_profile(
    pool: &PgPool,
    user_id: Uuid,
    username: &str,
) -> Result<UserProfile, sqlx::Error> {
    let row: ProfileRow = sqlx::query_as(
        "INSERT INTO user_profiles (id, username) VALUES ($1, $2)
         ON CONFLICT (id) DO UPDATE SET username = COALESCE(user_profiles.username, $2)
         RETURNING *",
    )
    .bind(user_id)
    .bind(username)
    .fetch_one(pool)
    .await?;
    Ok(row.into())
}

/// Insert or replace the editable profile fields. Callers validate first.
pub async fn upsert_profile(
    pool: &PgPool,
    user_id: Uuid,
    update: &ProfileUpdate,
) -> Result<UserProfile, sqlx::Error> {
    let row: ProfileRow = sqlx::query_as(
        "INSERT INTO user_profiles (id, username, avatar_url, bio, location)
         VALUES ($1, $2, $3, $4, $5)
         ON CONFLICT (id) DO UPDATE SET
            username = $2,
            avatar_url = $3,
            bio = $4,
            location = $5,
            updated_at = NOW()
         RETURNING *",
    )
    .bind(user_id)
    .bind(update.username.trim())
    .bind(non_blank(&update.avatar_url))
    .bind(non_blank(&update.bio))
    .bind(non_blank(&update.location))
    .fetch_one(pool)
    .await?;
    Ok(row.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(&Some("  杭州 ".into())).as_deref(), Some("杭州"));
        assert_eq!(non_blank(&Some("   ".into())), None);
        assert_eq!(non_blank(&None), None);
    }
}
