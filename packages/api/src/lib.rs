//! # API crate — shared fullstack server functions for ETHOSLOG
//!
//! Defines every Dioxus server function the web frontend calls, plus the
//! clients and raw HTTP routes behind them.
//!
//! ## Modules
//!
//! | Module | Feature gate | Purpose |
//! |--------|-------------|---------|
//! | [`analysis`] | — | Chat-completion analyzer implementing `store::Analyzer` |
//! | [`auth`] | partly `server` | Credential checks, Argon2 hashing, sessions, reset tokens |
//! | [`blob`] | — | Public blob storage client (avatars) |
//! | [`db`] | `server` | PostgreSQL pool, `PgDiaryStore`, profile queries |
//! | [`location`] | — | Signed place search client and address parsing |
//! | [`models`] | — | `UserInfo` and re-exported diary/profile records |
//! | [`routes`] | `server` | `/api/upload`, `/api/analyze`, `/api/location-search` |
//! | [`services`] | `server` | Lazily built journal and clients |
//! | [`settings`] | `server` | Layered configuration |
//!
//! ## Server functions exposed here
//!
//! Every public `async fn` in this file is compiled twice: with full server
//! logic (behind `#[cfg(feature = "server")]`) and as a thin client stub.
//!
//! - **Authentication**: `get_current_user`, `register`, `login_password`, `logout`,
//!   `request_password_reset`, `reset_password`
//! - **Diaries**: `list_diaries`, `get_diary`, `create_diary`, `update_diary`,
//!   `delete_diary`, `reanalyze_diary`, `analyzing_diaries`, `list_tags`
//! - **Profile**: `get_profile`, `update_profile`, `upload_avatar`
//! - **Locations**: `search_locations`
//!
//! Creating or updating a diary commits the entry and returns it right away; the
//! analysis runs as a detached task and `analyzing_diaries` reports which of the
//! caller's entries are still in flight and which analyses failed.

use dioxus::prelude::*;

#[cfg(feature = "server")]
pub mod analysis;
pub mod auth;
#[cfg(feature = "server")]
pub mod blob;
pub mod db;
#[cfg(feature = "server")]
pub mod error;
#[cfg(feature = "server")]
pub mod location;
pub mod models;
#[cfg(feature = "server")]
pub mod routes;
#[cfg(feature = "server")]
pub mod services;
#[cfg(feature = "server")]
pub mod settings;

pub use models::{AnalysisStatus, DiaryEntry, LocationItem, UserInfo, UserProfile};

/// Resolve the logged-in user or fail with "请先登录".
#[cfg(feature = "server")]
async fn session_user(session: &tower_sessions::Session) -> Result<uuid::Uuid, ServerFnError> {
    auth::require_user(session)
        .await
        .map_err(|e| ServerFnError::new(e.to_string()))
}

#[cfg(feature = "server")]
async fn load_user_info(
    pool: &sqlx::PgPool,
    user_id: uuid::Uuid,
) -> Result<Option<UserInfo>, ServerFnError> {
    let user: Option<models::User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| ServerFnError::new(e.to_string()))?;

    let Some(user) = user else {
        return Ok(None);
    };

    let profile = db::profiles::get_profile(pool, user_id)
        .await
        .map_err(|e| ServerFnError::new(e.to_string()))?;

    Ok(Some(user.to_info(profile.as_ref())))
}

/// Two random base-36 characters used to pad short derived usernames.
#[cfg(feature = "server")]
fn username_suffix() -> String {
    use rand::Rng;

    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::thread_rng();
    (0..2)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

// ---------------------------------------------------------------------------
// Authentication
// ---------------------------------------------------------------------------

/// Get the current authenticated user from the session.
#[cfg(feature = "server")]
#[get("/api/auth/me", session: tower_sessions::Session)]
pub async fn get_current_user() -> Result<Option<UserInfo>, ServerFnError> {
    use crate::db::get_pool;

    let user_id = auth::current_user_id(&session)
        .await
        .map_err(|e| ServerFnError::new(e.to_string()))?;

    let Some(user_id) = user_id else {
        return Ok(None);
    };

    let pool = get_pool()
        .await
        .map_err(|e| ServerFnError::new(e.to_string()))?;

    load_user_info(pool, user_id).await
}

#[cfg(not(feature = "server"))]
#[get("/api/auth/me")]
pub async fn get_current_user() -> Result<Option<UserInfo>, ServerFnError> {
    Ok(None)
}

/// Log out the current user by clearing the session.
#[cfg(feature = "server")]
#[post("/api/auth/logout", session: tower_sessions::Session)]
pub async fn logout() -> Result<(), ServerFnError> {
    session
        .flush()
        .await
        .map_err(|e| ServerFnError::new(e.to_string()))?;

    Ok(())
}

#[cfg(not(feature = "server"))]
#[post("/api/auth/logout")]
pub async fn logout() -> Result<(), ServerFnError> {
    Ok(())
}

/// Register a new account, create its profile and log it in.
#[cfg(feature = "server")]
#[post("/api/auth/register", session: tower_sessions::Session)]
pub async fn register(email: String, password: String) -> Result<UserInfo, ServerFnError> {
    use crate::db::get_pool;
    use store::validation::username_from_email;

    let email = auth::normalize_email(&email).map_err(|e| ServerFnError::new(e.to_string()))?;
    auth::validate_password(&password).map_err(|e| ServerFnError::new(e.to_string()))?;

    let pool = get_pool()
        .await
        .map_err(|e| ServerFnError::new(e.to_string()))?;

    let existing: Option<(uuid::Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE email = $1")
        .bind(&email)
        .fetch_optional(pool)
        .await
        .map_err(|e| ServerFnError::new(e.to_string()))?;

    if existing.is_some() {
        return Err(ServerFnError::new(auth::AuthError::EmailTaken.to_string()));
    }

    let password_hash =
        auth::hash_password(&password).map_err(|e| ServerFnError::new(e.to_string()))?;

    let user = db::users::insert_user(pool, &email, &password_hash)
        .await
        .map_err(|e| ServerFnError::new(e.to_string()))?
        .ok_or_else(|| ServerFnError::new(auth::AuthError::EmailTaken.to_string()))?;

    let username = username_from_email(&email, &username_suffix());
    let profile = db::profiles::create_profile(pool, user.id, &username)
        .await
        .map_err(|e| ServerFnError::new(e.to_string()))?;

    auth::log_in(&session, user.id)
        .await
        .map_err(|e| ServerFnError::new(e.to_string()))?;

    tracing::info!("Registered user {} as {}", user.id, username);
    Ok(user.to_info(Some(&profile)))
}

#[cfg(not(feature = "server"))]
#[post("/api/auth/register")]
pub async fn register(email: String, password: String) -> Result<UserInfo, ServerFnError> {
    Err(ServerFnError::new("Server only"))
}

/// Log in with email and password.
#[cfg(feature = "server")]
#[post("/api/auth/login-password", session: tower_sessions::Session)]
pub async fn login_password(email: String, password: String) -> Result<UserInfo, ServerFnError> {
    use crate::db::get_pool;

    let invalid = || ServerFnError::new(auth::AuthError::InvalidCredentials.to_string());
    let email = auth::normalize_email(&email).map_err(|_| invalid())?;

    let pool = get_pool()
        .await
        .map_err(|e| ServerFnError::new(e.to_string()))?;

    let user: Option<models::User> = sqlx::query_as("SELECT * FROM users WHERE email = $1")
        .bind(&email)
        .fetch_optional(pool)
        .await
        .map_err(|e| ServerFnError::new(e.to_string()))?;

    let Some(user) = user else {
        return Err(invalid());
    };

    let valid = auth::verify_password(&password, &user.password_hash)
        .map_err(|e| ServerFnError::new(e.to_string()))?;

    if !valid {
        return Err(invalid());
    }

    auth::log_in(&session, user.id)
        .await
        .map_err(|e| ServerFnError::new(e.to_string()))?;

    let profile = db::profiles::get_profile(pool, user.id)
        .await
        .map_err(|e| ServerFnError::new(e.to_string()))?;

    Ok(user.to_info(profile.as_ref()))
}

#[cfg(not(feature = "server"))]
#[post("/api/auth/login-password")]
pub async fn login_password(email: String, password: String) -> Result<UserInfo, ServerFnError> {
    Err(ServerFnError::new("Server only"))
}

/// Start a password reset. Always succeeds for a well-formed address so the
/// response does not reveal whether an account exists.
#[cfg(feature = "server")]
#[post("/api/auth/forgot-password")]
pub async fn request_password_reset(email: String) -> Result<(), ServerFnError> {
    use crate::db::get_pool;

    let email = auth::normalize_email(&email).map_err(|e| ServerFnError::new(e.to_string()))?;

    let pool = get_pool()
        .await
        .map_err(|e| ServerFnError::new(e.to_string()))?;

    let user: Option<(uuid::Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE email = $1")
        .bind(&email)
        .fetch_optional(pool)
        .await
        .map_err(|e| ServerFnError::new(e.to_string()))?;

    let Some((user_id,)) = user else {
        tracing::info!("Password reset requested for unknown address");
        return Ok(());
    };

    let token = auth::reset::generate_token();
    let expires_at = chrono::Utc::now() + auth::reset::token_ttl();

    sqlx::query("INSERT INTO password_resets (token, user_id, expires_at) VALUES ($1, $2, $3)")
        .bind(&token)
        .bind(user_id)
        .bind(expires_at)
        .execute(pool)
        .await
        .map_err(|e| ServerFnError::new(e.to_string()))?;

    let link = auth::reset::reset_link(&settings::settings().app.public_url, &token);
    tracing::info!("Password reset link for {}: {}", email, link);
    Ok(())
}

#[cfg(not(feature = "server"))]
#[post("/api/auth/forgot-password")]
pub async fn request_password_reset(email: String) -> Result<(), ServerFnError> {
    Err(ServerFnError::new("Server only"))
}

/// Set a new password with a reset token. The token is consumed.
#[cfg(feature = "server")]
#[post("/api/auth/reset-password")]
pub async fn reset_password(token: String, password: String) -> Result<(), ServerFnError> {
    use crate::db::get_pool;
    use chrono::{DateTime, Utc};

    auth::validate_password(&password).map_err(|e| ServerFnError::new(e.to_string()))?;

    let pool = get_pool()
        .await
        .map_err(|e| ServerFnError::new(e.to_string()))?;

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| ServerFnError::new(e.to_string()))?;

    let row: Option<(uuid::Uuid, DateTime<Utc>, Option<DateTime<Utc>>)> = sqlx::query_as(
        "SELECT user_id, expires_at, used_at FROM password_resets WHERE token = $1 FOR UPDATE",
    )
    .bind(&token)
    .fetch_optional(&mut *tx)
    .await
    .map_err(|e| ServerFnError::new(e.to_string()))?;

    let Some((user_id, expires_at, used_at)) = row else {
        return Err(ServerFnError::new(auth::AuthError::InvalidResetToken.to_string()));
    };

    if !auth::reset::is_redeemable(expires_at, used_at, Utc::now()) {
        return Err(ServerFnError::new(auth::AuthError::InvalidResetToken.to_string()));
    }

    let password_hash =
        auth::hash_password(&password).map_err(|e| ServerFnError::new(e.to_string()))?;

    sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
        .bind(user_id)
        .bind(&password_hash)
        .execute(&mut *tx)
        .await
        .map_err(|e| ServerFnError::new(e.to_string()))?;

    sqlx::query("UPDATE password_resets SET used_at = NOW() WHERE token = $1")
        .bind(&token)
        .execute(&mut *tx)
        .await
        .map_err(|e| ServerFnError::new(e.to_string()))?;

    tx.commit()
        .await
        .map_err(|e| ServerFnError::new(e.to_string()))?;

    tracing::info!("Password reset for user {}", user_id);
    Ok(())
}

#[cfg(not(feature = "server"))]
#[post("/api/auth/reset-password")]
pub async fn reset_password(token: String, password: String) -> Result<(), ServerFnError> {
    Err(ServerFnError::new("Server only"))
}

// ---------------------------------------------------------------------------
// Diaries
// ---------------------------------------------------------------------------

/// The current user's diary entries, newest first.
#[cfg(feature = "server")]
#[get("/api/diaries", session: tower_sessions::Session)]
pub async fn list_diaries() -> Result<Vec<DiaryEntry>, ServerFnError> {
    let user_id = session_user(&session).await?;
    let journal = services::journal()
        .await
        .map_err(|e| ServerFnError::new(e.to_string()))?;

    journal
        .list(&user_id.to_string())
        .await
        .map_err(|e| ServerFnError::new(e.to_string()))
}

#[cfg(not(feature = "server"))]
#[get("/api/diaries")]
pub async fn list_diaries() -> Result<Vec<DiaryEntry>, ServerFnError> {
    Err(ServerFnError::new("Server only"))
}

#[cfg(feature = "server")]
#[post("/api/diaries/get", session: tower_sessions::Session)]
pub async fn get_diary(id: String) -> Result<DiaryEntry, ServerFnError> {
    let user_id = session_user(&session).await?;
    let journal = services::journal()
        .await
        .map_err(|e| ServerFnError::new(e.to_string()))?;

    journal
        .get(&user_id.to_string(), &id)
        .await
        .map_err(|e| ServerFnError::new(e.to_string()))
}

#[cfg(not(feature = "server"))]
#[post("/api/diaries/get")]
pub async fn get_diary(id: String) -> Result<DiaryEntry, ServerFnError> {
    Err(ServerFnError::new("Server only"))
}

/// Save a new entry and start its analysis in the background.
#[cfg(feature = "server")]
#[post("/api/diaries/create", session: tower_sessions::Session)]
pub async fn create_diary(
    title: String,
    content: String,
    category: Option<String>,
    tags: Vec<String>,
) -> Result<DiaryEntry, ServerFnError> {
    let user_id = session_user(&session).await?;
    let journal = services::journal()
        .await
        .map_err(|e| ServerFnError::new(e.to_string()))?;

    let draft = store::DiaryDraft {
        title,
        content,
        category,
        tags,
    };
    let (entry, job) = journal
        .save(&user_id.to_string(), None, draft)
        .await
        .map_err(|e| ServerFnError::new(e.to_string()))?;

    services::spawn_analysis(job);
    Ok(entry)
}

#[cfg(not(feature = "server"))]
#[post("/api/diaries/create")]
pub async fn create_diary(
    title: String,
    content: String,
    category: Option<String>,
    tags: Vec<String>,
) -> Result<DiaryEntry, ServerFnError> {
    Err(ServerFnError::new("Server only"))
}

/// Save changes to an entry and re-run its analysis in the background.
#[cfg(feature = "server")]
#[post("/api/diaries/update", session: tower_sessions::Session)]
pub async fn update_diary(
    id: String,
    title: String,
    content: String,
    category: Option<String>,
    tags: Vec<String>,
) -> Result<DiaryEntry, ServerFnError> {
    let user_id = session_user(&session).await?;
    let journal = services::journal()
        .await
        .map_err(|e| ServerFnError::new(e.to_string()))?;

    let draft = store::DiaryDraft {
        title,
        content,
        category,
        tags,
    };
    let (entry, job) = journal
        .save(&user_id.to_string(), Some(&id), draft)
        .await
        .map_err(|e| ServerFnError::new(e.to_string()))?;

    services::spawn_analysis(job);
    Ok(entry)
}

#[cfg(not(feature = "server"))]
#[post("/api/diaries/update")]
pub async fn update_diary(
    id: String,
    title: String,
    content: String,
    category: Option<String>,
    tags: Vec<String>,
) -> Result<DiaryEntry, ServerFnError> {
    Err(ServerFnError::new("Server only"))
}

/// Soft-delete an entry.
#[cfg(feature = "server")]
#[post("/api/diaries/delete", session: tower_sessions::Session)]
pub async fn delete_diary(id: String) -> Result<(), ServerFnError> {
    let user_id = session_user(&session).await?;
    let journal = services::journal()
        .await
        .map_err(|e| ServerFnError::new(e.to_string()))?;

    journal
        .delete(&user_id.to_string(), &id)
        .await
        .map_err(|e| ServerFnError::new(e.to_string()))
}

#[cfg(not(feature = "server"))]
#[post("/api/diaries/delete")]
pub async fn delete_diary(id: String) -> Result<(), ServerFnError> {
    Err(ServerFnError::new("Server only"))
}

/// Run the analysis of a stored entry again.
#[cfg(feature = "server")]
#[post("/api/diaries/reanalyze", session: tower_sessions::Session)]
pub async fn reanalyze_diary(id: String) -> Result<(), ServerFnError> {
    let user_id = session_user(&session).await?;
    let journal = services::journal()
        .await
        .map_err(|e| ServerFnError::new(e.to_string()))?;

    let job = journal
        .reanalyze(&user_id.to_string(), &id)
        .await
        .map_err(|e| ServerFnError::new(e.to_string()))?;

    services::spawn_analysis(job);
    Ok(())
}

#[cfg(not(feature = "server"))]
#[post("/api/diaries/reanalyze")]
pub async fn reanalyze_diary(id: String) -> Result<(), ServerFnError> {
    Err(ServerFnError::new("Server only"))
}

/// Analyses of the caller's entries that are running or failed since the last call.
///
/// Failed ids are reported once.
#[cfg(feature = "server")]
#[get("/api/diaries/analyzing", session: tower_sessions::Session)]
pub async fn analyzing_diaries() -> Result<AnalysisStatus, ServerFnError> {
    let user_id = session_user(&session).await?;
    let journal = services::journal()
        .await
        .map_err(|e| ServerFnError::new(e.to_string()))?;

    let own: Vec<String> = journal
        .list(&user_id.to_string())
        .await
        .map_err(|e| ServerFnError::new(e.to_string()))?
        .into_iter()
        .map(|entry| entry.id)
        .collect();

    Ok(services::analysis_status(journal.tracker(), &own))
}

#[cfg(not(feature = "server"))]
#[get("/api/diaries/analyzing")]
pub async fn analyzing_diaries() -> Result<AnalysisStatus, ServerFnError> {
    Err(ServerFnError::new("Server only"))
}

/// Distinct tags over the caller's entries, for tag suggestions.
#[cfg(feature = "server")]
#[get("/api/diaries/tags", session: tower_sessions::Session)]
pub async fn list_tags() -> Result<Vec<String>, ServerFnError> {
    let user_id = session_user(&session).await?;
    let journal = services::journal()
        .await
        .map_err(|e| ServerFnError::new(e.to_string()))?;

    journal
        .tags(&user_id.to_string())
        .await
        .map_err(|e| ServerFnError::new(e.to_string()))
}

#[cfg(not(feature = "server"))]
#[get("/api/diaries/tags")]
pub async fn list_tags() -> Result<Vec<String>, ServerFnError> {
    Err(ServerFnError::new("Server only"))
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

#[cfg(feature = "server")]
#[get("/api/profile", session: tower_sessions::Session)]
pub async fn get_profile() -> Result<Option<UserProfile>, ServerFnError> {
    use crate::db::get_pool;

    let user_id = session_user(&session).await?;
    let pool = get_pool()
        .await
        .map_err(|e| ServerFnError::new(e.to_string()))?;

    db::profiles::get_profile(pool, user_id)
        .await
        .map_err(|e| ServerFnError::new(e.to_string()))
}

#[cfg(not(feature = "server"))]
#[get("/api/profile")]
pub async fn get_profile() -> Result<Option<UserProfile>, ServerFnError> {
    Err(ServerFnError::new("Server only"))
}

/// Validate and save the profile form.
#[cfg(feature = "server")]
#[post("/api/profile", session: tower_sessions::Session)]
pub async fn update_profile(
    username: String,
    avatar_url: Option<String>,
    bio: Option<String>,
    location: Option<String>,
) -> Result<UserProfile, ServerFnError> {
    use crate::db::get_pool;
    use store::validation;

    let user_id = session_user(&session).await?;

    let update = store::ProfileUpdate {
        username,
        avatar_url,
        bio,
        location,
    };
    validation::validate_profile(&update).map_err(|e| ServerFnError::new(e.to_string()))?;

    let pool = get_pool()
        .await
        .map_err(|e| ServerFnError::new(e.to_string()))?;

    let profile = db::profiles::upsert_profile(pool, user_id, &update)
        .await
        .map_err(|e| ServerFnError::new(e.to_string()))?;

    tracing::info!("Profile updated for user {}", user_id);
    Ok(profile)
}

#[cfg(not(feature = "server"))]
#[post("/api/profile")]
pub async fn update_profile(
    username: String,
    avatar_url: Option<String>,
    bio: Option<String>,
    location: Option<String>,
) -> Result<UserProfile, ServerFnError> {
    Err(ServerFnError::new("Server only"))
}

/// Store an avatar image and return its public URL.
#[cfg(feature = "server")]
#[post("/api/profile/avatar", session: tower_sessions::Session)]
pub async fn upload_avatar(filename: String, bytes: Vec<u8>) -> Result<String, ServerFnError> {
    session_user(&session).await?;

    let object = services::blob_client()
        .put(&filename, bytes, None)
        .await
        .map_err(|e| {
            tracing::error!("Avatar upload failed: {}", e);
            ServerFnError::new("上传头像失败")
        })?;

    Ok(object.url)
}

#[cfg(not(feature = "server"))]
#[post("/api/profile/avatar")]
pub async fn upload_avatar(filename: String, bytes: Vec<u8>) -> Result<String, ServerFnError> {
    Err(ServerFnError::new("Server only"))
}

// ---------------------------------------------------------------------------
// Locations
// ---------------------------------------------------------------------------

/// Place suggestions for the profile location field.
#[cfg(feature = "server")]
#[post("/api/locations/search")]
pub async fn search_locations(keyword: String) -> Result<Vec<LocationItem>, ServerFnError> {
    services::location_client()
        .search(&keyword)
        .await
        .map_err(|e| ServerFnError::new(e.to_string()))
}

#[cfg(not(feature = "server"))]
#[post("/api/locations/search")]
pub async fn search_locations(keyword: String) -> Result<Vec<LocationItem>, ServerFnError> {
    Err(ServerFnError::new("Server only"))
}

#[cfg(test)]
mod tests {
    /// Outbound HTTP clients are server code; client builds must not link them.
    #[test]
    fn test_outbound_client_crates_are_server_only() {
        let manifest = include_str!("../Cargo.toml");
        for name in ["reqwest", "md-5", "hex", "regex"] {
            let line = manifest
                .lines()
                .find(|l| l.starts_with(&format!("{name} =")))
                .unwrap();
            assert!(line.contains("optional = true"), "{name} is not optional");
            assert!(manifest.contains(&format!("    \"{name}\",")), "{name} not in server");
        }
    }
}
