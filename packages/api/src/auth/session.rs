//! Session helpers.

use tower_sessions::Session;
use uuid::Uuid;

use super::AuthError;

/// Key for storing user ID in session.
pub const SESSION_USER_ID_KEY: &str = "user_id";

/// The logged-in user's id, if any.
pub async fn current_user_id(session: &Session) -> Result<Option<Uuid>, AuthError> {
    let user_id: Option<String> = session
        .get(SESSION_USER_ID_KEY)
        .await
        .map_err(|e| AuthError::Session(e.to_string()))?;

    Ok(user_id.and_then(|id| Uuid::parse_str(&id).ok()))
}

/// The logged-in user's id, or [`AuthError::NotAuthenticated`].
pub async fn require_user(session: &Session) -> Result<Uuid, AuthError> {
    current_user_id(session)
        .await?
        .ok_or(AuthError::NotAuthenticated)
}

/// Bind the session to `user_id`, rotating the session id.
pub async fn log_in(session: &Session, user_id: Uuid) -> Result<(), AuthError> {
    session
        .cycle_id()
        .await
        .map_err(|e| AuthError::Session(e.to_string()))?;
    session
        .insert(SESSION_USER_ID_KEY, user_id.to_string())
        .await
        .map_err(|e| AuthError::Session(e.to_string()))
}
