//! Account rows in `users`.

use sqlx::PgPool;

use crate::models::User;

/// The unique index on `email` decides between concurrent registrations.
const INSERT_USER: &str = "INSERT INTO users (email, password_hash) VALUES ($1, $2) \
                           ON CONFLICT (email) DO NOTHING RETURNING *";

/// Create an account. Returns `None` when the email is already registered,
/// including by a registration that raced this one.
pub async fn insert_user(
    pool: &PgPool,
    email: &str,
    password_hash: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as(INSERT_USER)
        .bind(email)
        .bind(password_hash)
        .fetch_optional(pool)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_email_inserts_nothing() {
        assert!(INSERT_USER.contains("ON CONFLICT (email) DO NOTHING"));
        assert!(INSERT_USER.ends_with("RETURNING *"));
    }
}
