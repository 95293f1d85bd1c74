//! Email and password authentication.
//!
//! Credential checks compile everywhere so forms can validate before calling
//! the server. Hashing, sessions and reset tokens are server only.

use thiserror::Error;

#[cfg(feature = "server")]
mod password;
#[cfg(feature = "server")]
pub mod reset;
#[cfg(feature = "server")]
mod session;

#[cfg(feature = "server")]
pub use password::{hash_password, verify_password};
#[cfg(feature = "server")]
pub use session::{current_user_id, log_in, require_user, SESSION_USER_ID_KEY};

pub const PASSWORD_MIN_CHARS: usize = 6;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AuthError {
    #[error("请输入有效的邮箱地址")]
    InvalidEmail,
    #[error("密码至少需要6个字符")]
    PasswordTooShort,
    #[error("两次输入的密码不一致")]
    PasswordMismatch,
    #[error("该邮箱已被注册")]
    EmailTaken,
    #[error("邮箱或密码错误")]
    InvalidCredentials,
    #[error("重置链接无效或已过期")]
    InvalidResetToken,
    #[error("请先登录")]
    NotAuthenticated,
    #[error("password hashing failed: {0}")]
    Hash(String),
    #[error("session error: {0}")]
    Session(String),
}

/// Trim and lowercase an email, rejecting anything without an `@`.
pub fn normalize_email(email: &str) -> Result<String, AuthError> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(AuthError::InvalidEmail),
    }
}

pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < PASSWORD_MIN_CHARS {
        return Err(AuthError::PasswordTooShort);
    }
    Ok(())
}

/// Checks for the register and reset forms, which ask for the password twice.
pub fn validate_new_password(password: &str, confirm: &str) -> Result<(), AuthError> {
    validate_password(password)?;
    if password != confirm {
        return Err(AuthError::PasswordMismatch);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Me@Example.COM ").unwrap(), "me@example.com");
        assert_eq!(normalize_email("nope"), Err(AuthError::InvalidEmail));
        assert_eq!(normalize_email("@x.com"), Err(AuthError::InvalidEmail));
    }

    #[test]
    fn test_password_rules() {
        assert_eq!(validate_password("12345"), Err(AuthError::PasswordTooShort));
        assert!(validate_password("123456").is_ok());
        assert_eq!(
            validate_new_password("123456", "1234567"),
            Err(AuthError::PasswordMismatch)
        );
        assert!(validate_new_password("密码很安全呢", "密码很安全呢").is_ok());
    }
}
