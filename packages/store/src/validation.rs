//! Profile form validation.
//!
//! The same checks run in the profile page (to show the message right away) and
//! in the `update_profile` server function (the authoritative check).

use thiserror::Error;

use crate::models::ProfileUpdate;

pub const USERNAME_MIN_CHARS: usize = 2;
pub const USERNAME_MAX_CHARS: usize = 30;
pub const BIO_MAX_CHARS: usize = 200;
pub const LOCATION_MAX_CHARS: usize = 100;

/// A rejected form field. The message is shown to the user verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("用户名不能为空")]
    UsernameEmpty,
    #[error("用户名只能包含字母、数字、下划线和连字符")]
    UsernameCharset,
    #[error("用户名长度必须在2-30个字符之间")]
    UsernameLength,
    #[error("个人简介不能超过200个字符")]
    BioTooLong,
    #[error("所在地不能超过100个字符")]
    LocationTooLong,
}

fn is_username_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.is_empty() {
        return Err(ValidationError::UsernameEmpty);
    }
    if !username.chars().all(is_username_char) {
        return Err(ValidationError::UsernameCharset);
    }
    let len = username.chars().count();
    if !(USERNAME_MIN_CHARS..=USERNAME_MAX_CHARS).contains(&len) {
        return Err(ValidationError::UsernameLength);
    }
    Ok(())
}

pub fn validate_bio(bio: &str) -> Result<(), ValidationError> {
    if bio.chars().count() > BIO_MAX_CHARS {
        return Err(ValidationError::BioTooLong);
    }
    Ok(())
}

pub fn validate_location(location: &str) -> Result<(), ValidationError> {
    if location.chars().count() > LOCATION_MAX_CHARS {
        return Err(ValidationError::LocationTooLong);
    }
    Ok(())
}

/// Run every profile check in form order, stopping at the first failure.
pub fn validate_profile(update: &ProfileUpdate) -> Result<(), ValidationError> {
    validate_username(update.username.trim())?;
    if let Some(bio) = &update.bio {
        validate_bio(bio.trim())?;
    }
    if let Some(location) = &update.location {
        validate_location(location.trim())?;
    }
    Ok(())
}

/// Derive the initial username for a freshly registered account.
///
/// Takes the local part of the email, keeps only username characters and
/// lowercases it. Names shorter than the minimum get `suffix` appended (the
/// server passes two random base-36 characters); long names are truncated.
pub fn username_from_email(email: &str, suffix: &str) -> String {
    let local = email.split('@').next().unwrap_or_default();
    let mut username: String = local
        .chars()
        .filter(|c| is_username_char(*c))
        .collect::<String>()
        .to_lowercase();

    if username.chars().count() < USERNAME_MIN_CHARS {
        username.push_str(suffix);
    }
    username.chars().take(USERNAME_MAX_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_rules() {
        assert_eq!(validate_username(""), Err(ValidationError::UsernameEmpty));
        assert_eq!(validate_username("张三"), Err(ValidationError::UsernameCharset));
        assert_eq!(validate_username("a b"), Err(ValidationError::UsernameCharset));
        assert_eq!(validate_username("a"), Err(ValidationError::UsernameLength));
        assert_eq!(
            validate_username(&"a".repeat(31)),
            Err(ValidationError::UsernameLength)
        );
        assert!(validate_username("ab").is_ok());
        assert!(validate_username("night_owl-42").is_ok());
        assert!(validate_username(&"a".repeat(30)).is_ok());
    }

    #[test]
    fn test_bio_and_location_limits() {
        assert!(validate_bio(&"字".repeat(200)).is_ok());
        assert_eq!(validate_bio(&"字".repeat(201)), Err(ValidationError::BioTooLong));
        assert!(validate_location("杭州").is_ok());
        assert_eq!(
            validate_location(&"x".repeat(101)),
            Err(ValidationError::LocationTooLong)
        );
    }

    #[test]
    fn test_error_messages_are_user_facing() {
        assert_eq!(ValidationError::UsernameLength.to_string(), "用户名长度必须在2-30个字符之间");
    }

    #[test]
    fn test_username_from_email() {
        assert_eq!(username_from_email("John.Doe+news@example.com", "xy"), "johndoenews");
        assert_eq!(username_from_email("a@example.com", "k3"), "ak3");
        assert_eq!(username_from_email("王@example.com", "k3"), "k3");
        let long = format!("{}@example.com", "b".repeat(40));
        assert_eq!(username_from_email(&long, "xy").len(), 30);
    }

    #[test]
    fn test_validate_profile_reports_first_failure() {
        let mut update = ProfileUpdate {
            username: " lin_01 ".into(),
            bio: Some("读书".into()),
            location: Some("杭州".into()),
            ..ProfileUpdate::default()
        };
        assert!(validate_profile(&update).is_ok());

        update.bio = Some("字".repeat(201));
        update.location = Some("地".repeat(101));
        assert_eq!(validate_profile(&update), Err(ValidationError::BioTooLong));

        update.username = "张三".into();
        assert_eq!(validate_profile(&update), Err(ValidationError::UsernameCharset));
    }
}
