//! Password reset tokens.
//!
//! A token is 32 random bytes, hex encoded, stored in `password_resets` with an
//! expiry one hour out. It can be used once.

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;

pub const TOKEN_BYTES: usize = 32;

pub fn token_ttl() -> Duration {
    Duration::hours(1)
}

pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Link that opens the reset form for `token`.
pub fn reset_link(public_url: &str, token: &str) -> String {
    format!("{}/reset-password/{}", public_url.trim_end_matches('/'), token)
}

/// Whether a stored token can still be redeemed at `now`.
pub fn is_redeemable(
    expires_at: DateTime<Utc>,
    used_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> bool {
    used_at.is_none() && now < expires_at
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_is_64_hex_chars() {
        let token = generate_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(token, generate_token());
    }

    #[test]
    fn test_reset_link() {
        assert_eq!(
            reset_link("https://ethoslog.app/", "abc"),
            "https://ethoslog.app/reset-password/abc"
        );
    }

    #[test]
    fn test_is_redeemable() {
        let now = Utc::now();
        let expires = now + token_ttl();
        assert!(is_redeemable(expires, None, now));
        assert!(!is_redeemable(expires, Some(now), now));
        assert!(!is_redeemable(expires, None, expires + Duration::seconds(1)));
    }
}
