//! Credential records backing the authentication flows
//!
//! All of these share the same lifecycle rule: a record is *valid* while it
//! is unused (or unrevoked) and its expiry has not elapsed. Consuming one is
//! one-way and idempotent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::user::UserId;

/// Server-side record of an issued refresh token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshTokenRecord {
    /// The opaque token value, unique across all rows
    pub token: String,
    pub user_id: UserId,
    pub expires_at: DateTime<Utc>,
    pub is_revoked: bool,
    pub created_at: DateTime<Utc>,
}

impl RefreshTokenRecord {
    pub fn new(user_id: UserId, token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            token: token.into(),
            user_id,
            expires_at,
            is_revoked: false,
            created_at: Utc::now(),
        }
    }

    /// Usable as a credential right now
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        !self.is_revoked && self.expires_at > now
    }
}

/// One-time numeric code sent out of band
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpCode {
    pub id: Uuid,
    pub user_id: UserId,
    pub code: String,
    pub expires_at: DateTime<Utc>,
    pub is_used: bool,
    /// Failed verification attempts against this code
    pub attempts: u32,
    pub created_at: DateTime<Utc>,
}

impl OtpCode {
    pub fn new(user_id: UserId, code: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            code: code.into(),
            expires_at,
            is_used: false,
            attempts: 0,
            created_at: Utc::now(),
        }
    }

    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        !self.is_used && self.expires_at > now
    }
}

/// What a one-time token is allowed to be exchanged for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenPurpose {
    MagicLink,
    PasswordReset,
    EmailVerification,
}

impl TokenPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MagicLink => "magic_link",
            Self::PasswordReset => "password_reset",
            Self::EmailVerification => "email_verification",
        }
    }
}

/// Single-use secure token (magic link, password reset, email verification)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OneTimeToken {
    pub id: Uuid,
    pub user_id: UserId,
    pub token: String,
    pub purpose: TokenPurpose,
    pub expires_at: DateTime<Utc>,
    pub is_used: bool,
    pub created_at: DateTime<Utc>,
}

impl OneTimeToken {
    pub fn new(
        user_id: UserId,
        token: impl Into<String>,
        purpose: TokenPurpose,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            token: token.into(),
            purpose,
            expires_at,
            is_used: false,
            created_at: Utc::now(),
        }
    }

    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        !self.is_used && self.expires_at > now
    }
}

/// Server-side session record, an alternative to refresh tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user_id: UserId,
    pub expires_at: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(
        user_id: UserId,
        token: impl Into<String>,
        expires_at: DateTime<Utc>,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> Self {
        Self {
            token: token.into(),
            user_id,
            expires_at,
            ip_address,
            user_agent,
            created_at: Utc::now(),
        }
    }

    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_refresh_token_validity() {
        let user_id = UserId::generate();
        let now = Utc::now();

        let live = RefreshTokenRecord::new(user_id, "tok", now + Duration::days(7));
        assert!(live.is_valid(now));

        let expired = RefreshTokenRecord::new(user_id, "tok", now - Duration::seconds(1));
        assert!(!expired.is_valid(now));

        let mut revoked = RefreshTokenRecord::new(user_id, "tok", now + Duration::days(7));
        revoked.is_revoked = true;
        assert!(!revoked.is_valid(now));
    }

    #[test]
    fn test_otp_validity() {
        let user_id = UserId::generate();
        let now = Utc::now();

        let mut otp = OtpCode::new(user_id, "123456", now + Duration::minutes(10));
        assert!(otp.is_valid(now));

        otp.is_used = true;
        assert!(!otp.is_valid(now));
    }

    #[test]
    fn test_one_time_token_validity() {
        let user_id = UserId::generate();
        let now = Utc::now();

        let token = OneTimeToken::new(
            user_id,
            "abcdef",
            TokenPurpose::PasswordReset,
            now + Duration::minutes(15),
        );
        assert!(token.is_valid(now));
        assert_eq!(token.purpose, TokenPurpose::PasswordReset);
    }

    #[test]
    fn test_purpose_strings() {
        assert_eq!(TokenPurpose::MagicLink.as_str(), "magic_link");
        assert_eq!(TokenPurpose::PasswordReset.as_str(), "password_reset");
        assert_eq!(
            TokenPurpose::EmailVerification.as_str(),
            "email_verification"
        );
    }

    #[test]
    fn test_session_validity() {
        let user_id = UserId::generate();
        let now = Utc::now();

        let session = Session::new(
            user_id,
            "sess",
            now + Duration::hours(1),
            Some("127.0.0.1".to_string()),
            None,
        );
        assert!(session.is_valid(now));
        assert!(!session.is_valid(now + Duration::hours(2)));
    }
}
