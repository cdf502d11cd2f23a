//! Signed access and refresh token issuance
//!
//! Access and refresh tokens are signed with independent secrets so a leaked
//! token of one kind can never be verified as the other.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::domain::user::{Role, User, UserId};
use crate::domain::DomainError;

/// Identity claims carried by every issued token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,
    pub email: String,
    pub role: Role,
    /// Issued at timestamp (Unix epoch)
    pub iat: i64,
    /// Expiration timestamp (Unix epoch)
    pub exp: i64,
    /// Unique token id, makes every issued token distinct
    pub jti: String,
}

impl Claims {
    fn new(user: &User, ttl: Duration) -> Self {
        let now = Utc::now();

        Self {
            sub: user.id().to_string(),
            email: user.email().to_string(),
            role: user.role(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            jti: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// Parse the subject back into a user id
    pub fn user_id(&self) -> Result<UserId, DomainError> {
        UserId::parse(&self.sub).map_err(|_| DomainError::InvalidToken)
    }
}

/// Configuration for the token issuer
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// Secret for signing access tokens, min 32 bytes
    pub access_secret: String,
    /// Secret for signing refresh tokens, min 32 bytes
    pub refresh_secret: String,
    /// Access token lifetime in hours
    pub access_ttl_hours: u64,
    /// Refresh token lifetime in days
    pub refresh_ttl_days: u64,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            access_secret: "change-me-in-production-0123456789ab".to_string(),
            refresh_secret: "change-me-too-in-production-0123456".to_string(),
            access_ttl_hours: 24,
            refresh_ttl_days: 7,
        }
    }
}

/// Trait for token issuance and verification
pub trait TokenIssuer: Send + Sync + Debug {
    fn generate_access_token(&self, user: &User) -> Result<String, DomainError>;

    fn generate_refresh_token(&self, user: &User) -> Result<String, DomainError>;

    fn verify_access_token(&self, token: &str) -> Result<Claims, DomainError>;

    fn verify_refresh_token(&self, token: &str) -> Result<Claims, DomainError>;

    /// Access token lifetime
    fn access_ttl(&self) -> Duration;

    /// Refresh token lifetime
    fn refresh_ttl(&self) -> Duration;
}

/// HS256 token issuer with separate access and refresh key pairs
#[derive(Clone)]
pub struct JwtTokenIssuer {
    config: TokenConfig,
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
}

impl Debug for JwtTokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtTokenIssuer")
            .field("access_ttl_hours", &self.config.access_ttl_hours)
            .field("refresh_ttl_days", &self.config.refresh_ttl_days)
            .field("keys", &"[hidden]")
            .finish()
    }
}

impl JwtTokenIssuer {
    pub fn new(config: TokenConfig) -> Self {
        let access_encoding = EncodingKey::from_secret(config.access_secret.as_bytes());
        let access_decoding = DecodingKey::from_secret(config.access_secret.as_bytes());
        let refresh_encoding = EncodingKey::from_secret(config.refresh_secret.as_bytes());
        let refresh_decoding = DecodingKey::from_secret(config.refresh_secret.as_bytes());

        Self {
            config,
            access_encoding,
            access_decoding,
            refresh_encoding,
            refresh_decoding,
        }
    }

    fn generate(&self, user: &User, ttl: Duration, key: &EncodingKey) -> Result<String, DomainError> {
        let claims = Claims::new(user, ttl);

        encode(&Header::default(), &claims, key)
            .map_err(|e| DomainError::internal(format!("Failed to sign token: {}", e)))
    }

    fn verify(&self, token: &str, key: &DecodingKey) -> Result<Claims, DomainError> {
        let validation = Validation::default();

        match decode::<Claims>(token, key, &validation) {
            Ok(data) => Ok(data.claims),
            Err(e) => match e.kind() {
                ErrorKind::ExpiredSignature => Err(DomainError::TokenExpired),
                _ => Err(DomainError::InvalidToken),
            },
        }
    }
}

impl TokenIssuer for JwtTokenIssuer {
    fn generate_access_token(&self, user: &User) -> Result<String, DomainError> {
        self.generate(user, self.access_ttl(), &self.access_encoding)
    }

    fn generate_refresh_token(&self, user: &User) -> Result<String, DomainError> {
        self.generate(user, self.refresh_ttl(), &self.refresh_encoding)
    }

    fn verify_access_token(&self, token: &str) -> Result<Claims, DomainError> {
        self.verify(token, &self.access_decoding)
    }

    fn verify_refresh_token(&self, token: &str) -> Result<Claims, DomainError> {
        self.verify(token, &self.refresh_decoding)
    }

    fn access_ttl(&self) -> Duration {
        Duration::hours(self.config.access_ttl_hours as i64)
    }

    fn refresh_ttl(&self) -> Duration {
        Duration::days(self.config.refresh_ttl_days as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_user() -> User {
        User::new(
            "user@example.com",
            Some("hashed_password".to_string()),
            "Test User",
            Role::User,
        )
    }

    fn create_issuer() -> JwtTokenIssuer {
        JwtTokenIssuer::new(TokenConfig {
            access_secret: "access-secret-for-tests-0123456789ab".to_string(),
            refresh_secret: "refresh-secret-for-tests-0123456789a".to_string(),
            access_ttl_hours: 24,
            refresh_ttl_days: 7,
        })
    }

    #[test]
    fn test_access_token_round_trip() {
        let issuer = create_issuer();
        let user = create_test_user();

        let token = issuer.generate_access_token(&user).unwrap();
        assert!(!token.is_empty());

        let claims = issuer.verify_access_token(&token).unwrap();
        assert_eq!(claims.sub, user.id().to_string());
        assert_eq!(claims.email, "user@example.com");
        assert_eq!(claims.role, Role::User);
        assert_eq!(claims.user_id().unwrap(), user.id());
    }

    #[test]
    fn test_refresh_token_round_trip() {
        let issuer = create_issuer();
        let user = create_test_user();

        let token = issuer.generate_refresh_token(&user).unwrap();
        let claims = issuer.verify_refresh_token(&token).unwrap();
        assert_eq!(claims.sub, user.id().to_string());
    }

    #[test]
    fn test_secrets_are_independent() {
        let issuer = create_issuer();
        let user = create_test_user();

        let refresh = issuer.generate_refresh_token(&user).unwrap();
        let result = issuer.verify_access_token(&refresh);
        assert!(matches!(result, Err(DomainError::InvalidToken)));

        let access = issuer.generate_access_token(&user).unwrap();
        let result = issuer.verify_refresh_token(&access);
        assert!(matches!(result, Err(DomainError::InvalidToken)));
    }

    #[test]
    fn test_tokens_are_unique_per_issuance() {
        let issuer = create_issuer();
        let user = create_test_user();

        // Same user, same second: jti still makes the tokens distinct
        let first = issuer.generate_refresh_token(&user).unwrap();
        let second = issuer.generate_refresh_token(&user).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_garbage_token_is_invalid() {
        let issuer = create_issuer();

        let result = issuer.verify_access_token("not-a-token");
        assert!(matches!(result, Err(DomainError::InvalidToken)));
    }

    #[test]
    fn test_expired_token_is_distinguished() {
        let issuer = create_issuer();
        let user = create_test_user();

        // Sign claims that expired two hours ago with the access secret
        let past = Utc::now() - Duration::hours(2);
        let claims = Claims {
            sub: user.id().to_string(),
            email: user.email().to_string(),
            role: user.role(),
            iat: (past - Duration::hours(1)).timestamp(),
            exp: past.timestamp(),
            jti: "test-token-id".to_string(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret("access-secret-for-tests-0123456789ab".as_bytes()),
        )
        .unwrap();

        let result = issuer.verify_access_token(&token);
        assert!(matches!(result, Err(DomainError::TokenExpired)));
    }

    #[test]
    fn test_wrong_secret_fails() {
        let issuer1 = create_issuer();
        let issuer2 = JwtTokenIssuer::new(TokenConfig {
            access_secret: "a-completely-different-secret-012345".to_string(),
            refresh_secret: "another-different-secret-0123456789a".to_string(),
            access_ttl_hours: 24,
            refresh_ttl_days: 7,
        });

        let user = create_test_user();
        let token = issuer1.generate_access_token(&user).unwrap();

        assert!(issuer2.verify_access_token(&token).is_err());
    }

    #[test]
    fn test_ttls() {
        let issuer = create_issuer();
        assert_eq!(issuer.access_ttl(), Duration::hours(24));
        assert_eq!(issuer.refresh_ttl(), Duration::days(7));
    }
}
