//! Authentication workflow
//!
//! Orchestrates registration, login, token refresh and logout over the user
//! and auth stores. Password hashing is pushed onto the blocking pool so the
//! async runtime is never stalled by Argon2.

use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::auth::{AuthRepository, RefreshTokenRecord};
use crate::domain::user::{validate_email, validate_name, Role, User, UserRepository};
use crate::domain::DomainError;
use crate::infrastructure::auth::jwt::TokenIssuer;
use crate::infrastructure::auth::password::{validate_password_strength, PasswordHasher};

const INVALID_CREDENTIALS: &str = "Invalid email or password";
const ACCOUNT_DEACTIVATED: &str = "Account is deactivated";
const INVALID_REFRESH_TOKEN: &str = "Invalid refresh token";
const REFRESH_TOKEN_EXPIRED: &str = "Refresh token expired";

/// Result of a successful authentication flow
#[derive(Debug, Clone)]
pub struct AuthTokens {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
}

/// Service for the authentication lifecycle
#[derive(Debug)]
pub struct AuthService<U, A, H, T>
where
    U: UserRepository,
    A: AuthRepository,
    H: PasswordHasher + 'static,
    T: TokenIssuer,
{
    users: Arc<U>,
    auth: Arc<A>,
    hasher: Arc<H>,
    tokens: Arc<T>,
}

impl<U, A, H, T> AuthService<U, A, H, T>
where
    U: UserRepository,
    A: AuthRepository,
    H: PasswordHasher + 'static,
    T: TokenIssuer,
{
    pub fn new(users: Arc<U>, auth: Arc<A>, hasher: Arc<H>, tokens: Arc<T>) -> Self {
        Self {
            users,
            auth,
            hasher,
            tokens,
        }
    }

    /// Register a new account and sign it in
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<AuthTokens, DomainError> {
        validate_email(email).map_err(|e| DomainError::validation(e.to_string()))?;
        validate_name(name).map_err(|e| DomainError::validation(e.to_string()))?;

        if let Err(errors) = validate_password_strength(password) {
            return Err(DomainError::validation_with_details(
                "Password does not meet requirements",
                errors,
            ));
        }

        if self.users.find_by_email(email).await?.is_some() {
            return Err(DomainError::conflict("User with this email already exists"));
        }

        let password_hash = self.hash_password(password).await?;

        // The store's unique index catches a concurrent registration; its
        // Conflict passes through unchanged
        let user = self
            .users
            .create(User::new(email, Some(password_hash), name, Role::User))
            .await?;

        info!(user_id = %user.id(), "User registered");

        self.issue_tokens(user).await
    }

    /// Authenticate with email and password
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthTokens, DomainError> {
        let mut user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or_else(|| DomainError::invalid_credentials(INVALID_CREDENTIALS))?;

        let hash = user
            .password_hash()
            .ok_or_else(|| DomainError::invalid_credentials(INVALID_CREDENTIALS))?
            .to_string();

        if !self.verify_password(password, hash).await? {
            warn!(user_id = %user.id(), "Login failed: wrong password");
            return Err(DomainError::invalid_credentials(INVALID_CREDENTIALS));
        }

        // Password first, then the active flag, so an attacker probing a
        // deactivated account still pays for a hash verification
        if !user.is_active() {
            return Err(DomainError::invalid_credentials(ACCOUNT_DEACTIVATED));
        }

        user.record_login();
        self.users.update_last_login(user.id()).await?;

        info!(user_id = %user.id(), "User logged in");

        self.issue_tokens(user).await
    }

    /// Exchange a refresh token for a fresh pair, retiring the old one
    pub async fn refresh(&self, refresh_token: &str) -> Result<AuthTokens, DomainError> {
        self.tokens.verify_refresh_token(refresh_token)?;

        let record = self
            .auth
            .find_refresh_token(refresh_token)
            .await?
            .ok_or_else(|| DomainError::invalid_credentials(INVALID_REFRESH_TOKEN))?;

        if record.is_revoked {
            return Err(DomainError::invalid_credentials(INVALID_REFRESH_TOKEN));
        }

        if record.expires_at <= Utc::now() {
            // Signature lifetime and row lifetime can disagree under clock
            // skew; the row is authoritative
            self.auth.delete_refresh_token(refresh_token).await?;
            return Err(DomainError::invalid_credentials(REFRESH_TOKEN_EXPIRED));
        }

        let user = self
            .users
            .find_by_id(record.user_id)
            .await?
            .ok_or_else(|| DomainError::invalid_credentials(INVALID_REFRESH_TOKEN))?;

        if !user.is_active() {
            return Err(DomainError::invalid_credentials(ACCOUNT_DEACTIVATED));
        }

        let access_token = self.tokens.generate_access_token(&user)?;
        let new_refresh = self.tokens.generate_refresh_token(&user)?;

        let new_record = RefreshTokenRecord::new(
            user.id(),
            new_refresh.clone(),
            Utc::now() + self.tokens.refresh_ttl(),
        );

        self.auth
            .rotate_refresh_token(refresh_token, new_record)
            .await?;

        Ok(AuthTokens {
            user,
            access_token,
            refresh_token: new_refresh,
        })
    }

    /// Resolve an access token to its active user
    pub async fn authenticate(&self, access_token: &str) -> Result<User, DomainError> {
        let claims = self.tokens.verify_access_token(access_token)?;

        let user = self
            .users
            .find_by_id(claims.user_id()?)
            .await?
            .ok_or(DomainError::InvalidToken)?;

        if !user.is_active() {
            return Err(DomainError::invalid_credentials(ACCOUNT_DEACTIVATED));
        }

        Ok(user)
    }

    /// Invalidate a refresh token; unknown tokens succeed silently
    pub async fn logout(&self, refresh_token: &str) -> Result<(), DomainError> {
        self.auth.revoke_refresh_token(refresh_token).await
    }

    async fn issue_tokens(&self, user: User) -> Result<AuthTokens, DomainError> {
        let access_token = self.tokens.generate_access_token(&user)?;
        let refresh_token = self.tokens.generate_refresh_token(&user)?;

        let record = RefreshTokenRecord::new(
            user.id(),
            refresh_token.clone(),
            Utc::now() + self.tokens.refresh_ttl(),
        );
        self.auth.create_refresh_token(record).await?;

        Ok(AuthTokens {
            user,
            access_token,
            refresh_token,
        })
    }

    async fn hash_password(&self, password: &str) -> Result<String, DomainError> {
        let hasher = Arc::clone(&self.hasher);
        let password = password.to_string();

        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| DomainError::internal(format!("Hashing task failed: {}", e)))?
    }

    async fn verify_password(&self, password: &str, hash: String) -> Result<bool, DomainError> {
        let hasher = Arc::clone(&self.hasher);
        let password = password.to_string();

        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| DomainError::internal(format!("Verification task failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::auth::jwt::{JwtTokenIssuer, TokenConfig};
    use crate::infrastructure::auth::password::Argon2Hasher;
    use crate::infrastructure::auth::repository::InMemoryAuthRepository;
    use crate::infrastructure::user::repository::InMemoryUserRepository;

    type TestService =
        AuthService<InMemoryUserRepository, InMemoryAuthRepository, Argon2Hasher, JwtTokenIssuer>;

    fn create_service() -> TestService {
        let issuer = JwtTokenIssuer::new(TokenConfig {
            access_secret: "access-secret-for-tests-0123456789ab".to_string(),
            refresh_secret: "refresh-secret-for-tests-0123456789a".to_string(),
            access_ttl_hours: 1,
            refresh_ttl_days: 7,
        });

        AuthService::new(
            Arc::new(InMemoryUserRepository::new()),
            Arc::new(InMemoryAuthRepository::new()),
            Arc::new(Argon2Hasher::new()),
            Arc::new(issuer),
        )
    }

    #[tokio::test]
    async fn test_register_returns_user_and_tokens() {
        let service = create_service();

        let tokens = service
            .register("alice@example.com", "Passw0rd", "Alice")
            .await
            .unwrap();

        assert_eq!(tokens.user.email(), "alice@example.com");
        assert!(tokens.user.password_hash().is_some());
        assert!(!tokens.access_token.is_empty());
        assert!(!tokens.refresh_token.is_empty());
        assert_ne!(tokens.access_token, tokens.refresh_token);
    }

    #[tokio::test]
    async fn test_register_duplicate_email_conflicts() {
        let service = create_service();

        service
            .register("alice@example.com", "Passw0rd", "Alice")
            .await
            .unwrap();

        let result = service
            .register("alice@example.com", "Passw0rd", "Alice Again")
            .await;
        assert!(matches!(result, Err(DomainError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_register_weak_password_lists_all_violations() {
        let service = create_service();

        let result = service.register("alice@example.com", "", "Alice").await;
        match result {
            Err(DomainError::Validation { details, .. }) => assert_eq!(details.len(), 4),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_register_rejects_bad_email() {
        let service = create_service();

        let result = service.register("not-an-email", "Passw0rd", "Alice").await;
        assert!(matches!(result, Err(DomainError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_login_success_records_last_login() {
        let service = create_service();
        service
            .register("alice@example.com", "Passw0rd", "Alice")
            .await
            .unwrap();

        let tokens = service.login("alice@example.com", "Passw0rd").await.unwrap();
        assert!(tokens.user.last_login_at().is_some());
    }

    #[tokio::test]
    async fn test_login_failures_share_one_message() {
        let service = create_service();
        service
            .register("alice@example.com", "Passw0rd", "Alice")
            .await
            .unwrap();

        let wrong_password = service.login("alice@example.com", "WrongPass1").await;
        let unknown_email = service.login("nobody@example.com", "Passw0rd").await;

        let msg_a = match wrong_password {
            Err(DomainError::InvalidCredentials { message }) => message,
            other => panic!("expected invalid credentials, got {:?}", other),
        };
        let msg_b = match unknown_email {
            Err(DomainError::InvalidCredentials { message }) => message,
            other => panic!("expected invalid credentials, got {:?}", other),
        };
        assert_eq!(msg_a, msg_b);
    }

    #[tokio::test]
    async fn test_login_deactivated_account() {
        let service = create_service();
        let tokens = service
            .register("alice@example.com", "Passw0rd", "Alice")
            .await
            .unwrap();

        let mut user = tokens.user;
        user.deactivate();
        service.users.update(&user).await.unwrap();

        let result = service.login("alice@example.com", "Passw0rd").await;
        match result {
            Err(DomainError::InvalidCredentials { message }) => {
                assert_eq!(message, "Account is deactivated");
            }
            other => panic!("expected invalid credentials, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_refresh_rotates_token() {
        let service = create_service();
        let tokens = service
            .register("alice@example.com", "Passw0rd", "Alice")
            .await
            .unwrap();

        let refreshed = service.refresh(&tokens.refresh_token).await.unwrap();
        assert_ne!(refreshed.refresh_token, tokens.refresh_token);

        // The retired token no longer works
        let replay = service.refresh(&tokens.refresh_token).await;
        assert!(matches!(
            replay,
            Err(DomainError::InvalidCredentials { .. })
        ));

        // The fresh one does
        assert!(service.refresh(&refreshed.refresh_token).await.is_ok());
    }

    #[tokio::test]
    async fn test_refresh_after_logout_fails() {
        let service = create_service();
        let tokens = service
            .register("alice@example.com", "Passw0rd", "Alice")
            .await
            .unwrap();

        service.logout(&tokens.refresh_token).await.unwrap();

        let result = service.refresh(&tokens.refresh_token).await;
        assert!(matches!(
            result,
            Err(DomainError::InvalidCredentials { .. })
        ));
    }

    #[tokio::test]
    async fn test_refresh_rejects_garbage() {
        let service = create_service();

        let result = service.refresh("not-a-token").await;
        assert!(matches!(result, Err(DomainError::InvalidToken)));
    }

    #[tokio::test]
    async fn test_refresh_unknown_but_well_signed_token() {
        let service = create_service();
        let tokens = service
            .register("alice@example.com", "Passw0rd", "Alice")
            .await
            .unwrap();

        // Well-signed, but never persisted
        let orphan = service
            .tokens
            .generate_refresh_token(&tokens.user)
            .unwrap();

        let result = service.refresh(&orphan).await;
        assert!(matches!(
            result,
            Err(DomainError::InvalidCredentials { .. })
        ));
    }

    #[tokio::test]
    async fn test_authenticate_resolves_access_token() {
        let service = create_service();
        let tokens = service
            .register("alice@example.com", "Passw0rd", "Alice")
            .await
            .unwrap();

        let user = service.authenticate(&tokens.access_token).await.unwrap();
        assert_eq!(user.id(), tokens.user.id());

        // A refresh token must not pass as an access token
        let result = service.authenticate(&tokens.refresh_token).await;
        assert!(matches!(result, Err(DomainError::InvalidToken)));
    }

    #[tokio::test]
    async fn test_authenticate_rejects_deactivated_user() {
        let service = create_service();
        let tokens = service
            .register("alice@example.com", "Passw0rd", "Alice")
            .await
            .unwrap();

        let mut user = tokens.user;
        user.deactivate();
        service.users.update(&user).await.unwrap();

        let result = service.authenticate(&tokens.access_token).await;
        assert!(matches!(
            result,
            Err(DomainError::InvalidCredentials { .. })
        ));
    }

    #[tokio::test]
    async fn test_logout_is_idempotent() {
        let service = create_service();
        let tokens = service
            .register("alice@example.com", "Passw0rd", "Alice")
            .await
            .unwrap();

        service.logout(&tokens.refresh_token).await.unwrap();
        service.logout(&tokens.refresh_token).await.unwrap();
        service.logout("completely-unknown").await.unwrap();
    }

    #[tokio::test]
    async fn test_refresh_expired_row_is_deleted() {
        let service = create_service();
        let tokens = service
            .register("alice@example.com", "Passw0rd", "Alice")
            .await
            .unwrap();

        // Well-signed token whose stored row has already lapsed
        let stale = service
            .tokens
            .generate_refresh_token(&tokens.user)
            .unwrap();
        service
            .auth
            .create_refresh_token(RefreshTokenRecord::new(
                tokens.user.id(),
                stale.clone(),
                Utc::now() - chrono::Duration::hours(1),
            ))
            .await
            .unwrap();

        let result = service.refresh(&stale).await;
        match result {
            Err(DomainError::InvalidCredentials { message }) => {
                assert_eq!(message, "Refresh token expired");
            }
            other => panic!("expected invalid credentials, got {:?}", other),
        }

        // The lapsed row is gone, not merely rejected
        assert!(service.auth.find_refresh_token(&stale).await.unwrap().is_none());
    }
}
