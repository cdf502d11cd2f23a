//! Auth store contract
//!
//! Persistence for refresh tokens plus the single-use credential families
//! (OTP codes, one-time tokens, sessions). Mark-used and revoke operations
//! are one-way and idempotent: applying them to an already-consumed record
//! affects zero rows and is not an error.

use async_trait::async_trait;
use std::fmt::Debug;
use uuid::Uuid;

use super::entity::{OneTimeToken, OtpCode, RefreshTokenRecord, Session, TokenPurpose};
use crate::domain::user::UserId;
use crate::domain::DomainError;

/// Repository trait for authentication credentials
#[async_trait]
pub trait AuthRepository: Send + Sync + Debug {
    // Refresh tokens

    async fn create_refresh_token(
        &self,
        record: RefreshTokenRecord,
    ) -> Result<RefreshTokenRecord, DomainError>;

    /// Find a token that is neither revoked nor expired
    async fn find_valid_refresh_token(
        &self,
        token: &str,
    ) -> Result<Option<RefreshTokenRecord>, DomainError>;

    /// Find a token row regardless of validity
    async fn find_refresh_token(
        &self,
        token: &str,
    ) -> Result<Option<RefreshTokenRecord>, DomainError>;

    /// Mark a token revoked; keeps the row
    async fn revoke_refresh_token(&self, token: &str) -> Result<(), DomainError>;

    async fn revoke_all_user_refresh_tokens(&self, user_id: UserId) -> Result<(), DomainError>;

    /// Remove a token row; returns whether a row was removed
    async fn delete_refresh_token(&self, token: &str) -> Result<bool, DomainError>;

    /// Atomically retire `old_token` and persist `new_record`
    ///
    /// Both steps happen in one transaction so a crash cannot leave a
    /// session with zero or two live tokens.
    async fn rotate_refresh_token(
        &self,
        old_token: &str,
        new_record: RefreshTokenRecord,
    ) -> Result<RefreshTokenRecord, DomainError>;

    async fn delete_expired_refresh_tokens(&self) -> Result<u64, DomainError>;

    // OTP codes

    async fn create_otp_code(&self, otp: OtpCode) -> Result<OtpCode, DomainError>;

    async fn find_valid_otp_code(
        &self,
        user_id: UserId,
        code: &str,
    ) -> Result<Option<OtpCode>, DomainError>;

    async fn mark_otp_used(&self, id: Uuid) -> Result<(), DomainError>;

    async fn increment_otp_attempts(&self, id: Uuid) -> Result<(), DomainError>;

    async fn delete_expired_otp_codes(&self) -> Result<u64, DomainError>;

    // One-time tokens (magic link, password reset, email verification)

    async fn create_one_time_token(
        &self,
        token: OneTimeToken,
    ) -> Result<OneTimeToken, DomainError>;

    async fn find_valid_one_time_token(
        &self,
        token: &str,
        purpose: TokenPurpose,
    ) -> Result<Option<OneTimeToken>, DomainError>;

    async fn mark_one_time_token_used(&self, id: Uuid) -> Result<(), DomainError>;

    /// Consume every outstanding token of one purpose for a user
    async fn revoke_all_one_time_tokens(
        &self,
        user_id: UserId,
        purpose: TokenPurpose,
    ) -> Result<(), DomainError>;

    async fn delete_expired_one_time_tokens(&self) -> Result<u64, DomainError>;

    // Sessions

    async fn create_session(&self, session: Session) -> Result<Session, DomainError>;

    async fn find_valid_session(&self, token: &str) -> Result<Option<Session>, DomainError>;

    async fn delete_session(&self, token: &str) -> Result<bool, DomainError>;

    async fn delete_all_user_sessions(&self, user_id: UserId) -> Result<(), DomainError>;

    async fn delete_expired_sessions(&self) -> Result<u64, DomainError>;
}
