//! In-memory auth repository

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::auth::{
    AuthRepository, OneTimeToken, OtpCode, RefreshTokenRecord, Session, TokenPurpose,
};
use crate::domain::user::UserId;
use crate::domain::DomainError;

/// In-memory implementation of AuthRepository
#[derive(Debug, Clone, Default)]
pub struct InMemoryAuthRepository {
    refresh_tokens: Arc<RwLock<HashMap<String, RefreshTokenRecord>>>,
    otp_codes: Arc<RwLock<HashMap<Uuid, OtpCode>>>,
    one_time_tokens: Arc<RwLock<HashMap<Uuid, OneTimeToken>>>,
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

impl InMemoryAuthRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuthRepository for InMemoryAuthRepository {
    async fn create_refresh_token(
        &self,
        record: RefreshTokenRecord,
    ) -> Result<RefreshTokenRecord, DomainError> {
        let mut tokens = self.refresh_tokens.write().await;

        if tokens.contains_key(&record.token) {
            return Err(DomainError::conflict("Refresh token already exists"));
        }

        tokens.insert(record.token.clone(), record.clone());
        Ok(record)
    }

    async fn find_valid_refresh_token(
        &self,
        token: &str,
    ) -> Result<Option<RefreshTokenRecord>, DomainError> {
        let tokens = self.refresh_tokens.read().await;
        let now = Utc::now();

        Ok(tokens.get(token).filter(|t| t.is_valid(now)).cloned())
    }

    async fn find_refresh_token(
        &self,
        token: &str,
    ) -> Result<Option<RefreshTokenRecord>, DomainError> {
        let tokens = self.refresh_tokens.read().await;
        Ok(tokens.get(token).cloned())
    }

    async fn revoke_refresh_token(&self, token: &str) -> Result<(), DomainError> {
        let mut tokens = self.refresh_tokens.write().await;

        if let Some(record) = tokens.get_mut(token) {
            record.is_revoked = true;
        }

        Ok(())
    }

    async fn revoke_all_user_refresh_tokens(&self, user_id: UserId) -> Result<(), DomainError> {
        let mut tokens = self.refresh_tokens.write().await;

        for record in tokens.values_mut() {
            if record.user_id == user_id {
                record.is_revoked = true;
            }
        }

        Ok(())
    }

    async fn delete_refresh_token(&self, token: &str) -> Result<bool, DomainError> {
        let mut tokens = self.refresh_tokens.write().await;
        Ok(tokens.remove(token).is_some())
    }

    async fn rotate_refresh_token(
        &self,
        old_token: &str,
        new_record: RefreshTokenRecord,
    ) -> Result<RefreshTokenRecord, DomainError> {
        // Single write lock covers both steps. The old row must still exist:
        // a concurrent rotation that already consumed it must not mint a
        // second live token for the same session.
        let mut tokens = self.refresh_tokens.write().await;

        if tokens.remove(old_token).is_none() {
            return Err(DomainError::invalid_credentials("Invalid refresh token"));
        }

        tokens.insert(new_record.token.clone(), new_record.clone());

        Ok(new_record)
    }

    async fn delete_expired_refresh_tokens(&self) -> Result<u64, DomainError> {
        let mut tokens = self.refresh_tokens.write().await;
        let now = Utc::now();

        let before = tokens.len();
        tokens.retain(|_, t| t.expires_at > now);

        Ok((before - tokens.len()) as u64)
    }

    async fn create_otp_code(&self, otp: OtpCode) -> Result<OtpCode, DomainError> {
        let mut codes = self.otp_codes.write().await;
        codes.insert(otp.id, otp.clone());
        Ok(otp)
    }

    async fn find_valid_otp_code(
        &self,
        user_id: UserId,
        code: &str,
    ) -> Result<Option<OtpCode>, DomainError> {
        let codes = self.otp_codes.read().await;
        let now = Utc::now();

        Ok(codes
            .values()
            .find(|c| c.user_id == user_id && c.code == code && c.is_valid(now))
            .cloned())
    }

    async fn mark_otp_used(&self, id: Uuid) -> Result<(), DomainError> {
        let mut codes = self.otp_codes.write().await;

        if let Some(otp) = codes.get_mut(&id) {
            otp.is_used = true;
        }

        Ok(())
    }

    async fn increment_otp_attempts(&self, id: Uuid) -> Result<(), DomainError> {
        let mut codes = self.otp_codes.write().await;

        if let Some(otp) = codes.get_mut(&id) {
            otp.attempts += 1;
        }

        Ok(())
    }

    async fn delete_expired_otp_codes(&self) -> Result<u64, DomainError> {
        let mut codes = self.otp_codes.write().await;
        let now = Utc::now();

        let before = codes.len();
        codes.retain(|_, c| c.expires_at > now);

        Ok((before - codes.len()) as u64)
    }

    async fn create_one_time_token(
        &self,
        token: OneTimeToken,
    ) -> Result<OneTimeToken, DomainError> {
        let mut tokens = self.one_time_tokens.write().await;
        tokens.insert(token.id, token.clone());
        Ok(token)
    }

    async fn find_valid_one_time_token(
        &self,
        token: &str,
        purpose: TokenPurpose,
    ) -> Result<Option<OneTimeToken>, DomainError> {
        let tokens = self.one_time_tokens.read().await;
        let now = Utc::now();

        Ok(tokens
            .values()
            .find(|t| t.token == token && t.purpose == purpose && t.is_valid(now))
            .cloned())
    }

    async fn mark_one_time_token_used(&self, id: Uuid) -> Result<(), DomainError> {
        let mut tokens = self.one_time_tokens.write().await;

        if let Some(token) = tokens.get_mut(&id) {
            token.is_used = true;
        }

        Ok(())
    }

    async fn revoke_all_one_time_tokens(
        &self,
        user_id: UserId,
        purpose: TokenPurpose,
    ) -> Result<(), DomainError> {
        let mut tokens = self.one_time_tokens.write().await;

        for token in tokens.values_mut() {
            if token.user_id == user_id && token.purpose == purpose {
                token.is_used = true;
            }
        }

        Ok(())
    }

    async fn delete_expired_one_time_tokens(&self) -> Result<u64, DomainError> {
        let mut tokens = self.one_time_tokens.write().await;
        let now = Utc::now();

        let before = tokens.len();
        tokens.retain(|_, t| t.expires_at > now);

        Ok((before - tokens.len()) as u64)
    }

    async fn create_session(&self, session: Session) -> Result<Session, DomainError> {
        let mut sessions = self.sessions.write().await;
        sessions.insert(session.token.clone(), session.clone());
        Ok(session)
    }

    async fn find_valid_session(&self, token: &str) -> Result<Option<Session>, DomainError> {
        let sessions = self.sessions.read().await;
        let now = Utc::now();

        Ok(sessions.get(token).filter(|s| s.is_valid(now)).cloned())
    }

    async fn delete_session(&self, token: &str) -> Result<bool, DomainError> {
        let mut sessions = self.sessions.write().await;
        Ok(sessions.remove(token).is_some())
    }

    async fn delete_all_user_sessions(&self, user_id: UserId) -> Result<(), DomainError> {
        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, s| s.user_id != user_id);
        Ok(())
    }

    async fn delete_expired_sessions(&self) -> Result<u64, DomainError> {
        let mut sessions = self.sessions.write().await;
        let now = Utc::now();

        let before = sessions.len();
        sessions.retain(|_, s| s.expires_at > now);

        Ok((before - sessions.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(user_id: UserId, token: &str, days: i64) -> RefreshTokenRecord {
        RefreshTokenRecord::new(user_id, token, Utc::now() + Duration::days(days))
    }

    #[tokio::test]
    async fn test_refresh_token_lifecycle() {
        let repo = InMemoryAuthRepository::new();
        let user_id = UserId::generate();

        repo.create_refresh_token(record(user_id, "tok-1", 7))
            .await
            .unwrap();

        let found = repo.find_valid_refresh_token("tok-1").await.unwrap();
        assert!(found.is_some());

        repo.revoke_refresh_token("tok-1").await.unwrap();
        assert!(repo
            .find_valid_refresh_token("tok-1")
            .await
            .unwrap()
            .is_none());

        // Row still present, just revoked
        let raw = repo.find_refresh_token("tok-1").await.unwrap().unwrap();
        assert!(raw.is_revoked);
    }

    #[tokio::test]
    async fn test_revoke_is_idempotent() {
        let repo = InMemoryAuthRepository::new();

        // Unknown token is a silent no-op
        repo.revoke_refresh_token("missing").await.unwrap();

        let user_id = UserId::generate();
        repo.create_refresh_token(record(user_id, "tok", 7))
            .await
            .unwrap();
        repo.revoke_refresh_token("tok").await.unwrap();
        repo.revoke_refresh_token("tok").await.unwrap();
    }

    #[tokio::test]
    async fn test_expired_token_is_not_valid() {
        let repo = InMemoryAuthRepository::new();
        let user_id = UserId::generate();

        repo.create_refresh_token(record(user_id, "old", -1))
            .await
            .unwrap();

        assert!(repo.find_valid_refresh_token("old").await.unwrap().is_none());
        // Still findable without the validity filter
        assert!(repo.find_refresh_token("old").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_rotate_retires_old_token() {
        let repo = InMemoryAuthRepository::new();
        let user_id = UserId::generate();

        repo.create_refresh_token(record(user_id, "old", 7))
            .await
            .unwrap();

        repo.rotate_refresh_token("old", record(user_id, "new", 7))
            .await
            .unwrap();

        assert!(repo.find_refresh_token("old").await.unwrap().is_none());
        assert!(repo.find_valid_refresh_token("new").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_rotate_requires_live_old_token() {
        let repo = InMemoryAuthRepository::new();
        let user_id = UserId::generate();

        let result = repo
            .rotate_refresh_token("never-stored", record(user_id, "new", 7))
            .await;
        assert!(matches!(
            result,
            Err(DomainError::InvalidCredentials { .. })
        ));
        assert!(repo.find_refresh_token("new").await.unwrap().is_none());

        // Second rotation of the same token loses; only one replacement is
        // ever minted
        repo.create_refresh_token(record(user_id, "old", 7))
            .await
            .unwrap();
        repo.rotate_refresh_token("old", record(user_id, "first", 7))
            .await
            .unwrap();

        let replay = repo
            .rotate_refresh_token("old", record(user_id, "second", 7))
            .await;
        assert!(replay.is_err());
        assert!(repo.find_refresh_token("second").await.unwrap().is_none());
        assert!(repo.find_valid_refresh_token("first").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_revoke_all_user_tokens() {
        let repo = InMemoryAuthRepository::new();
        let alice = UserId::generate();
        let bob = UserId::generate();

        repo.create_refresh_token(record(alice, "a1", 7)).await.unwrap();
        repo.create_refresh_token(record(alice, "a2", 7)).await.unwrap();
        repo.create_refresh_token(record(bob, "b1", 7)).await.unwrap();

        repo.revoke_all_user_refresh_tokens(alice).await.unwrap();

        assert!(repo.find_valid_refresh_token("a1").await.unwrap().is_none());
        assert!(repo.find_valid_refresh_token("a2").await.unwrap().is_none());
        assert!(repo.find_valid_refresh_token("b1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_expired_refresh_tokens() {
        let repo = InMemoryAuthRepository::new();
        let user_id = UserId::generate();

        repo.create_refresh_token(record(user_id, "live", 7))
            .await
            .unwrap();
        repo.create_refresh_token(record(user_id, "dead", -1))
            .await
            .unwrap();

        let removed = repo.delete_expired_refresh_tokens().await.unwrap();
        assert_eq!(removed, 1);
        assert!(repo.find_refresh_token("live").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_otp_single_use() {
        let repo = InMemoryAuthRepository::new();
        let user_id = UserId::generate();

        let otp = OtpCode::new(user_id, "123456", Utc::now() + Duration::minutes(10));
        let id = otp.id;
        repo.create_otp_code(otp).await.unwrap();

        let found = repo.find_valid_otp_code(user_id, "123456").await.unwrap();
        assert!(found.is_some());

        repo.mark_otp_used(id).await.unwrap();
        assert!(repo
            .find_valid_otp_code(user_id, "123456")
            .await
            .unwrap()
            .is_none());

        // Marking again is a no-op
        repo.mark_otp_used(id).await.unwrap();
    }

    #[tokio::test]
    async fn test_otp_attempts() {
        let repo = InMemoryAuthRepository::new();
        let user_id = UserId::generate();

        let otp = OtpCode::new(user_id, "654321", Utc::now() + Duration::minutes(10));
        let id = otp.id;
        repo.create_otp_code(otp).await.unwrap();

        repo.increment_otp_attempts(id).await.unwrap();
        repo.increment_otp_attempts(id).await.unwrap();

        let stored = repo.find_valid_otp_code(user_id, "654321").await.unwrap();
        assert_eq!(stored.unwrap().attempts, 2);
    }

    #[tokio::test]
    async fn test_one_time_token_purpose_scoping() {
        let repo = InMemoryAuthRepository::new();
        let user_id = UserId::generate();

        let token = OneTimeToken::new(
            user_id,
            "reset-tok",
            TokenPurpose::PasswordReset,
            Utc::now() + Duration::minutes(15),
        );
        repo.create_one_time_token(token).await.unwrap();

        assert!(repo
            .find_valid_one_time_token("reset-tok", TokenPurpose::PasswordReset)
            .await
            .unwrap()
            .is_some());

        // Same value under another purpose does not match
        assert!(repo
            .find_valid_one_time_token("reset-tok", TokenPurpose::MagicLink)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_revoke_all_one_time_tokens() {
        let repo = InMemoryAuthRepository::new();
        let user_id = UserId::generate();

        for value in ["t1", "t2"] {
            repo.create_one_time_token(OneTimeToken::new(
                user_id,
                value,
                TokenPurpose::EmailVerification,
                Utc::now() + Duration::minutes(15),
            ))
            .await
            .unwrap();
        }

        repo.revoke_all_one_time_tokens(user_id, TokenPurpose::EmailVerification)
            .await
            .unwrap();

        assert!(repo
            .find_valid_one_time_token("t1", TokenPurpose::EmailVerification)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let repo = InMemoryAuthRepository::new();
        let user_id = UserId::generate();

        let session = Session::new(
            user_id,
            "sess-1",
            Utc::now() + Duration::hours(1),
            Some("127.0.0.1".to_string()),
            Some("test-agent".to_string()),
        );
        repo.create_session(session).await.unwrap();

        assert!(repo.find_valid_session("sess-1").await.unwrap().is_some());

        repo.delete_all_user_sessions(user_id).await.unwrap();
        assert!(repo.find_valid_session("sess-1").await.unwrap().is_none());
    }
}
