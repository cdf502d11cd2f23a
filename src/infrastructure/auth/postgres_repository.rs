//! PostgreSQL auth repository implementation

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::domain::auth::{
    AuthRepository, OneTimeToken, OtpCode, RefreshTokenRecord, Session, TokenPurpose,
};
use crate::domain::user::UserId;
use crate::domain::DomainError;

/// PostgreSQL implementation of AuthRepository
#[derive(Debug, Clone)]
pub struct PostgresAuthRepository {
    pool: PgPool,
}

impl PostgresAuthRepository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuthRepository for PostgresAuthRepository {
    async fn create_refresh_token(
        &self,
        record: RefreshTokenRecord,
    ) -> Result<RefreshTokenRecord, DomainError> {
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (token, user_id, expires_at, is_revoked, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&record.token)
        .bind(record.user_id.as_uuid())
        .bind(record.expires_at)
        .bind(record.is_revoked)
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            let msg = e.to_string();

            if msg.contains("duplicate key") || msg.contains("unique constraint") {
                DomainError::conflict("Refresh token already exists")
            } else {
                DomainError::storage(format!("Failed to create refresh token: {}", e))
            }
        })?;

        Ok(record)
    }

    async fn find_valid_refresh_token(
        &self,
        token: &str,
    ) -> Result<Option<RefreshTokenRecord>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT token, user_id, expires_at, is_revoked, created_at
            FROM refresh_tokens
            WHERE token = $1 AND is_revoked = FALSE AND expires_at > NOW()
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to get refresh token: {}", e)))?;

        Ok(row.map(|row| row_to_refresh_token(&row)))
    }

    async fn find_refresh_token(
        &self,
        token: &str,
    ) -> Result<Option<RefreshTokenRecord>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT token, user_id, expires_at, is_revoked, created_at
            FROM refresh_tokens
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to get refresh token: {}", e)))?;

        Ok(row.map(|row| row_to_refresh_token(&row)))
    }

    async fn revoke_refresh_token(&self, token: &str) -> Result<(), DomainError> {
        // Zero affected rows means the token was unknown or already revoked,
        // which is fine
        sqlx::query("UPDATE refresh_tokens SET is_revoked = TRUE WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to revoke refresh token: {}", e)))?;

        Ok(())
    }

    async fn revoke_all_user_refresh_tokens(&self, user_id: UserId) -> Result<(), DomainError> {
        sqlx::query("UPDATE refresh_tokens SET is_revoked = TRUE WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                DomainError::storage(format!("Failed to revoke user refresh tokens: {}", e))
            })?;

        Ok(())
    }

    async fn delete_refresh_token(&self, token: &str) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to delete refresh token: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn rotate_refresh_token(
        &self,
        old_token: &str,
        new_record: RefreshTokenRecord,
    ) -> Result<RefreshTokenRecord, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to begin transaction: {}", e)))?;

        let retired = sqlx::query("DELETE FROM refresh_tokens WHERE token = $1")
            .bind(old_token)
            .execute(&mut *tx)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to retire refresh token: {}", e)))?;

        // A concurrent rotation may have consumed the old row first; only the
        // caller that actually retired it gets a replacement
        if retired.rows_affected() == 0 {
            tx.rollback()
                .await
                .map_err(|e| DomainError::storage(format!("Failed to roll back rotation: {}", e)))?;
            return Err(DomainError::invalid_credentials("Invalid refresh token"));
        }

        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (token, user_id, expires_at, is_revoked, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&new_record.token)
        .bind(new_record.user_id.as_uuid())
        .bind(new_record.expires_at)
        .bind(new_record.is_revoked)
        .bind(new_record.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to store refresh token: {}", e)))?;

        tx.commit()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to commit rotation: {}", e)))?;

        Ok(new_record)
    }

    async fn delete_expired_refresh_tokens(&self) -> Result<u64, DomainError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await
            .map_err(|e| {
                DomainError::storage(format!("Failed to delete expired refresh tokens: {}", e))
            })?;

        Ok(result.rows_affected())
    }

    async fn create_otp_code(&self, otp: OtpCode) -> Result<OtpCode, DomainError> {
        sqlx::query(
            r#"
            INSERT INTO otp_codes (id, user_id, code, expires_at, is_used, attempts, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(otp.id)
        .bind(otp.user_id.as_uuid())
        .bind(&otp.code)
        .bind(otp.expires_at)
        .bind(otp.is_used)
        .bind(otp.attempts as i32)
        .bind(otp.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to create OTP code: {}", e)))?;

        Ok(otp)
    }

    async fn find_valid_otp_code(
        &self,
        user_id: UserId,
        code: &str,
    ) -> Result<Option<OtpCode>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, code, expires_at, is_used, attempts, created_at
            FROM otp_codes
            WHERE user_id = $1 AND code = $2 AND is_used = FALSE AND expires_at > NOW()
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to get OTP code: {}", e)))?;

        Ok(row.map(|row| row_to_otp(&row)))
    }

    async fn mark_otp_used(&self, id: Uuid) -> Result<(), DomainError> {
        sqlx::query("UPDATE otp_codes SET is_used = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to mark OTP code used: {}", e)))?;

        Ok(())
    }

    async fn increment_otp_attempts(&self, id: Uuid) -> Result<(), DomainError> {
        sqlx::query("UPDATE otp_codes SET attempts = attempts + 1 WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to count OTP attempt: {}", e)))?;

        Ok(())
    }

    async fn delete_expired_otp_codes(&self) -> Result<u64, DomainError> {
        let result = sqlx::query("DELETE FROM otp_codes WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await
            .map_err(|e| {
                DomainError::storage(format!("Failed to delete expired OTP codes: {}", e))
            })?;

        Ok(result.rows_affected())
    }

    async fn create_one_time_token(
        &self,
        token: OneTimeToken,
    ) -> Result<OneTimeToken, DomainError> {
        sqlx::query(
            r#"
            INSERT INTO one_time_tokens (id, user_id, token, purpose, expires_at, is_used, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(token.id)
        .bind(token.user_id.as_uuid())
        .bind(&token.token)
        .bind(token.purpose.as_str())
        .bind(token.expires_at)
        .bind(token.is_used)
        .bind(token.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to create one-time token: {}", e)))?;

        Ok(token)
    }

    async fn find_valid_one_time_token(
        &self,
        token: &str,
        purpose: TokenPurpose,
    ) -> Result<Option<OneTimeToken>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, token, purpose, expires_at, is_used, created_at
            FROM one_time_tokens
            WHERE token = $1 AND purpose = $2 AND is_used = FALSE AND expires_at > NOW()
            "#,
        )
        .bind(token)
        .bind(purpose.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to get one-time token: {}", e)))?;

        Ok(row.map(|row| row_to_one_time_token(&row)))
    }

    async fn mark_one_time_token_used(&self, id: Uuid) -> Result<(), DomainError> {
        sqlx::query("UPDATE one_time_tokens SET is_used = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                DomainError::storage(format!("Failed to mark one-time token used: {}", e))
            })?;

        Ok(())
    }

    async fn revoke_all_one_time_tokens(
        &self,
        user_id: UserId,
        purpose: TokenPurpose,
    ) -> Result<(), DomainError> {
        sqlx::query("UPDATE one_time_tokens SET is_used = TRUE WHERE user_id = $1 AND purpose = $2")
            .bind(user_id.as_uuid())
            .bind(purpose.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                DomainError::storage(format!("Failed to revoke one-time tokens: {}", e))
            })?;

        Ok(())
    }

    async fn delete_expired_one_time_tokens(&self) -> Result<u64, DomainError> {
        let result = sqlx::query("DELETE FROM one_time_tokens WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await
            .map_err(|e| {
                DomainError::storage(format!("Failed to delete expired one-time tokens: {}", e))
            })?;

        Ok(result.rows_affected())
    }

    async fn create_session(&self, session: Session) -> Result<Session, DomainError> {
        sqlx::query(
            r#"
            INSERT INTO sessions (token, user_id, expires_at, ip_address, user_agent, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(&session.token)
        .bind(session.user_id.as_uuid())
        .bind(session.expires_at)
        .bind(&session.ip_address)
        .bind(&session.user_agent)
        .bind(session.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to create session: {}", e)))?;

        Ok(session)
    }

    async fn find_valid_session(&self, token: &str) -> Result<Option<Session>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT token, user_id, expires_at, ip_address, user_agent, created_at
            FROM sessions
            WHERE token = $1 AND expires_at > NOW()
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to get session: {}", e)))?;

        Ok(row.map(|row| row_to_session(&row)))
    }

    async fn delete_session(&self, token: &str) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to delete session: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_all_user_sessions(&self, user_id: UserId) -> Result<(), DomainError> {
        sqlx::query("DELETE FROM sessions WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to delete user sessions: {}", e)))?;

        Ok(())
    }

    async fn delete_expired_sessions(&self) -> Result<u64, DomainError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await
            .map_err(|e| {
                DomainError::storage(format!("Failed to delete expired sessions: {}", e))
            })?;

        Ok(result.rows_affected())
    }
}

fn row_to_refresh_token(row: &sqlx::postgres::PgRow) -> RefreshTokenRecord {
    let user_id: Uuid = row.get("user_id");

    RefreshTokenRecord {
        token: row.get("token"),
        user_id: UserId::from(user_id),
        expires_at: row.get("expires_at"),
        is_revoked: row.get("is_revoked"),
        created_at: row.get("created_at"),
    }
}

fn row_to_otp(row: &sqlx::postgres::PgRow) -> OtpCode {
    let user_id: Uuid = row.get("user_id");
    let attempts: i32 = row.get("attempts");

    OtpCode {
        id: row.get("id"),
        user_id: UserId::from(user_id),
        code: row.get("code"),
        expires_at: row.get("expires_at"),
        is_used: row.get("is_used"),
        attempts: attempts as u32,
        created_at: row.get("created_at"),
    }
}

fn row_to_one_time_token(row: &sqlx::postgres::PgRow) -> OneTimeToken {
    let user_id: Uuid = row.get("user_id");
    let purpose: String = row.get("purpose");

    OneTimeToken {
        id: row.get("id"),
        user_id: UserId::from(user_id),
        token: row.get("token"),
        purpose: parse_purpose(&purpose),
        expires_at: row.get("expires_at"),
        is_used: row.get("is_used"),
        created_at: row.get("created_at"),
    }
}

fn row_to_session(row: &sqlx::postgres::PgRow) -> Session {
    let user_id: Uuid = row.get("user_id");

    Session {
        token: row.get("token"),
        user_id: UserId::from(user_id),
        expires_at: row.get("expires_at"),
        ip_address: row.get("ip_address"),
        user_agent: row.get("user_agent"),
        created_at: row.get("created_at"),
    }
}

fn parse_purpose(s: &str) -> TokenPurpose {
    match s {
        "magic_link" => TokenPurpose::MagicLink,
        "password_reset" => TokenPurpose::PasswordReset,
        _ => TokenPurpose::EmailVerification,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_purpose_round_trip() {
        for purpose in [
            TokenPurpose::MagicLink,
            TokenPurpose::PasswordReset,
            TokenPurpose::EmailVerification,
        ] {
            assert_eq!(parse_purpose(purpose.as_str()), purpose);
        }
    }
}
