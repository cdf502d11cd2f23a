//! PostgreSQL user repository implementation

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::domain::user::{ListUsersParams, Role, User, UserId, UserPage, UserRepository};
use crate::domain::DomainError;

const USER_COLUMNS: &str = "id, email, password_hash, name, role, is_active, email_verified, \
                            created_at, updated_at, last_login_at";

/// PostgreSQL implementation of UserRepository
#[derive(Debug, Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, DomainError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to get user: {}", e)))?;

        match row {
            Some(row) => Ok(Some(row_to_user(&row))),
            None => Ok(None),
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to get user by email: {}", e)))?;

        match row {
            Some(row) => Ok(Some(row_to_user(&row))),
            None => Ok(None),
        }
    }

    async fn create(&self, user: User) -> Result<User, DomainError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, password_hash, name, role, is_active,
                               email_verified, created_at, updated_at, last_login_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(user.id().as_uuid())
        .bind(user.email())
        .bind(user.password_hash())
        .bind(user.name())
        .bind(user.role().as_str())
        .bind(user.is_active())
        .bind(user.email_verified())
        .bind(user.created_at())
        .bind(user.updated_at())
        .bind(user.last_login_at())
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "Failed to create user"))?;

        Ok(user)
    }

    async fn update(&self, user: &User) -> Result<User, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET email = $2, password_hash = $3, name = $4, role = $5, is_active = $6,
                email_verified = $7, updated_at = $8, last_login_at = $9
            WHERE id = $1
            "#,
        )
        .bind(user.id().as_uuid())
        .bind(user.email())
        .bind(user.password_hash())
        .bind(user.name())
        .bind(user.role().as_str())
        .bind(user.is_active())
        .bind(user.email_verified())
        .bind(user.updated_at())
        .bind(user.last_login_at())
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "Failed to update user"))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(format!(
                "User '{}' not found",
                user.id()
            )));
        }

        Ok(user.clone())
    }

    async fn delete(&self, id: UserId) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to delete user: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn exists(&self, id: UserId) -> Result<bool, DomainError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to check user existence: {}", e)))?;

        Ok(count > 0)
    }

    async fn find_all(&self, params: &ListUsersParams) -> Result<UserPage, DomainError> {
        // NULL binds disable their filter clause, so one statement covers
        // every filter combination
        let filter = r#"
            WHERE ($1::text IS NULL OR email ILIKE $1 OR name ILIKE $1)
              AND ($2::text IS NULL OR role = $2)
              AND ($3::boolean IS NULL OR is_active = $3)
        "#;

        let search = params
            .search
            .as_ref()
            .map(|s| format!("%{}%", escape_like_pattern(s)));
        let role = params.role.map(|r| r.as_str());

        let rows = sqlx::query(&format!(
            "SELECT {} FROM users {} ORDER BY created_at DESC OFFSET $4 LIMIT $5",
            USER_COLUMNS, filter
        ))
        .bind(search.as_deref())
        .bind(role)
        .bind(params.is_active)
        .bind(params.offset() as i64)
        .bind(params.limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to list users: {}", e)))?;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM users {}", filter))
            .bind(search.as_deref())
            .bind(role)
            .bind(params.is_active)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to count users: {}", e)))?;

        let users = rows.iter().map(row_to_user).collect();

        Ok(UserPage {
            users,
            total: total as u64,
        })
    }

    async fn update_last_login(&self, id: UserId) -> Result<(), DomainError> {
        let result = sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to record login: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(format!("User '{}' not found", id)));
        }

        Ok(())
    }
}

fn row_to_user(row: &sqlx::postgres::PgRow) -> User {
    let id: uuid::Uuid = row.get("id");
    let role: String = row.get("role");

    User::from_parts(
        UserId::from(id),
        row.get("email"),
        row.get("password_hash"),
        row.get("name"),
        Role::from_str_lossy(&role),
        row.get("is_active"),
        row.get("email_verified"),
        row.get("created_at"),
        row.get("updated_at"),
        row.get("last_login_at"),
    )
}

// ILIKE treats % and _ as wildcards; searches are plain substrings
fn escape_like_pattern(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn map_unique_violation(e: sqlx::Error, context: &str) -> DomainError {
    let msg = e.to_string();

    if msg.contains("duplicate key") || msg.contains("unique constraint") {
        DomainError::conflict("User with this email already exists")
    } else {
        DomainError::storage(format!("{}: {}", context, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like_pattern() {
        assert_eq!(escape_like_pattern("alice"), "alice");
        assert_eq!(escape_like_pattern("50%_off"), "50\\%\\_off");
        assert_eq!(escape_like_pattern("back\\slash"), "back\\\\slash");
    }

    #[test]
    fn test_unique_violation_maps_to_conflict() {
        let err = sqlx::Error::Protocol(
            "duplicate key value violates unique constraint \"users_email_key\"".to_string(),
        );

        let mapped = map_unique_violation(err, "Failed to create user");
        assert!(matches!(mapped, DomainError::Conflict { .. }));
    }

    #[test]
    fn test_other_errors_map_to_storage() {
        let err = sqlx::Error::Protocol("connection reset".to_string());

        let mapped = map_unique_violation(err, "Failed to create user");
        assert!(matches!(mapped, DomainError::Storage { .. }));
    }
}
