//! User repository trait

use async_trait::async_trait;
use std::fmt::Debug;

use super::entity::{Role, User, UserId};
use crate::domain::DomainError;

/// Filter and pagination parameters for listing users
#[derive(Debug, Clone)]
pub struct ListUsersParams {
    /// 1-based page number
    pub page: u32,
    /// Page size
    pub limit: u32,
    /// Case-insensitive substring match against email OR name
    pub search: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

impl Default for ListUsersParams {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 10,
            search: None,
            role: None,
            is_active: None,
        }
    }
}

impl ListUsersParams {
    /// Number of records to skip for the requested page
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

/// One page of users plus the total count under the same filter
#[derive(Debug, Clone)]
pub struct UserPage {
    pub users: Vec<User>,
    pub total: u64,
}

/// Repository trait for user storage
#[async_trait]
pub trait UserRepository: Send + Sync + Debug {
    /// Get a user by id; absence is not an error
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, DomainError>;

    /// Get a user by email (exact, case-sensitive match)
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError>;

    /// Create a new user; a duplicate email surfaces as `DomainError::Conflict`
    async fn create(&self, user: User) -> Result<User, DomainError>;

    /// Update an existing user
    async fn update(&self, user: &User) -> Result<User, DomainError>;

    /// Delete a user; returns whether a row was removed
    async fn delete(&self, id: UserId) -> Result<bool, DomainError>;

    /// Cheap existence probe, avoids loading the full record
    async fn exists(&self, id: UserId) -> Result<bool, DomainError> {
        Ok(self.find_by_id(id).await?.is_some())
    }

    /// List users, newest first, with the total count under the same filter
    async fn find_all(&self, params: &ListUsersParams) -> Result<UserPage, DomainError>;

    /// Set `last_login_at` to now
    async fn update_last_login(&self, id: UserId) -> Result<(), DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_first_page() {
        let params = ListUsersParams::default();
        assert_eq!(params.offset(), 0);
    }

    #[test]
    fn test_offset_later_page() {
        let params = ListUsersParams {
            page: 3,
            limit: 10,
            ..Default::default()
        };
        assert_eq!(params.offset(), 20);
    }

    #[test]
    fn test_offset_page_zero_clamps() {
        let params = ListUsersParams {
            page: 0,
            limit: 10,
            ..Default::default()
        };
        assert_eq!(params.offset(), 0);
    }
}
