//! In-memory user repository
//!
//! Backs tests and the non-persistent storage backend. Uniqueness checks
//! mirror the database constraints so workflows observe the same conflicts.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::user::{ListUsersParams, User, UserId, UserPage, UserRepository};
use crate::domain::DomainError;

/// In-memory implementation of UserRepository
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<HashMap<UserId, User>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn matches(user: &User, params: &ListUsersParams) -> bool {
    if let Some(search) = &params.search {
        let needle = search.to_lowercase();
        let hit = user.email().to_lowercase().contains(&needle)
            || user.name().to_lowercase().contains(&needle);

        if !hit {
            return false;
        }
    }

    if let Some(role) = params.role {
        if user.role() != role {
            return false;
        }
    }

    if let Some(is_active) = params.is_active {
        if user.is_active() != is_active {
            return false;
        }
    }

    true
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, DomainError> {
        let users = self.users.read().await;
        Ok(users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email() == email).cloned())
    }

    async fn create(&self, user: User) -> Result<User, DomainError> {
        let mut users = self.users.write().await;

        if users.values().any(|u| u.email() == user.email()) {
            return Err(DomainError::conflict(
                "User with this email already exists",
            ));
        }

        users.insert(user.id(), user.clone());
        Ok(user)
    }

    async fn update(&self, user: &User) -> Result<User, DomainError> {
        let mut users = self.users.write().await;

        if !users.contains_key(&user.id()) {
            return Err(DomainError::not_found(format!(
                "User '{}' not found",
                user.id()
            )));
        }

        let email_taken = users
            .values()
            .any(|u| u.email() == user.email() && u.id() != user.id());

        if email_taken {
            return Err(DomainError::conflict(
                "User with this email already exists",
            ));
        }

        users.insert(user.id(), user.clone());
        Ok(user.clone())
    }

    async fn delete(&self, id: UserId) -> Result<bool, DomainError> {
        let mut users = self.users.write().await;
        Ok(users.remove(&id).is_some())
    }

    async fn exists(&self, id: UserId) -> Result<bool, DomainError> {
        let users = self.users.read().await;
        Ok(users.contains_key(&id))
    }

    async fn find_all(&self, params: &ListUsersParams) -> Result<UserPage, DomainError> {
        let users = self.users.read().await;

        let mut filtered: Vec<User> = users
            .values()
            .filter(|u| matches(u, params))
            .cloned()
            .collect();

        // Newest first
        filtered.sort_by(|a, b| b.created_at().cmp(&a.created_at()));

        let total = filtered.len() as u64;
        let page: Vec<User> = filtered
            .into_iter()
            .skip(params.offset() as usize)
            .take(params.limit as usize)
            .collect();

        Ok(UserPage { users: page, total })
    }

    async fn update_last_login(&self, id: UserId) -> Result<(), DomainError> {
        let mut users = self.users.write().await;

        match users.get_mut(&id) {
            Some(user) => {
                user.record_login();
                Ok(())
            }
            None => Err(DomainError::not_found(format!("User '{}' not found", id))),
        }
    }
}
