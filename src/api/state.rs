//! Application state for shared services

use std::sync::Arc;

use crate::domain::auth::AuthRepository;
use crate::domain::user::{ListUsersParams, Role, User, UserId, UserPage, UserRepository};
use crate::domain::DomainError;
use crate::infrastructure::auth::jwt::TokenIssuer;
use crate::infrastructure::auth::password::PasswordHasher;
use crate::infrastructure::auth::service::{AuthService, AuthTokens};
use crate::infrastructure::user::service::{UserChanges, UserService};

/// Application state containing shared services using dynamic dispatch
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<dyn AuthServiceTrait>,
    pub user_service: Arc<dyn UserServiceTrait>,
}

impl AppState {
    pub fn new(
        auth_service: Arc<dyn AuthServiceTrait>,
        user_service: Arc<dyn UserServiceTrait>,
    ) -> Self {
        Self {
            auth_service,
            user_service,
        }
    }
}

/// Trait for authentication workflow operations
#[async_trait::async_trait]
pub trait AuthServiceTrait: Send + Sync {
    async fn register(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<AuthTokens, DomainError>;
    async fn login(&self, email: &str, password: &str) -> Result<AuthTokens, DomainError>;
    async fn refresh(&self, refresh_token: &str) -> Result<AuthTokens, DomainError>;
    async fn logout(&self, refresh_token: &str) -> Result<(), DomainError>;
    async fn authenticate(&self, access_token: &str) -> Result<User, DomainError>;
}

/// Trait for user management operations
#[async_trait::async_trait]
pub trait UserServiceTrait: Send + Sync {
    async fn create(
        &self,
        email: &str,
        name: &str,
        role: Role,
        password: Option<&str>,
    ) -> Result<User, DomainError>;
    async fn get(&self, id: UserId) -> Result<User, DomainError>;
    async fn update(&self, id: UserId, changes: UserChanges) -> Result<User, DomainError>;
    async fn delete(&self, id: UserId) -> Result<(), DomainError>;
    async fn list(&self, params: &ListUsersParams) -> Result<UserPage, DomainError>;
}

#[async_trait::async_trait]
impl<U, A, H, T> AuthServiceTrait for AuthService<U, A, H, T>
where
    U: UserRepository + 'static,
    A: AuthRepository + 'static,
    H: PasswordHasher + 'static,
    T: TokenIssuer + 'static,
{
    async fn register(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<AuthTokens, DomainError> {
        AuthService::register(self, email, password, name).await
    }

    async fn login(&self, email: &str, password: &str) -> Result<AuthTokens, DomainError> {
        AuthService::login(self, email, password).await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<AuthTokens, DomainError> {
        AuthService::refresh(self, refresh_token).await
    }

    async fn logout(&self, refresh_token: &str) -> Result<(), DomainError> {
        AuthService::logout(self, refresh_token).await
    }

    async fn authenticate(&self, access_token: &str) -> Result<User, DomainError> {
        AuthService::authenticate(self, access_token).await
    }
}

#[async_trait::async_trait]
impl<R, H> UserServiceTrait for UserService<R, H>
where
    R: UserRepository + 'static,
    H: PasswordHasher + 'static,
{
    async fn create(
        &self,
        email: &str,
        name: &str,
        role: Role,
        password: Option<&str>,
    ) -> Result<User, DomainError> {
        UserService::create(self, email, name, role, password).await
    }

    async fn get(&self, id: UserId) -> Result<User, DomainError> {
        UserService::get(self, id).await
    }

    async fn update(&self, id: UserId, changes: UserChanges) -> Result<User, DomainError> {
        UserService::update(self, id, changes).await
    }

    async fn delete(&self, id: UserId) -> Result<(), DomainError> {
        UserService::delete(self, id).await
    }

    async fn list(&self, params: &ListUsersParams) -> Result<UserPage, DomainError> {
        UserService::list(self, params).await
    }
}
