//! User management workflow

use std::sync::Arc;
use tracing::info;

use crate::domain::user::{
    validate_email, validate_name, ListUsersParams, Role, User, UserId, UserPage, UserRepository,
};
use crate::domain::DomainError;
use crate::infrastructure::auth::password::{validate_password_strength, PasswordHasher};

/// Fields that can change on an existing user; `None` leaves a field as is
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub name: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    pub password: Option<String>,
}

/// Service for user management
#[derive(Debug)]
pub struct UserService<R, H>
where
    R: UserRepository,
    H: PasswordHasher + 'static,
{
    repository: Arc<R>,
    hasher: Arc<H>,
}

impl<R, H> UserService<R, H>
where
    R: UserRepository,
    H: PasswordHasher + 'static,
{
    pub fn new(repository: Arc<R>, hasher: Arc<H>) -> Self {
        Self { repository, hasher }
    }

    /// Create a user; `password` is optional for passwordless accounts
    pub async fn create(
        &self,
        email: &str,
        name: &str,
        role: Role,
        password: Option<&str>,
    ) -> Result<User, DomainError> {
        validate_email(email).map_err(|e| DomainError::validation(e.to_string()))?;
        validate_name(name).map_err(|e| DomainError::validation(e.to_string()))?;

        let password_hash = match password {
            Some(password) => {
                if let Err(errors) = validate_password_strength(password) {
                    return Err(DomainError::validation_with_details(
                        "Password does not meet requirements",
                        errors,
                    ));
                }
                Some(self.hash_password(password).await?)
            }
            None => None,
        };

        let user = self
            .repository
            .create(User::new(email, password_hash, name, role))
            .await?;

        info!(user_id = %user.id(), "User created");

        Ok(user)
    }

    pub async fn get(&self, id: UserId) -> Result<User, DomainError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("User '{}' not found", id)))
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        self.repository.find_by_email(email).await
    }

    /// Apply a set of changes to an existing user
    pub async fn update(&self, id: UserId, changes: UserChanges) -> Result<User, DomainError> {
        let mut user = self.get(id).await?;

        if let Some(email) = changes.email {
            validate_email(&email).map_err(|e| DomainError::validation(e.to_string()))?;

            if email != user.email() {
                user.set_email(email);
            }
        }

        if let Some(name) = changes.name {
            validate_name(&name).map_err(|e| DomainError::validation(e.to_string()))?;
            user.set_name(name);
        }

        if let Some(role) = changes.role {
            user.set_role(role);
        }

        if let Some(is_active) = changes.is_active {
            if is_active {
                user.activate();
            } else {
                user.deactivate();
            }
        }

        if let Some(password) = changes.password {
            if let Err(errors) = validate_password_strength(&password) {
                return Err(DomainError::validation_with_details(
                    "Password does not meet requirements",
                    errors,
                ));
            }
            let hash = self.hash_password(&password).await?;
            user.set_password_hash(hash);
        }

        self.repository.update(&user).await
    }

    pub async fn delete(&self, id: UserId) -> Result<(), DomainError> {
        if !self.repository.delete(id).await? {
            return Err(DomainError::not_found(format!("User '{}' not found", id)));
        }

        info!(user_id = %id, "User deleted");

        Ok(())
    }

    pub async fn list(&self, params: &ListUsersParams) -> Result<UserPage, DomainError> {
        self.repository.find_all(params).await
    }

    async fn hash_password(&self, password: &str) -> Result<String, DomainError> {
        let hasher = Arc::clone(&self.hasher);
        let password = password.to_string();

        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| DomainError::internal(format!("Hashing task failed: {}", e)))?
    }
}
