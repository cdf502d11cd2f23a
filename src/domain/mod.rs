//! Domain layer: entities, repository contracts and the error taxonomy.

pub mod auth;
pub mod error;
pub mod user;

pub use error::DomainError;
pub use user::{ListUsersParams, Role, User, UserId, UserPage, UserRepository};
