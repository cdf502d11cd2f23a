//! User entity, validation and repository contract

pub mod entity;
pub mod repository;
pub mod validation;

pub use entity::{Role, User, UserId};
pub use repository::{ListUsersParams, UserPage, UserRepository};
pub use validation::{validate_email, validate_name};
