//! User infrastructure: stores and the user management workflow.

pub mod postgres_repository;
pub mod repository;
pub mod service;

pub use postgres_repository::PostgresUserRepository;
pub use repository::InMemoryUserRepository;
pub use service::{UserChanges, UserService};
