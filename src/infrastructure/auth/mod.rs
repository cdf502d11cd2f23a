//! Authentication infrastructure: hashing, token issuance, stores and the
//! auth workflow.

pub mod jwt;
pub mod password;
pub mod postgres_repository;
pub mod repository;
pub mod service;

pub use jwt::{Claims, JwtTokenIssuer, TokenConfig, TokenIssuer};
pub use password::{Argon2Hasher, PasswordHasher};
pub use postgres_repository::PostgresAuthRepository;
pub use repository::InMemoryAuthRepository;
pub use service::{AuthService, AuthTokens};
