//! Authentication entities and the auth store contract

pub mod entity;
pub mod repository;

pub use entity::{OneTimeToken, OtpCode, RefreshTokenRecord, Session, TokenPurpose};
pub use repository::AuthRepository;
