//! Account service
//!
//! REST backend for account management:
//! - Registration and password login with Argon2 hashing
//! - JWT access tokens plus rotated, server-tracked refresh tokens
//! - User CRUD with filtering and pagination
//! - PostgreSQL persistence with embedded migrations

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use api::state::AppState;
use infrastructure::auth::{Argon2Hasher, AuthService, JwtTokenIssuer, PostgresAuthRepository, TokenConfig};
use infrastructure::migrations::run_migrations;
use infrastructure::user::{InMemoryUserRepository, PostgresUserRepository, UserService};

/// Connect to PostgreSQL, apply migrations and wire up all services
pub async fn create_app_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await?;

    run_migrations(&pool).await?;
    info!("Database ready");

    Ok(create_app_state_with_pool(pool, config))
}

/// Wire up services over an existing connection pool
pub fn create_app_state_with_pool(pool: PgPool, config: &AppConfig) -> AppState {
    let users = Arc::new(PostgresUserRepository::new(pool.clone()));
    let auth_store = Arc::new(PostgresAuthRepository::new(pool));
    let hasher = Arc::new(Argon2Hasher::new());
    let tokens = Arc::new(JwtTokenIssuer::new(token_config(config)));

    let auth_service = Arc::new(AuthService::new(
        Arc::clone(&users),
        auth_store,
        Arc::clone(&hasher),
        tokens,
    ));
    let user_service = Arc::new(UserService::new(users, hasher));

    AppState::new(auth_service, user_service)
}

/// Wire up services over in-memory stores; no database required
///
/// Backs integration tests and local experimentation. State is lost on
/// shutdown.
pub fn create_in_memory_app_state(config: &AppConfig) -> AppState {
    let users = Arc::new(InMemoryUserRepository::new());
    let auth_store = Arc::new(infrastructure::auth::InMemoryAuthRepository::new());
    let hasher = Arc::new(Argon2Hasher::new());
    let tokens = Arc::new(JwtTokenIssuer::new(token_config(config)));

    let auth_service = Arc::new(AuthService::new(
        Arc::clone(&users),
        auth_store,
        Arc::clone(&hasher),
        tokens,
    ));
    let user_service = Arc::new(UserService::new(users, hasher));

    AppState::new(auth_service, user_service)
}

fn token_config(config: &AppConfig) -> TokenConfig {
    TokenConfig {
        access_secret: config.auth.access_secret.clone(),
        refresh_secret: config.auth.refresh_secret.clone(),
        access_ttl_hours: config.auth.access_ttl_hours,
        refresh_ttl_days: config.auth.refresh_ttl_days,
    }
}
