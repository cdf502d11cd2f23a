//! Migrate command - applies pending database migrations

use sqlx::postgres::PgPoolOptions;
use tracing::info;

use crate::config::AppConfig;
use crate::infrastructure::logging;
use crate::infrastructure::migrations::{run_migrations, PostgresMigrator};

/// Apply all pending migrations and report the resulting schema version
pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    logging::init_logging(&config.logging);

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&config.database.url)
        .await?;

    run_migrations(&pool).await?;

    let version = PostgresMigrator::new(pool).current_version().await?;
    info!(version = ?version, "Migrations applied");

    Ok(())
}
