use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::error::AppResult;

/// Creates a PostgreSQL connection pool
///
/// Establishes a pool of database connections for efficient reuse.
/// `acquire_timeout` bounds how long a pipeline run waits for a connection.
pub async fn create_pool(database_url: &str, acquire_timeout: Duration) -> AppResult<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(acquire_timeout)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Applies the embedded migrations (pgvector extension, `movies`, `match_movies`)
pub async fn run_migrations(pool: &PgPool) -> AppResult<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| sqlx::Error::Migrate(Box::new(e)))?;

    tracing::info!("Database migrations applied");
    Ok(())
}
