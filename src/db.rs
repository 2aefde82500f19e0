use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;

/// Postgres connection pool wrapper for the registry database.
pub struct Database {
    pub pool: PgPool,
}

impl Database {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await?;

        // Fail fast on an unreachable database
        sqlx::query("SELECT 1").execute(&pool).await?;

        Ok(Self { pool })
    }
}
