//! Database pool construction

use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::error::{AppError, Result};

/// Connect to Postgres using `DATABASE_URL`.
pub async fn connect() -> Result<PgPool> {
    dotenvy::dotenv().ok();

    let url = std::env::var("DATABASE_URL")
        .map_err(|_| AppError::Config("DATABASE_URL is not set".to_string()))?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&url)
        .await?;

    tracing::info!("Connected to database");
    Ok(pool)
}
