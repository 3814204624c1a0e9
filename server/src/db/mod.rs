// server/src/db/mod.rs

pub mod pg_user_store;

pub use pg_user_store::PgUserStore;

use crate::errors::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

/// Connects to Postgres and brings the schema up to date.
pub async fn connect_and_migrate(database_url: &str) -> Result<PgPool> {
  let pool = PgPoolOptions::new().max_connections(10).connect(database_url).await?;
  info!("Successfully connected to the database.");

  info!("Running database migrations");
  sqlx::migrate!("./migrations").run(&pool).await?;
  info!("Database migrations completed successfully");

  Ok(pool)
}
