use anyhow::Result;
use sqlx::{PgPool, postgres::PgPoolOptions};

pub mod models;
pub mod repositories;
pub mod service_role;
pub mod transaction;
pub mod types;
pub mod utils;

pub use service_role::ServiceRole;

/// Connect the user-scoped pool and bring the schema up to date.
pub async fn init_database(database_url: &str) -> Result<PgPool> {
    let pool = connect(database_url).await?;

    log::info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(&pool).await?;
    log::info!("Migrations completed successfully");

    Ok(pool)
}

pub async fn connect(database_url: &str) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    Ok(pool)
}
