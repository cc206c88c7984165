//! # Coursemart DB
//!
//! Connection pool setup and the Postgres implementations of the delivery
//! ports.
//!
//! # Example
//!
//! ```ignore
//! use coursemart_db::{PgContentRepository, init_db_pool};
//!
//! let pool = init_db_pool(&database_url).await?;
//! let content = PgContentRepository::new(pool.clone());
//! ```

pub mod repositories;

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;

pub use repositories::{PgContentRepository, PgEntitlementLookup, PgIdentityDirectory};
pub use sqlx::PgPool;

/// Initializes a PostgreSQL connection pool.
///
/// The pool is cheap to clone and meant to live in the application state.
pub async fn init_db_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(20)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await?;

    tracing::info!("database pool initialized");
    Ok(pool)
}

/// Apply the SQL migrations shipped with the workspace.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../migrations").run(pool).await
}
