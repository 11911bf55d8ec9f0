//! Embedded database migrations.
//!
//! ```rust,ignore
//! use praxis::postgres::migrations;
//! use sqlx::PgPool;
//!
//! async fn setup_database(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
//!     migrations::run(pool).await
//! }
//! ```

use sqlx::PgPool;

/// Creates the directory, affiliation, invitation and active-context tables.
pub async fn run(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
