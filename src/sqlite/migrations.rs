//! Embedded migrations for `SQLite`.
//!
//! ```rust,ignore
//! use praxis::sqlite::migrations;
//! use sqlx::SqlitePool;
//!
//! async fn setup_database(pool: &SqlitePool) -> Result<(), sqlx::Error> {
//!     migrations::run(pool).await
//! }
//! ```

use sqlx::{Executor, SqlitePool};

const MIGRATIONS: &[(&str, &str)] = &[
    (
        "20250301000001_create_directory_tables",
        include_str!("../../migrations_sqlite/20250301000001_create_directory_tables.sql"),
    ),
    (
        "20250301000002_create_affiliations_table",
        include_str!("../../migrations_sqlite/20250301000002_create_affiliations_table.sql"),
    ),
    (
        "20250301000003_create_invitations_table",
        include_str!("../../migrations_sqlite/20250301000003_create_invitations_table.sql"),
    ),
    (
        "20250301000004_create_active_contexts_table",
        include_str!("../../migrations_sqlite/20250301000004_create_active_contexts_table.sql"),
    ),
];

/// Runs every pending migration, tracking applied ones in `_praxis_migrations`.
pub async fn run(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    pool.execute(
        r"
        CREATE TABLE IF NOT EXISTS _praxis_migrations (
            name TEXT PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        )
        ",
    )
    .await?;

    for (name, sql) in MIGRATIONS {
        let applied: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM _praxis_migrations WHERE name = ?)")
                .bind(*name)
                .fetch_one(pool)
                .await?;

        if applied {
            continue;
        }

        // statements are split on ';', so migrations must not contain it inside literals
        for statement in sql.split(';') {
            let trimmed = statement.trim();
            if !trimmed.is_empty() {
                pool.execute(trimmed).await?;
            }
        }

        sqlx::query("INSERT INTO _praxis_migrations (name) VALUES (?)")
            .bind(*name)
            .execute(pool)
            .await?;

        log::info!(target: "praxis", "msg=\"migration applied\", name=\"{name}\"");
    }

    Ok(())
}
