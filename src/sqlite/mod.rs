//! `SQLite` implementations of every repository trait.
//!
//! Enable the `sqlx_sqlite` feature to use these implementations.

mod affiliation;
mod context;
mod directory;
mod invitation;
pub mod migrations;

pub use affiliation::SqliteAffiliationRepository;
pub use context::SqliteActiveContextRepository;
pub use directory::{
    SqliteDepartmentRepository, SqliteEstablishmentRepository, SqliteProfessionalRepository,
};
pub use invitation::SqliteInvitationRepository;

use sqlx::SqlitePool;

/// Creates all `SQLite` repository instances from a connection pool.
pub fn create_repositories(
    pool: SqlitePool,
) -> (
    SqliteProfessionalRepository,
    SqliteEstablishmentRepository,
    SqliteDepartmentRepository,
    SqliteAffiliationRepository,
    SqliteInvitationRepository,
    SqliteActiveContextRepository,
) {
    (
        SqliteProfessionalRepository::new(pool.clone()),
        SqliteEstablishmentRepository::new(pool.clone()),
        SqliteDepartmentRepository::new(pool.clone()),
        SqliteAffiliationRepository::new(pool.clone()),
        SqliteInvitationRepository::new(pool.clone()),
        SqliteActiveContextRepository::new(pool),
    )
}
