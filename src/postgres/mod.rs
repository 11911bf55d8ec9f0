mod affiliation;
mod context;
mod directory;
mod invitation;
pub mod migrations;

pub use affiliation::PostgresAffiliationRepository;
pub use context::PostgresActiveContextRepository;
pub use directory::{
    PostgresDepartmentRepository, PostgresEstablishmentRepository, PostgresProfessionalRepository,
};
pub use invitation::PostgresInvitationRepository;

use sqlx::PgPool;

/// Creates all Postgres repository instances from a connection pool.
pub fn create_repositories(
    pool: PgPool,
) -> (
    PostgresProfessionalRepository,
    PostgresEstablishmentRepository,
    PostgresDepartmentRepository,
    PostgresAffiliationRepository,
    PostgresInvitationRepository,
    PostgresActiveContextRepository,
) {
    (
        PostgresProfessionalRepository::new(pool.clone()),
        PostgresEstablishmentRepository::new(pool.clone()),
        PostgresDepartmentRepository::new(pool.clone()),
        PostgresAffiliationRepository::new(pool.clone()),
        PostgresInvitationRepository::new(pool.clone()),
        PostgresActiveContextRepository::new(pool),
    )
}
