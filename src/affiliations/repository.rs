use async_trait::async_trait;
use chrono::NaiveDate;

use super::{Affiliation, AffiliationStatus, CapabilitySet, Role};
use crate::PraxisError;

/// Full attribute set written by an upsert.
///
/// The conflict key is (`professional_id`, `establishment_id`, `department_id`);
/// every other field overwrites the stored row. A `None` start date keeps
/// the stored one; a new row starts today.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertAffiliation {
    pub professional_id: i64,
    pub establishment_id: i64,
    pub department_id: Option<i64>,
    pub role: Role,
    pub position_title: Option<String>,
    pub is_department_head: bool,
    pub is_establishment_admin: bool,
    pub permissions: CapabilitySet,
    pub status: AffiliationStatus,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub matricule: Option<String>,
}

#[async_trait]
pub trait AffiliationRepository: Send + Sync {
    /// Inserts or overwrites the row for the triple in a single statement.
    async fn upsert(&self, data: UpsertAffiliation) -> Result<Affiliation, PraxisError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Affiliation>, PraxisError>;

    /// All affiliations of a professional regardless of status, newest
    /// `start_date` first (ties broken by id, highest first).
    async fn find_by_professional(
        &self,
        professional_id: i64,
    ) -> Result<Vec<Affiliation>, PraxisError>;

    /// Deletes every affiliation of the pair. Returns the number removed.
    async fn delete_by_professional_and_establishment(
        &self,
        professional_id: i64,
        establishment_id: i64,
    ) -> Result<u64, PraxisError>;

    /// Returns `NotFound` for an unknown id.
    async fn update_status(
        &self,
        id: i64,
        status: AffiliationStatus,
    ) -> Result<Affiliation, PraxisError>;
}
