use async_trait::async_trait;

use super::types::{Department, Establishment, EstablishmentType, Professional};
use crate::PraxisError;

#[derive(Debug, Clone)]
pub struct CreateProfessional {
    pub user_id: i64,
    pub display_name: String,
    pub email: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateEstablishment {
    pub name: String,
    pub establishment_type: EstablishmentType,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub contact_email: Option<String>,
}

/// Insert-or-update keyed on (establishment, code).
#[derive(Debug, Clone)]
pub struct UpsertDepartment {
    pub establishment_id: i64,
    pub code: String,
    pub name: String,
}

#[async_trait]
pub trait ProfessionalRepository: Send + Sync {
    async fn create(&self, data: CreateProfessional) -> Result<Professional, PraxisError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Professional>, PraxisError>;
    async fn find_by_user_id(&self, user_id: i64) -> Result<Option<Professional>, PraxisError>;
}

/// Establishment lookups plus the claim columns owned by the invitation manager.
///
/// Every claim write touches a single establishment row.
#[async_trait]
pub trait EstablishmentRepository: Send + Sync {
    async fn create(&self, data: CreateEstablishment) -> Result<Establishment, PraxisError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Establishment>, PraxisError>;
    async fn find_by_claim_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<Establishment>, PraxisError>;

    /// Stores a new claim token hash, replacing any previous one.
    ///
    /// Only unclaimed rows are written. Returns `NotFound` for an unknown id
    /// and `InvalidState` when the establishment is already claimed.
    async fn set_claim_token(
        &self,
        id: i64,
        token_hash: &str,
    ) -> Result<Establishment, PraxisError>;

    /// Marks the establishment claimed if, and only if, it still carries
    /// `token_hash` and is not already claimed. Clears the token.
    ///
    /// Returns `None` when the conditional write matched no row.
    async fn mark_claimed(
        &self,
        id: i64,
        token_hash: &str,
        claimed_by: i64,
    ) -> Result<Option<Establishment>, PraxisError>;

    /// Resets claim state to unclaimed and clears claimant and token.
    ///
    /// Returns `NotFound` for an unknown id.
    async fn reset_claim(&self, id: i64) -> Result<Establishment, PraxisError>;
}

#[async_trait]
pub trait DepartmentRepository: Send + Sync {
    async fn upsert(&self, data: UpsertDepartment) -> Result<Department, PraxisError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Department>, PraxisError>;
    async fn find_by_establishment(
        &self,
        establishment_id: i64,
    ) -> Result<Vec<Department>, PraxisError>;
}
