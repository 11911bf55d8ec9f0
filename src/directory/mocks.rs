#![allow(clippy::significant_drop_tightening)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::Utc;

use super::repository::{
    CreateEstablishment, CreateProfessional, DepartmentRepository, EstablishmentRepository,
    ProfessionalRepository, UpsertDepartment,
};
use super::types::{ClaimState, Department, Establishment, Professional};
use crate::PraxisError;

fn poisoned<T>(_: T) -> PraxisError {
    PraxisError::Internal("lock poisoned".into())
}

/// In-memory professionals. Clones share storage.
#[derive(Clone)]
pub struct MockProfessionalRepository {
    professionals: Arc<RwLock<HashMap<i64, Professional>>>,
    next_id: Arc<AtomicI64>,
}

impl MockProfessionalRepository {
    pub fn new() -> Self {
        Self {
            professionals: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(AtomicI64::new(1)),
        }
    }
}

impl Default for MockProfessionalRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProfessionalRepository for MockProfessionalRepository {
    async fn create(&self, data: CreateProfessional) -> Result<Professional, PraxisError> {
        let mut professionals = self.professionals.write().map_err(poisoned)?;
        if professionals.values().any(|p| p.user_id == data.user_id) {
            return Err(PraxisError::Validation(
                "user already has a professional profile".into(),
            ));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let now = Utc::now();
        let professional = Professional {
            id,
            user_id: data.user_id,
            display_name: data.display_name,
            email: data.email,
            phone: data.phone,
            is_verified: false,
            verified_by: None,
            verified_at: None,
            created_at: now,
            updated_at: now,
        };
        professionals.insert(id, professional.clone());

        Ok(professional)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Professional>, PraxisError> {
        let professionals = self.professionals.read().map_err(poisoned)?;
        Ok(professionals.get(&id).cloned())
    }

    async fn find_by_user_id(&self, user_id: i64) -> Result<Option<Professional>, PraxisError> {
        let professionals = self.professionals.read().map_err(poisoned)?;
        Ok(professionals.values().find(|p| p.user_id == user_id).cloned())
    }
}

/// In-memory establishments. Clones share storage.
#[derive(Clone)]
pub struct MockEstablishmentRepository {
    establishments: Arc<RwLock<HashMap<i64, Establishment>>>,
    next_id: Arc<AtomicI64>,
}

impl MockEstablishmentRepository {
    pub fn new() -> Self {
        Self {
            establishments: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(AtomicI64::new(1)),
        }
    }
}

impl Default for MockEstablishmentRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EstablishmentRepository for MockEstablishmentRepository {
    async fn create(&self, data: CreateEstablishment) -> Result<Establishment, PraxisError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let now = Utc::now();
        let establishment = Establishment {
            id,
            name: data.name,
            establishment_type: data.establishment_type,
            address: data.address,
            city: data.city,
            country: data.country,
            contact_email: data.contact_email,
            claim_state: ClaimState::Unclaimed,
            claim_token_hash: None,
            claim_token_issued_at: None,
            claimed_at: None,
            claimed_by: None,
            created_at: now,
            updated_at: now,
        };

        let mut establishments = self.establishments.write().map_err(poisoned)?;
        establishments.insert(id, establishment.clone());

        Ok(establishment)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Establishment>, PraxisError> {
        let establishments = self.establishments.read().map_err(poisoned)?;
        Ok(establishments.get(&id).cloned())
    }

    async fn find_by_claim_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<Establishment>, PraxisError> {
        let establishments = self.establishments.read().map_err(poisoned)?;
        Ok(establishments
            .values()
            .find(|e| e.claim_token_hash.as_deref() == Some(token_hash))
            .cloned())
    }

    async fn set_claim_token(
        &self,
        id: i64,
        token_hash: &str,
    ) -> Result<Establishment, PraxisError> {
        let mut establishments = self.establishments.write().map_err(poisoned)?;
        let establishment = establishments.get_mut(&id).ok_or(PraxisError::NotFound)?;
        if establishment.is_claimed() {
            return Err(PraxisError::InvalidState(
                "establishment is already claimed".into(),
            ));
        }

        let now = Utc::now();
        establishment.claim_token_hash = Some(token_hash.to_owned());
        establishment.claim_token_issued_at = Some(now);
        establishment.updated_at = now;

        Ok(establishment.clone())
    }

    async fn mark_claimed(
        &self,
        id: i64,
        token_hash: &str,
        claimed_by: i64,
    ) -> Result<Option<Establishment>, PraxisError> {
        let mut establishments = self.establishments.write().map_err(poisoned)?;
        let Some(establishment) = establishments.get_mut(&id) else {
            return Ok(None);
        };

        if establishment.is_claimed()
            || establishment.claim_token_hash.as_deref() != Some(token_hash)
        {
            return Ok(None);
        }

        let now = Utc::now();
        establishment.claim_state = ClaimState::Claimed;
        establishment.claimed_by = Some(claimed_by);
        establishment.claimed_at = Some(now);
        establishment.claim_token_hash = None;
        establishment.claim_token_issued_at = None;
        establishment.updated_at = now;

        Ok(Some(establishment.clone()))
    }

    async fn reset_claim(&self, id: i64) -> Result<Establishment, PraxisError> {
        let mut establishments = self.establishments.write().map_err(poisoned)?;
        let establishment = establishments.get_mut(&id).ok_or(PraxisError::NotFound)?;

        establishment.claim_state = ClaimState::Unclaimed;
        establishment.claimed_by = None;
        establishment.claimed_at = None;
        establishment.claim_token_hash = None;
        establishment.claim_token_issued_at = None;
        establishment.updated_at = Utc::now();

        Ok(establishment.clone())
    }
}

/// In-memory departments. Clones share storage.
#[derive(Clone)]
pub struct MockDepartmentRepository {
    departments: Arc<RwLock<HashMap<i64, Department>>>,
    next_id: Arc<AtomicI64>,
}

impl MockDepartmentRepository {
    pub fn new() -> Self {
        Self {
            departments: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(AtomicI64::new(1)),
        }
    }
}

impl Default for MockDepartmentRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DepartmentRepository for MockDepartmentRepository {
    async fn upsert(&self, data: UpsertDepartment) -> Result<Department, PraxisError> {
        let mut departments = self.departments.write().map_err(poisoned)?;

        if let Some(existing) = departments
            .values_mut()
            .find(|d| d.establishment_id == data.establishment_id && d.code == data.code)
        {
            existing.name = data.name;
            return Ok(existing.clone());
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let department = Department {
            id,
            establishment_id: data.establishment_id,
            code: data.code,
            name: data.name,
            created_at: Utc::now(),
        };
        departments.insert(id, department.clone());

        Ok(department)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Department>, PraxisError> {
        let departments = self.departments.read().map_err(poisoned)?;
        Ok(departments.get(&id).cloned())
    }

    async fn find_by_establishment(
        &self,
        establishment_id: i64,
    ) -> Result<Vec<Department>, PraxisError> {
        let departments = self.departments.read().map_err(poisoned)?;
        let mut found: Vec<Department> = departments
            .values()
            .filter(|d| d.establishment_id == establishment_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::EstablishmentType;

    fn clinic() -> CreateEstablishment {
        CreateEstablishment {
            name: "Clinique Pasteur".to_owned(),
            establishment_type: EstablishmentType::Clinic,
            address: None,
            city: Some("Dakar".to_owned()),
            country: Some("SN".to_owned()),
            contact_email: Some("contact@pasteur.sn".to_owned()),
        }
    }

    #[tokio::test]
    async fn test_professional_repository() {
        let repo = MockProfessionalRepository::new();
        let professional = repo
            .create(CreateProfessional {
                user_id: 42,
                display_name: "Dr Awa Ndiaye".to_owned(),
                email: "awa@example.com".to_owned(),
                phone: None,
            })
            .await
            .unwrap();

        assert!(!professional.is_verified);
        assert!(repo.find_by_id(professional.id).await.unwrap().is_some());
        assert_eq!(
            repo.find_by_user_id(42).await.unwrap().map(|p| p.id),
            Some(professional.id)
        );
    }

    #[tokio::test]
    async fn test_mark_claimed_is_conditional() {
        let repo = MockEstablishmentRepository::new();
        let establishment = repo.create(clinic()).await.unwrap();
        repo.set_claim_token(establishment.id, "hash-a").await.unwrap();

        assert!(
            repo.mark_claimed(establishment.id, "hash-b", 1)
                .await
                .unwrap()
                .is_none()
        );

        let claimed = repo
            .mark_claimed(establishment.id, "hash-a", 1)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(claimed.claim_state, ClaimState::Claimed);
        assert!(claimed.claim_token_hash.is_none());

        assert!(
            repo.mark_claimed(establishment.id, "hash-a", 2)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_set_claim_token_skips_claimed_row() {
        let repo = MockEstablishmentRepository::new();
        let establishment = repo.create(clinic()).await.unwrap();
        repo.set_claim_token(establishment.id, "hash-a").await.unwrap();
        repo.mark_claimed(establishment.id, "hash-a", 1).await.unwrap();

        assert!(matches!(
            repo.set_claim_token(establishment.id, "hash-b").await,
            Err(PraxisError::InvalidState(_))
        ));
        let stored = repo.find_by_id(establishment.id).await.unwrap().unwrap();
        assert!(stored.claim_token_hash.is_none());
        assert_eq!(
            repo.set_claim_token(99, "hash-c").await.unwrap_err(),
            PraxisError::NotFound
        );
    }

    #[tokio::test]
    async fn test_reset_claim_unknown_id() {
        let repo = MockEstablishmentRepository::new();
        assert_eq!(repo.reset_claim(99).await.unwrap_err(), PraxisError::NotFound);
    }

    #[tokio::test]
    async fn test_department_upsert_is_idempotent() {
        let repo = MockDepartmentRepository::new();
        let first = repo
            .upsert(UpsertDepartment {
                establishment_id: 1,
                code: "MED".to_owned(),
                name: "Medical".to_owned(),
            })
            .await
            .unwrap();
        let second = repo
            .upsert(UpsertDepartment {
                establishment_id: 1,
                code: "MED".to_owned(),
                name: "Médical".to_owned(),
            })
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.name, "Médical");
        assert_eq!(repo.find_by_establishment(1).await.unwrap().len(), 1);
    }
}
