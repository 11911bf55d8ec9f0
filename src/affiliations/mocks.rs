#![allow(clippy::significant_drop_tightening)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicU32, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::Utc;

use super::repository::{AffiliationRepository, UpsertAffiliation};
use super::{Affiliation, AffiliationStatus};
use crate::PraxisError;

fn poisoned<T>(_: T) -> PraxisError {
    PraxisError::Internal("lock poisoned".into())
}

/// In-memory affiliation store. Clones share storage.
///
/// [`fail_next`](Self::fail_next) makes the following calls fail with a
/// transient `StoreUnavailable`, for exercising retries and degraded loads.
#[derive(Clone)]
pub struct MockAffiliationRepository {
    affiliations: Arc<RwLock<HashMap<i64, Affiliation>>>,
    next_id: Arc<AtomicI64>,
    failures: Arc<AtomicU32>,
}

impl MockAffiliationRepository {
    pub fn new() -> Self {
        Self {
            affiliations: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(AtomicI64::new(1)),
            failures: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Fail the next `n` repository calls with `StoreUnavailable`.
    pub fn fail_next(&self, n: u32) {
        self.failures.store(n, Ordering::SeqCst);
    }

    /// Number of stored rows, any status.
    pub fn len(&self) -> usize {
        self.affiliations.read().map(|a| a.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_failure(&self) -> Result<(), PraxisError> {
        let injected = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        match injected {
            Ok(_) => Err(PraxisError::StoreUnavailable("injected failure".into())),
            Err(_) => Ok(()),
        }
    }
}

impl Default for MockAffiliationRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AffiliationRepository for MockAffiliationRepository {
    async fn upsert(&self, data: UpsertAffiliation) -> Result<Affiliation, PraxisError> {
        self.check_failure()?;
        let mut affiliations = self.affiliations.write().map_err(poisoned)?;
        let now = Utc::now();

        let existing = affiliations
            .values()
            .find(|a| {
                a.professional_id == data.professional_id
                    && a.matches(data.establishment_id, data.department_id)
            })
            .map(|a| (a.id, a.created_at, a.start_date));

        let (id, created_at, stored_start) = match existing {
            Some(found) => found,
            None => (self.next_id.fetch_add(1, Ordering::SeqCst), now, now.date_naive()),
        };

        let affiliation = Affiliation {
            id,
            professional_id: data.professional_id,
            establishment_id: data.establishment_id,
            department_id: data.department_id,
            role: data.role,
            position_title: data.position_title,
            is_department_head: data.is_department_head,
            is_establishment_admin: data.is_establishment_admin,
            permissions: data.permissions,
            status: data.status,
            start_date: data.start_date.unwrap_or(stored_start),
            end_date: data.end_date,
            matricule: data.matricule,
            created_at,
            updated_at: now,
        };
        affiliations.insert(id, affiliation.clone());

        Ok(affiliation)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Affiliation>, PraxisError> {
        self.check_failure()?;
        let affiliations = self.affiliations.read().map_err(poisoned)?;
        Ok(affiliations.get(&id).cloned())
    }

    async fn find_by_professional(
        &self,
        professional_id: i64,
    ) -> Result<Vec<Affiliation>, PraxisError> {
        self.check_failure()?;
        let affiliations = self.affiliations.read().map_err(poisoned)?;
        let mut found: Vec<Affiliation> = affiliations
            .values()
            .filter(|a| a.professional_id == professional_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.start_date.cmp(&a.start_date).then(b.id.cmp(&a.id)));
        Ok(found)
    }

    async fn delete_by_professional_and_establishment(
        &self,
        professional_id: i64,
        establishment_id: i64,
    ) -> Result<u64, PraxisError> {
        self.check_failure()?;
        let mut affiliations = self.affiliations.write().map_err(poisoned)?;
        let before = affiliations.len();
        affiliations.retain(|_, a| {
            !(a.professional_id == professional_id && a.establishment_id == establishment_id)
        });
        Ok((before - affiliations.len()) as u64)
    }

    async fn update_status(
        &self,
        id: i64,
        status: AffiliationStatus,
    ) -> Result<Affiliation, PraxisError> {
        self.check_failure()?;
        let mut affiliations = self.affiliations.write().map_err(poisoned)?;
        let affiliation = affiliations.get_mut(&id).ok_or(PraxisError::NotFound)?;
        affiliation.status = status;
        affiliation.updated_at = Utc::now();
        Ok(affiliation.clone())
    }
}
