#![allow(clippy::significant_drop_tightening)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;

use super::ActiveContext;
use super::repository::ActiveContextRepository;
use crate::PraxisError;

fn poisoned<T>(_: T) -> PraxisError {
    PraxisError::Internal("lock poisoned".into())
}

/// In-memory markers. Clones share storage.
#[derive(Clone, Default)]
pub struct MockActiveContextRepository {
    markers: Arc<RwLock<HashMap<i64, ActiveContext>>>,
    failures: Arc<AtomicU32>,
    delay: Arc<RwLock<Option<Duration>>>,
}

impl MockActiveContextRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `n` calls with `StoreUnavailable`.
    pub fn fail_next(&self, n: u32) {
        self.failures.store(n, Ordering::SeqCst);
    }

    /// Delay every `set` by `delay`, to exercise switch timeouts.
    pub fn delay_writes(&self, delay: Duration) {
        if let Ok(mut slot) = self.delay.write() {
            *slot = Some(delay);
        }
    }

    fn check_failure(&self) -> Result<(), PraxisError> {
        match self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        {
            Ok(_) => Err(PraxisError::StoreUnavailable("injected failure".into())),
            Err(_) => Ok(()),
        }
    }
}

#[async_trait]
impl ActiveContextRepository for MockActiveContextRepository {
    async fn get(&self, professional_id: i64) -> Result<Option<ActiveContext>, PraxisError> {
        self.check_failure()?;
        let markers = self.markers.read().map_err(poisoned)?;
        Ok(markers.get(&professional_id).cloned())
    }

    async fn set(&self, marker: ActiveContext) -> Result<ActiveContext, PraxisError> {
        let delay = *self.delay.read().map_err(poisoned)?;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.check_failure()?;

        let mut markers = self.markers.write().map_err(poisoned)?;
        let stored = match markers.get(&marker.professional_id) {
            Some(existing) if existing.updated_at > marker.updated_at => existing.clone(),
            _ => {
                markers.insert(marker.professional_id, marker.clone());
                marker
            }
        };
        Ok(stored)
    }

    async fn clear(&self, professional_id: i64) -> Result<(), PraxisError> {
        self.check_failure()?;
        let mut markers = self.markers.write().map_err(poisoned)?;
        markers.remove(&professional_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration as ChronoDuration, Utc};

    use super::*;

    fn marker(establishment_id: i64, offset_secs: i64) -> ActiveContext {
        ActiveContext {
            professional_id: 1,
            establishment_id,
            department_id: None,
            affiliation_id: establishment_id,
            updated_at: Utc::now() + ChronoDuration::seconds(offset_secs),
        }
    }

    #[tokio::test]
    async fn test_later_write_wins() {
        let repo = MockActiveContextRepository::new();

        repo.set(marker(1, 10)).await.unwrap();
        let stored = repo.set(marker(2, 0)).await.unwrap();

        assert_eq!(stored.establishment_id, 1);
        assert_eq!(repo.get(1).await.unwrap().unwrap().establishment_id, 1);

        repo.set(marker(3, 20)).await.unwrap();
        assert_eq!(repo.get(1).await.unwrap().unwrap().establishment_id, 3);
    }

    #[tokio::test]
    async fn test_clear_is_idempotent() {
        let repo = MockActiveContextRepository::new();
        repo.set(marker(1, 0)).await.unwrap();
        repo.clear(1).await.unwrap();
        repo.clear(1).await.unwrap();
        assert!(repo.get(1).await.unwrap().is_none());
    }
}
