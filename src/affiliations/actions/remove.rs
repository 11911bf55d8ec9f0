use chrono::Utc;

use crate::affiliations::AffiliationRepository;
use crate::events::{PraxisEvent, dispatch};
use crate::retry::RetryPolicy;
use crate::PraxisError;

/// Removes every affiliation a professional holds at one establishment.
///
/// Idempotent: removing a pair with no rows returns `Ok(0)`.
pub struct RemoveAffiliationAction<A: AffiliationRepository> {
    affiliation_repo: A,
    retry: RetryPolicy,
}

impl<A: AffiliationRepository> RemoveAffiliationAction<A> {
    pub fn new(affiliation_repo: A) -> Self {
        Self::with_retry(affiliation_repo, RetryPolicy::default())
    }

    pub fn with_retry(affiliation_repo: A, retry: RetryPolicy) -> Self {
        Self {
            affiliation_repo,
            retry,
        }
    }

    /// Returns the number of rows removed.
    #[cfg_attr(feature = "tracing", tracing::instrument(name = "remove_affiliation", skip(self), err))]
    pub async fn execute(&self, professional_id: i64, establishment_id: i64) -> Result<u64, PraxisError> {
        let repo = &self.affiliation_repo;
        let removed = self
            .retry
            .run("remove_affiliation", move || {
                repo.delete_by_professional_and_establishment(professional_id, establishment_id)
            })
            .await?;

        if removed > 0 {
            log::info!(
                target: "praxis",
                "msg=\"affiliations removed\", professional_id={professional_id}, establishment_id={establishment_id}, removed={removed}"
            );

            dispatch(PraxisEvent::AffiliationsRemoved {
                professional_id,
                establishment_id,
                removed,
                at: Utc::now(),
            })
            .await;
        }

        Ok(removed)
    }
}
