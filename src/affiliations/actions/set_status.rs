use chrono::Utc;

use crate::affiliations::{Affiliation, AffiliationRepository, AffiliationStatus};
use crate::events::{PraxisEvent, dispatch};
use crate::retry::RetryPolicy;
use crate::PraxisError;

/// Changes the status field of one affiliation and nothing else.
pub struct SetAffiliationStatusAction<A: AffiliationRepository> {
    affiliation_repo: A,
    retry: RetryPolicy,
}

impl<A: AffiliationRepository> SetAffiliationStatusAction<A> {
    pub fn new(affiliation_repo: A) -> Self {
        Self::with_retry(affiliation_repo, RetryPolicy::default())
    }

    pub fn with_retry(affiliation_repo: A, retry: RetryPolicy) -> Self {
        Self {
            affiliation_repo,
            retry,
        }
    }

    /// - `Err(PraxisError::NotFound)` - unknown affiliation id
    #[cfg_attr(feature = "tracing", tracing::instrument(name = "set_affiliation_status", skip(self), err))]
    pub async fn execute(
        &self,
        affiliation_id: i64,
        status: AffiliationStatus,
    ) -> Result<Affiliation, PraxisError> {
        let repo = &self.affiliation_repo;
        let affiliation = self
            .retry
            .run("set_affiliation_status", move || {
                repo.update_status(affiliation_id, status)
            })
            .await?;

        log::info!(
            target: "praxis",
            "msg=\"affiliation status changed\", affiliation_id={affiliation_id}, status=\"{status}\""
        );

        dispatch(PraxisEvent::AffiliationStatusChanged {
            affiliation_id,
            status,
            at: Utc::now(),
        })
        .await;

        Ok(affiliation)
    }
}
