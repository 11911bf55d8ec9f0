use crate::affiliations::{Affiliation, AffiliationRepository};
use crate::retry::RetryPolicy;
use crate::PraxisError;

/// Lists every affiliation of a professional, newest `start_date` first.
///
/// Statuses are not filtered; an unknown professional yields an empty list.
pub struct ListAffiliationsAction<A: AffiliationRepository> {
    affiliation_repo: A,
    retry: RetryPolicy,
}

impl<A: AffiliationRepository> ListAffiliationsAction<A> {
    pub fn new(affiliation_repo: A) -> Self {
        Self::with_retry(affiliation_repo, RetryPolicy::default())
    }

    pub fn with_retry(affiliation_repo: A, retry: RetryPolicy) -> Self {
        Self {
            affiliation_repo,
            retry,
        }
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(name = "list_affiliations", skip(self), err))]
    pub async fn execute(&self, professional_id: i64) -> Result<Vec<Affiliation>, PraxisError> {
        let repo = &self.affiliation_repo;
        self.retry
            .run("list_affiliations", move || repo.find_by_professional(professional_id))
            .await
    }
}
