use chrono::Utc;

use super::generate_claim::issue_claim_token;
use crate::config::ClaimConfig;
use crate::directory::EstablishmentRepository;
use crate::events::{PraxisEvent, dispatch};
use crate::invitations::RevokedClaim;
use crate::retry::RetryPolicy;
use crate::PraxisError;

/// Returns a claimed establishment to the unclaimed state.
///
/// Authorization of the platform operator happens before this action.
/// Affiliations created under the previous claim are left untouched.
pub struct RevokeClaimAction<E: EstablishmentRepository> {
    establishment_repo: E,
    config: ClaimConfig,
    retry: RetryPolicy,
}

impl<E: EstablishmentRepository> RevokeClaimAction<E> {
    pub fn new(establishment_repo: E) -> Self {
        Self::with_config(establishment_repo, ClaimConfig::default(), RetryPolicy::default())
    }

    pub fn with_config(establishment_repo: E, config: ClaimConfig, retry: RetryPolicy) -> Self {
        Self {
            establishment_repo,
            config,
            retry,
        }
    }

    /// Clears claimant, claim time and token, then issues a fresh token when
    /// `reissue_on_revoke` is set.
    ///
    /// - `Err(PraxisError::NotFound)` - unknown establishment
    #[cfg_attr(feature = "tracing", tracing::instrument(name = "revoke_claim", skip(self), err))]
    pub async fn execute(&self, establishment_id: i64) -> Result<RevokedClaim, PraxisError> {
        let repo = &self.establishment_repo;
        let mut establishment = self
            .retry
            .run("reset_claim", move || repo.reset_claim(establishment_id))
            .await?;

        log::info!(
            target: "praxis",
            "msg=\"claim revoked\", establishment_id={establishment_id}"
        );

        dispatch(PraxisEvent::ClaimRevoked {
            establishment_id,
            at: Utc::now(),
        })
        .await;

        let new_link = if self.config.reissue_on_revoke {
            let link = issue_claim_token(repo, &self.config, &self.retry, establishment_id).await?;
            if let Some(refreshed) = repo.find_by_id(establishment_id).await? {
                establishment = refreshed;
            }
            Some(link)
        } else {
            None
        };

        Ok(RevokedClaim {
            establishment,
            new_link,
        })
    }
}
