use chrono::Utc;

use crate::config::ClaimConfig;
use crate::crypto::{generate_token, hash_token};
use crate::directory::EstablishmentRepository;
use crate::events::{PraxisEvent, dispatch};
use crate::invitations::ClaimLink;
use crate::retry::RetryPolicy;
use crate::{PraxisError, SecretString};

/// Issues a single-use claim token for an unclaimed establishment.
///
/// Regenerating overwrites the stored hash, so earlier links stop working.
/// The plain token is returned once and never stored.
pub struct GenerateClaimTokenAction<E: EstablishmentRepository> {
    establishment_repo: E,
    config: ClaimConfig,
    retry: RetryPolicy,
}

impl<E: EstablishmentRepository> GenerateClaimTokenAction<E> {
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

    /// - `Err(PraxisError::NotFound)` - unknown establishment
    /// - `Err(PraxisError::InvalidState)` - establishment is already claimed
    #[cfg_attr(feature = "tracing", tracing::instrument(name = "generate_claim_token", skip(self), err))]
    pub async fn execute(&self, establishment_id: i64) -> Result<ClaimLink, PraxisError> {
        let establishment = self
            .establishment_repo
            .find_by_id(establishment_id)
            .await?
            .ok_or(PraxisError::NotFound)?;

        if establishment.is_claimed() {
            return Err(PraxisError::InvalidState(
                "establishment is already claimed".into(),
            ));
        }

        issue_claim_token(&self.establishment_repo, &self.config, &self.retry, establishment_id).await
    }
}

/// Generates, stores and announces a new claim token.
pub(crate) async fn issue_claim_token<E: EstablishmentRepository>(
    establishment_repo: &E,
    config: &ClaimConfig,
    retry: &RetryPolicy,
    establishment_id: i64,
) -> Result<ClaimLink, PraxisError> {
    let token = generate_token(config.token_length);
    let token_hash = hash_token(&token);

    // rewriting the same hash is harmless, so the write is retried
    let hash = token_hash.as_str();
    let stored = retry
        .run("set_claim_token", move || {
            establishment_repo.set_claim_token(establishment_id, hash)
        })
        .await?;

    let issued_at = stored.claim_token_issued_at.unwrap_or_else(Utc::now);

    log::info!(
        target: "praxis",
        "msg=\"claim token issued\", establishment_id={establishment_id}"
    );

    dispatch(PraxisEvent::ClaimTokenIssued {
        establishment_id,
        at: issued_at,
    })
    .await;

    Ok(ClaimLink {
        establishment_id,
        url: SecretString::new(config.claim_url(&token)),
        token: SecretString::new(token),
        issued_at,
    })
}
