use chrono::Utc;

use crate::crypto::hash_token;
use crate::directory::{Establishment, EstablishmentRepository};
use crate::events::{PraxisEvent, dispatch};
use crate::retry::RetryPolicy;
use crate::{PraxisError, SecretString};

/// Consumes a claim token and marks its establishment claimed.
///
/// The token is single-use: a second call with the same token fails with
/// `InvalidToken` and leaves the establishment unchanged.
pub struct ClaimEstablishmentAction<E: EstablishmentRepository> {
    establishment_repo: E,
    retry: RetryPolicy,
}

impl<E: EstablishmentRepository> ClaimEstablishmentAction<E> {
    pub fn new(establishment_repo: E) -> Self {
        Self::with_retry(establishment_repo, RetryPolicy::default())
    }

    pub fn with_retry(establishment_repo: E, retry: RetryPolicy) -> Self {
        Self {
            establishment_repo,
            retry,
        }
    }

    /// - `Err(PraxisError::InvalidToken)` - unknown or consumed token, or an
    ///   establishment that is already claimed
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "claim_establishment", skip(self, token), err)
    )]
    pub async fn execute(
        &self,
        token: &SecretString,
        claiming_user_id: i64,
    ) -> Result<Establishment, PraxisError> {
        let token_hash = hash_token(token.expose_secret());

        let repo = &self.establishment_repo;
        let hash = token_hash.as_str();
        let establishment = self
            .retry
            .run("find_by_claim_token", move || repo.find_by_claim_token_hash(hash))
            .await?
            .ok_or(PraxisError::InvalidToken)?;

        if establishment.is_claimed() {
            return Err(PraxisError::InvalidToken);
        }

        // the conditional write is not retried: a lost acknowledgement would
        // otherwise come back as InvalidToken
        let claimed = self
            .establishment_repo
            .mark_claimed(establishment.id, &token_hash, claiming_user_id)
            .await?
            .ok_or(PraxisError::InvalidToken)?;

        log::info!(
            target: "praxis",
            "msg=\"establishment claimed\", establishment_id={}, claimed_by={claiming_user_id}",
            claimed.id
        );

        dispatch(PraxisEvent::EstablishmentClaimed {
            establishment_id: claimed.id,
            claimed_by: claiming_user_id,
            at: claimed.claimed_at.unwrap_or_else(Utc::now),
        })
        .await;

        Ok(claimed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::{
        ClaimState, CreateEstablishment, EstablishmentType, MockEstablishmentRepository,
    };
    use crate::invitations::GenerateClaimTokenAction;

    async fn clinic_with_token(repo: &MockEstablishmentRepository) -> (i64, SecretString) {
        let clinic = repo
            .create(CreateEstablishment {
                name: "Clinique Pasteur".into(),
                establishment_type: EstablishmentType::Clinic,
                address: None,
                city: None,
                country: None,
                contact_email: None,
            })
            .await
            .unwrap();
        let link = GenerateClaimTokenAction::new(repo.clone())
            .execute(clinic.id)
            .await
            .unwrap();
        (clinic.id, link.token)
    }

    #[tokio::test]
    async fn test_claim_round_trip() {
        let repo = MockEstablishmentRepository::new();
        let (id, token) = clinic_with_token(&repo).await;

        let claimed = ClaimEstablishmentAction::new(repo.clone())
            .execute(&token, 42)
            .await
            .unwrap();
        assert_eq!(claimed.id, id);

        let stored = repo.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(stored.claim_state, ClaimState::Claimed);
        assert_eq!(stored.claimed_by, Some(42));
        assert!(stored.claimed_at.is_some());
        assert!(!stored.has_claim_token());
    }

    #[tokio::test]
    async fn test_token_is_single_use() {
        let repo = MockEstablishmentRepository::new();
        let (id, token) = clinic_with_token(&repo).await;
        let action = ClaimEstablishmentAction::new(repo.clone());

        action.execute(&token, 42).await.unwrap();
        let second = action.execute(&token, 43).await;

        assert_eq!(second.unwrap_err(), PraxisError::InvalidToken);
        let stored = repo.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(stored.claimed_by, Some(42));
    }

    #[tokio::test]
    async fn test_unknown_token() {
        let action = ClaimEstablishmentAction::new(MockEstablishmentRepository::new());
        assert_eq!(
            action.execute(&SecretString::new("nope"), 1).await.unwrap_err(),
            PraxisError::InvalidToken
        );
    }
}
