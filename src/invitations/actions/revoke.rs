use chrono::Utc;

use crate::affiliations::AffiliationRepository;
use crate::events::{PraxisEvent, dispatch};
use crate::invitations::authorize::ensure_can_manage_staff;
use crate::invitations::{Invitation, InvitationRepository, InvitationStatus};
use crate::PraxisError;

/// Withdraws a pending invitation.
pub struct RevokeInvitationAction<I, A>
where
    I: InvitationRepository,
    A: AffiliationRepository,
{
    invitation_repo: I,
    affiliation_repo: A,
}

impl<I: InvitationRepository, A: AffiliationRepository> RevokeInvitationAction<I, A> {
    pub fn new(invitation_repo: I, affiliation_repo: A) -> Self {
        Self {
            invitation_repo,
            affiliation_repo,
        }
    }

    /// - `Err(PraxisError::NotFound)` - unknown invitation
    /// - `Err(PraxisError::Forbidden)` - caller lacks `manage_all_staff`
    /// - `Err(PraxisError::InvalidState)` - invitation already left `pending`
    #[cfg_attr(feature = "tracing", tracing::instrument(name = "revoke_invitation", skip(self), err))]
    pub async fn execute(
        &self,
        invitation_id: i64,
        revoked_by: i64,
    ) -> Result<Invitation, PraxisError> {
        let invitation = self
            .invitation_repo
            .find_by_id(invitation_id)
            .await?
            .ok_or(PraxisError::NotFound)?;

        ensure_can_manage_staff(&self.affiliation_repo, revoked_by, invitation.establishment_id)
            .await?;

        let revoked = self
            .invitation_repo
            .transition_status(invitation.id, InvitationStatus::Pending, InvitationStatus::Revoked)
            .await?
            .ok_or_else(|| PraxisError::InvalidState("invitation is no longer pending".into()))?;

        log::info!(
            target: "praxis",
            "msg=\"invitation revoked\", invitation_id={}, revoked_by={revoked_by}",
            revoked.id
        );

        dispatch(PraxisEvent::InvitationRevoked {
            invitation_id: revoked.id,
            at: Utc::now(),
        })
        .await;

        Ok(revoked)
    }
}
