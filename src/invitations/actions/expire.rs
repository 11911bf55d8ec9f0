use chrono::Utc;

use crate::events::{PraxisEvent, dispatch};
use crate::invitations::InvitationRepository;
use crate::PraxisError;

/// Flips stale pending invitations to `expired`. Meant for a periodic job.
pub struct ExpireInvitationsAction<I: InvitationRepository> {
    invitation_repo: I,
}

impl<I: InvitationRepository> ExpireInvitationsAction<I> {
    pub fn new(invitation_repo: I) -> Self {
        Self { invitation_repo }
    }

    /// Returns the number of invitations expired.
    #[cfg_attr(feature = "tracing", tracing::instrument(name = "expire_invitations", skip(self), err))]
    pub async fn execute(&self) -> Result<u64, PraxisError> {
        let now = Utc::now();
        let count = self.invitation_repo.expire_stale(now).await?;

        if count > 0 {
            log::info!(
                target: "praxis",
                "msg=\"invitations expired\", count={count}"
            );
            dispatch(PraxisEvent::InvitationsExpired { count, at: now }).await;
        }

        Ok(count)
    }
}
