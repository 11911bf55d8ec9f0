//! Invitation delivery seam.

use async_trait::async_trait;

use super::Invitation;
use crate::directory::Establishment;
use crate::PraxisError;

/// Sends the invitation to the invitee (email, SMS, in-app).
///
/// Delivery failures are logged by the caller and never undo the invitation.
#[async_trait]
pub trait InvitationNotifier: Send + Sync {
    async fn send_invitation(
        &self,
        invitation: &Invitation,
        establishment: &Establishment,
        url: &str,
    ) -> Result<(), PraxisError>;
}

/// Writes the invitation to the log instead of delivering it.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl InvitationNotifier for LogNotifier {
    async fn send_invitation(
        &self,
        invitation: &Invitation,
        establishment: &Establishment,
        url: &str,
    ) -> Result<(), PraxisError> {
        log::info!(
            target: "praxis",
            "msg=\"invitation ready for delivery\", invitation_id={}, establishment=\"{}\", email=\"{}\", url=\"{url}\"",
            invitation.id,
            establishment.name,
            invitation.email
        );
        Ok(())
    }
}
