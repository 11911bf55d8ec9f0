use chrono::Utc;

use crate::invitations::{Invitation, InvitationRepository};
use crate::validators::normalize_email;
use crate::PraxisError;

/// Lists open invitations, either addressed to an email or issued by an
/// establishment. Pending rows already past `expires_at` are left out.
pub struct ListPendingInvitationsAction<I: InvitationRepository> {
    invitation_repo: I,
}

impl<I: InvitationRepository> ListPendingInvitationsAction<I> {
    pub fn new(invitation_repo: I) -> Self {
        Self { invitation_repo }
    }

    /// Open invitations for `email`, compared case-insensitively.
    #[cfg_attr(feature = "tracing", tracing::instrument(name = "list_pending_invitations", skip_all, err))]
    pub async fn execute(&self, email: &str) -> Result<Vec<Invitation>, PraxisError> {
        let email = normalize_email(email);
        let now = Utc::now();
        Ok(self
            .invitation_repo
            .find_pending_by_email(&email)
            .await?
            .into_iter()
            .filter(|i| !i.is_expired_at(now))
            .collect())
    }

    pub async fn for_establishment(
        &self,
        establishment_id: i64,
    ) -> Result<Vec<Invitation>, PraxisError> {
        let now = Utc::now();
        Ok(self
            .invitation_repo
            .find_pending_by_establishment(establishment_id)
            .await?
            .into_iter()
            .filter(|i| !i.is_expired_at(now))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::affiliations::Role;
    use crate::invitations::{CreateInvitation, MockInvitationRepository};

    fn invitation(establishment_id: i64, email: &str, expires_in: Duration) -> CreateInvitation {
        CreateInvitation {
            establishment_id,
            email: email.into(),
            invited_by: 1,
            role: Role::Doctor,
            position_title: None,
            department_id: None,
            message: None,
            expires_at: Utc::now() + expires_in,
        }
    }

    #[tokio::test]
    async fn test_lists_open_invitations_for_email() {
        let repo = MockInvitationRepository::new();
        repo.create(invitation(1, "doc@example.org", Duration::days(3))).await.unwrap();
        repo.create(invitation(2, "doc@example.org", Duration::days(-1))).await.unwrap();
        repo.create(invitation(3, "other@example.org", Duration::days(3))).await.unwrap();

        let listed = ListPendingInvitationsAction::new(repo)
            .execute(" DOC@example.org")
            .await
            .unwrap();

        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].establishment_id, 1);
    }

    #[tokio::test]
    async fn test_lists_for_establishment() {
        let repo = MockInvitationRepository::new();
        repo.create(invitation(1, "a@example.org", Duration::days(3))).await.unwrap();
        repo.create(invitation(1, "b@example.org", Duration::days(3))).await.unwrap();
        repo.create(invitation(2, "c@example.org", Duration::days(3))).await.unwrap();

        let listed = ListPendingInvitationsAction::new(repo)
            .for_establishment(1)
            .await
            .unwrap();
        assert_eq!(listed.len(), 2);
    }
}
