use chrono::Utc;

use crate::affiliations::{
    Affiliation, AffiliationAttributes, AffiliationRepository, UpsertAffiliationAction,
    UpsertAffiliationInput,
};
use crate::directory::{DepartmentRepository, EstablishmentRepository, ProfessionalRepository};
use crate::events::{PraxisEvent, dispatch};
use crate::invitations::{InvitationRepository, InvitationStatus};
use crate::validators::normalize_email;
use crate::PraxisError;

/// Accepts a staff invitation and turns it into an affiliation.
///
/// This action:
/// 1. Checks the invitation is pending (an expired one is flipped to `expired`)
/// 2. Verifies the professional's email matches the invited one
/// 3. Upserts the affiliation described by the invitation
/// 4. Marks the invitation accepted
///
/// The upsert is idempotent, so two racing accepts converge on one row; the
/// loser of the status flip gets `InvalidState`.
pub struct AcceptInvitationAction<I, A, P, E, D>
where
    I: InvitationRepository,
    A: AffiliationRepository,
    P: ProfessionalRepository,
    E: EstablishmentRepository,
    D: DepartmentRepository,
{
    invitation_repo: I,
    upsert: UpsertAffiliationAction<A, P, E, D>,
}

impl<I, A, P, E, D> AcceptInvitationAction<I, A, P, E, D>
where
    I: InvitationRepository,
    A: AffiliationRepository,
    P: ProfessionalRepository,
    E: EstablishmentRepository,
    D: DepartmentRepository,
{
    pub fn new(invitation_repo: I, upsert: UpsertAffiliationAction<A, P, E, D>) -> Self {
        Self {
            invitation_repo,
            upsert,
        }
    }

    /// - `Err(PraxisError::NotFound)` - unknown invitation or professional
    /// - `Err(PraxisError::InvalidState)` - invitation not pending, or expired
    /// - `Err(PraxisError::EmailMismatch)` - invitation was sent elsewhere
    #[cfg_attr(feature = "tracing", tracing::instrument(name = "accept_invitation", skip(self), err))]
    pub async fn execute(
        &self,
        invitation_id: i64,
        professional_id: i64,
    ) -> Result<Affiliation, PraxisError> {
        let invitation = self
            .invitation_repo
            .find_by_id(invitation_id)
            .await?
            .ok_or(PraxisError::NotFound)?;

        if !invitation.is_pending() {
            return Err(PraxisError::InvalidState(format!(
                "invitation is {}",
                invitation.status
            )));
        }

        if invitation.is_expired() {
            self.invitation_repo
                .transition_status(invitation.id, InvitationStatus::Pending, InvitationStatus::Expired)
                .await?;
            return Err(PraxisError::InvalidState("invitation has expired".into()));
        }

        let professional = self
            .upsert
            .professional_repo()
            .find_by_id(professional_id)
            .await?
            .ok_or(PraxisError::NotFound)?;

        if normalize_email(&professional.email) != invitation.email {
            return Err(PraxisError::EmailMismatch);
        }

        let affiliation = self
            .upsert
            .execute(UpsertAffiliationInput {
                professional_id,
                establishment_id: invitation.establishment_id,
                department_id: invitation.department_id,
                role: invitation.role.as_str().to_owned(),
                attributes: AffiliationAttributes {
                    position_title: invitation.position_title.clone(),
                    ..AffiliationAttributes::default()
                },
            })
            .await?;

        self.invitation_repo
            .transition_status(invitation.id, InvitationStatus::Pending, InvitationStatus::Accepted)
            .await?
            .ok_or_else(|| PraxisError::InvalidState("invitation is no longer pending".into()))?;

        log::info!(
            target: "praxis",
            "msg=\"invitation accepted\", invitation_id={}, professional_id={professional_id}, affiliation_id={}",
            invitation.id,
            affiliation.id
        );

        dispatch(PraxisEvent::InvitationAccepted {
            invitation_id: invitation.id,
            affiliation_id: affiliation.id,
            at: Utc::now(),
        })
        .await;

        Ok(affiliation)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::affiliations::Role;
    use crate::directory::EstablishmentType;
    use crate::invitations::CreateInvitation;
    use crate::test_support::World;

    struct Setup {
        world: World,
        hospital: i64,
        nurse: i64,
    }

    async fn setup() -> Setup {
        let world = World::new();
        let hospital = world.establishment("Hôpital Principal", EstablishmentType::Hospital).await;
        let nurse = world.professional(10, "Fatou@Example.org").await;
        Setup {
            hospital: hospital.id,
            nurse: nurse.id,
            world,
        }
    }

    async fn invite(s: &Setup, email: &str, expires_in: Duration) -> i64 {
        s.world
            .invitations
            .create(CreateInvitation {
                establishment_id: s.hospital,
                email: email.into(),
                invited_by: 1,
                role: Role::Nurse,
                position_title: Some("Infirmière major".into()),
                department_id: None,
                message: None,
                expires_at: Utc::now() + expires_in,
            })
            .await
            .unwrap()
            .id
    }

    fn action(world: &World) -> AcceptInvitationAction<
        crate::invitations::MockInvitationRepository,
        crate::affiliations::MockAffiliationRepository,
        crate::directory::MockProfessionalRepository,
        crate::directory::MockEstablishmentRepository,
        crate::directory::MockDepartmentRepository,
    > {
        AcceptInvitationAction::new(world.invitations.clone(), world.upsert_action())
    }

    #[tokio::test]
    async fn test_accept_creates_affiliation() {
        let s = setup().await;
        let id = invite(&s, "fatou@example.org", Duration::days(7)).await;

        let affiliation = action(&s.world).execute(id, s.nurse).await.unwrap();

        assert_eq!(affiliation.establishment_id, s.hospital);
        assert_eq!(affiliation.role, Role::Nurse);
        assert_eq!(affiliation.position_title.as_deref(), Some("Infirmière major"));
        let invitation = s.world.invitations.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(invitation.status, InvitationStatus::Accepted);
        assert!(invitation.responded_at.is_some());
    }

    #[tokio::test]
    async fn test_accept_twice_is_invalid_state() {
        let s = setup().await;
        let id = invite(&s, "fatou@example.org", Duration::days(7)).await;
        let action = action(&s.world);

        action.execute(id, s.nurse).await.unwrap();
        let second = action.execute(id, s.nurse).await;

        assert!(matches!(second, Err(PraxisError::InvalidState(_))));
        assert_eq!(s.world.affiliations.len(), 1);
    }

    #[tokio::test]
    async fn test_expired_invitation_flips_to_expired() {
        let s = setup().await;
        let id = invite(&s, "fatou@example.org", Duration::hours(-1)).await;

        let result = action(&s.world).execute(id, s.nurse).await;

        assert!(matches!(result, Err(PraxisError::InvalidState(_))));
        let invitation = s.world.invitations.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(invitation.status, InvitationStatus::Expired);
        assert!(s.world.affiliations.is_empty());
    }

    #[tokio::test]
    async fn test_email_mismatch() {
        let s = setup().await;
        let id = invite(&s, "someone.else@example.org", Duration::days(7)).await;

        let result = action(&s.world).execute(id, s.nurse).await;

        assert_eq!(result.unwrap_err(), PraxisError::EmailMismatch);
        let invitation = s.world.invitations.find_by_id(id).await.unwrap().unwrap();
        assert!(invitation.is_pending());
    }

    #[tokio::test]
    async fn test_revoked_invitation_cannot_be_accepted() {
        let s = setup().await;
        let id = invite(&s, "fatou@example.org", Duration::days(7)).await;
        s.world
            .invitations
            .transition_status(id, InvitationStatus::Pending, InvitationStatus::Revoked)
            .await
            .unwrap();

        let result = action(&s.world).execute(id, s.nurse).await;
        assert!(matches!(result, Err(PraxisError::InvalidState(_))));
        assert!(s.world.affiliations.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_invitation() {
        let s = setup().await;
        assert_eq!(
            action(&s.world).execute(404, s.nurse).await.unwrap_err(),
            PraxisError::NotFound
        );
    }
}
