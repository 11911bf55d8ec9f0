use chrono::{Duration, Utc};

use crate::affiliations::{AffiliationRepository, Role};
use crate::config::InvitationConfig;
use crate::directory::EstablishmentRepository;
use crate::events::{PraxisEvent, dispatch};
use crate::invitations::authorize::ensure_can_manage_staff;
use crate::invitations::{CreateInvitation, Invitation, InvitationNotifier, InvitationRepository};
use crate::validators::{normalize_email, validate_email, validate_label, validate_message};
use crate::PraxisError;

/// Input data for inviting a professional to an establishment.
#[derive(Debug, Clone)]
pub struct CreateInvitationInput {
    pub establishment_id: i64,
    /// Professional id of the inviter.
    pub invited_by: i64,
    pub email: String,
    pub role: String,
    pub position_title: Option<String>,
    pub department_id: Option<i64>,
    pub message: Option<String>,
}

/// Creates a staff invitation and hands it to the notifier.
///
/// This action:
/// 1. Validates email, role, title and message
/// 2. Checks the establishment exists
/// 3. Verifies the inviter may manage staff there
/// 4. Rejects a second open invitation for the same email
/// 5. Stores the invitation and delivers it
///
/// A failed delivery is logged; the invitation stays pending.
pub struct CreateInvitationAction<I, A, E, N>
where
    I: InvitationRepository,
    A: AffiliationRepository,
    E: EstablishmentRepository,
    N: InvitationNotifier,
{
    invitation_repo: I,
    affiliation_repo: A,
    establishment_repo: E,
    notifier: N,
    config: InvitationConfig,
}

impl<I, A, E, N> CreateInvitationAction<I, A, E, N>
where
    I: InvitationRepository,
    A: AffiliationRepository,
    E: EstablishmentRepository,
    N: InvitationNotifier,
{
    pub fn new(invitation_repo: I, affiliation_repo: A, establishment_repo: E, notifier: N) -> Self {
        Self::with_config(
            invitation_repo,
            affiliation_repo,
            establishment_repo,
            notifier,
            InvitationConfig::default(),
        )
    }

    pub fn with_config(
        invitation_repo: I,
        affiliation_repo: A,
        establishment_repo: E,
        notifier: N,
        config: InvitationConfig,
    ) -> Self {
        Self {
            invitation_repo,
            affiliation_repo,
            establishment_repo,
            notifier,
            config,
        }
    }

    /// - `Err(PraxisError::Validation)` - malformed input
    /// - `Err(PraxisError::NotFound)` - unknown establishment
    /// - `Err(PraxisError::Forbidden)` - inviter lacks `manage_all_staff`
    /// - `Err(PraxisError::InvalidState)` - an open invitation already exists
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "create_invitation",
            skip_all,
            fields(establishment_id = input.establishment_id, invited_by = input.invited_by),
            err
        )
    )]
    pub async fn execute(&self, input: CreateInvitationInput) -> Result<Invitation, PraxisError> {
        validate_email(&input.email)?;
        let email = normalize_email(&input.email);
        let role: Role = input.role.parse()?;
        if let Some(title) = input.position_title.as_deref() {
            validate_label(title)?;
        }
        if let Some(message) = input.message.as_deref() {
            validate_message(message)?;
        }

        let establishment = self
            .establishment_repo
            .find_by_id(input.establishment_id)
            .await?
            .ok_or(PraxisError::NotFound)?;

        ensure_can_manage_staff(&self.affiliation_repo, input.invited_by, establishment.id).await?;

        let already_open = self
            .invitation_repo
            .find_pending_by_email(&email)
            .await?
            .iter()
            .any(|i| i.establishment_id == establishment.id && !i.is_expired());
        if already_open {
            return Err(PraxisError::InvalidState(
                "an invitation is already pending for this email".into(),
            ));
        }

        let invitation = self
            .invitation_repo
            .create(CreateInvitation {
                establishment_id: establishment.id,
                email,
                invited_by: input.invited_by,
                role,
                position_title: input.position_title,
                department_id: input.department_id,
                message: input.message,
                expires_at: Utc::now() + Duration::days(self.config.expiry_days),
            })
            .await?;

        let url = self.config.invitation_url(invitation.id);
        if let Err(e) = self
            .notifier
            .send_invitation(&invitation, &establishment, &url)
            .await
        {
            log::error!(
                target: "praxis",
                "msg=\"invitation delivery failed\", invitation_id={}, error=\"{e}\"",
                invitation.id
            );
        }

        log::info!(
            target: "praxis",
            "msg=\"invitation created\", invitation_id={}, establishment_id={}, invited_by={}",
            invitation.id,
            invitation.establishment_id,
            invitation.invited_by
        );

        dispatch(PraxisEvent::InvitationCreated {
            invitation_id: invitation.id,
            establishment_id: invitation.establishment_id,
            email: invitation.email.clone(),
            at: invitation.created_at,
        })
        .await;

        Ok(invitation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::EstablishmentType;
    use crate::invitations::{InvitationStatus, MockInvitationRepository, RecordingNotifier};
    use crate::affiliations::MockAffiliationRepository;
    use crate::directory::MockEstablishmentRepository;
    use crate::test_support::World;

    type Action = CreateInvitationAction<
        MockInvitationRepository,
        MockAffiliationRepository,
        MockEstablishmentRepository,
        RecordingNotifier,
    >;

    fn action(world: &World) -> Action {
        CreateInvitationAction::with_config(
            world.invitations.clone(),
            world.affiliations.clone(),
            world.establishments.clone(),
            world.notifier.clone(),
            InvitationConfig {
                origin: "https://care.example.org".into(),
                ..InvitationConfig::default()
            },
        )
    }

    fn input(establishment_id: i64, invited_by: i64, email: &str) -> CreateInvitationInput {
        CreateInvitationInput {
            establishment_id,
            invited_by,
            email: email.into(),
            role: "nurse".into(),
            position_title: Some("Infirmière".into()),
            department_id: None,
            message: Some("Bienvenue".into()),
        }
    }

    async fn director_at_hospital(world: &World) -> (i64, i64) {
        let director = world.professional(1, "director@example.org").await;
        let hospital = world.establishment("Hôpital Dalal Jamm", EstablishmentType::Hospital).await;
        world.affiliate(director.id, hospital.id, None, Role::Director, 30).await;
        (director.id, hospital.id)
    }

    #[tokio::test]
    async fn test_director_can_invite() {
        let world = World::new();
        let (director, hospital) = director_at_hospital(&world).await;

        let invitation = action(&world)
            .execute(input(hospital, director, "  Nurse@Example.org "))
            .await
            .unwrap();

        assert_eq!(invitation.status, InvitationStatus::Pending);
        assert_eq!(invitation.email, "nurse@example.org");
        assert_eq!(invitation.role, Role::Nurse);
        assert!(invitation.expires_at > Utc::now() + Duration::days(6));
        assert_eq!(
            world.notifier.sent(),
            vec![(
                invitation.id,
                format!("https://care.example.org/invitations/{}", invitation.id)
            )]
        );
    }

    #[tokio::test]
    async fn test_doctor_cannot_invite() {
        let world = World::new();
        let doctor = world.professional(2, "doc@example.org").await;
        let hospital = world.establishment("Hôpital Le Dantec", EstablishmentType::Hospital).await;
        world.affiliate(doctor.id, hospital.id, None, Role::Doctor, 3).await;

        let result = action(&world)
            .execute(input(hospital.id, doctor.id, "nurse@example.org"))
            .await;
        assert_eq!(result.unwrap_err(), PraxisError::Forbidden);
    }

    #[tokio::test]
    async fn test_admin_elsewhere_cannot_invite() {
        let world = World::new();
        let (director, _) = director_at_hospital(&world).await;
        let clinic = world.establishment("Clinique Madeleine", EstablishmentType::Clinic).await;

        let result = action(&world)
            .execute(input(clinic.id, director, "nurse@example.org"))
            .await;
        assert_eq!(result.unwrap_err(), PraxisError::Forbidden);
    }

    #[tokio::test]
    async fn test_duplicate_open_invitation_rejected() {
        let world = World::new();
        let (director, hospital) = director_at_hospital(&world).await;
        let action = action(&world);

        action.execute(input(hospital, director, "nurse@example.org")).await.unwrap();
        let again = action.execute(input(hospital, director, "NURSE@example.org")).await;

        assert!(matches!(again, Err(PraxisError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_invalid_input() {
        let world = World::new();
        let (director, hospital) = director_at_hospital(&world).await;
        let action = action(&world);

        let bad_email = action.execute(input(hospital, director, "not-an-email")).await;
        assert!(matches!(bad_email, Err(PraxisError::Validation(_))));

        let mut bad_role = input(hospital, director, "nurse@example.org");
        bad_role.role = "shaman".into();
        assert!(matches!(action.execute(bad_role).await, Err(PraxisError::Validation(_))));

        let unknown = action.execute(input(999, director, "nurse@example.org")).await;
        assert_eq!(unknown.unwrap_err(), PraxisError::NotFound);
    }

    #[tokio::test]
    async fn test_delivery_failure_keeps_invitation() {
        let world = World::new();
        let (director, hospital) = director_at_hospital(&world).await;
        world.notifier.fail_deliveries();

        let invitation = action(&world)
            .execute(input(hospital, director, "nurse@example.org"))
            .await
            .unwrap();

        assert!(invitation.is_pending());
        assert!(world.notifier.sent().is_empty());
    }
}
