//! End-to-end scenarios across affiliations, claims, invitations and
//! context switching.
//!
//! These tests use mock repositories - no database required.
//! Run with: `cargo test --features mocks --test e2e_context`

#![cfg(feature = "mocks")]
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use praxis::affiliations::{
    AffiliationAttributes, Capability, MockAffiliationRepository, ProvisionAffiliationsAction,
    ProvisionEntry, Role, UpsertAffiliationAction, UpsertAffiliationInput,
};
use praxis::context::{ContextState, MockActiveContextRepository, WorkSession};
use praxis::directory::{
    CreateEstablishment, CreateProfessional, DepartmentRepository, EstablishmentRepository,
    EstablishmentType, MockDepartmentRepository, MockEstablishmentRepository,
    MockProfessionalRepository, Professional, ProfessionalRepository, UpsertDepartment,
};
use praxis::invitations::{
    ClaimEstablishmentAction, CreateInvitationAction, CreateInvitationInput,
    GenerateClaimTokenAction, InvitationStatus, MockInvitationRepository, RecordingNotifier,
    RevokeClaimAction,
};
use praxis::session::SessionApi;
use praxis::{PraxisConfig, PraxisError};

type Upsert = UpsertAffiliationAction<
    MockAffiliationRepository,
    MockProfessionalRepository,
    MockEstablishmentRepository,
    MockDepartmentRepository,
>;

type Api = SessionApi<
    MockAffiliationRepository,
    MockProfessionalRepository,
    MockEstablishmentRepository,
    MockDepartmentRepository,
    MockActiveContextRepository,
    MockInvitationRepository,
>;

#[derive(Clone, Default)]
struct Stores {
    professionals: MockProfessionalRepository,
    establishments: MockEstablishmentRepository,
    departments: MockDepartmentRepository,
    affiliations: MockAffiliationRepository,
    invitations: MockInvitationRepository,
    contexts: MockActiveContextRepository,
}

impl Stores {
    fn upsert(&self) -> Upsert {
        UpsertAffiliationAction::new(
            self.affiliations.clone(),
            self.professionals.clone(),
            self.establishments.clone(),
            self.departments.clone(),
        )
    }

    fn session_api(&self) -> Api {
        SessionApi::new(
            self.affiliations.clone(),
            self.professionals.clone(),
            self.establishments.clone(),
            self.departments.clone(),
            self.contexts.clone(),
            self.invitations.clone(),
            &PraxisConfig::default(),
        )
    }

    async fn professional(&self, user_id: i64, email: &str) -> Professional {
        self.professionals
            .create(CreateProfessional {
                user_id,
                display_name: format!("Dr {user_id}"),
                email: email.to_owned(),
                phone: None,
            })
            .await
            .unwrap()
    }

    async fn establishment(&self, name: &str, kind: EstablishmentType) -> i64 {
        self.establishments
            .create(CreateEstablishment {
                name: name.to_owned(),
                establishment_type: kind,
                address: None,
                city: Some("Abidjan".into()),
                country: Some("CI".into()),
                contact_email: None,
            })
            .await
            .unwrap()
            .id
    }

    async fn affiliate(&self, professional_id: i64, establishment_id: i64, role: &str, admin: bool) {
        self.upsert()
            .execute(UpsertAffiliationInput {
                professional_id,
                establishment_id,
                department_id: None,
                role: role.to_owned(),
                attributes: AffiliationAttributes {
                    is_establishment_admin: admin,
                    ..AffiliationAttributes::default()
                },
            })
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn test_switch_between_affiliated_establishments() {
    let stores = Stores::default();
    let p1 = stores.professional(1, "p1@example.org").await;
    let e1 = stores.establishment("Hopital Central", EstablishmentType::Hospital).await;
    let e2 = stores.establishment("Clinique Nord", EstablishmentType::Clinic).await;
    let e3 = stores.establishment("Pharmacie Sud", EstablishmentType::Pharmacy).await;
    stores.affiliate(p1.id, e1, "doctor", false).await;
    stores.affiliate(p1.id, e2, "director", true).await;

    let api = stores.session_api();
    let mut session = WorkSession::new();

    let state = api.start(&mut session, p1.user_id).await;
    let active = state.context().unwrap().establishment_id;
    assert!(active == e1 || active == e2);

    let context = api
        .switch_context(&mut session, p1.user_id, e2, None)
        .await
        .unwrap();
    assert_eq!(context.establishment_id, e2);
    assert!(context.capabilities.can(Capability::ManageEstablishment));

    let err = api
        .switch_context(&mut session, p1.user_id, e3, None)
        .await
        .unwrap_err();
    assert_eq!(err, PraxisError::NotAffiliated);
    assert_eq!(
        api.get_current_context(&session).unwrap().establishment_id,
        e2
    );
}

#[tokio::test]
async fn test_claim_token_is_single_use() {
    let stores = Stores::default();
    let e9 = stores.establishment("Centre de Sante 9", EstablishmentType::Clinic).await;

    let link = GenerateClaimTokenAction::new(stores.establishments.clone())
        .execute(e9)
        .await
        .unwrap();

    let claim = ClaimEstablishmentAction::new(stores.establishments.clone());
    let claimed = claim.execute(&link.token, 100).await.unwrap();
    assert!(claimed.is_claimed());
    assert_eq!(claimed.claimed_by, Some(100));

    let second = claim.execute(&link.token, 200).await;
    assert_eq!(second.unwrap_err(), PraxisError::InvalidToken);

    let stored = stores.establishments.find_by_id(e9).await.unwrap().unwrap();
    assert_eq!(stored.claimed_by, Some(100));
}

#[tokio::test]
async fn test_revoked_claim_can_be_claimed_again_with_new_token() {
    let stores = Stores::default();
    let establishment = stores.establishment("Labo Bio", EstablishmentType::Laboratory).await;
    let first = GenerateClaimTokenAction::new(stores.establishments.clone())
        .execute(establishment)
        .await
        .unwrap();
    let claim = ClaimEstablishmentAction::new(stores.establishments.clone());
    claim.execute(&first.token, 1).await.unwrap();

    let revoked = RevokeClaimAction::new(stores.establishments.clone())
        .execute(establishment)
        .await
        .unwrap();
    assert!(!revoked.establishment.is_claimed());
    let fresh = revoked.new_link.unwrap();

    assert_eq!(
        claim.execute(&first.token, 2).await.unwrap_err(),
        PraxisError::InvalidToken
    );
    assert_eq!(claim.execute(&fresh.token, 2).await.unwrap().claimed_by, Some(2));
}

#[tokio::test]
async fn test_professional_without_affiliations_resolves_to_none() {
    let stores = Stores::default();
    let p2 = stores.professional(2, "p2@example.org").await;

    let api = stores.session_api();
    let mut session = WorkSession::new();
    let state = api.start(&mut session, p2.user_id).await;

    assert_eq!(state, ContextState::NoAffiliations);
    assert!(api.get_current_context(&session).is_none());
    assert!(api
        .list_my_establishments(&session, p2.user_id)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_invitation_accepted_once() {
    let stores = Stores::default();
    let e5 = stores.establishment("Hopital E5", EstablishmentType::Hospital).await;
    let director = stores.professional(10, "director@e5.org").await;
    stores.affiliate(director.id, e5, "director", true).await;
    let nurse = stores.professional(11, "x@y.org").await;

    let invitation = CreateInvitationAction::new(
        stores.invitations.clone(),
        stores.affiliations.clone(),
        stores.establishments.clone(),
        RecordingNotifier::new(),
    )
    .execute(CreateInvitationInput {
        establishment_id: e5,
        invited_by: director.id,
        email: "X@Y.org".to_owned(),
        role: "nurse".to_owned(),
        position_title: None,
        department_id: None,
        message: None,
    })
    .await
    .unwrap();
    assert_eq!(invitation.status, InvitationStatus::Pending);

    let api = stores.session_api();
    let mut session = WorkSession::new();
    api.start(&mut session, nurse.user_id).await;

    let pending = api.list_pending_invitations("x@y.org").await.unwrap();
    assert_eq!(pending.len(), 1);

    let affiliation = api
        .accept_invitation(&mut session, nurse.user_id, invitation.id)
        .await
        .unwrap();
    assert_eq!(affiliation.establishment_id, e5);
    assert_eq!(affiliation.role, Role::Nurse);

    // the session had nothing active, so the new affiliation is picked up
    assert_eq!(
        api.get_current_context(&session).unwrap().establishment_id,
        e5
    );

    let again = api
        .accept_invitation(&mut session, nurse.user_id, invitation.id)
        .await;
    assert!(matches!(again, Err(PraxisError::InvalidState(_))));
    assert!(api.list_pending_invitations("x@y.org").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_provisioned_director_and_doctor_roles_merge_in_summary() {
    let stores = Stores::default();
    let professional = stores.professional(20, "multi@example.org").await;
    let hospital = stores.establishment("CHU", EstablishmentType::Hospital).await;
    let direction = stores
        .departments
        .upsert(UpsertDepartment {
            establishment_id: hospital,
            code: "DIR".into(),
            name: "Direction".into(),
        })
        .await
        .unwrap();
    let medical = stores
        .departments
        .upsert(UpsertDepartment {
            establishment_id: hospital,
            code: "MED".into(),
            name: "Medical".into(),
        })
        .await
        .unwrap();

    let provisioned = ProvisionAffiliationsAction::new(stores.upsert())
        .execute(
            professional.id,
            hospital,
            vec![
                ProvisionEntry {
                    department_id: Some(direction.id),
                    role: "director".into(),
                    attributes: AffiliationAttributes::default(),
                },
                ProvisionEntry {
                    department_id: Some(medical.id),
                    role: "doctor".into(),
                    attributes: AffiliationAttributes::default(),
                },
            ],
        )
        .await
        .unwrap();
    assert_eq!(provisioned.len(), 2);

    let api = stores.session_api();
    let mut session = WorkSession::new();
    api.start(&mut session, professional.user_id).await;

    let summaries = api
        .list_my_establishments(&session, professional.user_id)
        .await
        .unwrap();
    assert_eq!(summaries.len(), 1);
    assert!(summaries[0].roles.contains(&Role::Director));
    assert!(summaries[0].roles.contains(&Role::Doctor));
    assert!(summaries[0].capabilities.can(Capability::Prescription));
    assert!(summaries[0].capabilities.can(Capability::ManageAllStaff));

    let doctor = api
        .switch_context(&mut session, professional.user_id, hospital, Some(medical.id))
        .await
        .unwrap();
    assert_eq!(doctor.role(), Role::Doctor);
    assert!(!doctor.capabilities.can(Capability::ManageAllStaff));
}

#[tokio::test]
async fn test_logout_forgets_context() {
    let stores = Stores::default();
    let professional = stores.professional(30, "out@example.org").await;
    let clinic = stores.establishment("Clinique", EstablishmentType::Clinic).await;
    stores.affiliate(professional.id, clinic, "nurse", false).await;

    let api = stores.session_api();
    let mut session = WorkSession::new();
    api.start(&mut session, professional.user_id).await;
    assert!(api.get_current_context(&session).is_some());

    api.end(&mut session, professional.user_id).await.unwrap();
    assert!(api.get_current_context(&session).is_none());
    assert!(!session.state().is_resolved());
}
