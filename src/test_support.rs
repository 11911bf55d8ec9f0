//! Shared fixtures for unit tests: one set of in-memory stores plus helpers
//! to seed professionals, establishments and affiliations.

use chrono::{Duration, NaiveDate, Utc};

use crate::affiliations::{
    Affiliation, AffiliationRepository, AffiliationStatus, CapabilitySet,
    MockAffiliationRepository, Role, UpsertAffiliation, UpsertAffiliationAction,
};
use crate::context::MockActiveContextRepository;
use crate::directory::{
    CreateEstablishment, CreateProfessional, Department, DepartmentRepository, Establishment,
    EstablishmentRepository, EstablishmentType, MockDepartmentRepository,
    MockEstablishmentRepository, MockProfessionalRepository, Professional, ProfessionalRepository,
    UpsertDepartment,
};
use crate::invitations::{MockInvitationRepository, RecordingNotifier};
use crate::retry::RetryPolicy;

pub(crate) type MockUpsert = UpsertAffiliationAction<
    MockAffiliationRepository,
    MockProfessionalRepository,
    MockEstablishmentRepository,
    MockDepartmentRepository,
>;

#[derive(Clone, Default)]
pub(crate) struct World {
    pub professionals: MockProfessionalRepository,
    pub establishments: MockEstablishmentRepository,
    pub departments: MockDepartmentRepository,
    pub affiliations: MockAffiliationRepository,
    pub invitations: MockInvitationRepository,
    pub contexts: MockActiveContextRepository,
    pub notifier: RecordingNotifier,
}

pub(crate) fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        base_delay: std::time::Duration::from_millis(1),
        max_delay: std::time::Duration::from_millis(5),
        ..RetryPolicy::default()
    }
}

pub(crate) fn days_ago(days: i64) -> NaiveDate {
    (Utc::now() - Duration::days(days)).date_naive()
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert_action(&self) -> MockUpsert {
        UpsertAffiliationAction::with_retry(
            self.affiliations.clone(),
            self.professionals.clone(),
            self.establishments.clone(),
            self.departments.clone(),
            fast_retry(),
        )
    }

    pub async fn professional(&self, user_id: i64, email: &str) -> Professional {
        self.professionals
            .create(CreateProfessional {
                user_id,
                display_name: format!("Professional {user_id}"),
                email: email.to_owned(),
                phone: None,
            })
            .await
            .unwrap()
    }

    pub async fn establishment(&self, name: &str, kind: EstablishmentType) -> Establishment {
        self.establishments
            .create(CreateEstablishment {
                name: name.to_owned(),
                establishment_type: kind,
                address: None,
                city: Some("Dakar".into()),
                country: Some("SN".into()),
                contact_email: None,
            })
            .await
            .unwrap()
    }

    pub async fn department(&self, establishment_id: i64, code: &str) -> Department {
        self.departments
            .upsert(UpsertDepartment {
                establishment_id,
                code: code.to_owned(),
                name: code.to_owned(),
            })
            .await
            .unwrap()
    }

    /// Seeds an active affiliation that started `started_days_ago` days ago.
    pub async fn affiliate(
        &self,
        professional_id: i64,
        establishment_id: i64,
        department_id: Option<i64>,
        role: Role,
        started_days_ago: i64,
    ) -> Affiliation {
        self.affiliations
            .upsert(UpsertAffiliation {
                professional_id,
                establishment_id,
                department_id,
                role,
                position_title: None,
                is_department_head: false,
                is_establishment_admin: false,
                permissions: CapabilitySet::new(),
                status: AffiliationStatus::Active,
                start_date: Some(days_ago(started_days_ago)),
                end_date: None,
                matricule: None,
            })
            .await
            .unwrap()
    }
}
