use std::collections::HashSet;

use chrono::Utc;

use super::upsert::{AffiliationAttributes, UpsertAffiliationAction, UpsertAffiliationInput, announce_upsert};
use crate::affiliations::{Affiliation, AffiliationRepository};
use crate::directory::{DepartmentRepository, EstablishmentRepository, ProfessionalRepository};
use crate::events::{PraxisEvent, dispatch};
use crate::PraxisError;

/// One affiliation of a re-provisioned set.
#[derive(Debug, Clone)]
pub struct ProvisionEntry {
    pub department_id: Option<i64>,
    pub role: String,
    pub attributes: AffiliationAttributes,
}

/// Replaces every affiliation a professional holds at one establishment.
///
/// Used for multi-role setups (Director + Doctor at the same hospital). All
/// entries are validated before anything is deleted, so a bad entry leaves
/// the existing rows untouched.
pub struct ProvisionAffiliationsAction<A, P, E, D>
where
    A: AffiliationRepository,
    P: ProfessionalRepository,
    E: EstablishmentRepository,
    D: DepartmentRepository,
{
    upsert: UpsertAffiliationAction<A, P, E, D>,
}

impl<A, P, E, D> ProvisionAffiliationsAction<A, P, E, D>
where
    A: AffiliationRepository,
    P: ProfessionalRepository,
    E: EstablishmentRepository,
    D: DepartmentRepository,
{
    pub fn new(upsert: UpsertAffiliationAction<A, P, E, D>) -> Self {
        Self { upsert }
    }

    /// Returns the new affiliations in entry order.
    ///
    /// - `Err(PraxisError::Validation)` - any invalid entry, or two entries
    ///   for the same department
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "provision_affiliations", skip(self, entries), err)
    )]
    pub async fn execute(
        &self,
        professional_id: i64,
        establishment_id: i64,
        entries: Vec<ProvisionEntry>,
    ) -> Result<Vec<Affiliation>, PraxisError> {
        let mut seen = HashSet::new();
        let mut rows = Vec::with_capacity(entries.len());

        for entry in entries {
            if !seen.insert(entry.department_id) {
                return Err(PraxisError::Validation(
                    "duplicate department in provisioning set".into(),
                ));
            }
            let row = self
                .upsert
                .validate(UpsertAffiliationInput {
                    professional_id,
                    establishment_id,
                    department_id: entry.department_id,
                    role: entry.role,
                    attributes: entry.attributes,
                })
                .await?;
            rows.push(row);
        }

        let repo = self.upsert.affiliation_repo();
        let removed = self
            .upsert
            .retry()
            .run("provision_affiliations", move || {
                repo.delete_by_professional_and_establishment(professional_id, establishment_id)
            })
            .await?;

        if removed > 0 {
            dispatch(PraxisEvent::AffiliationsRemoved {
                professional_id,
                establishment_id,
                removed,
                at: Utc::now(),
            })
            .await;
        }

        let mut provisioned = Vec::with_capacity(rows.len());
        for row in rows {
            let affiliation = self.upsert.write(row).await?;
            announce_upsert(&affiliation).await;
            provisioned.push(affiliation);
        }

        log::info!(
            target: "praxis",
            "msg=\"affiliations provisioned\", professional_id={professional_id}, establishment_id={establishment_id}, removed={removed}, created={}",
            provisioned.len()
        );

        Ok(provisioned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::affiliations::{Capability, MockAffiliationRepository, Role, resolve_by_establishment};
    use crate::directory::{
        CreateEstablishment, CreateProfessional, EstablishmentType, MockDepartmentRepository,
        MockEstablishmentRepository, MockProfessionalRepository, UpsertDepartment,
    };

    type Action = ProvisionAffiliationsAction<
        MockAffiliationRepository,
        MockProfessionalRepository,
        MockEstablishmentRepository,
        MockDepartmentRepository,
    >;

    async fn setup() -> (Action, MockAffiliationRepository, i64, i64, i64) {
        let affiliations = MockAffiliationRepository::new();
        let professionals = MockProfessionalRepository::new();
        let establishments = MockEstablishmentRepository::new();
        let departments = MockDepartmentRepository::new();

        let professional = professionals
            .create(CreateProfessional {
                user_id: 1,
                display_name: "Dr. Moussa Diop".into(),
                email: "moussa@example.org".into(),
                phone: None,
            })
            .await
            .unwrap();
        let hospital = establishments
            .create(CreateEstablishment {
                name: "Hôpital Fann".into(),
                establishment_type: EstablishmentType::Hospital,
                address: None,
                city: None,
                country: None,
                contact_email: None,
            })
            .await
            .unwrap();
        let cardio = departments
            .upsert(UpsertDepartment {
                establishment_id: hospital.id,
                code: "CARDIO".into(),
                name: "Cardiologie".into(),
            })
            .await
            .unwrap();

        let action = ProvisionAffiliationsAction::new(UpsertAffiliationAction::new(
            affiliations.clone(),
            professionals,
            establishments,
            departments,
        ));

        (action, affiliations, professional.id, hospital.id, cardio.id)
    }

    fn entry(department_id: Option<i64>, role: &str) -> ProvisionEntry {
        ProvisionEntry {
            department_id,
            role: role.into(),
            attributes: AffiliationAttributes::default(),
        }
    }

    #[tokio::test]
    async fn test_director_and_doctor_at_same_hospital() {
        let (action, repo, professional, hospital, cardio) = setup().await;
        let mut director = entry(None, "director");
        director.attributes.is_establishment_admin = true;

        let provisioned = action
            .execute(professional, hospital, vec![director, entry(Some(cardio), "doctor")])
            .await
            .unwrap();

        assert_eq!(provisioned.len(), 2);
        let resolved = resolve_by_establishment(&repo.find_by_professional(professional).await.unwrap());
        let caps = &resolved[&hospital];
        assert!(caps.can(Capability::ManageEstablishment));
        assert!(caps.can(Capability::Prescription));
    }

    #[tokio::test]
    async fn test_reprovision_replaces_previous_set() {
        let (action, repo, professional, hospital, cardio) = setup().await;
        action
            .execute(professional, hospital, vec![entry(None, "director"), entry(Some(cardio), "doctor")])
            .await
            .unwrap();

        action
            .execute(professional, hospital, vec![entry(Some(cardio), "nurse")])
            .await
            .unwrap();

        let rows = repo.find_by_professional(professional).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].role, Role::Nurse);
    }

    #[tokio::test]
    async fn test_invalid_entry_keeps_existing_rows() {
        let (action, repo, professional, hospital, _) = setup().await;
        action
            .execute(professional, hospital, vec![entry(None, "director")])
            .await
            .unwrap();

        let result = action
            .execute(professional, hospital, vec![entry(None, "doctor"), entry(Some(1), "wizard")])
            .await;

        assert!(matches!(result, Err(PraxisError::Validation(_))));
        let rows = repo.find_by_professional(professional).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].role, Role::Director);
    }

    #[tokio::test]
    async fn test_duplicate_department_rejected() {
        let (action, _, professional, hospital, _) = setup().await;
        let result = action
            .execute(professional, hospital, vec![entry(None, "director"), entry(None, "doctor")])
            .await;
        assert!(matches!(result, Err(PraxisError::Validation(_))));
    }
}
