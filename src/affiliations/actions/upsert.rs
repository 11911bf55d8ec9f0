use chrono::{NaiveDate, Utc};

use crate::affiliations::{
    Affiliation, AffiliationRepository, AffiliationStatus, CapabilitySet, Role, UpsertAffiliation,
};
use crate::directory::{DepartmentRepository, EstablishmentRepository, ProfessionalRepository};
use crate::events::{PraxisEvent, dispatch};
use crate::retry::RetryPolicy;
use crate::validators::validate_label;
use crate::PraxisError;

/// Everything an affiliation carries besides its key and role.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AffiliationAttributes {
    pub position_title: Option<String>,
    pub is_department_head: bool,
    pub is_establishment_admin: bool,
    pub permissions: CapabilitySet,
    pub status: AffiliationStatus,
    /// `None` keeps the stored date on an update; a new row starts today.
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub matricule: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UpsertAffiliationInput {
    pub professional_id: i64,
    pub establishment_id: i64,
    pub department_id: Option<i64>,
    /// Role name as received from the caller, e.g. `"doctor"`.
    pub role: String,
    pub attributes: AffiliationAttributes,
}

/// Inserts or overwrites the affiliation for a
/// (professional, establishment, department) triple.
///
/// This action:
/// 1. Parses the role against the enumerated set
/// 2. Checks the professional and establishment exist
/// 3. Checks the department, if any, belongs to the establishment
/// 4. Writes the row in one upsert, retrying transient store errors
///
/// Calling it twice with the same input leaves a single row with the same
/// attributes.
pub struct UpsertAffiliationAction<A, P, E, D>
where
    A: AffiliationRepository,
    P: ProfessionalRepository,
    E: EstablishmentRepository,
    D: DepartmentRepository,
{
    affiliation_repo: A,
    professional_repo: P,
    establishment_repo: E,
    department_repo: D,
    retry: RetryPolicy,
}

impl<A, P, E, D> UpsertAffiliationAction<A, P, E, D>
where
    A: AffiliationRepository,
    P: ProfessionalRepository,
    E: EstablishmentRepository,
    D: DepartmentRepository,
{
    pub fn new(
        affiliation_repo: A,
        professional_repo: P,
        establishment_repo: E,
        department_repo: D,
    ) -> Self {
        Self::with_retry(
            affiliation_repo,
            professional_repo,
            establishment_repo,
            department_repo,
            RetryPolicy::default(),
        )
    }

    pub fn with_retry(
        affiliation_repo: A,
        professional_repo: P,
        establishment_repo: E,
        department_repo: D,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            affiliation_repo,
            professional_repo,
            establishment_repo,
            department_repo,
            retry,
        }
    }

    /// Returns the stored affiliation.
    ///
    /// - `Err(PraxisError::Validation)` - unknown role, unknown professional
    ///   or establishment, foreign department, or a malformed label
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "upsert_affiliation",
            skip_all,
            fields(
                professional_id = input.professional_id,
                establishment_id = input.establishment_id
            ),
            err
        )
    )]
    pub async fn execute(&self, input: UpsertAffiliationInput) -> Result<Affiliation, PraxisError> {
        let data = self.validate(input).await?;

        let affiliation = self.write(data).await?;
        announce_upsert(&affiliation).await;

        Ok(affiliation)
    }

    pub(crate) async fn write(&self, data: UpsertAffiliation) -> Result<Affiliation, PraxisError> {
        let repo = &self.affiliation_repo;
        self.retry
            .run("upsert_affiliation", move || repo.upsert(data.clone()))
            .await
    }

    pub(crate) fn affiliation_repo(&self) -> &A {
        &self.affiliation_repo
    }

    pub(crate) fn professional_repo(&self) -> &P {
        &self.professional_repo
    }

    pub(crate) fn retry(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Checks the input and resolves it to a row, without writing.
    pub(crate) async fn validate(
        &self,
        input: UpsertAffiliationInput,
    ) -> Result<UpsertAffiliation, PraxisError> {
        let role: Role = input.role.parse()?;
        let attrs = input.attributes;

        if let Some(title) = attrs.position_title.as_deref() {
            validate_label(title)?;
        }
        if let Some(matricule) = attrs.matricule.as_deref() {
            validate_label(matricule)?;
        }

        if self
            .professional_repo
            .find_by_id(input.professional_id)
            .await?
            .is_none()
        {
            return Err(PraxisError::Validation(format!(
                "unknown professional {}",
                input.professional_id
            )));
        }

        if self
            .establishment_repo
            .find_by_id(input.establishment_id)
            .await?
            .is_none()
        {
            return Err(PraxisError::Validation(format!(
                "unknown establishment {}",
                input.establishment_id
            )));
        }

        if let Some(department_id) = input.department_id {
            let department = self.department_repo.find_by_id(department_id).await?;
            if department.is_none_or(|d| d.establishment_id != input.establishment_id) {
                return Err(PraxisError::Validation(format!(
                    "department {department_id} does not belong to establishment {}",
                    input.establishment_id
                )));
            }
        }

        let start_date = attrs.start_date;
        let effective_start = start_date.unwrap_or_else(|| Utc::now().date_naive());
        if attrs.end_date.is_some_and(|end| end < effective_start) {
            return Err(PraxisError::Validation(
                "end date precedes start date".into(),
            ));
        }

        Ok(UpsertAffiliation {
            professional_id: input.professional_id,
            establishment_id: input.establishment_id,
            department_id: input.department_id,
            role,
            position_title: attrs.position_title,
            is_department_head: attrs.is_department_head,
            is_establishment_admin: attrs.is_establishment_admin,
            permissions: attrs.permissions,
            status: attrs.status,
            start_date,
            end_date: attrs.end_date,
            matricule: attrs.matricule,
        })
    }
}

pub(crate) async fn announce_upsert(affiliation: &Affiliation) {
    log::info!(
        target: "praxis",
        "msg=\"affiliation upserted\", affiliation_id={}, professional_id={}, establishment_id={}, role=\"{}\"",
        affiliation.id,
        affiliation.professional_id,
        affiliation.establishment_id,
        affiliation.role
    );

    dispatch(PraxisEvent::AffiliationUpserted {
        affiliation_id: affiliation.id,
        professional_id: affiliation.professional_id,
        establishment_id: affiliation.establishment_id,
        at: Utc::now(),
    })
    .await;
}
