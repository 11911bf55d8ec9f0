use crate::affiliations::{AffiliationRepository, Capability, resolve_capabilities};
use crate::PraxisError;

/// Fails with `Forbidden` unless `professional_id` holds an active
/// affiliation at `establishment_id` granting `manage_all_staff`.
pub(crate) async fn ensure_can_manage_staff<A: AffiliationRepository>(
    affiliation_repo: &A,
    professional_id: i64,
    establishment_id: i64,
) -> Result<(), PraxisError> {
    let allowed = affiliation_repo
        .find_by_professional(professional_id)
        .await?
        .iter()
        .filter(|a| a.establishment_id == establishment_id && a.is_active())
        .any(|a| resolve_capabilities(a).can(Capability::ManageAllStaff));

    if allowed {
        Ok(())
    } else {
        log::warn!(
            target: "praxis",
            "msg=\"staff management denied\", professional_id={professional_id}, establishment_id={establishment_id}"
        );
        Err(PraxisError::Forbidden)
    }
}
