//! Permission resolver: role baseline plus explicit grants.
//!
//! Resolution is a pure function of one affiliation. Capabilities are
//! additive and never cross establishments.

use std::collections::BTreeMap;

use super::{Affiliation, Capability, CapabilitySet, Role};

/// Capabilities implied by each role.
pub const ROLE_BASELINES: [(Role, &[Capability]); 8] = [
    (
        Role::Director,
        &[
            Capability::ViewPatients,
            Capability::ViewAllReports,
            Capability::ManageAllStaff,
        ],
    ),
    (
        Role::Doctor,
        &[
            Capability::Consultation,
            Capability::Prescription,
            Capability::ViewPatients,
        ],
    ),
    (
        Role::Nurse,
        &[Capability::ViewPatients, Capability::ManageAppointments],
    ),
    (
        Role::Admin,
        &[
            Capability::ManageEstablishment,
            Capability::ViewAllReports,
            Capability::ManageAllStaff,
        ],
    ),
    (
        Role::Pharmacist,
        &[Capability::Dispense, Capability::ManageInventory],
    ),
    (Role::LabTech, &[Capability::LabResults]),
    (
        Role::Receptionist,
        &[Capability::ManageAppointments, Capability::Billing],
    ),
    (Role::Other, &[]),
];

/// Implied by `is_establishment_admin`, whatever the role.
pub const ESTABLISHMENT_ADMIN_CAPABILITIES: &[Capability] = &[
    Capability::ManageEstablishment,
    Capability::ViewAllReports,
    Capability::ManageAllStaff,
];

/// Implied by `is_department_head`.
pub const DEPARTMENT_HEAD_CAPABILITIES: &[Capability] = &[Capability::ManageDepartment];

/// Baseline capabilities of a role.
pub fn baseline_for(role: Role) -> &'static [Capability] {
    ROLE_BASELINES
        .iter()
        .find(|(r, _)| *r == role)
        .map_or(&[], |(_, caps)| caps)
}

/// Effective capabilities of a single affiliation.
///
/// Union of the explicit permission map, the role baseline and the flag
/// grants. Status is not consulted; callers decide which affiliations count.
pub fn resolve_capabilities(affiliation: &Affiliation) -> CapabilitySet {
    let mut effective = affiliation.permissions.clone();

    for capability in baseline_for(affiliation.role) {
        effective.grant(*capability);
    }
    if affiliation.is_establishment_admin {
        for capability in ESTABLISHMENT_ADMIN_CAPABILITIES {
            effective.grant(*capability);
        }
    }
    if affiliation.is_department_head {
        for capability in DEPARTMENT_HEAD_CAPABILITIES {
            effective.grant(*capability);
        }
    }

    effective
}

/// Effective capabilities per establishment over the active affiliations.
///
/// A Director + Doctor at the same establishment yields the union of both;
/// nothing from one establishment appears under another.
pub fn resolve_by_establishment(affiliations: &[Affiliation]) -> BTreeMap<i64, CapabilitySet> {
    let mut by_establishment: BTreeMap<i64, CapabilitySet> = BTreeMap::new();

    for affiliation in affiliations.iter().filter(|a| a.is_active()) {
        by_establishment
            .entry(affiliation.establishment_id)
            .or_default()
            .extend_from(&resolve_capabilities(affiliation));
    }

    by_establishment
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::affiliations::{AffiliationStatus, CapabilitySetBuilder};

    fn affiliation(establishment_id: i64, role: Role) -> Affiliation {
        let now = Utc::now();
        Affiliation {
            id: establishment_id,
            professional_id: 1,
            establishment_id,
            department_id: None,
            role,
            position_title: None,
            is_department_head: false,
            is_establishment_admin: false,
            permissions: CapabilitySet::new(),
            status: AffiliationStatus::Active,
            start_date: now.date_naive(),
            end_date: None,
            matricule: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_every_role_has_a_baseline_entry() {
        for role in Role::ALL {
            assert!(ROLE_BASELINES.iter().any(|(r, _)| *r == role), "{role}");
        }
    }

    #[test]
    fn test_doctor_baseline() {
        let caps = resolve_capabilities(&affiliation(1, Role::Doctor));
        assert!(caps.can(Capability::Consultation));
        assert!(caps.can(Capability::Prescription));
        assert!(!caps.can(Capability::ManageEstablishment));
    }

    #[test]
    fn test_admin_flag_grants_management() {
        let mut director = affiliation(1, Role::Director);
        director.is_establishment_admin = true;

        let caps = resolve_capabilities(&director);
        assert!(caps.can(Capability::ManageEstablishment));
        assert!(caps.can(Capability::ViewAllReports));
        assert!(caps.can(Capability::ManageAllStaff));
    }

    #[test]
    fn test_department_head_flag() {
        let mut nurse = affiliation(1, Role::Nurse);
        nurse.is_department_head = true;
        assert!(resolve_capabilities(&nurse).can(Capability::ManageDepartment));
    }

    #[test]
    fn test_explicit_map_only_adds() {
        let mut doctor = affiliation(1, Role::Doctor);
        doctor.permissions = CapabilitySetBuilder::new().grant(Capability::Billing).build();

        let caps = resolve_capabilities(&doctor);
        assert!(caps.can(Capability::Billing));
        assert!(caps.can(Capability::Consultation));
        assert!(caps.can(Capability::Prescription));
    }

    #[test]
    fn test_custom_grant_reaches_effective_set() {
        let mut nurse = affiliation(1, Role::Nurse);
        nurse.permissions.grant_named("view_consultations");

        let caps = resolve_capabilities(&nurse);
        assert!(caps.has("view_consultations"));

        let by_establishment = resolve_by_establishment(&[nurse]);
        assert!(by_establishment[&1].has("view_consultations"));
    }

    #[test]
    fn test_monotonic_in_explicit_map() {
        for role in Role::ALL {
            let mut a = affiliation(1, role);
            let before = resolve_capabilities(&a);
            for capability in Capability::ALL {
                a.permissions.grant(capability);
                let after = resolve_capabilities(&a);
                assert!(after.is_superset(&before), "{role} lost a capability");
                assert!(after.can(capability));
            }
        }
    }

    #[test]
    fn test_deterministic() {
        let mut a = affiliation(1, Role::Pharmacist);
        a.is_establishment_admin = true;
        assert_eq!(resolve_capabilities(&a), resolve_capabilities(&a));
    }

    #[test]
    fn test_by_establishment_never_leaks() {
        let doctor = affiliation(1, Role::Doctor);
        let mut admin = affiliation(2, Role::Admin);
        admin.permissions.grant(Capability::Billing);

        let resolved = resolve_by_establishment(&[doctor, admin]);

        assert!(resolved[&1].can(Capability::Consultation));
        assert!(!resolved[&1].can(Capability::ManageEstablishment));
        assert!(!resolved[&1].can(Capability::Billing));
        assert!(resolved[&2].can(Capability::ManageEstablishment));
        assert!(!resolved[&2].can(Capability::Prescription));
    }

    #[test]
    fn test_by_establishment_unions_roles_and_skips_inactive() {
        let director = affiliation(1, Role::Director);
        let mut doctor = affiliation(1, Role::Doctor);
        doctor.department_id = Some(7);
        let mut suspended = affiliation(3, Role::Admin);
        suspended.status = AffiliationStatus::Suspended;

        let resolved = resolve_by_establishment(&[director, doctor, suspended]);

        assert!(resolved[&1].can(Capability::ManageAllStaff));
        assert!(resolved[&1].can(Capability::Prescription));
        assert!(!resolved.contains_key(&3));
    }
}
