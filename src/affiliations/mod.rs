//! Affiliation Store and Permission Resolver.
//!
//! An [`Affiliation`] binds a professional to an establishment, optionally
//! scoped to a department. Effective capabilities are derived by
//! [`resolve_capabilities`] and never cross establishments.

mod actions;
mod capabilities;
mod repository;
mod resolver;
mod types;

#[cfg(any(test, feature = "mocks"))]
mod mocks;

pub use actions::{
    AffiliationAttributes, ListAffiliationsAction, ProvisionAffiliationsAction, ProvisionEntry,
    RemoveAffiliationAction, SetAffiliationStatusAction, UpsertAffiliationAction,
    UpsertAffiliationInput,
};
pub use capabilities::{Capability, CapabilitySet, CapabilitySetBuilder};
pub use repository::{AffiliationRepository, UpsertAffiliation};
pub use resolver::{
    DEPARTMENT_HEAD_CAPABILITIES, ESTABLISHMENT_ADMIN_CAPABILITIES, ROLE_BASELINES, baseline_for,
    resolve_by_establishment, resolve_capabilities,
};
pub use types::{Affiliation, AffiliationStatus, Role};

#[cfg(any(test, feature = "mocks"))]
pub use mocks::MockAffiliationRepository;
