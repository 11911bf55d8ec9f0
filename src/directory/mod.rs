//! Read-mostly directory of professionals, establishments and departments.
//!
//! The context engine and the invitation manager only consume these records;
//! the one exception is the establishment claim columns, written through
//! [`EstablishmentRepository`] by the claim actions.

mod repository;
mod types;

#[cfg(any(test, feature = "mocks"))]
mod mocks;

pub use repository::{
    CreateEstablishment, CreateProfessional, DepartmentRepository, EstablishmentRepository,
    ProfessionalRepository, UpsertDepartment,
};
pub use types::{ClaimState, Department, Establishment, EstablishmentType, Professional};

#[cfg(any(test, feature = "mocks"))]
pub use mocks::{MockDepartmentRepository, MockEstablishmentRepository, MockProfessionalRepository};
