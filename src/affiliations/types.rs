//! Core affiliation types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::CapabilitySet;
use crate::PraxisError;

/// Role a professional holds within one establishment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Director,
    Doctor,
    Nurse,
    Admin,
    Pharmacist,
    LabTech,
    Receptionist,
    Other,
}

impl Role {
    pub const ALL: [Self; 8] = [
        Self::Director,
        Self::Doctor,
        Self::Nurse,
        Self::Admin,
        Self::Pharmacist,
        Self::LabTech,
        Self::Receptionist,
        Self::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Director => "director",
            Self::Doctor => "doctor",
            Self::Nurse => "nurse",
            Self::Admin => "admin",
            Self::Pharmacist => "pharmacist",
            Self::LabTech => "lab_tech",
            Self::Receptionist => "receptionist",
            Self::Other => "other",
        }
    }
}

impl FromStr for Role {
    type Err = PraxisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| PraxisError::Validation(format!("unknown role \"{s}\"")))
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AffiliationStatus {
    #[default]
    Active,
    Inactive,
    Suspended,
}

impl AffiliationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Suspended => "suspended",
        }
    }
}

impl FromStr for AffiliationStatus {
    type Err = PraxisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            "suspended" => Ok(Self::Suspended),
            _ => Err(PraxisError::Validation(format!(
                "unknown affiliation status \"{s}\""
            ))),
        }
    }
}

impl fmt::Display for AffiliationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Binds one professional to one establishment, optionally to one department.
///
/// At most one affiliation exists per (professional, establishment,
/// department) triple; a professional may still hold several affiliations at
/// the same establishment in different departments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Affiliation {
    pub id: i64,
    pub professional_id: i64,
    pub establishment_id: i64,
    pub department_id: Option<i64>,
    pub role: Role,
    /// Human-readable title, e.g. "Médecin chef".
    pub position_title: Option<String>,
    pub is_department_head: bool,
    pub is_establishment_admin: bool,
    /// Explicit grants on top of the role baseline.
    pub permissions: CapabilitySet,
    pub status: AffiliationStatus,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    /// Internal staff number.
    pub matricule: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Affiliation {
    /// Active status and not past its end date.
    pub fn is_active(&self) -> bool {
        self.is_active_on(Utc::now().date_naive())
    }

    pub fn is_active_on(&self, day: NaiveDate) -> bool {
        self.status == AffiliationStatus::Active && self.end_date.is_none_or(|end| end >= day)
    }

    /// Exact (establishment, department) match.
    pub fn matches(&self, establishment_id: i64, department_id: Option<i64>) -> bool {
        self.establishment_id == establishment_id && self.department_id == department_id
    }
}
