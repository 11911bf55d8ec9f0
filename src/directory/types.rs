//! Directory records: professionals, establishments and their departments.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::PraxisError;

/// Identity anchor for a person practicing medicine or administration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Professional {
    pub id: i64,
    /// Authenticated account this professional belongs to (1:1).
    pub user_id: i64,
    pub display_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub is_verified: bool,
    /// Authority that verified the professional (order of physicians, ministry...).
    pub verified_by: Option<String>,
    pub verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstablishmentType {
    Hospital,
    Clinic,
    Pharmacy,
    Laboratory,
    Ministry,
    Other,
}

impl EstablishmentType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hospital => "hospital",
            Self::Clinic => "clinic",
            Self::Pharmacy => "pharmacy",
            Self::Laboratory => "laboratory",
            Self::Ministry => "ministry",
            Self::Other => "other",
        }
    }
}

impl FromStr for EstablishmentType {
    type Err = PraxisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hospital" => Ok(Self::Hospital),
            "clinic" => Ok(Self::Clinic),
            "pharmacy" => Ok(Self::Pharmacy),
            "laboratory" => Ok(Self::Laboratory),
            "ministry" => Ok(Self::Ministry),
            "other" => Ok(Self::Other),
            _ => Err(PraxisError::Validation(format!(
                "unknown establishment type \"{s}\""
            ))),
        }
    }
}

impl fmt::Display for EstablishmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether an establishment has a responsible account holder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimState {
    Unclaimed,
    Claimed,
    Revoked,
}

impl ClaimState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unclaimed => "unclaimed",
            Self::Claimed => "claimed",
            Self::Revoked => "revoked",
        }
    }
}

impl FromStr for ClaimState {
    type Err = PraxisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unclaimed" => Ok(Self::Unclaimed),
            "claimed" => Ok(Self::Claimed),
            "revoked" => Ok(Self::Revoked),
            _ => Err(PraxisError::Validation(format!("unknown claim state \"{s}\""))),
        }
    }
}

impl fmt::Display for ClaimState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An organization professionals are affiliated with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Establishment {
    pub id: i64,
    pub name: String,
    pub establishment_type: EstablishmentType,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub contact_email: Option<String>,
    pub claim_state: ClaimState,
    /// SHA-256 of the outstanding single-use claim token.
    #[serde(skip_serializing)]
    pub claim_token_hash: Option<String>,
    pub claim_token_issued_at: Option<DateTime<Utc>>,
    pub claimed_at: Option<DateTime<Utc>>,
    /// User id of the account holder who completed the claim.
    pub claimed_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Establishment {
    pub fn is_claimed(&self) -> bool {
        self.claim_state == ClaimState::Claimed
    }

    /// True when a claim link is outstanding.
    pub fn has_claim_token(&self) -> bool {
        self.claim_token_hash.is_some()
    }
}

/// A named subdivision of one establishment ("Direction", "Médical").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub id: i64,
    pub establishment_id: i64,
    /// Short code, unique within the establishment.
    pub code: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}
