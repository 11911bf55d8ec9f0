//! Core types for staff invitations and establishment claims.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::affiliations::Role;
use crate::directory::Establishment;
use crate::{PraxisError, SecretString};

/// Invitation lifecycle. Only `Pending` is non-terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvitationStatus {
    #[default]
    Pending,
    Accepted,
    Revoked,
    Expired,
}

impl InvitationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Revoked => "revoked",
            Self::Expired => "expired",
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl FromStr for InvitationStatus {
    type Err = PraxisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "revoked" => Ok(Self::Revoked),
            "expired" => Ok(Self::Expired),
            other => Err(PraxisError::Validation(format!(
                "unknown invitation status \"{other}\""
            ))),
        }
    }
}

impl fmt::Display for InvitationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A pending offer of an affiliation at one establishment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invitation {
    pub id: i64,
    pub establishment_id: i64,
    /// Normalized (trimmed, lowercase) invitee email.
    pub email: String,
    /// Professional id of the inviter.
    pub invited_by: i64,
    pub role: Role,
    pub position_title: Option<String>,
    pub department_id: Option<i64>,
    pub message: Option<String>,
    pub status: InvitationStatus,
    pub expires_at: DateTime<Utc>,
    /// Set when the invitation leaves `Pending`.
    pub responded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Invitation {
    pub fn is_pending(&self) -> bool {
        self.status == InvitationStatus::Pending
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Pending and not yet past `expires_at`.
    pub fn is_open(&self) -> bool {
        self.is_pending() && !self.is_expired()
    }
}

/// A freshly issued claim link. The plain token is never stored.
#[derive(Debug, Clone, Serialize)]
pub struct ClaimLink {
    pub establishment_id: i64,
    pub token: SecretString,
    /// `{origin}/claim-establishment/{token}`
    pub url: SecretString,
    pub issued_at: DateTime<Utc>,
}

/// Result of revoking a claim.
#[derive(Debug, Clone)]
pub struct RevokedClaim {
    pub establishment: Establishment,
    /// Fresh link when the configuration reissues on revoke.
    pub new_link: Option<ClaimLink>,
}
