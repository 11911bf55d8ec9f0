use chrono::{DateTime, Utc};

use crate::affiliations::AffiliationStatus;

/// Events emitted by praxis actions.
#[derive(Debug, Clone)]
pub enum PraxisEvent {
    // affiliations
    AffiliationUpserted {
        affiliation_id: i64,
        professional_id: i64,
        establishment_id: i64,
        at: DateTime<Utc>,
    },
    AffiliationsRemoved {
        professional_id: i64,
        establishment_id: i64,
        removed: u64,
        at: DateTime<Utc>,
    },
    AffiliationStatusChanged {
        affiliation_id: i64,
        status: AffiliationStatus,
        at: DateTime<Utc>,
    },

    // work context
    ContextSwitched {
        professional_id: i64,
        establishment_id: i64,
        affiliation_id: i64,
        at: DateTime<Utc>,
    },
    ContextCleared {
        professional_id: i64,
        at: DateTime<Utc>,
    },

    // establishment claims
    ClaimTokenIssued {
        establishment_id: i64,
        at: DateTime<Utc>,
    },
    EstablishmentClaimed {
        establishment_id: i64,
        claimed_by: i64,
        at: DateTime<Utc>,
    },
    ClaimRevoked {
        establishment_id: i64,
        at: DateTime<Utc>,
    },

    // staff invitations
    InvitationCreated {
        invitation_id: i64,
        establishment_id: i64,
        email: String,
        at: DateTime<Utc>,
    },
    InvitationAccepted {
        invitation_id: i64,
        affiliation_id: i64,
        at: DateTime<Utc>,
    },
    InvitationRevoked {
        invitation_id: i64,
        at: DateTime<Utc>,
    },
    InvitationsExpired {
        count: u64,
        at: DateTime<Utc>,
    },
}

impl PraxisEvent {
    /// Returns a dot-separated event name for logging/tracing.
    pub fn name(&self) -> &'static str {
        match self {
            Self::AffiliationUpserted { .. } => "affiliation.upserted",
            Self::AffiliationsRemoved { .. } => "affiliation.removed",
            Self::AffiliationStatusChanged { .. } => "affiliation.status_changed",
            Self::ContextSwitched { .. } => "context.switched",
            Self::ContextCleared { .. } => "context.cleared",
            Self::ClaimTokenIssued { .. } => "claim.token_issued",
            Self::EstablishmentClaimed { .. } => "claim.completed",
            Self::ClaimRevoked { .. } => "claim.revoked",
            Self::InvitationCreated { .. } => "invitation.created",
            Self::InvitationAccepted { .. } => "invitation.accepted",
            Self::InvitationRevoked { .. } => "invitation.revoked",
            Self::InvitationsExpired { .. } => "invitation.expired",
        }
    }

    /// Returns the timestamp when this event occurred.
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::AffiliationUpserted { at, .. }
            | Self::AffiliationsRemoved { at, .. }
            | Self::AffiliationStatusChanged { at, .. }
            | Self::ContextSwitched { at, .. }
            | Self::ContextCleared { at, .. }
            | Self::ClaimTokenIssued { at, .. }
            | Self::EstablishmentClaimed { at, .. }
            | Self::ClaimRevoked { at, .. }
            | Self::InvitationCreated { at, .. }
            | Self::InvitationAccepted { at, .. }
            | Self::InvitationRevoked { at, .. }
            | Self::InvitationsExpired { at, .. } => *at,
        }
    }
}
