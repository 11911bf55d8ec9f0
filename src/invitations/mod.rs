//! Invitation Manager: establishment claim tokens and staff invitations.
//!
//! Claim lifecycle per establishment:
//!
//! ```text
//! unclaimed ──generate──▶ unclaimed + token ──claim──▶ claimed
//!     ▲                        │  ▲                       │
//!     │                        └──┘ regenerate            │
//!     └──────────── revoke (fresh token by default) ──────┘
//! ```
//!
//! Staff invitations go `pending → accepted | revoked | expired`; accepting
//! one upserts the affiliation it describes.

mod actions;
mod authorize;
mod notifier;
mod repository;
mod types;

#[cfg(any(test, feature = "mocks"))]
mod mocks;

pub use actions::{
    AcceptInvitationAction, ClaimEstablishmentAction, CreateInvitationAction,
    CreateInvitationInput, ExpireInvitationsAction, GenerateClaimTokenAction,
    ListPendingInvitationsAction, RevokeClaimAction, RevokeInvitationAction,
};
pub use notifier::{InvitationNotifier, LogNotifier};
pub use repository::{CreateInvitation, InvitationRepository};
pub use types::{ClaimLink, Invitation, InvitationStatus, RevokedClaim};

#[cfg(any(test, feature = "mocks"))]
pub use mocks::{MockInvitationRepository, RecordingNotifier};
