mod accept;
mod claim;
mod create;
mod expire;
mod generate_claim;
mod list;
mod revoke;
mod revoke_claim;

pub use accept::AcceptInvitationAction;
pub use claim::ClaimEstablishmentAction;
pub use create::{CreateInvitationAction, CreateInvitationInput};
pub use expire::ExpireInvitationsAction;
pub use generate_claim::GenerateClaimTokenAction;
pub use list::ListPendingInvitationsAction;
pub use revoke::RevokeInvitationAction;
pub use revoke_claim::RevokeClaimAction;
