use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{Invitation, InvitationStatus};
use crate::affiliations::Role;
use crate::PraxisError;

#[derive(Debug, Clone)]
pub struct CreateInvitation {
    pub establishment_id: i64,
    /// Already normalized.
    pub email: String,
    pub invited_by: i64,
    pub role: Role,
    pub position_title: Option<String>,
    pub department_id: Option<i64>,
    pub message: Option<String>,
    pub expires_at: DateTime<Utc>,
}

#[async_trait]
pub trait InvitationRepository: Send + Sync {
    async fn create(&self, data: CreateInvitation) -> Result<Invitation, PraxisError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Invitation>, PraxisError>;

    /// Pending invitations for a normalized email, newest first.
    async fn find_pending_by_email(&self, email: &str) -> Result<Vec<Invitation>, PraxisError>;

    async fn find_pending_by_establishment(
        &self,
        establishment_id: i64,
    ) -> Result<Vec<Invitation>, PraxisError>;

    /// Moves `id` from `from` to `to` and stamps `responded_at`, only if the
    /// stored status is still `from`.
    ///
    /// Returns `None` when the conditional write matched no row.
    async fn transition_status(
        &self,
        id: i64,
        from: InvitationStatus,
        to: InvitationStatus,
    ) -> Result<Option<Invitation>, PraxisError>;

    /// Flips every pending invitation with `expires_at <= now` to expired.
    async fn expire_stale(&self, now: DateTime<Utc>) -> Result<u64, PraxisError>;
}
