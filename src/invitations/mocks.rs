#![allow(clippy::significant_drop_tightening)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::notifier::InvitationNotifier;
use super::repository::{CreateInvitation, InvitationRepository};
use super::{Invitation, InvitationStatus};
use crate::directory::Establishment;
use crate::PraxisError;

fn poisoned<T>(_: T) -> PraxisError {
    PraxisError::Internal("lock poisoned".into())
}

/// In-memory invitations. Clones share storage.
#[derive(Clone)]
pub struct MockInvitationRepository {
    invitations: Arc<RwLock<HashMap<i64, Invitation>>>,
    next_id: Arc<AtomicI64>,
}

impl MockInvitationRepository {
    pub fn new() -> Self {
        Self {
            invitations: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(AtomicI64::new(1)),
        }
    }

    fn pending_where(
        &self,
        predicate: impl Fn(&Invitation) -> bool,
    ) -> Result<Vec<Invitation>, PraxisError> {
        let invitations = self.invitations.read().map_err(poisoned)?;
        let mut found: Vec<Invitation> = invitations
            .values()
            .filter(|i| i.is_pending() && predicate(i))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(found)
    }
}

impl Default for MockInvitationRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InvitationRepository for MockInvitationRepository {
    async fn create(&self, data: CreateInvitation) -> Result<Invitation, PraxisError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let invitation = Invitation {
            id,
            establishment_id: data.establishment_id,
            email: data.email,
            invited_by: data.invited_by,
            role: data.role,
            position_title: data.position_title,
            department_id: data.department_id,
            message: data.message,
            status: InvitationStatus::Pending,
            expires_at: data.expires_at,
            responded_at: None,
            created_at: Utc::now(),
        };

        let mut invitations = self.invitations.write().map_err(poisoned)?;
        invitations.insert(id, invitation.clone());

        Ok(invitation)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Invitation>, PraxisError> {
        let invitations = self.invitations.read().map_err(poisoned)?;
        Ok(invitations.get(&id).cloned())
    }

    async fn find_pending_by_email(&self, email: &str) -> Result<Vec<Invitation>, PraxisError> {
        self.pending_where(|i| i.email == email)
    }

    async fn find_pending_by_establishment(
        &self,
        establishment_id: i64,
    ) -> Result<Vec<Invitation>, PraxisError> {
        self.pending_where(|i| i.establishment_id == establishment_id)
    }

    async fn transition_status(
        &self,
        id: i64,
        from: InvitationStatus,
        to: InvitationStatus,
    ) -> Result<Option<Invitation>, PraxisError> {
        let mut invitations = self.invitations.write().map_err(poisoned)?;
        let Some(invitation) = invitations.get_mut(&id) else {
            return Ok(None);
        };
        if invitation.status != from {
            return Ok(None);
        }

        invitation.status = to;
        invitation.responded_at = Some(Utc::now());
        Ok(Some(invitation.clone()))
    }

    async fn expire_stale(&self, now: DateTime<Utc>) -> Result<u64, PraxisError> {
        let mut invitations = self.invitations.write().map_err(poisoned)?;
        let mut expired = 0;
        for invitation in invitations.values_mut() {
            if invitation.is_pending() && invitation.is_expired_at(now) {
                invitation.status = InvitationStatus::Expired;
                invitation.responded_at = Some(now);
                expired += 1;
            }
        }
        Ok(expired)
    }
}

/// Notifier that records what it was asked to send. Clones share the record.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<(i64, String)>>>,
    failing: Arc<AtomicBool>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following delivery fail.
    pub fn fail_deliveries(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    /// (invitation id, url) pairs delivered so far.
    pub fn sent(&self) -> Vec<(i64, String)> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl InvitationNotifier for RecordingNotifier {
    async fn send_invitation(
        &self,
        invitation: &Invitation,
        _establishment: &Establishment,
        url: &str,
    ) -> Result<(), PraxisError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PraxisError::StoreUnavailable("mail relay down".into()));
        }
        self.sent
            .lock()
            .map_err(poisoned)?
            .push((invitation.id, url.to_owned()));
        Ok(())
    }
}
