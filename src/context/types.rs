use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::affiliations::{Affiliation, CapabilitySet, Role};
use crate::directory::EstablishmentType;

/// Persisted pointer to the context a professional last switched to.
///
/// One row per professional; concurrent devices resolve by `updated_at`,
/// the later write wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveContext {
    pub professional_id: i64,
    pub establishment_id: i64,
    pub department_id: Option<i64>,
    pub affiliation_id: i64,
    pub updated_at: DateTime<Utc>,
}

/// The active (professional, establishment, affiliation) triple of a session
/// and the capabilities it grants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkContext {
    pub professional_id: i64,
    pub establishment_id: i64,
    pub establishment_name: String,
    pub establishment_type: EstablishmentType,
    pub department_id: Option<i64>,
    pub affiliation: Affiliation,
    pub capabilities: CapabilitySet,
    pub activated_at: DateTime<Utc>,
}

impl WorkContext {
    pub fn role(&self) -> Role {
        self.affiliation.role
    }

    pub fn marker(&self) -> ActiveContext {
        ActiveContext {
            professional_id: self.professional_id,
            establishment_id: self.establishment_id,
            department_id: self.department_id,
            affiliation_id: self.affiliation.id,
            updated_at: self.activated_at,
        }
    }
}

/// One establishment a professional can switch to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkContextSummary {
    pub establishment_id: i64,
    pub establishment_name: String,
    pub establishment_type: EstablishmentType,
    /// Distinct roles held there, most recent affiliation first.
    pub roles: Vec<Role>,
    /// Departments with an active affiliation; `None` is the establishment level.
    pub department_ids: Vec<Option<i64>>,
    /// Union over every active affiliation at this establishment.
    pub capabilities: CapabilitySet,
    pub is_current: bool,
}

/// Per-session resolution state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ContextState {
    #[default]
    Unresolved,
    /// Resolved, but the professional has no usable affiliation.
    NoAffiliations,
    Active(Box<WorkContext>),
}

impl ContextState {
    pub fn is_resolved(&self) -> bool {
        !matches!(self, Self::Unresolved)
    }

    pub fn context(&self) -> Option<&WorkContext> {
        match self {
            Self::Active(context) => Some(context),
            _ => None,
        }
    }
}

/// Session-scoped holder of the current [`ContextState`].
///
/// Owned by one session (one login on one device). Only the
/// [`ContextEngine`](super::ContextEngine) replaces the state; reads never
/// perform I/O.
#[derive(Debug, Clone, Default)]
pub struct WorkSession {
    state: ContextState,
}

impl WorkSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ContextState {
        &self.state
    }

    /// `None` before the first load, or when there is nothing to activate.
    pub fn current_context(&self) -> Option<&WorkContext> {
        self.state.context()
    }

    /// Discards the cached context (logout or explicit reset).
    pub fn reset(&mut self) {
        self.state = ContextState::Unresolved;
    }

    pub(crate) fn replace(&mut self, state: ContextState) {
        self.state = state;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_unresolved() {
        let session = WorkSession::new();
        assert_eq!(session.state(), &ContextState::Unresolved);
        assert!(!session.state().is_resolved());
        assert!(session.current_context().is_none());
    }

    #[test]
    fn test_no_affiliations_is_resolved_without_context() {
        let mut session = WorkSession::new();
        session.replace(ContextState::NoAffiliations);
        assert!(session.state().is_resolved());
        assert!(session.current_context().is_none());

        session.reset();
        assert!(!session.state().is_resolved());
    }
}
