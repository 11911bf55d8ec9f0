//! Workplace-context layer for professionals affiliated with several
//! establishments at once.
//!
//! A professional (doctor, nurse, director...) can hold affiliations with any
//! number of hospitals, clinics, pharmacies or ministries. Each affiliation
//! carries its own role, department and capability set. `praxis` keeps those
//! affiliations, runs the establishment-claim and staff-invitation lifecycles,
//! and resolves which establishment is "active" for a session.
//!
//! Storage is abstracted behind async repository traits; enable
//! `sqlx_postgres` or `sqlx_sqlite` for database backends and `mocks` for
//! in-memory implementations.

pub mod affiliations;
pub mod config;
pub mod context;
pub mod crypto;
pub mod directory;
pub mod events;
pub mod invitations;
pub mod retry;
pub mod session;
pub mod validators;

#[cfg(test)]
pub(crate) mod test_support;

#[cfg(any(feature = "sqlx_postgres", feature = "sqlx_sqlite"))]
mod db_error;

#[cfg(feature = "axum_api")]
pub mod api;
#[cfg(feature = "sqlx_postgres")]
pub mod postgres;
#[cfg(feature = "sqlx_sqlite")]
pub mod sqlite;

pub use config::PraxisConfig;
pub use crypto::SecretString;
pub use events::register_event_listeners;

use std::fmt;

/// Errors produced by every `praxis` operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PraxisError {
    /// Malformed input: unknown role, missing field, bad email.
    Validation(String),
    /// A referenced professional, establishment, affiliation or invitation does not exist.
    NotFound,
    /// The switch target has no matching active affiliation.
    NotAffiliated,
    /// A claim token is unknown, already consumed, or its establishment is claimed.
    InvalidToken,
    /// The record is not in a state that allows the transition.
    InvalidState(String),
    /// The caller may not perform the operation.
    Forbidden,
    /// The accepting professional's email differs from the invited one.
    EmailMismatch,
    /// The store could not be reached. The only retryable class.
    StoreUnavailable(String),
    /// The store rejected the operation.
    DatabaseError(String),
    /// The operation did not finish within its deadline; outcome unknown.
    Timeout,
    Internal(String),
}

impl PraxisError {
    /// Returns true when the operation may succeed if attempted again.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::NotAffiliated => "NOT_AFFILIATED",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::InvalidState(_) => "INVALID_STATE",
            Self::Forbidden => "FORBIDDEN",
            Self::EmailMismatch => "EMAIL_MISMATCH",
            Self::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            Self::DatabaseError(_) => "DATABASE_ERROR",
            Self::Timeout => "TIMEOUT",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl std::error::Error for PraxisError {}

impl fmt::Display for PraxisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(msg) => write!(f, "Validation error: {msg}"),
            Self::NotFound => write!(f, "Resource not found"),
            Self::NotAffiliated => write!(f, "You are not a member of this establishment"),
            Self::InvalidToken => write!(f, "Invalid or already used token"),
            Self::InvalidState(msg) => write!(f, "Invalid state: {msg}"),
            Self::Forbidden => write!(f, "Forbidden"),
            Self::EmailMismatch => write!(f, "Invitation was sent to a different email"),
            Self::StoreUnavailable(msg) => write!(f, "Store unavailable: {msg}"),
            Self::DatabaseError(msg) => write!(f, "Database error: {msg}"),
            Self::Timeout => write!(f, "Operation timed out"),
            Self::Internal(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_store_unavailable_is_transient() {
        assert!(PraxisError::StoreUnavailable("pool timed out".into()).is_transient());
        assert!(!PraxisError::DatabaseError("constraint".into()).is_transient());
        assert!(!PraxisError::InvalidToken.is_transient());
        assert!(!PraxisError::Timeout.is_transient());
    }

    #[test]
    fn test_not_affiliated_message_is_user_facing() {
        assert_eq!(
            PraxisError::NotAffiliated.to_string(),
            "You are not a member of this establishment"
        );
    }
}
