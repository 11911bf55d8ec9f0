//! Configuration types for the praxis library.
//!
//! # Example
//!
//! ```rust
//! use praxis::config::{ClaimConfig, PraxisConfig};
//!
//! // Use defaults
//! let config = PraxisConfig::default();
//!
//! // Or customize
//! let config = PraxisConfig {
//!     claims: ClaimConfig {
//!         origin: "https://care.example.org".to_owned(),
//!         ..Default::default()
//!     },
//!     ..Default::default()
//! };
//! assert_eq!(
//!     config.claims.claim_url("abc"),
//!     "https://care.example.org/claim-establishment/abc"
//! );
//! ```

use std::time::Duration;

use crate::retry::RetryPolicy;

/// Main configuration struct.
#[derive(Debug, Clone)]
pub struct PraxisConfig {
    /// Establishment claim token settings.
    pub claims: ClaimConfig,

    /// Staff invitation settings.
    pub invitations: InvitationConfig,

    /// Retry policy for transient store errors.
    pub retry: RetryPolicy,

    /// Deadline applied to a context switch before re-resolving.
    ///
    /// Default: 5 seconds
    pub switch_timeout: Duration,
}

impl Default for PraxisConfig {
    fn default() -> Self {
        Self {
            claims: ClaimConfig::default(),
            invitations: InvitationConfig::default(),
            retry: RetryPolicy::default(),
            switch_timeout: Duration::from_secs(5),
        }
    }
}

impl PraxisConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Local development: localhost links, long-lived invitations, quick retries.
    pub fn development() -> Self {
        let origin = "http://localhost:3000".to_owned();
        Self {
            claims: ClaimConfig {
                origin: origin.clone(),
                ..ClaimConfig::default()
            },
            invitations: InvitationConfig {
                expiry_days: 30,
                origin,
            },
            retry: RetryPolicy {
                max_attempts: 2,
                base_delay: Duration::from_millis(10),
                max_delay: Duration::from_millis(100),
            },
            switch_timeout: Duration::from_secs(10),
        }
    }

    /// Shorter invitation lifetime and longer claim tokens.
    pub fn strict() -> Self {
        Self {
            claims: ClaimConfig {
                token_length: 48,
                ..ClaimConfig::default()
            },
            invitations: InvitationConfig {
                expiry_days: 2,
                ..InvitationConfig::default()
            },
            retry: RetryPolicy::default(),
            switch_timeout: Duration::from_secs(3),
        }
    }
}

/// Configuration for establishment claim links.
#[derive(Debug, Clone)]
pub struct ClaimConfig {
    /// Public origin used to build claim links, without trailing slash.
    pub origin: String,

    /// Length of generated claim tokens (alphanumeric characters).
    ///
    /// Default: 32 (~190 bits of entropy)
    pub token_length: usize,

    /// Issue a fresh token right after a claim is revoked.
    ///
    /// Default: true
    pub reissue_on_revoke: bool,
}

impl Default for ClaimConfig {
    fn default() -> Self {
        Self {
            origin: String::new(),
            token_length: 32,
            reissue_on_revoke: true,
        }
    }
}

impl ClaimConfig {
    /// Shareable URL for a plain claim token.
    pub fn claim_url(&self, token: &str) -> String {
        format!("{}/claim-establishment/{token}", self.origin.trim_end_matches('/'))
    }
}

/// Configuration for staff invitations.
#[derive(Debug, Clone)]
pub struct InvitationConfig {
    /// Number of days until a pending invitation expires.
    ///
    /// Default: 7
    pub expiry_days: i64,

    /// Public origin used in invitation emails.
    pub origin: String,
}

impl Default for InvitationConfig {
    fn default() -> Self {
        Self {
            expiry_days: 7,
            origin: String::new(),
        }
    }
}

impl InvitationConfig {
    /// Link sent to the invitee.
    pub fn invitation_url(&self, invitation_id: i64) -> String {
        format!("{}/invitations/{invitation_id}", self.origin.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PraxisConfig::default();

        assert_eq!(config.claims.token_length, 32);
        assert!(config.claims.reissue_on_revoke);
        assert_eq!(config.invitations.expiry_days, 7);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.switch_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_strict_config() {
        let config = PraxisConfig::strict();

        assert_eq!(config.claims.token_length, 48);
        assert_eq!(config.invitations.expiry_days, 2);
    }

    #[test]
    fn test_development_config() {
        let config = PraxisConfig::development();

        assert_eq!(config.invitations.expiry_days, 30);
        assert_eq!(
            config.claims.claim_url("tok"),
            "http://localhost:3000/claim-establishment/tok"
        );
    }

    #[test]
    fn test_claim_url_trims_trailing_slash() {
        let claims = ClaimConfig {
            origin: "https://care.example.org/".to_owned(),
            ..ClaimConfig::default()
        };
        assert_eq!(
            claims.claim_url("xyz"),
            "https://care.example.org/claim-establishment/xyz"
        );
    }

    #[test]
    fn test_invitation_url() {
        let invitations = InvitationConfig {
            origin: "https://care.example.org".to_owned(),
            ..InvitationConfig::default()
        };
        assert_eq!(
            invitations.invitation_url(12),
            "https://care.example.org/invitations/12"
        );
    }
}
