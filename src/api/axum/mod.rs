//! Axum routes exposing the session API.
//!
//! ```rust,ignore
//! use praxis::api::axum::{AppState, praxis_routes};
//!
//! let state = AppState::new(session_api, claim_action, identity_provider);
//! let app = axum::Router::new().merge(praxis_routes()).with_state(state);
//! ```

mod error;
mod handlers;
mod middleware;
mod routes;
mod sessions;

pub use error::AppError;
pub use middleware::{AuthenticatedUser, IdentityProvider, extract_bearer_token};
pub use routes::{AppState, praxis_routes};
pub use sessions::SessionStore;
