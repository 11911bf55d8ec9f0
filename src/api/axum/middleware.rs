use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use super::error::AppError;
use super::routes::AppState;
use crate::PraxisError;
use crate::affiliations::AffiliationRepository;
use crate::context::ActiveContextRepository;
use crate::directory::{DepartmentRepository, EstablishmentRepository, ProfessionalRepository};
use crate::invitations::InvitationRepository;

/// Maps a bearer token to the authenticated user id.
///
/// Authentication itself lives outside this crate; the embedding service
/// plugs its token store or JWT verifier in here.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Returns `None` for an unknown or expired token.
    async fn resolve(&self, token: &str) -> Result<Option<i64>, PraxisError>;
}

/// The caller of a request, resolved from the `Authorization` header.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: i64,
    /// Bearer token, used as the session key.
    pub(crate) token: String,
}

pub fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()
        .and_then(|auth| auth.strip_prefix("Bearer "))
        .map(ToOwned::to_owned)
}

impl<A, P, E, D, C, I, Id> FromRequestParts<AppState<A, P, E, D, C, I, Id>> for AuthenticatedUser
where
    A: AffiliationRepository + 'static,
    P: ProfessionalRepository + 'static,
    E: EstablishmentRepository + 'static,
    D: DepartmentRepository + 'static,
    C: ActiveContextRepository + 'static,
    I: InvitationRepository + 'static,
    Id: IdentityProvider + 'static,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<A, P, E, D, C, I, Id>,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(&parts.headers).ok_or(AppError::Unauthenticated)?;

        let user_id = state
            .identity
            .resolve(&token)
            .await?
            .ok_or(AppError::Unauthenticated)?;

        Ok(Self { user_id, token })
    }
}
