use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};

use super::handlers;
use super::middleware::IdentityProvider;
use super::sessions::SessionStore;
use crate::affiliations::AffiliationRepository;
use crate::context::{ActiveContextRepository, WorkSession};
use crate::directory::{DepartmentRepository, EstablishmentRepository, ProfessionalRepository};
use crate::invitations::{ClaimEstablishmentAction, InvitationRepository};
use crate::session::SessionApi;

pub struct AppState<A, P, E, D, C, I, Id>
where
    A: AffiliationRepository,
    P: ProfessionalRepository,
    E: EstablishmentRepository,
    D: DepartmentRepository,
    C: ActiveContextRepository,
    I: InvitationRepository,
{
    pub session_api: Arc<SessionApi<A, P, E, D, C, I>>,
    pub claim: Arc<ClaimEstablishmentAction<E>>,
    pub identity: Arc<Id>,
    pub sessions: SessionStore,
}

impl<A, P, E, D, C, I, Id> Clone for AppState<A, P, E, D, C, I, Id>
where
    A: AffiliationRepository,
    P: ProfessionalRepository,
    E: EstablishmentRepository,
    D: DepartmentRepository,
    C: ActiveContextRepository,
    I: InvitationRepository,
{
    fn clone(&self) -> Self {
        Self {
            session_api: Arc::clone(&self.session_api),
            claim: Arc::clone(&self.claim),
            identity: Arc::clone(&self.identity),
            sessions: self.sessions.clone(),
        }
    }
}

impl<A, P, E, D, C, I, Id> AppState<A, P, E, D, C, I, Id>
where
    A: AffiliationRepository,
    P: ProfessionalRepository,
    E: EstablishmentRepository,
    D: DepartmentRepository,
    C: ActiveContextRepository,
    I: InvitationRepository,
{
    pub fn new(
        session_api: SessionApi<A, P, E, D, C, I>,
        claim: ClaimEstablishmentAction<E>,
        identity: Id,
    ) -> Self {
        Self {
            session_api: Arc::new(session_api),
            claim: Arc::new(claim),
            identity: Arc::new(identity),
            sessions: SessionStore::new(),
        }
    }

    /// Resolves a session on its first request.
    pub(crate) async fn ensure_started(&self, session: &mut WorkSession, user_id: i64) {
        if !session.state().is_resolved() {
            self.session_api.start(session, user_id).await;
        }
    }
}

/// Session endpoints plus the public claim URL. Every route requires a
/// bearer token.
pub fn praxis_routes<A, P, E, D, C, I, Id>() -> Router<AppState<A, P, E, D, C, I, Id>>
where
    A: AffiliationRepository + 'static,
    P: ProfessionalRepository + 'static,
    E: EstablishmentRepository + 'static,
    D: DepartmentRepository + 'static,
    C: ActiveContextRepository + 'static,
    I: InvitationRepository + 'static,
    Id: IdentityProvider + 'static,
{
    Router::new()
        .route(
            "/me/establishments",
            get(handlers::list_my_establishments::<A, P, E, D, C, I, Id>),
        )
        .route(
            "/me/context",
            get(handlers::get_current_context::<A, P, E, D, C, I, Id>)
                .put(handlers::switch_context::<A, P, E, D, C, I, Id>)
                .delete(handlers::end_session::<A, P, E, D, C, I, Id>),
        )
        .route(
            "/me/invitations",
            get(handlers::list_pending_invitations::<A, P, E, D, C, I, Id>),
        )
        .route(
            "/me/invitations/{id}/accept",
            post(handlers::accept_invitation::<A, P, E, D, C, I, Id>),
        )
        .route(
            "/claim-establishment/{token}",
            post(handlers::claim_establishment::<A, P, E, D, C, I, Id>),
        )
}
