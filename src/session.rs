//! Session-facing API.
//!
//! [`SessionApi`] is what a presentation layer talks to once the user is
//! authenticated: it maps the user id to a professional and drives the
//! context engine and invitation actions on behalf of one [`WorkSession`].

use crate::affiliations::{Affiliation, AffiliationRepository, UpsertAffiliationAction};
use crate::config::PraxisConfig;
use crate::context::{
    ActiveContextRepository, ContextEngine, ContextState, WorkContext, WorkContextSummary,
    WorkSession,
};
use crate::directory::{
    DepartmentRepository, EstablishmentRepository, Professional, ProfessionalRepository,
};
use crate::invitations::{
    AcceptInvitationAction, Invitation, InvitationRepository, ListPendingInvitationsAction,
};
use crate::PraxisError;

pub struct SessionApi<A, P, E, D, C, I>
where
    A: AffiliationRepository,
    P: ProfessionalRepository,
    E: EstablishmentRepository,
    D: DepartmentRepository,
    C: ActiveContextRepository,
    I: InvitationRepository,
{
    professional_repo: P,
    engine: ContextEngine<A, E, C>,
    pending: ListPendingInvitationsAction<I>,
    accept: AcceptInvitationAction<I, A, P, E, D>,
}

impl<A, P, E, D, C, I> SessionApi<A, P, E, D, C, I>
where
    A: AffiliationRepository + Clone,
    P: ProfessionalRepository + Clone,
    E: EstablishmentRepository + Clone,
    D: DepartmentRepository,
    C: ActiveContextRepository,
    I: InvitationRepository + Clone,
{
    pub fn new(
        affiliation_repo: A,
        professional_repo: P,
        establishment_repo: E,
        department_repo: D,
        context_repo: C,
        invitation_repo: I,
        config: &PraxisConfig,
    ) -> Self {
        let upsert = UpsertAffiliationAction::with_retry(
            affiliation_repo.clone(),
            professional_repo.clone(),
            establishment_repo.clone(),
            department_repo,
            config.retry.clone(),
        );

        Self {
            engine: ContextEngine::with_config(
                affiliation_repo,
                establishment_repo,
                context_repo,
                config,
            ),
            pending: ListPendingInvitationsAction::new(invitation_repo.clone()),
            accept: AcceptInvitationAction::new(invitation_repo, upsert),
            professional_repo,
        }
    }
}

impl<A, P, E, D, C, I> SessionApi<A, P, E, D, C, I>
where
    A: AffiliationRepository,
    P: ProfessionalRepository,
    E: EstablishmentRepository,
    D: DepartmentRepository,
    C: ActiveContextRepository,
    I: InvitationRepository,
{
    /// Professional profile of an authenticated user, if one exists yet.
    pub async fn professional(&self, user_id: i64) -> Result<Option<Professional>, PraxisError> {
        self.professional_repo.find_by_user_id(user_id).await
    }

    /// Resolves the session at login. A user without a professional profile
    /// resolves to [`ContextState::NoAffiliations`].
    pub async fn start(&self, session: &mut WorkSession, user_id: i64) -> ContextState {
        match self.professional(user_id).await {
            Ok(Some(professional)) => {
                self.engine
                    .load_work_context(session, professional.id)
                    .await
            }
            Ok(None) => {
                session.replace(ContextState::NoAffiliations);
                ContextState::NoAffiliations
            }
            Err(e) => {
                log::warn!(
                    target: "praxis",
                    "msg=\"professional lookup failed at session start\", user_id={user_id}, error=\"{e}\""
                );
                session.replace(ContextState::NoAffiliations);
                ContextState::NoAffiliations
            }
        }
    }

    pub async fn list_my_establishments(
        &self,
        session: &WorkSession,
        user_id: i64,
    ) -> Result<Vec<WorkContextSummary>, PraxisError> {
        let Some(professional) = self.professional(user_id).await? else {
            return Ok(Vec::new());
        };
        self.engine
            .list_my_establishments(session, professional.id)
            .await
    }

    /// Pure read of the session; `None` until [`start`](Self::start) ran.
    pub fn get_current_context<'s>(&self, session: &'s WorkSession) -> Option<&'s WorkContext> {
        session.current_context()
    }

    /// Switches with the configured timeout.
    ///
    /// - `Err(PraxisError::NotAffiliated)` - no matching active affiliation,
    ///   including for users without a professional profile
    /// - `Err(PraxisError::Timeout)` - outcome unknown; the session was re-resolved
    pub async fn switch_context(
        &self,
        session: &mut WorkSession,
        user_id: i64,
        establishment_id: i64,
        department_id: Option<i64>,
    ) -> Result<WorkContext, PraxisError> {
        let professional = self
            .professional(user_id)
            .await?
            .ok_or(PraxisError::NotAffiliated)?;

        self.engine
            .switch_context_with_timeout(session, professional.id, establishment_id, department_id)
            .await
    }

    pub async fn list_pending_invitations(&self, email: &str) -> Result<Vec<Invitation>, PraxisError> {
        self.pending.execute(email).await
    }

    /// Accepts an invitation addressed to the user's professional email.
    ///
    /// A session that had nothing active is re-resolved so the new
    /// affiliation becomes usable right away.
    pub async fn accept_invitation(
        &self,
        session: &mut WorkSession,
        user_id: i64,
        invitation_id: i64,
    ) -> Result<Affiliation, PraxisError> {
        let professional = self
            .professional(user_id)
            .await?
            .ok_or(PraxisError::NotFound)?;

        let affiliation = self.accept.execute(invitation_id, professional.id).await?;

        if session.current_context().is_none() {
            self.engine
                .load_work_context(session, professional.id)
                .await;
        }

        Ok(affiliation)
    }

    /// Logout: drops the session context and the persisted marker.
    pub async fn end(&self, session: &mut WorkSession, user_id: i64) -> Result<(), PraxisError> {
        match self.professional(user_id).await? {
            Some(professional) => self.engine.clear_context(session, professional.id).await,
            None => {
                session.reset();
                Ok(())
            }
        }
    }
}
