//! HTTP handlers for the session endpoints.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use super::error::AppError;
use super::middleware::{AuthenticatedUser, IdentityProvider};
use super::routes::AppState;
use crate::affiliations::{Affiliation, AffiliationRepository};
use crate::api::{CurrentContextResponse, SwitchContextRequest};
use crate::context::{ActiveContextRepository, WorkContext, WorkContextSummary};
use crate::directory::{
    DepartmentRepository, Establishment, EstablishmentRepository, ProfessionalRepository,
};
use crate::invitations::{Invitation, InvitationRepository};
use crate::SecretString;

/// List every establishment the caller is affiliated with.
///
/// GET /me/establishments
pub async fn list_my_establishments<A, P, E, D, C, I, Id>(
    State(state): State<AppState<A, P, E, D, C, I, Id>>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<WorkContextSummary>>, AppError>
where
    A: AffiliationRepository,
    P: ProfessionalRepository,
    E: EstablishmentRepository,
    D: DepartmentRepository,
    C: ActiveContextRepository,
    I: InvitationRepository,
    Id: IdentityProvider,
{
    let session = state.sessions.checkout(&user.token)?;
    let mut session = session.lock().await;
    state.ensure_started(&mut session, user.user_id).await;

    let summaries = state
        .session_api
        .list_my_establishments(&session, user.user_id)
        .await?;

    Ok(Json(summaries))
}

/// GET /me/context
pub async fn get_current_context<A, P, E, D, C, I, Id>(
    State(state): State<AppState<A, P, E, D, C, I, Id>>,
    user: AuthenticatedUser,
) -> Result<Json<CurrentContextResponse>, AppError>
where
    A: AffiliationRepository,
    P: ProfessionalRepository,
    E: EstablishmentRepository,
    D: DepartmentRepository,
    C: ActiveContextRepository,
    I: InvitationRepository,
    Id: IdentityProvider,
{
    let session = state.sessions.checkout(&user.token)?;
    let mut session = session.lock().await;
    state.ensure_started(&mut session, user.user_id).await;

    Ok(Json(CurrentContextResponse {
        context: state.session_api.get_current_context(&session).cloned(),
    }))
}

/// Switch the active establishment (and optionally department).
///
/// PUT /me/context
pub async fn switch_context<A, P, E, D, C, I, Id>(
    State(state): State<AppState<A, P, E, D, C, I, Id>>,
    user: AuthenticatedUser,
    Json(body): Json<SwitchContextRequest>,
) -> Result<Json<WorkContext>, AppError>
where
    A: AffiliationRepository,
    P: ProfessionalRepository,
    E: EstablishmentRepository,
    D: DepartmentRepository,
    C: ActiveContextRepository,
    I: InvitationRepository,
    Id: IdentityProvider,
{
    let session = state.sessions.checkout(&user.token)?;
    let mut session = session.lock().await;
    state.ensure_started(&mut session, user.user_id).await;

    let context = state
        .session_api
        .switch_context(
            &mut session,
            user.user_id,
            body.establishment_id,
            body.department_id,
        )
        .await?;

    Ok(Json(context))
}

/// Logout: forget the session and the persisted context.
///
/// DELETE /me/context
pub async fn end_session<A, P, E, D, C, I, Id>(
    State(state): State<AppState<A, P, E, D, C, I, Id>>,
    user: AuthenticatedUser,
) -> Result<StatusCode, AppError>
where
    A: AffiliationRepository,
    P: ProfessionalRepository,
    E: EstablishmentRepository,
    D: DepartmentRepository,
    C: ActiveContextRepository,
    I: InvitationRepository,
    Id: IdentityProvider,
{
    let session = state.sessions.checkout(&user.token)?;
    {
        let mut session = session.lock().await;
        state.session_api.end(&mut session, user.user_id).await?;
    }
    state.sessions.remove(&user.token)?;

    Ok(StatusCode::NO_CONTENT)
}

/// Pending invitations addressed to the caller's professional email.
///
/// GET /me/invitations
pub async fn list_pending_invitations<A, P, E, D, C, I, Id>(
    State(state): State<AppState<A, P, E, D, C, I, Id>>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<Invitation>>, AppError>
where
    A: AffiliationRepository,
    P: ProfessionalRepository,
    E: EstablishmentRepository,
    D: DepartmentRepository,
    C: ActiveContextRepository,
    I: InvitationRepository,
    Id: IdentityProvider,
{
    let Some(professional) = state.session_api.professional(user.user_id).await? else {
        return Ok(Json(Vec::new()));
    };

    let invitations = state
        .session_api
        .list_pending_invitations(&professional.email)
        .await?;

    Ok(Json(invitations))
}

/// POST /me/invitations/{id}/accept
pub async fn accept_invitation<A, P, E, D, C, I, Id>(
    State(state): State<AppState<A, P, E, D, C, I, Id>>,
    user: AuthenticatedUser,
    Path(invitation_id): Path<i64>,
) -> Result<Json<Affiliation>, AppError>
where
    A: AffiliationRepository,
    P: ProfessionalRepository,
    E: EstablishmentRepository,
    D: DepartmentRepository,
    C: ActiveContextRepository,
    I: InvitationRepository,
    Id: IdentityProvider,
{
    let session = state.sessions.checkout(&user.token)?;
    let mut session = session.lock().await;
    state.ensure_started(&mut session, user.user_id).await;

    let affiliation = state
        .session_api
        .accept_invitation(&mut session, user.user_id, invitation_id)
        .await?;

    Ok(Json(affiliation))
}

/// Consume a claim link on behalf of the caller.
///
/// POST /claim-establishment/{token}
pub async fn claim_establishment<A, P, E, D, C, I, Id>(
    State(state): State<AppState<A, P, E, D, C, I, Id>>,
    user: AuthenticatedUser,
    Path(token): Path<String>,
) -> Result<Json<Establishment>, AppError>
where
    A: AffiliationRepository,
    P: ProfessionalRepository,
    E: EstablishmentRepository,
    D: DepartmentRepository,
    C: ActiveContextRepository,
    I: InvitationRepository,
    Id: IdentityProvider,
{
    let token = SecretString::new(token);
    let establishment = state.claim.execute(&token, user.user_id).await?;

    Ok(Json(establishment))
}
