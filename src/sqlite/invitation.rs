use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};

use crate::db_error::{corrupt_row, db_error};
use crate::invitations::{CreateInvitation, Invitation, InvitationRepository, InvitationStatus};
use crate::PraxisError;

#[derive(Clone)]
pub struct SqliteInvitationRepository {
    pool: SqlitePool,
}

impl SqliteInvitationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct InvitationRecord {
    id: i64,
    establishment_id: i64,
    email: String,
    invited_by: i64,
    role: String,
    position_title: Option<String>,
    department_id: Option<i64>,
    message: Option<String>,
    status: String,
    expires_at: DateTime<Utc>,
    responded_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<InvitationRecord> for Invitation {
    type Error = PraxisError;

    fn try_from(row: InvitationRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            establishment_id: row.establishment_id,
            email: row.email,
            invited_by: row.invited_by,
            role: row.role.parse().map_err(|e| corrupt_row("invitation_role", e))?,
            position_title: row.position_title,
            department_id: row.department_id,
            message: row.message,
            status: row
                .status
                .parse()
                .map_err(|e| corrupt_row("invitation_status", e))?,
            expires_at: row.expires_at,
            responded_at: row.responded_at,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl InvitationRepository for SqliteInvitationRepository {
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn create(&self, data: CreateInvitation) -> Result<Invitation, PraxisError> {
        let row: InvitationRecord = sqlx::query_as(
            r"
            INSERT INTO invitations (establishment_id, email, invited_by, role, position_title, department_id, message, expires_at, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id, establishment_id, email, invited_by, role, position_title, department_id,
                      message, status, expires_at, responded_at, created_at
            ",
        )
        .bind(data.establishment_id)
        .bind(&data.email)
        .bind(data.invited_by)
        .bind(data.role.as_str())
        .bind(&data.position_title)
        .bind(data.department_id)
        .bind(&data.message)
        .bind(data.expires_at)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("create_invitation", e))?;

        row.try_into()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_by_id(&self, id: i64) -> Result<Option<Invitation>, PraxisError> {
        let row: Option<InvitationRecord> = sqlx::query_as(
            r"
            SELECT id, establishment_id, email, invited_by, role, position_title, department_id,
                   message, status, expires_at, responded_at, created_at
            FROM invitations WHERE id = ?
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("find_invitation_by_id", e))?;

        row.map(TryInto::try_into).transpose()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_pending_by_email(&self, email: &str) -> Result<Vec<Invitation>, PraxisError> {
        let rows: Vec<InvitationRecord> = sqlx::query_as(
            r"
            SELECT id, establishment_id, email, invited_by, role, position_title, department_id,
                   message, status, expires_at, responded_at, created_at
            FROM invitations
            WHERE email = ? AND status = 'pending'
            ORDER BY created_at DESC, id DESC
            ",
        )
        .bind(email)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("find_pending_invitations_by_email", e))?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_pending_by_establishment(
        &self,
        establishment_id: i64,
    ) -> Result<Vec<Invitation>, PraxisError> {
        let rows: Vec<InvitationRecord> = sqlx::query_as(
            r"
            SELECT id, establishment_id, email, invited_by, role, position_title, department_id,
                   message, status, expires_at, responded_at, created_at
            FROM invitations
            WHERE establishment_id = ? AND status = 'pending'
            ORDER BY created_at DESC, id DESC
            ",
        )
        .bind(establishment_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("find_pending_invitations_by_establishment", e))?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn transition_status(
        &self,
        id: i64,
        from: InvitationStatus,
        to: InvitationStatus,
    ) -> Result<Option<Invitation>, PraxisError> {
        let row: Option<InvitationRecord> = sqlx::query_as(
            r"
            UPDATE invitations SET status = ?, responded_at = ?
            WHERE id = ? AND status = ?
            RETURNING id, establishment_id, email, invited_by, role, position_title, department_id,
                      message, status, expires_at, responded_at, created_at
            ",
        )
        .bind(to.as_str())
        .bind(Utc::now())
        .bind(id)
        .bind(from.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("transition_invitation_status", e))?;

        row.map(TryInto::try_into).transpose()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn expire_stale(&self, now: DateTime<Utc>) -> Result<u64, PraxisError> {
        // timestamps are text here; julianday compares them as instants
        let result = sqlx::query(
            r"
            UPDATE invitations SET status = 'expired', responded_at = ?
            WHERE status = 'pending' AND julianday(expires_at) <= julianday(?)
            ",
        )
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("expire_stale_invitations", e))?;

        Ok(result.rows_affected())
    }
}
