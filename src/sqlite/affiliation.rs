use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, SqlitePool};

use crate::affiliations::{
    Affiliation, AffiliationRepository, AffiliationStatus, CapabilitySet, UpsertAffiliation,
};
use crate::db_error::{corrupt_row, db_error};
use crate::PraxisError;

#[derive(Clone)]
pub struct SqliteAffiliationRepository {
    pool: SqlitePool,
}

impl SqliteAffiliationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct AffiliationRecord {
    id: i64,
    professional_id: i64,
    establishment_id: i64,
    department_id: Option<i64>,
    role: String,
    position_title: Option<String>,
    is_department_head: bool,
    is_establishment_admin: bool,
    permissions: String,
    status: String,
    start_date: NaiveDate,
    end_date: Option<NaiveDate>,
    matricule: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AffiliationRecord> for Affiliation {
    type Error = PraxisError;

    fn try_from(row: AffiliationRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            professional_id: row.professional_id,
            establishment_id: row.establishment_id,
            department_id: row.department_id,
            role: row.role.parse().map_err(|e| corrupt_row("affiliation_role", e))?,
            position_title: row.position_title,
            is_department_head: row.is_department_head,
            is_establishment_admin: row.is_establishment_admin,
            permissions: CapabilitySet::from_json(&row.permissions)
                .map_err(|e| corrupt_row("affiliation_permissions", e))?,
            status: row
                .status
                .parse()
                .map_err(|e| corrupt_row("affiliation_status", e))?,
            start_date: row.start_date,
            end_date: row.end_date,
            matricule: row.matricule,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl AffiliationRepository for SqliteAffiliationRepository {
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn upsert(&self, data: UpsertAffiliation) -> Result<Affiliation, PraxisError> {
        let now = Utc::now();
        let row: AffiliationRecord = sqlx::query_as(
            r"
            INSERT INTO affiliations (
                professional_id, establishment_id, department_id, department_key, role,
                position_title, is_department_head, is_establishment_admin, permissions,
                status, start_date, end_date, matricule, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, COALESCE(?, ?), ?, ?, ?, ?)
            ON CONFLICT (professional_id, establishment_id, department_key)
            DO UPDATE SET
                role = excluded.role,
                position_title = excluded.position_title,
                is_department_head = excluded.is_department_head,
                is_establishment_admin = excluded.is_establishment_admin,
                permissions = excluded.permissions,
                status = excluded.status,
                start_date = COALESCE(?, affiliations.start_date),
                end_date = excluded.end_date,
                matricule = excluded.matricule,
                updated_at = excluded.updated_at
            RETURNING id, professional_id, establishment_id, department_id, role, position_title,
                      is_department_head, is_establishment_admin, permissions, status,
                      start_date, end_date, matricule, created_at, updated_at
            ",
        )
        .bind(data.professional_id)
        .bind(data.establishment_id)
        .bind(data.department_id)
        .bind(data.department_id.unwrap_or(0))
        .bind(data.role.as_str())
        .bind(&data.position_title)
        .bind(data.is_department_head)
        .bind(data.is_establishment_admin)
        .bind(data.permissions.to_json())
        .bind(data.status.as_str())
        .bind(data.start_date)
        .bind(now.date_naive())
        .bind(data.end_date)
        .bind(&data.matricule)
        .bind(now)
        .bind(now)
        .bind(data.start_date)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("upsert_affiliation", e))?;

        row.try_into()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_by_id(&self, id: i64) -> Result<Option<Affiliation>, PraxisError> {
        let row: Option<AffiliationRecord> = sqlx::query_as(
            r"
            SELECT id, professional_id, establishment_id, department_id, role, position_title,
                   is_department_head, is_establishment_admin, permissions, status,
                   start_date, end_date, matricule, created_at, updated_at
            FROM affiliations WHERE id = ?
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("find_affiliation_by_id", e))?;

        row.map(TryInto::try_into).transpose()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_by_professional(
        &self,
        professional_id: i64,
    ) -> Result<Vec<Affiliation>, PraxisError> {
        let rows: Vec<AffiliationRecord> = sqlx::query_as(
            r"
            SELECT id, professional_id, establishment_id, department_id, role, position_title,
                   is_department_head, is_establishment_admin, permissions, status,
                   start_date, end_date, matricule, created_at, updated_at
            FROM affiliations
            WHERE professional_id = ?
            ORDER BY start_date DESC, id DESC
            ",
        )
        .bind(professional_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("find_affiliations_by_professional", e))?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn delete_by_professional_and_establishment(
        &self,
        professional_id: i64,
        establishment_id: i64,
    ) -> Result<u64, PraxisError> {
        let result = sqlx::query(
            "DELETE FROM affiliations WHERE professional_id = ? AND establishment_id = ?",
        )
        .bind(professional_id)
        .bind(establishment_id)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("delete_affiliations", e))?;

        Ok(result.rows_affected())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn update_status(
        &self,
        id: i64,
        status: AffiliationStatus,
    ) -> Result<Affiliation, PraxisError> {
        let row: Option<AffiliationRecord> = sqlx::query_as(
            r"
            UPDATE affiliations SET status = ?, updated_at = ?
            WHERE id = ?
            RETURNING id, professional_id, establishment_id, department_id, role, position_title,
                      is_department_head, is_establishment_admin, permissions, status,
                      start_date, end_date, matricule, created_at, updated_at
            ",
        )
        .bind(status.as_str())
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("update_affiliation_status", e))?;

        row.ok_or(PraxisError::NotFound)?.try_into()
    }
}
