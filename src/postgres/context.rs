use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use crate::context::{ActiveContext, ActiveContextRepository};
use crate::db_error::db_error;
use crate::PraxisError;

/// PostgreSQL-backed store for the per-professional active context marker.
#[derive(Clone)]
pub struct PostgresActiveContextRepository {
    pool: PgPool,
}

impl PostgresActiveContextRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct ActiveContextRecord {
    professional_id: i64,
    establishment_id: i64,
    department_id: Option<i64>,
    affiliation_id: i64,
    updated_at: DateTime<Utc>,
}

impl From<ActiveContextRecord> for ActiveContext {
    fn from(row: ActiveContextRecord) -> Self {
        Self {
            professional_id: row.professional_id,
            establishment_id: row.establishment_id,
            department_id: row.department_id,
            affiliation_id: row.affiliation_id,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl ActiveContextRepository for PostgresActiveContextRepository {
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn get(&self, professional_id: i64) -> Result<Option<ActiveContext>, PraxisError> {
        let row: Option<ActiveContextRecord> = sqlx::query_as(
            r"
            SELECT professional_id, establishment_id, department_id, affiliation_id, updated_at
            FROM active_contexts WHERE professional_id = $1
            ",
        )
        .bind(professional_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("get_active_context", e))?;

        Ok(row.map(Into::into))
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn set(&self, marker: ActiveContext) -> Result<ActiveContext, PraxisError> {
        let written: Option<ActiveContextRecord> = sqlx::query_as(
            r"
            INSERT INTO active_contexts (professional_id, establishment_id, department_id, affiliation_id, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (professional_id) DO UPDATE SET
                establishment_id = EXCLUDED.establishment_id,
                department_id = EXCLUDED.department_id,
                affiliation_id = EXCLUDED.affiliation_id,
                updated_at = EXCLUDED.updated_at
            WHERE active_contexts.updated_at <= EXCLUDED.updated_at
            RETURNING professional_id, establishment_id, department_id, affiliation_id, updated_at
            ",
        )
        .bind(marker.professional_id)
        .bind(marker.establishment_id)
        .bind(marker.department_id)
        .bind(marker.affiliation_id)
        .bind(marker.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("set_active_context", e))?;

        if let Some(row) = written {
            return Ok(row.into());
        }

        // a newer marker won the race
        self.get(marker.professional_id)
            .await?
            .ok_or(PraxisError::NotFound)
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn clear(&self, professional_id: i64) -> Result<(), PraxisError> {
        sqlx::query("DELETE FROM active_contexts WHERE professional_id = $1")
            .bind(professional_id)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("clear_active_context", e))?;

        Ok(())
    }
}
