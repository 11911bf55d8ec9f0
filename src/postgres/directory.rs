//! `PostgreSQL` implementations of the directory repositories.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use crate::db_error::{corrupt_row, db_error};
use crate::directory::{
    CreateEstablishment, CreateProfessional, Department, DepartmentRepository, Establishment,
    EstablishmentRepository, Professional, ProfessionalRepository, UpsertDepartment,
};
use crate::PraxisError;

/// PostgreSQL-backed professional repository.
#[derive(Clone)]
pub struct PostgresProfessionalRepository {
    pool: PgPool,
}

impl PostgresProfessionalRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct ProfessionalRecord {
    id: i64,
    user_id: i64,
    display_name: String,
    email: String,
    phone: Option<String>,
    is_verified: bool,
    verified_by: Option<String>,
    verified_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProfessionalRecord> for Professional {
    fn from(row: ProfessionalRecord) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            display_name: row.display_name,
            email: row.email,
            phone: row.phone,
            is_verified: row.is_verified,
            verified_by: row.verified_by,
            verified_at: row.verified_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl ProfessionalRepository for PostgresProfessionalRepository {
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn create(&self, data: CreateProfessional) -> Result<Professional, PraxisError> {
        let row: ProfessionalRecord = sqlx::query_as(
            r"
            INSERT INTO professionals (user_id, display_name, email, phone)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, display_name, email, phone, is_verified, verified_by, verified_at, created_at, updated_at
            ",
        )
        .bind(data.user_id)
        .bind(&data.display_name)
        .bind(&data.email)
        .bind(&data.phone)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("create_professional", e))?;

        Ok(row.into())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_by_id(&self, id: i64) -> Result<Option<Professional>, PraxisError> {
        let row: Option<ProfessionalRecord> = sqlx::query_as(
            "SELECT id, user_id, display_name, email, phone, is_verified, verified_by, verified_at, created_at, updated_at FROM professionals WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("find_professional_by_id", e))?;

        Ok(row.map(Into::into))
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_by_user_id(&self, user_id: i64) -> Result<Option<Professional>, PraxisError> {
        let row: Option<ProfessionalRecord> = sqlx::query_as(
            "SELECT id, user_id, display_name, email, phone, is_verified, verified_by, verified_at, created_at, updated_at FROM professionals WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("find_professional_by_user_id", e))?;

        Ok(row.map(Into::into))
    }
}

/// PostgreSQL-backed establishment repository, including the claim columns.
#[derive(Clone)]
pub struct PostgresEstablishmentRepository {
    pool: PgPool,
}

impl PostgresEstablishmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct EstablishmentRecord {
    id: i64,
    name: String,
    establishment_type: String,
    address: Option<String>,
    city: Option<String>,
    country: Option<String>,
    contact_email: Option<String>,
    claim_state: String,
    claim_token_hash: Option<String>,
    claim_token_issued_at: Option<DateTime<Utc>>,
    claimed_at: Option<DateTime<Utc>>,
    claimed_by: Option<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<EstablishmentRecord> for Establishment {
    type Error = PraxisError;

    fn try_from(row: EstablishmentRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            name: row.name,
            establishment_type: row
                .establishment_type
                .parse()
                .map_err(|e| corrupt_row("establishment_type", e))?,
            address: row.address,
            city: row.city,
            country: row.country,
            contact_email: row.contact_email,
            claim_state: row
                .claim_state
                .parse()
                .map_err(|e| corrupt_row("claim_state", e))?,
            claim_token_hash: row.claim_token_hash,
            claim_token_issued_at: row.claim_token_issued_at,
            claimed_at: row.claimed_at,
            claimed_by: row.claimed_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl EstablishmentRepository for PostgresEstablishmentRepository {
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn create(&self, data: CreateEstablishment) -> Result<Establishment, PraxisError> {
        let row: EstablishmentRecord = sqlx::query_as(
            r"
            INSERT INTO establishments (name, establishment_type, address, city, country, contact_email)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, establishment_type, address, city, country, contact_email, claim_state,
                      claim_token_hash, claim_token_issued_at, claimed_at, claimed_by, created_at, updated_at
            ",
        )
        .bind(&data.name)
        .bind(data.establishment_type.as_str())
        .bind(&data.address)
        .bind(&data.city)
        .bind(&data.country)
        .bind(&data.contact_email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("create_establishment", e))?;

        row.try_into()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_by_id(&self, id: i64) -> Result<Option<Establishment>, PraxisError> {
        let row: Option<EstablishmentRecord> = sqlx::query_as(
            r"
            SELECT id, name, establishment_type, address, city, country, contact_email, claim_state,
                   claim_token_hash, claim_token_issued_at, claimed_at, claimed_by, created_at, updated_at
            FROM establishments WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("find_establishment_by_id", e))?;

        row.map(TryInto::try_into).transpose()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, token_hash), err))]
    async fn find_by_claim_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<Establishment>, PraxisError> {
        let row: Option<EstablishmentRecord> = sqlx::query_as(
            r"
            SELECT id, name, establishment_type, address, city, country, contact_email, claim_state,
                   claim_token_hash, claim_token_issued_at, claimed_at, claimed_by, created_at, updated_at
            FROM establishments WHERE claim_token_hash = $1
            ",
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("find_establishment_by_claim_token", e))?;

        row.map(TryInto::try_into).transpose()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, token_hash), err))]
    async fn set_claim_token(
        &self,
        id: i64,
        token_hash: &str,
    ) -> Result<Establishment, PraxisError> {
        let row: Option<EstablishmentRecord> = sqlx::query_as(
            r"
            UPDATE establishments
            SET claim_token_hash = $2, claim_token_issued_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND claim_state <> 'claimed'
            RETURNING id, name, establishment_type, address, city, country, contact_email, claim_state,
                      claim_token_hash, claim_token_issued_at, claimed_at, claimed_by, created_at, updated_at
            ",
        )
        .bind(id)
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("set_claim_token", e))?;

        if let Some(row) = row {
            return row.try_into();
        }
        // zero rows: unknown id, or a claim landed first
        match self.find_by_id(id).await? {
            Some(_) => Err(PraxisError::InvalidState(
                "establishment is already claimed".into(),
            )),
            None => Err(PraxisError::NotFound),
        }
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, token_hash), err))]
    async fn mark_claimed(
        &self,
        id: i64,
        token_hash: &str,
        claimed_by: i64,
    ) -> Result<Option<Establishment>, PraxisError> {
        let row: Option<EstablishmentRecord> = sqlx::query_as(
            r"
            UPDATE establishments
            SET claim_state = 'claimed', claimed_by = $3, claimed_at = NOW(),
                claim_token_hash = NULL, claim_token_issued_at = NULL, updated_at = NOW()
            WHERE id = $1 AND claim_token_hash = $2 AND claim_state <> 'claimed'
            RETURNING id, name, establishment_type, address, city, country, contact_email, claim_state,
                      claim_token_hash, claim_token_issued_at, claimed_at, claimed_by, created_at, updated_at
            ",
        )
        .bind(id)
        .bind(token_hash)
        .bind(claimed_by)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("mark_establishment_claimed", e))?;

        row.map(TryInto::try_into).transpose()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn reset_claim(&self, id: i64) -> Result<Establishment, PraxisError> {
        let row: Option<EstablishmentRecord> = sqlx::query_as(
            r"
            UPDATE establishments
            SET claim_state = 'unclaimed', claimed_by = NULL, claimed_at = NULL,
                claim_token_hash = NULL, claim_token_issued_at = NULL, updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, establishment_type, address, city, country, contact_email, claim_state,
                      claim_token_hash, claim_token_issued_at, claimed_at, claimed_by, created_at, updated_at
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("reset_establishment_claim", e))?;

        row.ok_or(PraxisError::NotFound)?.try_into()
    }
}

/// PostgreSQL-backed department repository.
#[derive(Clone)]
pub struct PostgresDepartmentRepository {
    pool: PgPool,
}

impl PostgresDepartmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct DepartmentRecord {
    id: i64,
    establishment_id: i64,
    code: String,
    name: String,
    created_at: DateTime<Utc>,
}

impl From<DepartmentRecord> for Department {
    fn from(row: DepartmentRecord) -> Self {
        Self {
            id: row.id,
            establishment_id: row.establishment_id,
            code: row.code,
            name: row.name,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl DepartmentRepository for PostgresDepartmentRepository {
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn upsert(&self, data: UpsertDepartment) -> Result<Department, PraxisError> {
        let row: DepartmentRecord = sqlx::query_as(
            r"
            INSERT INTO departments (establishment_id, code, name)
            VALUES ($1, $2, $3)
            ON CONFLICT (establishment_id, code)
            DO UPDATE SET name = EXCLUDED.name
            RETURNING id, establishment_id, code, name, created_at
            ",
        )
        .bind(data.establishment_id)
        .bind(&data.code)
        .bind(&data.name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("upsert_department", e))?;

        Ok(row.into())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_by_id(&self, id: i64) -> Result<Option<Department>, PraxisError> {
        let row: Option<DepartmentRecord> = sqlx::query_as(
            "SELECT id, establishment_id, code, name, created_at FROM departments WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("find_department_by_id", e))?;

        Ok(row.map(Into::into))
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_by_establishment(
        &self,
        establishment_id: i64,
    ) -> Result<Vec<Department>, PraxisError> {
        let rows: Vec<DepartmentRecord> = sqlx::query_as(
            "SELECT id, establishment_id, code, name, created_at FROM departments WHERE establishment_id = $1 ORDER BY code",
        )
        .bind(establishment_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("find_departments_by_establishment", e))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
