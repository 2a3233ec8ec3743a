//! Postgres implementation of `RegistrationStore`.
//!
//! Wraps a PgPool. All SQL is runtime-checked (sqlx::query_as, not
//! sqlx::query_as!) so building does not need a live database. Expects the
//! table from `sql/registrations.sql`.

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use congreso_core::error::StoreError;
use congreso_core::store::{RegistrationStore, Result};
use congreso_core::types::{DedupKey, NewRegistration, Registration, Sector};

/// Name of the UNIQUE (name, district, church) constraint.
pub const DEDUP_CONSTRAINT: &str = "registrations_dedup_key";

#[derive(Debug, sqlx::FromRow)]
struct PgRegistrationRow {
    id: Uuid,
    name: String,
    district: String,
    sector: String,
    church: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<PgRegistrationRow> for Registration {
    type Error = String;

    fn try_from(row: PgRegistrationRow) -> std::result::Result<Self, Self::Error> {
        let sector: Sector = row
            .sector
            .parse()
            .map_err(|e| format!("registration {}: {e}", row.id))?;
        Ok(Registration {
            id: row.id,
            name: row.name,
            district: row.district,
            sector,
            church: row.church,
            created_at: row.created_at,
        })
    }
}

fn convert(rows: Vec<PgRegistrationRow>) -> Result<Vec<Registration>> {
    rows.into_iter()
        .map(|r| Registration::try_from(r).map_err(|e| StoreError::Backend(anyhow!(e))))
        .collect()
}

/// Only a violation of the named dedup constraint counts; any other unique
/// violation, or one without a constraint name, is a backend failure.
fn is_dedup_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => {
            db.is_unique_violation() && db.constraint() == Some(DEDUP_CONSTRAINT)
        }
        _ => false,
    }
}

/// Postgres-backed registration store.
pub struct PgRegistrationStore {
    pool: PgPool,
}

impl PgRegistrationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RegistrationStore for PgRegistrationStore {
    async fn insert(&self, record: &NewRegistration) -> Result<Registration> {
        let row = sqlx::query_as::<_, PgRegistrationRow>(
            r#"
            INSERT INTO registrations (id, name, district, sector, church)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, district, sector, church, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&record.name)
        .bind(&record.district)
        .bind(record.sector.to_string())
        .bind(&record.church)
        .fetch_one(&self.pool)
        .await;

        match row {
            Ok(row) => Registration::try_from(row).map_err(|e| StoreError::Backend(anyhow!(e))),
            Err(e) if is_dedup_violation(&e) => {
                tracing::debug!(district = %record.district, church = %record.church, "unique constraint hit");
                Err(StoreError::Conflict(record.dedup_key()))
            }
            Err(e) => Err(StoreError::Backend(anyhow!(e))),
        }
    }

    async fn list_all(&self) -> Result<Vec<Registration>> {
        let rows = sqlx::query_as::<_, PgRegistrationRow>(
            r#"
            SELECT id, name, district, sector, church, created_at
            FROM registrations
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;
        convert(rows)
    }

    async fn find_by_key(&self, key: &DedupKey) -> Result<Vec<Registration>> {
        let rows = sqlx::query_as::<_, PgRegistrationRow>(
            r#"
            SELECT id, name, district, sector, church, created_at
            FROM registrations
            WHERE name = $1 AND district = $2 AND church = $3
            ORDER BY created_at DESC
            "#,
        )
        .bind(&key.name)
        .bind(&key.district)
        .bind(&key.church)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;
        convert(rows)
    }
}
