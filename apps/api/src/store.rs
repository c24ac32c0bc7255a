//! Record Store — the durable lookups and the single write the description pipeline needs.
//!
//! `AppState` carries an `Arc<dyn RecordStore>`; `PgRecordStore` is the production backend.
//! The CRUD handlers share the `find_*` queries below for their by-id lookups.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::errors::AppError;
use crate::models::company::Company;
use crate::models::job_posting::JobPosting;

#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn get_job_posting(&self, id: i32) -> Result<Option<JobPosting>, AppError>;

    async fn get_company(&self, id: i32) -> Result<Option<Company>, AppError>;

    /// Replaces the posting's description. Fails with `AppError::Persistence`
    /// when the write does not land.
    async fn update_job_posting_description(&self, id: i32, text: &str) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn get_job_posting(&self, id: i32) -> Result<Option<JobPosting>, AppError> {
        find_job_posting(&self.pool, id).await
    }

    async fn get_company(&self, id: i32) -> Result<Option<Company>, AppError> {
        find_company(&self.pool, id).await
    }

    async fn update_job_posting_description(&self, id: i32, text: &str) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"UPDATE "JobPosting" SET description = $1, updated_at = now() WHERE id = $2"#,
        )
        .bind(text)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Persistence(format!("description update for job {id} failed: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::Persistence(format!(
                "job posting {id} no longer exists; description was not saved"
            )));
        }

        Ok(())
    }
}

pub async fn find_job_posting(pool: &PgPool, id: i32) -> Result<Option<JobPosting>, AppError> {
    let job = sqlx::query_as::<_, JobPosting>(r#"SELECT * FROM "JobPosting" WHERE id = $1"#)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(job)
}

pub async fn find_company(pool: &PgPool, id: i32) -> Result<Option<Company>, AppError> {
    let company = sqlx::query_as::<_, Company>(r#"SELECT * FROM "Company" WHERE id = $1"#)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(company)
}
