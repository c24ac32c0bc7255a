use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::models::job_posting::{JobPosting, JobPostingFilter, JobPostingUpdate, NewJobPosting};
use crate::models::{require_non_blank, Page};
use crate::state::AppState;
use crate::store::{find_company, find_job_posting};

async fn ensure_company_exists(state: &AppState, company_id: i32) -> Result<(), AppError> {
    match find_company(&state.db, company_id).await? {
        Some(_) => Ok(()),
        None => Err(AppError::NotFound(format!("Company {company_id} not found"))),
    }
}

/// POST /jobs
pub async fn handle_create_job(
    State(state): State<AppState>,
    Json(req): Json<NewJobPosting>,
) -> Result<(StatusCode, Json<JobPosting>), AppError> {
    require_non_blank("title", &req.title)?;
    ensure_company_exists(&state, req.company_id).await?;

    let job = sqlx::query_as::<_, JobPosting>(
        r#"
        INSERT INTO "JobPosting"
            (title, company_id, location, description, requirements, salary_range, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, now())
        RETURNING *
        "#,
    )
    .bind(req.title.trim())
    .bind(req.company_id)
    .bind(&req.location)
    .bind(&req.description)
    .bind(&req.requirements)
    .bind(&req.salary_range)
    .fetch_one(&state.db)
    .await?;

    tracing::info!("Created job posting {} for company {}", job.id, job.company_id);
    Ok((StatusCode::CREATED, Json(job)))
}

/// GET /jobs?company_id=&title=&location=&skip=&limit=
///
/// `title` and `location` match case-insensitive substrings.
pub async fn handle_list_jobs(
    State(state): State<AppState>,
    Query(filter): Query<JobPostingFilter>,
    Query(page): Query<Page>,
) -> Result<Json<Vec<JobPosting>>, AppError> {
    let (skip, limit) = page.clamped();

    let jobs = sqlx::query_as::<_, JobPosting>(
        r#"
        SELECT * FROM "JobPosting"
        WHERE ($1::int IS NULL OR company_id = $1)
          AND ($2::text IS NULL OR title ILIKE '%' || $2 || '%')
          AND ($3::text IS NULL OR location ILIKE '%' || $3 || '%')
        ORDER BY id
        OFFSET $4 LIMIT $5
        "#,
    )
    .bind(filter.company_id)
    .bind(&filter.title)
    .bind(&filter.location)
    .bind(skip)
    .bind(limit)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(jobs))
}

/// GET /jobs/:id
pub async fn handle_get_job(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<JobPosting>, AppError> {
    let job = find_job_posting(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job posting {id} not found")))?;
    Ok(Json(job))
}

/// PUT /jobs/:id
pub async fn handle_update_job(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(req): Json<JobPostingUpdate>,
) -> Result<Json<JobPosting>, AppError> {
    if let Some(title) = &req.title {
        require_non_blank("title", title)?;
    }
    if let Some(company_id) = req.company_id {
        ensure_company_exists(&state, company_id).await?;
    }

    let job = sqlx::query_as::<_, JobPosting>(
        r#"
        UPDATE "JobPosting" SET
            company_id   = COALESCE($1, company_id),
            title        = COALESCE($2, title),
            location     = COALESCE($3, location),
            description  = COALESCE($4, description),
            requirements = COALESCE($5, requirements),
            salary_range = COALESCE($6, salary_range),
            updated_at   = now()
        WHERE id = $7
        RETURNING *
        "#,
    )
    .bind(req.company_id)
    .bind(req.title.as_deref().map(str::trim))
    .bind(&req.location)
    .bind(&req.description)
    .bind(&req.requirements)
    .bind(&req.salary_range)
    .bind(id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Job posting {id} not found")))?;

    Ok(Json(job))
}

/// DELETE /jobs/:id
pub async fn handle_delete_job(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Value>, AppError> {
    let result = sqlx::query(r#"DELETE FROM "JobPosting" WHERE id = $1"#)
        .bind(id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Job posting {id} not found")));
    }

    tracing::info!("Deleted job posting {id}");
    Ok(Json(json!({ "message": "Job posting deleted successfully" })))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    use crate::routes::build_router;
    use crate::test_support::{test_state, Ending, FakeGenerator, FakeStore};

    #[tokio::test]
    async fn test_create_job_rejects_blank_title_before_lookup() {
        let app = build_router(test_state(
            Arc::new(FakeStore::default()),
            Arc::new(FakeGenerator::new(&[], Ending::Complete)),
        ));

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/jobs")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"company_id": 1, "title": ""}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_create_job_requires_company_id() {
        let app = build_router(test_state(
            Arc::new(FakeStore::default()),
            Arc::new(FakeGenerator::new(&[], Ending::Complete)),
        ));

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/jobs")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"title": "Backend Engineer"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
