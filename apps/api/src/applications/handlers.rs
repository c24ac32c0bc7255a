use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::models::application::{
    Application, ApplicationFilter, ApplicationUpdate, NewApplication,
};
use crate::models::{require_non_blank, Page};
use crate::state::AppState;
use crate::store::find_job_posting;

async fn ensure_job_exists(state: &AppState, job_id: i32) -> Result<(), AppError> {
    match find_job_posting(&state.db, job_id).await? {
        Some(_) => Ok(()),
        None => Err(AppError::NotFound(format!("Job posting {job_id} not found"))),
    }
}

/// POST /applications
pub async fn handle_create_application(
    State(state): State<AppState>,
    Json(req): Json<NewApplication>,
) -> Result<(StatusCode, Json<Application>), AppError> {
    req.validate()?;
    ensure_job_exists(&state, req.job_id).await?;

    let application = sqlx::query_as::<_, Application>(
        r#"
        INSERT INTO "Application" (job_id, candidate_id, name, email, status, created_at)
        VALUES ($1, $2, $3, $4, $5, now())
        RETURNING *
        "#,
    )
    .bind(req.job_id)
    .bind(req.candidate_id.trim())
    .bind(req.name.trim())
    .bind(req.email.trim())
    .bind(req.status.trim())
    .fetch_one(&state.db)
    .await?;

    tracing::info!(
        "Created application {} for job {}",
        application.id,
        application.job_id
    );
    Ok((StatusCode::CREATED, Json(application)))
}

/// GET /applications?job_id=&candidate_id=&email=&status=&skip=&limit=
pub async fn handle_list_applications(
    State(state): State<AppState>,
    Query(filter): Query<ApplicationFilter>,
    Query(page): Query<Page>,
) -> Result<Json<Vec<Application>>, AppError> {
    let (skip, limit) = page.clamped();

    let applications = sqlx::query_as::<_, Application>(
        r#"
        SELECT * FROM "Application"
        WHERE ($1::int IS NULL OR job_id = $1)
          AND ($2::text IS NULL OR candidate_id = $2)
          AND ($3::text IS NULL OR email = $3)
          AND ($4::text IS NULL OR status = $4)
        ORDER BY id
        OFFSET $5 LIMIT $6
        "#,
    )
    .bind(filter.job_id)
    .bind(&filter.candidate_id)
    .bind(&filter.email)
    .bind(&filter.status)
    .bind(skip)
    .bind(limit)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(applications))
}

/// GET /applications/:id
pub async fn handle_get_application(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Application>, AppError> {
    let application =
        sqlx::query_as::<_, Application>(r#"SELECT * FROM "Application" WHERE id = $1"#)
            .bind(id)
            .fetch_optional(&state.db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Application {id} not found")))?;
    Ok(Json(application))
}

/// PUT /applications/:id
pub async fn handle_update_application(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(req): Json<ApplicationUpdate>,
) -> Result<Json<Application>, AppError> {
    req.validate()?;
    for (field, value) in [
        ("candidate_id", &req.candidate_id),
        ("name", &req.name),
        ("status", &req.status),
    ] {
        if let Some(value) = value {
            require_non_blank(field, value)?;
        }
    }
    if let Some(job_id) = req.job_id {
        ensure_job_exists(&state, job_id).await?;
    }

    let application = sqlx::query_as::<_, Application>(
        r#"
        UPDATE "Application" SET
            job_id       = COALESCE($1, job_id),
            candidate_id = COALESCE($2, candidate_id),
            name         = COALESCE($3, name),
            email        = COALESCE($4, email),
            status       = COALESCE($5, status),
            updated_at   = now()
        WHERE id = $6
        RETURNING *
        "#,
    )
    .bind(req.job_id)
    .bind(req.candidate_id.as_deref().map(str::trim))
    .bind(req.name.as_deref().map(str::trim))
    .bind(req.email.as_deref().map(str::trim))
    .bind(req.status.as_deref().map(str::trim))
    .bind(id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Application {id} not found")))?;

    Ok(Json(application))
}

/// DELETE /applications/:id
pub async fn handle_delete_application(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Value>, AppError> {
    let result = sqlx::query(r#"DELETE FROM "Application" WHERE id = $1"#)
        .bind(id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Application {id} not found")));
    }

    Ok(Json(json!({ "message": "Application deleted successfully" })))
}
