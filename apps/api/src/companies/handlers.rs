use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::models::company::{Company, CompanyFilter, CompanyUpdate, NewCompany};
use crate::models::{require_non_blank, Page};
use crate::state::AppState;
use crate::store::find_company;

/// POST /companies
pub async fn handle_create_company(
    State(state): State<AppState>,
    Json(req): Json<NewCompany>,
) -> Result<(StatusCode, Json<Company>), AppError> {
    require_non_blank("name", &req.name)?;

    let company = sqlx::query_as::<_, Company>(
        r#"
        INSERT INTO "Company" (name, industry, url, headcount, country, state, city, "isPublic")
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(req.name.trim())
    .bind(&req.industry)
    .bind(&req.url)
    .bind(req.headcount)
    .bind(&req.country)
    .bind(&req.state)
    .bind(&req.city)
    .bind(req.is_public)
    .fetch_one(&state.db)
    .await?;

    tracing::info!("Created company {} ({})", company.id, company.name);
    Ok((StatusCode::CREATED, Json(company)))
}

/// GET /companies?industry=&skip=&limit=
pub async fn handle_list_companies(
    State(state): State<AppState>,
    Query(filter): Query<CompanyFilter>,
    Query(page): Query<Page>,
) -> Result<Json<Vec<Company>>, AppError> {
    let (skip, limit) = page.clamped();

    let companies = sqlx::query_as::<_, Company>(
        r#"
        SELECT * FROM "Company"
        WHERE ($1::text IS NULL OR industry = $1)
        ORDER BY id
        OFFSET $2 LIMIT $3
        "#,
    )
    .bind(&filter.industry)
    .bind(skip)
    .bind(limit)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(companies))
}

/// GET /companies/:id
pub async fn handle_get_company(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Company>, AppError> {
    let company = find_company(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Company {id} not found")))?;
    Ok(Json(company))
}

/// PUT /companies/:id
///
/// Only the fields present in the body change.
pub async fn handle_update_company(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(req): Json<CompanyUpdate>,
) -> Result<Json<Company>, AppError> {
    if let Some(name) = &req.name {
        require_non_blank("name", name)?;
    }

    let company = sqlx::query_as::<_, Company>(
        r#"
        UPDATE "Company" SET
            name       = COALESCE($1, name),
            industry   = COALESCE($2, industry),
            url        = COALESCE($3, url),
            headcount  = COALESCE($4, headcount),
            country    = COALESCE($5, country),
            state      = COALESCE($6, state),
            city       = COALESCE($7, city),
            "isPublic" = COALESCE($8, "isPublic")
        WHERE id = $9
        RETURNING *
        "#,
    )
    .bind(req.name.as_deref().map(str::trim))
    .bind(&req.industry)
    .bind(&req.url)
    .bind(req.headcount)
    .bind(&req.country)
    .bind(&req.state)
    .bind(&req.city)
    .bind(req.is_public)
    .bind(id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Company {id} not found")))?;

    Ok(Json(company))
}

/// DELETE /companies/:id
pub async fn handle_delete_company(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Value>, AppError> {
    let result = sqlx::query(r#"DELETE FROM "Company" WHERE id = $1"#)
        .bind(id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Company {id} not found")));
    }

    tracing::info!("Deleted company {id}");
    Ok(Json(json!({ "message": "Company deleted successfully" })))
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

    fn app() -> axum::Router {
        build_router(test_state(
            Arc::new(FakeStore::default()),
            Arc::new(FakeGenerator::new(&[], Ending::Complete)),
        ))
    }

    #[tokio::test]
    async fn test_create_company_rejects_blank_name() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/companies")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"name": "   ", "industry": "Retail"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_non_integer_id_is_rejected() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/companies/acme")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
