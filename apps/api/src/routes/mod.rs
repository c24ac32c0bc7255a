pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::applications::handlers as applications;
use crate::companies::handlers as companies;
use crate::generation::handlers as generation;
use crate::jobs::handlers as jobs;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health::root_handler))
        .route("/health", get(health::health_handler))
        // Companies
        .route(
            "/companies",
            post(companies::handle_create_company).get(companies::handle_list_companies),
        )
        .route(
            "/companies/:id",
            get(companies::handle_get_company)
                .put(companies::handle_update_company)
                .delete(companies::handle_delete_company),
        )
        // Job postings
        .route(
            "/jobs",
            post(jobs::handle_create_job).get(jobs::handle_list_jobs),
        )
        .route(
            "/jobs/:id",
            get(jobs::handle_get_job)
                .put(jobs::handle_update_job)
                .delete(jobs::handle_delete_job),
        )
        // Description generation
        .route(
            "/jobs/:id/description",
            post(generation::handle_generate_description),
        )
        .route(
            "/jobs/:id/description/stream",
            post(generation::handle_stream_description),
        )
        // Applications
        .route(
            "/applications",
            post(applications::handle_create_application)
                .get(applications::handle_list_applications),
        )
        .route(
            "/applications/:id",
            get(applications::handle_get_application)
                .put(applications::handle_update_application)
                .delete(applications::handle_delete_application),
        )
        .with_state(state)
}
