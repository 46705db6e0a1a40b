use axum::routing::{get, post};
use axum::Router;

use crate::pipeline::handlers as pipeline_handlers;
use crate::state::AppState;
use crate::storage::handlers as storage_handlers;

pub mod health;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/api/v1/roles", get(pipeline_handlers::list_roles))
        .route(
            "/api/v1/roadmaps/generate",
            post(pipeline_handlers::generate_roadmap),
        )
        .route("/api/v1/roadmaps/jobs", post(pipeline_handlers::submit_job))
        .route(
            "/api/v1/roadmaps/jobs/:id",
            get(pipeline_handlers::get_job),
        )
        .route("/api/v1/roadmaps", get(storage_handlers::list_roadmaps))
        .route(
            "/api/v1/roadmaps/:id",
            get(storage_handlers::get_roadmap).delete(storage_handlers::delete_roadmap),
        )
        .route(
            "/api/v1/roadmaps/:id/weeks/:week_index",
            get(storage_handlers::get_week),
        )
        .route(
            "/api/v1/roadmaps/:id/progress",
            get(storage_handlers::get_progress),
        )
        .route(
            "/api/v1/roadmaps/:id/tasks/:task_key/complete",
            post(storage_handlers::set_task_completion),
        )
        .with_state(state)
}
