//! HTTP handlers over persisted roadmaps.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::rows::RoadmapRow;
use crate::state::AppState;
use crate::storage;

/// GET /api/v1/roadmaps/:id
pub async fn get_roadmap(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RoadmapRow>, AppError> {
    let roadmap = storage::get_roadmap(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("roadmap {id} not found")))?;
    Ok(Json(roadmap))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub user_id: String,
}

/// GET /api/v1/roadmaps?user_id=...
pub async fn list_roadmaps(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<RoadmapRow>>, AppError> {
    if query.user_id.trim().is_empty() {
        return Err(AppError::Validation("user_id cannot be empty".into()));
    }
    let roadmaps = storage::list_user_roadmaps(&state.db, &query.user_id).await?;
    Ok(Json(roadmaps))
}

/// GET /api/v1/roadmaps/:id/weeks/:week_index
pub async fn get_week(
    State(state): State<AppState>,
    Path((id, week_index)): Path<(Uuid, i32)>,
) -> Result<Json<storage::WeekDetail>, AppError> {
    let week = storage::get_week(&state.db, id, week_index)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("week {week_index} of roadmap {id} not found"))
        })?;
    Ok(Json(week))
}

/// GET /api/v1/roadmaps/:id/progress
pub async fn get_progress(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<storage::Progress>, AppError> {
    let progress = storage::get_progress(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("roadmap {id} not found")))?;
    Ok(Json(progress))
}

#[derive(Debug, Deserialize)]
pub struct CompletionRequest {
    #[serde(default = "default_completed")]
    pub completed: bool,
}

fn default_completed() -> bool {
    true
}

/// POST /api/v1/roadmaps/:id/tasks/:task_key/complete
pub async fn set_task_completion(
    State(state): State<AppState>,
    Path((id, task_key)): Path<(Uuid, String)>,
    Json(request): Json<CompletionRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let updated =
        storage::set_task_completion(&state.db, id, &task_key, request.completed).await?;
    if !updated {
        return Err(AppError::NotFound(format!(
            "task {task_key} not found in roadmap {id}"
        )));
    }
    Ok(Json(json!({
        "task_key": task_key,
        "completed": request.completed,
    })))
}

/// DELETE /api/v1/roadmaps/:id
pub async fn delete_roadmap(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let deleted = storage::delete_roadmap(&state.db, id).await?;
    if !deleted {
        return Err(AppError::NotFound(format!("roadmap {id} not found")));
    }
    Ok(Json(json!({ "deleted": id })))
}
