//! HTTP handlers for roadmap generation and background jobs.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::errors::AppError;
use crate::jobs::JobRequest;
use crate::models::gap::SkillGap;
use crate::models::wire::PlanDocument;
use crate::pipeline::oracle::Violation;
use crate::state::AppState;
use crate::storage;

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub user_id: String,
    pub resume_text: String,
    pub target_role: String,
}

impl GenerateRequest {
    fn validate(&self) -> Result<(), AppError> {
        if self.user_id.trim().is_empty() {
            return Err(AppError::Validation("user_id cannot be empty".into()));
        }
        if self.resume_text.trim().is_empty() {
            return Err(AppError::Validation("resume_text cannot be empty".into()));
        }
        if self.target_role.trim().is_empty() {
            return Err(AppError::Validation("target_role cannot be empty".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub plan: PlanDocument,
    pub gaps: Vec<SkillGap>,
    pub violations: Vec<Violation>,
}

/// POST /api/v1/roadmaps/generate. Runs the full pipeline synchronously.
pub async fn generate_roadmap(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, AppError> {
    request.validate()?;

    let outcome = state
        .pipeline
        .run(&request.resume_text, &request.target_role, &request.user_id)
        .await?;

    let plan = PlanDocument::from_plan(&outcome.plan, &outcome.profile, Utc::now());

    Ok(Json(GenerateResponse {
        plan,
        gaps: outcome.gaps,
        violations: outcome.violations,
    }))
}

/// POST /api/v1/roadmaps/jobs. Offloads a run to the worker pool.
/// The job row is committed before dispatch so polling can never 404 a
/// just-created job.
pub async fn submit_job(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    request.validate()?;

    let job_id = storage::create_job(&state.db, &request.user_id).await?;

    state
        .jobs
        .submit(JobRequest {
            job_id,
            user_id: request.user_id,
            resume_text: request.resume_text,
            target_role: request.target_role,
        })
        .await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({
            "job_id": job_id,
            "status": storage::JobStatus::InProgress.as_str(),
        })),
    ))
}

/// GET /api/v1/roadmaps/jobs/:id
pub async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<crate::models::rows::JobRow>, AppError> {
    let job = storage::get_job(&state.db, job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("job {job_id} not found")))?;
    Ok(Json(job))
}

/// GET /api/v1/roles. Roles available for gap analysis.
pub async fn list_roles(State(state): State<AppState>) -> Json<serde_json::Value> {
    let roles = state.pipeline.skill_graph().list_roles();
    Json(json!({ "roles": roles }))
}
