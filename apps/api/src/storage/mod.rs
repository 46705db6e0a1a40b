//! Persistence for background jobs and generated roadmaps.
//!
//! Invariant at the job boundary: the job row is inserted before the job is
//! handed to the worker queue, so a polling client can never observe a
//! dispatched-but-nonexistent job.

use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::rows::{JobRow, RoadmapRow, TaskRow, WeekRow};
use crate::models::wire::PlanDocument;

pub mod handlers;

/// Background job lifecycle. "in progress" is the only non-terminal state;
/// a worker crash after `fail_job` leaves an explicit terminal record
/// instead of a silently stuck row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    InProgress,
    Complete,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::InProgress => "in progress",
            JobStatus::Complete => "complete",
            JobStatus::Failed => "failed",
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Jobs
// ────────────────────────────────────────────────────────────────────────────

pub async fn create_job(pool: &PgPool, user_id: &str) -> Result<Uuid, sqlx::Error> {
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO roadmap_jobs (id, user_id, status, created_at, updated_at)
         VALUES ($1, $2, $3, NOW(), NOW())",
    )
    .bind(id)
    .bind(user_id)
    .bind(JobStatus::InProgress.as_str())
    .execute(pool)
    .await?;
    Ok(id)
}

pub async fn complete_job(
    pool: &PgPool,
    job_id: Uuid,
    roadmap_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE roadmap_jobs
         SET status = $1, roadmap_id = $2, updated_at = NOW()
         WHERE id = $3",
    )
    .bind(JobStatus::Complete.as_str())
    .bind(roadmap_id)
    .bind(job_id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn fail_job(pool: &PgPool, job_id: Uuid, error: &str) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE roadmap_jobs
         SET status = $1, error_message = $2, updated_at = NOW()
         WHERE id = $3",
    )
    .bind(JobStatus::Failed.as_str())
    .bind(error)
    .bind(job_id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn get_job(pool: &PgPool, job_id: Uuid) -> Result<Option<JobRow>, sqlx::Error> {
    sqlx::query_as::<_, JobRow>(
        "SELECT id, user_id, status, roadmap_id, error_message, created_at, updated_at
         FROM roadmap_jobs WHERE id = $1",
    )
    .bind(job_id)
    .fetch_optional(pool)
    .await
}

// ────────────────────────────────────────────────────────────────────────────
// Roadmaps
// ────────────────────────────────────────────────────────────────────────────

/// Serializes a plan document for the JSONB `document` column.
fn encode_document(document: &PlanDocument) -> Result<serde_json::Value, sqlx::Error> {
    serde_json::to_value(document).map_err(|e| sqlx::Error::Decode(Box::new(e)))
}

/// Persists a completed plan document and its denormalized week/task rows in
/// one transaction, returning the new roadmap id.
pub async fn persist_plan(
    pool: &PgPool,
    user_id: &str,
    document: &PlanDocument,
) -> Result<Uuid, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let roadmap_id = Uuid::new_v4();
    let document_json = encode_document(document)?;

    sqlx::query(
        "INSERT INTO roadmaps (id, user_id, target_role, duration_weeks, weekly_hours_target, document, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, NOW())",
    )
    .bind(roadmap_id)
    .bind(user_id)
    .bind(&document.meta.target_role)
    .bind(document.meta.duration_weeks as i32)
    .bind(document.meta.weekly_hours_target as i32)
    .bind(&document_json)
    .execute(&mut *tx)
    .await?;

    for week in &document.roadmap.weeks {
        let week_id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO weeks (id, roadmap_id, week_index, theme, weekly_task)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(week_id)
        .bind(roadmap_id)
        .bind(week.week_index as i32)
        .bind(&week.theme)
        .bind(&week.weekly_task)
        .execute(&mut *tx)
        .await?;

        for day in &week.daily_tasks {
            for task in &day.tasks {
                sqlx::query(
                    "INSERT INTO daily_tasks (id, week_id, day_index, task_key, skill, activity_type, description, est_time_minutes, completed)
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, FALSE)",
                )
                .bind(Uuid::new_v4())
                .bind(week_id)
                .bind(day.day_index as i32)
                .bind(&task.id)
                .bind(&task.skill)
                .bind(&task.activity_type)
                .bind(&task.description)
                .bind(task.est_time_minutes as i32)
                .execute(&mut *tx)
                .await?;
            }
        }
    }

    tx.commit().await?;
    Ok(roadmap_id)
}

pub async fn get_roadmap(pool: &PgPool, id: Uuid) -> Result<Option<RoadmapRow>, sqlx::Error> {
    sqlx::query_as::<_, RoadmapRow>(
        "SELECT id, user_id, target_role, duration_weeks, weekly_hours_target, document, created_at
         FROM roadmaps WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn list_user_roadmaps(
    pool: &PgPool,
    user_id: &str,
) -> Result<Vec<RoadmapRow>, sqlx::Error> {
    sqlx::query_as::<_, RoadmapRow>(
        "SELECT id, user_id, target_role, duration_weeks, weekly_hours_target, document, created_at
         FROM roadmaps WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// One week plus its tasks and a completion rate over them.
#[derive(Debug, Serialize)]
pub struct WeekDetail {
    #[serde(flatten)]
    pub week: WeekRow,
    pub tasks: Vec<TaskRow>,
    pub completion_rate: f32,
}

pub async fn get_week(
    pool: &PgPool,
    roadmap_id: Uuid,
    week_index: i32,
) -> Result<Option<WeekDetail>, sqlx::Error> {
    let week = sqlx::query_as::<_, WeekRow>(
        "SELECT id, roadmap_id, week_index, theme, weekly_task
         FROM weeks WHERE roadmap_id = $1 AND week_index = $2",
    )
    .bind(roadmap_id)
    .bind(week_index)
    .fetch_optional(pool)
    .await?;

    let Some(week) = week else {
        return Ok(None);
    };

    let tasks = sqlx::query_as::<_, TaskRow>(
        "SELECT id, week_id, day_index, task_key, skill, activity_type, description, est_time_minutes, completed
         FROM daily_tasks WHERE week_id = $1 ORDER BY day_index, task_key",
    )
    .bind(week.id)
    .fetch_all(pool)
    .await?;

    let completion_rate = if tasks.is_empty() {
        0.0
    } else {
        tasks.iter().filter(|t| t.completed).count() as f32 / tasks.len() as f32
    };

    Ok(Some(WeekDetail {
        week,
        tasks,
        completion_rate,
    }))
}

/// Progress summary across a whole roadmap.
#[derive(Debug, Serialize)]
pub struct Progress {
    pub roadmap_id: Uuid,
    pub total_tasks: i64,
    pub completed_tasks: i64,
    pub completion_rate: f32,
    /// First week with an incomplete task; equals duration when all done.
    pub current_week: i32,
}

pub async fn get_progress(pool: &PgPool, roadmap_id: Uuid) -> Result<Option<Progress>, sqlx::Error> {
    let Some(roadmap) = get_roadmap(pool, roadmap_id).await? else {
        return Ok(None);
    };

    let (total, completed): (i64, i64) = sqlx::query_as(
        "SELECT COUNT(*), COUNT(*) FILTER (WHERE t.completed)
         FROM daily_tasks t JOIN weeks w ON w.id = t.week_id
         WHERE w.roadmap_id = $1",
    )
    .bind(roadmap_id)
    .fetch_one(pool)
    .await?;

    let current_week: Option<i32> = sqlx::query_scalar(
        "SELECT MIN(w.week_index)
         FROM weeks w JOIN daily_tasks t ON t.week_id = w.id
         WHERE w.roadmap_id = $1 AND NOT t.completed",
    )
    .bind(roadmap_id)
    .fetch_one(pool)
    .await?;

    let completion_rate = if total == 0 {
        0.0
    } else {
        completed as f32 / total as f32
    };

    Ok(Some(Progress {
        roadmap_id,
        total_tasks: total,
        completed_tasks: completed,
        completion_rate,
        current_week: current_week.unwrap_or(roadmap.duration_weeks),
    }))
}

/// Returns false when no task matched the key.
pub async fn set_task_completion(
    pool: &PgPool,
    roadmap_id: Uuid,
    task_key: &str,
    completed: bool,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE daily_tasks t
         SET completed = $1
         FROM weeks w
         WHERE t.week_id = w.id AND w.roadmap_id = $2 AND t.task_key = $3",
    )
    .bind(completed)
    .bind(roadmap_id)
    .bind(task_key)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Deletes a roadmap; weeks and tasks cascade via foreign keys.
pub async fn delete_roadmap(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM roadmaps WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::plan::tests::sample_plan;
    use crate::models::profile::Profile;
    use chrono::Utc;

    #[test]
    fn test_encode_document_produces_json_object() {
        let plan = sample_plan("full_stack_engineer", "html_mdn");
        let document = PlanDocument::from_plan(&plan, &Profile::fallback("user_001"), Utc::now());

        let value = encode_document(&document).unwrap();
        assert!(value.is_object());
        assert_eq!(value["meta"]["target_role"], "full_stack_engineer");
        assert_eq!(value["roadmap"]["weeks"].as_array().unwrap().len(), 12);
    }

    #[test]
    fn test_job_status_strings() {
        assert_eq!(JobStatus::InProgress.as_str(), "in progress");
        assert_eq!(JobStatus::Complete.as_str(), "complete");
        assert_eq!(JobStatus::Failed.as_str(), "failed");
    }
}
