//! Database row mappings for roadmap persistence.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct JobRow {
    pub id: Uuid,
    pub user_id: String,
    pub status: String,
    pub roadmap_id: Option<Uuid>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RoadmapRow {
    pub id: Uuid,
    pub user_id: String,
    pub target_role: String,
    pub duration_weeks: i32,
    pub weekly_hours_target: i32,
    /// Full wire document as stored JSON.
    pub document: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WeekRow {
    pub id: Uuid,
    pub roadmap_id: Uuid,
    pub week_index: i32,
    pub theme: String,
    pub weekly_task: String,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TaskRow {
    pub id: Uuid,
    pub week_id: Uuid,
    pub day_index: i32,
    pub task_key: String,
    pub skill: String,
    pub activity_type: String,
    pub description: String,
    pub est_time_minutes: i32,
    pub completed: bool,
}
