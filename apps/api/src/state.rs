use std::sync::Arc;

use sqlx::PgPool;

use crate::jobs::JobQueue;
use crate::pipeline::Pipeline;

/// Shared application state, cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub pipeline: Arc<Pipeline>,
    pub jobs: JobQueue,
}

impl AppState {
    pub fn new(db: PgPool, pipeline: Arc<Pipeline>, jobs: JobQueue) -> Self {
        Self { db, pipeline, jobs }
    }
}
