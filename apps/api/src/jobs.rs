//! Background roadmap generation: a bounded queue feeding a small worker
//! pool. Submitting returns immediately; callers poll the job row.

use std::sync::Arc;

use chrono::Utc;
use sqlx::PgPool;
use tokio::sync::{mpsc, Mutex};
use tracing::{error, info};
use uuid::Uuid;

use crate::models::wire::PlanDocument;
use crate::pipeline::Pipeline;
use crate::storage;

const QUEUE_CAPACITY: usize = 64;

#[derive(Debug)]
pub struct JobRequest {
    pub job_id: Uuid,
    pub user_id: String,
    pub resume_text: String,
    pub target_role: String,
}

/// Submission side of the queue. Cheap to clone into request handlers.
#[derive(Clone)]
pub struct JobQueue {
    tx: mpsc::Sender<JobRequest>,
}

impl JobQueue {
    /// Builds the queue and spawns `worker_count` workers sharing one
    /// receiver. Callers must insert the job row before `submit` so the id
    /// is observable by the time a worker (or poller) looks for it.
    pub fn start(pool: PgPool, pipeline: Arc<Pipeline>, worker_count: usize) -> Self {
        let (tx, rx) = mpsc::channel::<JobRequest>(QUEUE_CAPACITY);
        let rx = Arc::new(Mutex::new(rx));

        for worker_id in 0..worker_count {
            let rx = Arc::clone(&rx);
            let pool = pool.clone();
            let pipeline = Arc::clone(&pipeline);
            tokio::spawn(async move {
                loop {
                    let request = {
                        let mut rx = rx.lock().await;
                        rx.recv().await
                    };
                    let Some(request) = request else {
                        info!(worker_id, "job queue closed, worker exiting");
                        break;
                    };
                    process(&pool, &pipeline, request, worker_id).await;
                }
            });
        }

        Self { tx }
    }

    /// Enqueues a job, waiting for queue capacity if necessary.
    pub async fn submit(&self, request: JobRequest) -> anyhow::Result<()> {
        self.tx
            .send(request)
            .await
            .map_err(|_| anyhow::anyhow!("job queue is closed"))
    }
}

async fn process(pool: &PgPool, pipeline: &Pipeline, request: JobRequest, worker_id: usize) {
    let job_id = request.job_id;
    info!(worker_id, %job_id, role = %request.target_role, "job started");

    let result = run_job(pool, pipeline, &request).await;

    match result {
        Ok(roadmap_id) => {
            info!(worker_id, %job_id, %roadmap_id, "job complete");
        }
        Err(e) => {
            error!(worker_id, %job_id, "job failed: {e:#}");
            if let Err(db_err) = storage::fail_job(pool, job_id, &format!("{e:#}")).await {
                // The job row stays "in progress"; nothing more we can do
                // short of storage coming back.
                error!(%job_id, "could not mark job failed: {db_err}");
            }
        }
    }
}

async fn run_job(pool: &PgPool, pipeline: &Pipeline, request: &JobRequest) -> anyhow::Result<Uuid> {
    let outcome = pipeline
        .run(&request.resume_text, &request.target_role, &request.user_id)
        .await?;

    let document = PlanDocument::from_plan(&outcome.plan, &outcome.profile, Utc::now());
    let roadmap_id = storage::persist_plan(pool, &request.user_id, &document).await?;
    storage::complete_job(pool, request.job_id, roadmap_id).await?;
    Ok(roadmap_id)
}
