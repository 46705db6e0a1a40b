use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod catalog;
mod config;
mod db;
mod errors;
mod jobs;
mod llm_client;
mod models;
mod pipeline;
mod routes;
mod skill_graph;
mod state;
mod storage;

use catalog::ResourceCatalog;
use config::Config;
use jobs::JobQueue;
use llm_client::LlmClient;
use pipeline::oracle::{ClipMinutes, ReportOnly, ViolationPolicy};
use pipeline::Pipeline;
use skill_graph::SkillGraph;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| config.rust_log.clone().into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting roadmap API server...");

    let pool = db::create_pool(&config.database_url, config.db_max_connections).await?;
    info!("Database pool ready");

    let skill_graph = Arc::new(SkillGraph::load(config.data_dir.as_deref())?);
    let catalog = Arc::new(ResourceCatalog::load(config.data_dir.as_deref())?);
    info!(
        roles = skill_graph.list_roles().len(),
        resources = catalog.all_ids().len(),
        "skill graph and resource catalog loaded"
    );

    let policy: Arc<dyn ViolationPolicy> = if config.clip_violations {
        Arc::new(ClipMinutes)
    } else {
        Arc::new(ReportOnly)
    };
    info!(policy = policy.name(), "violation policy selected");

    let llm = Arc::new(LlmClient::new(config.anthropic_api_key.clone()));
    let pipeline = Arc::new(Pipeline::new(llm, skill_graph, catalog, policy));

    let jobs = JobQueue::start(pool.clone(), Arc::clone(&pipeline), config.worker_count);
    info!(workers = config.worker_count, "background workers started");

    let state = AppState::new(pool, pipeline, jobs);

    let app = routes::build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
