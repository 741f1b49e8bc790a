use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use shared::{
    domain::TaskId,
    error::{ApiError, ErrorCode},
    protocol::{CreateTaskRequest, RandomUserResponse, RemoteTask, UpdateTaskRequest},
};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

mod api;
mod app_state;
mod config;

use api::ApiContext;
use app_state::AppState;
use config::load_settings;

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

#[derive(Debug, Deserialize)]
struct RandomUserQuery {
    results: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = load_settings();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let api = ApiContext::new(settings.seed_tasks, settings.rng_seed);
    info!(tasks = api.catalog().len(), "catalog seeded");
    let app = build_router(Arc::new(AppState { api }));

    let addr: SocketAddr = settings
        .bind_addr
        .parse()
        .with_context(|| format!("invalid bind address '{}'", settings.bind_addr))?;
    info!(%addr, "placeholder api listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/todos", get(list_todos).post(create_todo))
        .route(
            "/todos/:id",
            get(get_todo).put(update_todo).delete(delete_todo),
        )
        .route("/api", get(random_users))
        .route("/api/", get(random_users))
        .with_state(state)
}

fn reject(err: ApiError) -> (StatusCode, Json<ApiError>) {
    let status = match err.code {
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    };
    warn!(?status, message = %err.message, "request rejected");
    (status, Json(err))
}

async fn healthz() -> &'static str {
    "ok"
}

async fn list_todos(State(state): State<Arc<AppState>>) -> Json<Vec<RemoteTask>> {
    Json(api::list_tasks(&state.api))
}

async fn get_todo(State(state): State<Arc<AppState>>, Path(id): Path<i64>) -> ApiResult<RemoteTask> {
    api::get_task(&state.api, TaskId(id)).map(Json).map_err(reject)
}

async fn create_todo(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateTaskRequest>,
) -> (StatusCode, Json<RemoteTask>) {
    let created = api::create_task(&state.api, req);
    debug!(task_id = %created.id, "create answered");
    (StatusCode::CREATED, Json(created))
}

async fn update_todo(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<RemoteTask> {
    let updated = api::update_task(&state.api, TaskId(id), req).map_err(reject)?;
    debug!(task_id = id, "update answered");
    Ok(Json(updated))
}

async fn delete_todo(Path(id): Path<i64>) -> Json<serde_json::Value> {
    debug!(task_id = id, "delete answered");
    Json(serde_json::json!({}))
}

async fn random_users(
    State(state): State<Arc<AppState>>,
    Query(q): Query<RandomUserQuery>,
) -> Json<RandomUserResponse> {
    let count = api::result_count(q.results);
    Json(RandomUserResponse {
        results: api::random_users(&state.api, count),
    })
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
