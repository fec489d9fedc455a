//! HTTP server implementation.
//!
//! This module provides the axum router for the task endpoints and the
//! server lifecycle (bind, serve, graceful shutdown).

use axum::{
    Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

use super::auth::CurrentUser;
use crate::db::Database;
use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::service::TaskService;
use crate::types::{DeleteConfirmation, Task, TaskId};

/// Server state shared across handlers.
#[derive(Clone)]
pub struct ApiServer {
    service: TaskService,
}

impl ApiServer {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            service: TaskService::new(db),
        }
    }

    pub fn service(&self) -> &TaskService {
        &self.service
    }
}

/// Health check response.
#[derive(serde::Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// HTTP status for each error code.
pub fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::ValidationFailed => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorCode::BadRequest => StatusCode::BAD_REQUEST,
        ErrorCode::Unauthenticated => StatusCode::UNAUTHORIZED,
        ErrorCode::TaskNotFound | ErrorCode::SubtaskNotFound => StatusCode::NOT_FOUND,
        ErrorCode::DatabaseError | ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(self.code);
        if status.is_server_error() {
            error!(code = ?self.code, details = ?self.details, "{}", self.message);
        } else {
            debug!(code = ?self.code, status = status.as_u16(), "{}", self.message);
        }
        (status, Json(self)).into_response()
    }
}

/// Unwrap a JSON body, turning extractor rejections into `BAD_REQUEST`.
fn json_body(body: Result<Json<Value>, JsonRejection>) -> ApiResult<Value> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ApiError::bad_request(rejection.body_text()))
}

/// Non-numeric ids cannot match any task, so they are simply not found.
fn parse_task_id(raw: &str) -> ApiResult<TaskId> {
    raw.parse::<TaskId>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| ApiError::task_not_found(raw))
}

/// GET /tasks
async fn list_tasks(
    State(state): State<ApiServer>,
    CurrentUser(owner): CurrentUser,
) -> ApiResult<Json<Vec<Task>>> {
    state.service().list(owner).map(Json)
}

/// POST /tasks
async fn create_task(
    State(state): State<ApiServer>,
    CurrentUser(owner): CurrentUser,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let payload = json_body(body)?;
    let task = state.service().create(owner, &payload)?;
    Ok((StatusCode::CREATED, Json(task)))
}

/// GET /tasks/{task_id}
async fn show_task(
    State(state): State<ApiServer>,
    CurrentUser(owner): CurrentUser,
    Path(task_id): Path<String>,
) -> ApiResult<Json<Task>> {
    let task_id = parse_task_id(&task_id)?;
    state.service().show(owner, task_id).map(Json)
}

/// PUT/PATCH /tasks/{task_id}
async fn update_task(
    State(state): State<ApiServer>,
    CurrentUser(owner): CurrentUser,
    Path(task_id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<Task>> {
    let task_id = parse_task_id(&task_id)?;
    let payload = json_body(body)?;
    state.service().update(owner, task_id, &payload).map(Json)
}

/// DELETE /tasks/{task_id}
async fn delete_task(
    State(state): State<ApiServer>,
    CurrentUser(owner): CurrentUser,
    Path(task_id): Path<String>,
) -> ApiResult<Json<DeleteConfirmation>> {
    let task_id = parse_task_id(&task_id)?;
    state.service().delete(owner, task_id).map(Json)
}

/// Health check endpoint.
async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Build the router with all routes.
pub fn build_router(state: ApiServer) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/tasks", get(list_tasks).post(create_task))
        .route(
            "/tasks/{task_id}",
            get(show_task)
                .put(update_task)
                .patch(update_task)
                .delete(delete_task),
        )
        .route("/api/health", get(health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Handle for a running server.
pub struct ServerHandle {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl ServerHandle {
    /// Address the server is actually bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Signal shutdown and wait for in-flight requests to finish.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Err(e) = self.task.await {
            error!("Server task ended abnormally: {}", e);
        }
    }
}

/// Start the HTTP server on `host:port` (port 0 picks a free port).
pub async fn start_server(db: Arc<Database>, host: &str, port: u16) -> anyhow::Result<ServerHandle> {
    let app = build_router(ApiServer::new(db));

    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    let addr = listener.local_addr()?;

    info!("Task API listening on http://{}", addr);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                info!("Task API shutting down");
            })
            .await
        {
            error!("Server error: {}", e);
        }
    });

    Ok(ServerHandle {
        addr,
        shutdown_tx: Some(shutdown_tx),
        task,
    })
}
