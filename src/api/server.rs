//! Router, handlers and error mapping for the HTTP API.

use axum::{
    Router,
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Json, Response},
    routing::{get, patch, post},
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::auth::{Gatekeeper, bearer_token};
use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::lifecycle::Lifecycle;
use crate::types::{
    Archive, Category, RolloverSummary, Submission, Task, TaskFilter, TaskKind, TaskStatus,
    TaskView,
};

/// State shared across handlers.
#[derive(Clone)]
pub struct ApiServer {
    engine: Arc<Lifecycle>,
    gate: Arc<Gatekeeper>,
}

impl ApiServer {
    pub fn new(engine: Arc<Lifecycle>, gate: Gatekeeper) -> Self {
        Self {
            engine,
            gate: Arc::new(gate),
        }
    }

    pub fn engine(&self) -> &Lifecycle {
        &self.engine
    }

    pub fn gate(&self) -> &Gatekeeper {
        &self.gate
    }
}

impl ErrorCode {
    /// HTTP status for this code.
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::StorageFailure => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.code.status();
        if status.is_server_error() {
            warn!(code = ?self.code, message = %self.message, "Request failed");
        }
        (status, Json(self)).into_response()
    }
}

/// Decode an optional JSON body. An empty body decodes to the default value.
fn parse_body<T: DeserializeOwned + Default>(body: &Bytes) -> ApiResult<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| {
        ApiError::new(ErrorCode::ValidationError, "Invalid JSON body").with_details(e.to_string())
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
struct SuccessResponse {
    success: bool,
}

#[derive(Serialize)]
struct MessageResponse {
    message: &'static str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AdminRequest {
    admin_password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateTaskRequest {
    admin_password: Option<String>,
    title: Option<String>,
    description: Option<String>,
    category: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitRequest {
    initials: Option<String>,
    notes: Option<String>,
    #[serde(default)]
    photos: Vec<String>,
    status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateCategoryRequest {
    admin_password: Option<String>,
    name: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteCategoryRequest {
    admin_password: Option<String>,
    id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct TaskListQuery {
    #[serde(rename = "type")]
    kind: Option<String>,
    status: Option<String>,
}

impl TaskListQuery {
    fn into_filter(self) -> ApiResult<TaskFilter> {
        let kind = match self.kind.filter(|s| !s.is_empty()) {
            Some(kind) => Some(
                kind.parse::<TaskKind>()
                    .map_err(|e| ApiError::invalid_value("type", &e.to_string()))?,
            ),
            None => None,
        };
        let status = match self.status.filter(|s| !s.is_empty()) {
            Some(status) => Some(
                status
                    .parse::<TaskStatus>()
                    .map_err(|e| ApiError::invalid_value("status", &e.to_string()))?,
            ),
            None => None,
        };
        Ok(TaskFilter { kind, status })
    }
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn verify_admin(
    State(state): State<ApiServer>,
    body: Bytes,
) -> ApiResult<Json<SuccessResponse>> {
    let req: AdminRequest = parse_body(&body)?;
    let password = req
        .admin_password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::missing_field("adminPassword"))?;
    state.gate().verify_admin(Some(&password))?;
    Ok(Json(SuccessResponse { success: true }))
}

async fn list_tasks(
    State(state): State<ApiServer>,
    Query(query): Query<TaskListQuery>,
) -> ApiResult<Json<Vec<TaskView>>> {
    let filter = query.into_filter()?;
    Ok(Json(state.engine().list_tasks(filter)?))
}

async fn create_task(State(state): State<ApiServer>, body: Bytes) -> ApiResult<Json<Task>> {
    let req: CreateTaskRequest = parse_body(&body)?;
    state.gate().verify_admin(req.admin_password.as_deref())?;
    let task = state
        .engine()
        .create_master(req.title, req.description, req.category)?;
    Ok(Json(task))
}

async fn submit_task(
    State(state): State<ApiServer>,
    Path(task_id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<Task>> {
    let req: SubmitRequest = parse_body(&body)?;
    let outcome = req
        .status
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ApiError::missing_field("status"))?
        .parse::<TaskStatus>()
        .map_err(|e| ApiError::invalid_value("status", &e.to_string()))?;
    let submission = Submission::new(req.initials, req.notes, req.photos, outcome);
    Ok(Json(state.engine().submit(&task_id, submission)?))
}

async fn undo_task(
    State(state): State<ApiServer>,
    Path(task_id): Path<String>,
) -> ApiResult<Json<Task>> {
    Ok(Json(state.engine().undo(&task_id)?))
}

async fn delete_task(
    State(state): State<ApiServer>,
    Path(task_id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<MessageResponse>> {
    let req: AdminRequest = parse_body(&body)?;
    state.gate().verify_admin(req.admin_password.as_deref())?;
    state.engine().delete_task(&task_id)?;
    Ok(Json(MessageResponse {
        message: "Task deleted successfully",
    }))
}

async fn list_categories(State(state): State<ApiServer>) -> ApiResult<Json<Vec<Category>>> {
    Ok(Json(state.engine().list_categories()?))
}

async fn create_category(
    State(state): State<ApiServer>,
    body: Bytes,
) -> ApiResult<Json<Category>> {
    let req: CreateCategoryRequest = parse_body(&body)?;
    state.gate().verify_admin(req.admin_password.as_deref())?;
    Ok(Json(state.engine().create_category(req.name, req.description)?))
}

async fn delete_category(
    State(state): State<ApiServer>,
    body: Bytes,
) -> ApiResult<Json<MessageResponse>> {
    let req: DeleteCategoryRequest = parse_body(&body)?;
    state.gate().verify_admin(req.admin_password.as_deref())?;
    state.engine().delete_category(req.id)?;
    Ok(Json(MessageResponse {
        message: "Category deleted successfully",
    }))
}

async fn list_archives(State(state): State<ApiServer>) -> ApiResult<Json<Vec<Archive>>> {
    Ok(Json(state.engine().list_archives()?))
}

/// Rollover triggered by the external scheduler with its bearer secret.
async fn scheduled_rollover(
    State(state): State<ApiServer>,
    headers: HeaderMap,
) -> ApiResult<Json<RolloverSummary>> {
    let header = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    state.gate().verify_scheduler(bearer_token(header))?;
    info!("Scheduled rollover triggered");
    Ok(Json(state.engine().rollover()?))
}

/// Rollover triggered by an admin.
async fn manual_rollover(
    State(state): State<ApiServer>,
    body: Bytes,
) -> ApiResult<Json<RolloverSummary>> {
    let req: AdminRequest = parse_body(&body)?;
    state.gate().verify_admin(req.admin_password.as_deref())?;
    info!("Manual rollover triggered");
    Ok(Json(state.engine().rollover()?))
}

/// Build the router with all routes.
pub fn build_router(state: ApiServer) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health))
        .route("/api/auth", post(verify_admin))
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route(
            "/api/tasks/{task_id}",
            patch(submit_task).put(undo_task).delete(delete_task),
        )
        .route(
            "/api/categories",
            get(list_categories)
                .post(create_category)
                .delete(delete_category),
        )
        .route("/api/archives", get(list_archives))
        .route(
            "/api/cron/deploy-tasks",
            get(scheduled_rollover).post(manual_rollover),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server.
///
/// Returns a oneshot sender that signals shutdown, and the bound address.
pub async fn start_server(
    state: ApiServer,
    addr: SocketAddr,
) -> anyhow::Result<(oneshot::Sender<()>, SocketAddr)> {
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    info!("API server listening on http://{}", bound_addr);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                info!("API server shutting down");
            })
            .await
        {
            tracing::error!("API server error: {}", e);
        }
    });

    Ok((shutdown_tx, bound_addr))
}
