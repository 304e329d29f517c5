//! Lab tasks and topics behind the access-token gate.
//!
//! Every route authenticates first; the admin routes then apply the role
//! check explicitly. Task attachments live under a configured data directory
//! and are streamed back as downloads.

pub(crate) mod storage;
pub(crate) mod types;

use axum::{
    extract::{Extension, Path, Query},
    http::{
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;
use std::{path::PathBuf, sync::Arc};
use tracing::{error, warn};
use utoipa::IntoParams;

use super::auth::principal::{require_admin, require_auth};
use super::auth::AuthState;
use storage::{
    delete_task as delete_task_row, insert_task, list_topics, lookup_task, search_tasks,
    topic_exists, update_task as update_task_row,
};
use types::{task_out, topic_out, CreateLabTaskRequest, LabTaskOut, TopicOut};

/// Where task attachments are read from.
pub struct LabsState {
    data_dir: PathBuf,
}

impl LabsState {
    #[must_use]
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    fn data_dir(&self) -> &PathBuf {
        &self.data_dir
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct SearchParams {
    /// Case-insensitive substring matched against title and description.
    pub q: Option<String>,
    /// Restrict results to one topic.
    pub topic_id: Option<i64>,
}

fn labs_error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({"error": message}))).into_response()
}

#[utoipa::path(
    get,
    path = "/topics",
    responses(
        (status = 200, description = "All topics", body = [TopicOut]),
        (status = 401, description = "Missing or invalid access token")
    ),
    tag = "labs"
)]
pub async fn topics(
    headers: HeaderMap,
    pool: Extension<SqlitePool>,
    auth_state: Extension<Arc<AuthState>>,
) -> impl IntoResponse {
    if let Err(failure) = require_auth(&headers, &pool, &auth_state).await {
        return failure.into_response();
    }

    match list_topics(&pool).await {
        Ok(records) => {
            let body: Vec<TopicOut> = records.iter().map(topic_out).collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(err) => {
            error!("Failed to list topics: {err}");
            labs_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}

#[utoipa::path(
    get,
    path = "/search",
    params(SearchParams),
    responses(
        (status = 200, description = "Tasks matching the filters", body = [LabTaskOut]),
        (status = 401, description = "Missing or invalid access token")
    ),
    tag = "labs"
)]
pub async fn search(
    headers: HeaderMap,
    pool: Extension<SqlitePool>,
    auth_state: Extension<Arc<AuthState>>,
    params: Query<SearchParams>,
) -> impl IntoResponse {
    if let Err(failure) = require_auth(&headers, &pool, &auth_state).await {
        return failure.into_response();
    }

    match search_tasks(&pool, params.q.as_deref(), params.topic_id).await {
        Ok(records) => {
            let body: Vec<LabTaskOut> = records.iter().map(task_out).collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(err) => {
            error!("Failed to search tasks: {err}");
            labs_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}

#[utoipa::path(
    get,
    path = "/tasks/{task_id}",
    params(("task_id" = i64, Path, description = "Task id")),
    responses(
        (status = 200, description = "Task details", body = LabTaskOut),
        (status = 401, description = "Missing or invalid access token"),
        (status = 404, description = "Task not found")
    ),
    tag = "labs"
)]
pub async fn task(
    headers: HeaderMap,
    pool: Extension<SqlitePool>,
    auth_state: Extension<Arc<AuthState>>,
    Path(task_id): Path<i64>,
) -> impl IntoResponse {
    if let Err(failure) = require_auth(&headers, &pool, &auth_state).await {
        return failure.into_response();
    }

    match lookup_task(&pool, task_id).await {
        Ok(Some(record)) => (StatusCode::OK, Json(task_out(&record))).into_response(),
        Ok(None) => labs_error(StatusCode::NOT_FOUND, "Task not found"),
        Err(err) => {
            error!("Failed to fetch task {task_id}: {err}");
            labs_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}

#[utoipa::path(
    get,
    path = "/tasks/{task_id}/download",
    params(("task_id" = i64, Path, description = "Task id")),
    responses(
        (status = 200, description = "Task attachment bytes"),
        (status = 401, description = "Missing or invalid access token"),
        (status = 404, description = "Task or file not found")
    ),
    tag = "labs"
)]
pub async fn download_file(
    headers: HeaderMap,
    pool: Extension<SqlitePool>,
    auth_state: Extension<Arc<AuthState>>,
    labs_state: Extension<Arc<LabsState>>,
    Path(task_id): Path<i64>,
) -> impl IntoResponse {
    if let Err(failure) = require_auth(&headers, &pool, &auth_state).await {
        return failure.into_response();
    }

    let record = match lookup_task(&pool, task_id).await {
        Ok(Some(record)) => record,
        Ok(None) => return labs_error(StatusCode::NOT_FOUND, "Task not found"),
        Err(err) => {
            error!("Failed to fetch task {task_id}: {err}");
            return labs_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
        }
    };

    match record.file_path.as_deref() {
        Some(relative) => send_attachment(&labs_state, relative, "File not found").await,
        None => labs_error(StatusCode::NOT_FOUND, "File not found"),
    }
}

#[utoipa::path(
    get,
    path = "/tasks/{task_id}/download-solution",
    params(("task_id" = i64, Path, description = "Task id")),
    responses(
        (status = 200, description = "Solution attachment bytes"),
        (status = 401, description = "Missing or invalid access token"),
        (status = 404, description = "Task or solution file not found")
    ),
    tag = "labs"
)]
pub async fn download_solution(
    headers: HeaderMap,
    pool: Extension<SqlitePool>,
    auth_state: Extension<Arc<AuthState>>,
    labs_state: Extension<Arc<LabsState>>,
    Path(task_id): Path<i64>,
) -> impl IntoResponse {
    if let Err(failure) = require_auth(&headers, &pool, &auth_state).await {
        return failure.into_response();
    }

    let record = match lookup_task(&pool, task_id).await {
        Ok(Some(record)) => record,
        Ok(None) => return labs_error(StatusCode::NOT_FOUND, "Task not found"),
        Err(err) => {
            error!("Failed to fetch task {task_id}: {err}");
            return labs_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
        }
    };

    match record.solution_file_path.as_deref() {
        Some(relative) => send_attachment(&labs_state, relative, "Solution file not found").await,
        None => labs_error(StatusCode::NOT_FOUND, "Solution file not found"),
    }
}

/// Read an attachment below the data dir and wrap it as a download.
async fn send_attachment(labs_state: &LabsState, relative: &str, missing: &str) -> Response {
    // Stored paths are server-managed, but never follow one out of the tree.
    if relative.split('/').any(|segment| segment == "..") {
        warn!("Refusing attachment path escaping the data dir: {relative}");
        return labs_error(StatusCode::NOT_FOUND, missing);
    }

    let path = labs_state.data_dir().join(relative);
    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(err) => {
            error!("Failed to read attachment {}: {err}", path.display());
            return labs_error(StatusCode::NOT_FOUND, missing);
        }
    };

    let filename = relative.rsplit('/').next().unwrap_or(relative);
    let mut headers = HeaderMap::new();
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static("application/octet-stream"),
    );
    let disposition = format!("attachment; filename=\"{filename}\"");
    match HeaderValue::from_str(&disposition) {
        Ok(value) => {
            headers.insert(CONTENT_DISPOSITION, value);
        }
        Err(_) => {
            headers.insert(CONTENT_DISPOSITION, HeaderValue::from_static("attachment"));
        }
    }

    (StatusCode::OK, headers, bytes).into_response()
}

#[utoipa::path(
    post,
    path = "/admin/tasks",
    request_body = CreateLabTaskRequest,
    responses(
        (status = 200, description = "Task created", body = LabTaskOut),
        (status = 401, description = "Missing or invalid access token"),
        (status = 403, description = "Authenticated but not an administrator"),
        (status = 404, description = "Topic not found")
    ),
    tag = "labs"
)]
pub async fn create_task(
    headers: HeaderMap,
    pool: Extension<SqlitePool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<CreateLabTaskRequest>>,
) -> impl IntoResponse {
    let principal = match require_auth(&headers, &pool, &auth_state).await {
        Ok(principal) => principal,
        Err(failure) => return failure.into_response(),
    };
    if let Err(failure) = require_admin(&principal) {
        return failure.into_response();
    }

    let request: CreateLabTaskRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    match topic_exists(&pool, request.topic_id).await {
        Ok(true) => {}
        Ok(false) => return labs_error(StatusCode::NOT_FOUND, "Topic not found"),
        Err(err) => {
            error!("Failed to check topic {}: {err}", request.topic_id);
            return labs_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
        }
    }

    match insert_task(&pool, &request.title, &request.description, request.topic_id).await {
        Ok(record) => (StatusCode::OK, Json(task_out(&record))).into_response(),
        Err(err) => {
            error!("Failed to create task: {err}");
            labs_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}

#[utoipa::path(
    put,
    path = "/admin/tasks/{task_id}",
    params(("task_id" = i64, Path, description = "Task id")),
    request_body = CreateLabTaskRequest,
    responses(
        (status = 200, description = "Task updated", body = LabTaskOut),
        (status = 401, description = "Missing or invalid access token"),
        (status = 403, description = "Authenticated but not an administrator"),
        (status = 404, description = "Task or topic not found")
    ),
    tag = "labs"
)]
pub async fn update_task(
    headers: HeaderMap,
    pool: Extension<SqlitePool>,
    auth_state: Extension<Arc<AuthState>>,
    Path(task_id): Path<i64>,
    payload: Option<Json<CreateLabTaskRequest>>,
) -> impl IntoResponse {
    let principal = match require_auth(&headers, &pool, &auth_state).await {
        Ok(principal) => principal,
        Err(failure) => return failure.into_response(),
    };
    if let Err(failure) = require_admin(&principal) {
        return failure.into_response();
    }

    let request: CreateLabTaskRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    match topic_exists(&pool, request.topic_id).await {
        Ok(true) => {}
        Ok(false) => return labs_error(StatusCode::NOT_FOUND, "Topic not found"),
        Err(err) => {
            error!("Failed to check topic {}: {err}", request.topic_id);
            return labs_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
        }
    }

    match update_task_row(
        &pool,
        task_id,
        &request.title,
        &request.description,
        request.topic_id,
    )
    .await
    {
        Ok(Some(record)) => (StatusCode::OK, Json(task_out(&record))).into_response(),
        Ok(None) => labs_error(StatusCode::NOT_FOUND, "Task not found"),
        Err(err) => {
            error!("Failed to update task {task_id}: {err}");
            labs_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}

#[utoipa::path(
    delete,
    path = "/admin/tasks/{task_id}",
    params(("task_id" = i64, Path, description = "Task id")),
    responses(
        (status = 200, description = "Task deleted"),
        (status = 401, description = "Missing or invalid access token"),
        (status = 403, description = "Authenticated but not an administrator"),
        (status = 404, description = "Task not found")
    ),
    tag = "labs"
)]
pub async fn delete_task(
    headers: HeaderMap,
    pool: Extension<SqlitePool>,
    auth_state: Extension<Arc<AuthState>>,
    Path(task_id): Path<i64>,
) -> impl IntoResponse {
    let principal = match require_auth(&headers, &pool, &auth_state).await {
        Ok(principal) => principal,
        Err(failure) => return failure.into_response(),
    };
    if let Err(failure) = require_admin(&principal) {
        return failure.into_response();
    }

    match delete_task_row(&pool, task_id).await {
        Ok(true) => (StatusCode::OK, Json(json!({"success": true}))).into_response(),
        Ok(false) => labs_error(StatusCode::NOT_FOUND, "Task not found"),
        Err(err) => {
            error!("Failed to delete task {task_id}: {err}");
            labs_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}
