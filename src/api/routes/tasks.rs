//! Task handlers.

use super::CreateTaskRequest;
use crate::api::AppState;
use crate::error::{ApiError, Error};
use crate::types::TaskId;
use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// GET /tasks - List all tasks
#[utoipa::path(
    get,
    path = "/tasks",
    tag = "tasks",
    responses(
        (status = 200, description = "All tasks, oldest first", body = Vec<crate::types::Task>)
    )
)]
pub async fn list_tasks(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.manager.list_tasks().await))
}

/// GET /tasks/:id - Get single task
#[utoipa::path(
    get,
    path = "/tasks/{id}",
    tag = "tasks",
    params(
        ("id" = String, Path, description = "Task ID")
    ),
    responses(
        (status = 200, description = "Task information", body = crate::types::Task),
        (status = 404, description = "Task not found", body = ApiError)
    )
)]
pub async fn get_task(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.manager.get_task(&TaskId::from(id)).await {
        Ok(task) => (StatusCode::OK, Json(task)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// POST /tasks - Create a task
#[utoipa::path(
    post,
    path = "/tasks",
    tag = "tasks",
    request_body = CreateTaskRequest,
    responses(
        (status = 201, description = "Task created and queued", body = crate::types::Task),
        (status = 400, description = "Malformed body or unusable URL list", body = ApiError),
        (status = 503, description = "Shutting down", body = ApiError)
    )
)]
pub async fn create_task(
    State(state): State<AppState>,
    payload: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ApiError::validation(rejection.body_text())),
            )
                .into_response();
        }
    };

    match state.manager.create_task(request.urls).await {
        Ok(task) => (StatusCode::CREATED, Json(task)).into_response(),
        Err(e @ (Error::Validation(_) | Error::ShuttingDown)) => e.into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to create task");
            e.into_response()
        }
    }
}
