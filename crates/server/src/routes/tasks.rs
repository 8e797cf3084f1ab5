use std::str::FromStr;

use axum::{
    Extension, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::{get, put},
};
use db::{
    TransactionTrait,
    models::{
        project::{Project, ProjectError},
        task::{CreateTask, Task, TaskReorderEntry, TaskStatus, TasksByStatus, UpdateTask},
    },
};
use serde::Deserialize;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError, extract::Json, middleware::load_task_middleware};

#[derive(Debug, Deserialize)]
pub struct TaskQuery {
    pub project_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTaskStatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTaskPositionRequest {
    pub position: i32,
}

#[derive(Debug, Deserialize)]
pub struct ReorderTasksRequest {
    pub project_id: Uuid,
    pub tasks: Vec<TaskReorderEntry>,
}

pub async fn get_tasks(
    State(state): State<AppState>,
    Query(query): Query<TaskQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<Task>>>, ApiError> {
    let tasks = match query.project_id {
        Some(project_id) => Task::find_by_project(&state.db().pool, project_id).await?,
        None => Task::find_all(&state.db().pool).await?,
    };

    Ok(ResponseJson(ApiResponse::success(tasks)))
}

pub async fn get_task(
    Extension(task): Extension<Task>,
) -> Result<ResponseJson<ApiResponse<Task>>, ApiError> {
    Ok(ResponseJson(ApiResponse::success(task)))
}

pub async fn create_task(
    State(state): State<AppState>,
    Json(payload): Json<CreateTask>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<Task>>), ApiError> {
    if payload.title.trim().is_empty() {
        return Err(ApiError::BadRequest("Task title is required".to_string()));
    }

    let pool = &state.db().pool;
    Project::find_by_id(pool, payload.project_id)
        .await?
        .ok_or(ProjectError::ProjectNotFound)?;

    tracing::debug!(
        "Creating task '{}' in project {}",
        payload.title,
        payload.project_id
    );

    let task = Task::create(pool, &payload, Uuid::new_v4()).await?;
    tracing::info!(task_id = %task.id, "Task created");
    Ok((StatusCode::CREATED, ResponseJson(ApiResponse::success(task))))
}

pub async fn update_task(
    Extension(existing_task): Extension<Task>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateTask>,
) -> Result<ResponseJson<ApiResponse<Task>>, ApiError> {
    // Use existing values if not provided in update
    let title = match payload.title {
        Some(title) => {
            let title = title.trim().to_string();
            if title.is_empty() {
                return Err(ApiError::BadRequest(
                    "Task title cannot be empty".to_string(),
                ));
            }
            title
        }
        None => existing_task.title,
    };
    let description = match payload.description {
        Some(s) if s.trim().is_empty() => None, // Empty string = clear description
        Some(s) => Some(s.trim().to_string()),  // Non-empty string = update description
        None => existing_task.description,      // Field omitted = keep existing
    };
    let status = payload.status.unwrap_or(existing_task.status);
    let position = payload.position.unwrap_or(existing_task.position);

    let task = Task::update(
        &state.db().pool,
        existing_task.id,
        title,
        description,
        status,
        position,
    )
    .await?;

    Ok(ResponseJson(ApiResponse::success(task)))
}

pub async fn update_task_status(
    Extension(task): Extension<Task>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateTaskStatusRequest>,
) -> Result<ResponseJson<ApiResponse<Task>>, ApiError> {
    let status = TaskStatus::from_str(payload.status.trim()).map_err(|_| {
        ApiError::BadRequest(
            "Invalid status. Must be one of: todo, in-progress, review, done".to_string(),
        )
    })?;

    let task = Task::update_status(&state.db().pool, task.id, status).await?;
    Ok(ResponseJson(ApiResponse::success(task)))
}

pub async fn update_task_position(
    Extension(task): Extension<Task>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateTaskPositionRequest>,
) -> Result<ResponseJson<ApiResponse<Task>>, ApiError> {
    if payload.position < 0 {
        return Err(ApiError::BadRequest(
            "Position must be a non-negative number".to_string(),
        ));
    }

    let task = Task::update_position(&state.db().pool, task.id, payload.position).await?;
    Ok(ResponseJson(ApiResponse::success(task)))
}

pub async fn delete_task(
    Extension(task): Extension<Task>,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Task>>, ApiError> {
    let deleted = Task::delete(&state.db().pool, task.id)
        .await?
        .ok_or(ApiError::NotFound("Task not found".to_string()))?;

    tracing::info!(task_id = %deleted.id, "Task deleted");
    Ok(ResponseJson(ApiResponse::success(deleted)))
}

/// Batch status/position update for drag-and-drop. Entries that do not
/// belong to the project are skipped; the whole batch commits or none of it
/// does.
pub async fn reorder_tasks(
    State(state): State<AppState>,
    Json(payload): Json<ReorderTasksRequest>,
) -> Result<ResponseJson<ApiResponse<Vec<Task>>>, ApiError> {
    let pool = &state.db().pool;
    Project::find_by_id(pool, payload.project_id)
        .await?
        .ok_or(ProjectError::ProjectNotFound)?;

    let txn = pool.begin().await?;
    let updated = Task::reorder(&txn, payload.project_id, &payload.tasks).await?;
    txn.commit().await?;

    tracing::info!(
        project_id = %payload.project_id,
        updated = updated.len(),
        "Tasks reordered"
    );
    Ok(ResponseJson(ApiResponse::success(updated)))
}

pub async fn get_tasks_by_status(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<TasksByStatus>>, ApiError> {
    let pool = &state.db().pool;
    Project::find_by_id(pool, project_id)
        .await?
        .ok_or(ProjectError::ProjectNotFound)?;

    let grouped = Task::find_by_project_grouped(pool, project_id).await?;
    Ok(ResponseJson(ApiResponse::success(grouped)))
}

pub fn router(state: &AppState) -> Router<AppState> {
    let task_id_router = Router::new()
        .route("/", get(get_task).put(update_task).delete(delete_task))
        .route("/status", put(update_task_status))
        .route("/position", put(update_task_position))
        .layer(from_fn_with_state(
            state.clone(),
            load_task_middleware::<AppState>,
        ));

    let tasks_router = Router::new()
        .route("/", get(get_tasks).post(create_task))
        .route("/reorder", put(reorder_tasks))
        .route("/projects/{id}/by-status", get(get_tasks_by_status))
        .nest("/{id}", task_id_router);

    Router::new().nest("/tasks", tasks_router)
}
