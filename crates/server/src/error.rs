use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use db::{
    DbErr, SqlErr,
    models::{
        mind_map_node::MindMapNodeError, project::ProjectError, task::TaskError,
    },
};
use thiserror::Error;
use utils::response::ApiResponse;

use crate::config::Environment;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Project(#[from] ProjectError),
    #[error(transparent)]
    Task(#[from] TaskError),
    #[error(transparent)]
    MindMapNode(#[from] MindMapNodeError),
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<&'static str> for ApiError {
    fn from(msg: &'static str) -> Self {
        ApiError::BadRequest(msg.to_string())
    }
}

/// Single translation point for store errors: constraint violations become
/// client errors, missing rows become 404, everything else is a 500.
fn database_status(err: &DbErr) -> (StatusCode, String) {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => (
            StatusCode::CONFLICT,
            "Resource already exists".to_string(),
        ),
        Some(SqlErr::ForeignKeyConstraintViolation(_)) => (
            StatusCode::BAD_REQUEST,
            "Referenced resource does not exist".to_string(),
        ),
        _ => match err {
            DbErr::RecordNotFound(message) => (StatusCode::NOT_FOUND, message.clone()),
            other if other.to_string().contains("NOT NULL constraint failed") => (
                StatusCode::BAD_REQUEST,
                "Required field is missing".to_string(),
            ),
            other => (StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
        },
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status_code, error_message) = match &self {
            ApiError::Project(err) => match err {
                ProjectError::ProjectNotFound => (StatusCode::NOT_FOUND, err.to_string()),
                ProjectError::Database(db_err) => database_status(db_err),
            },
            ApiError::Task(err) => match err {
                TaskError::TaskNotFound => (StatusCode::NOT_FOUND, err.to_string()),
                TaskError::Database(db_err) => database_status(db_err),
            },
            ApiError::MindMapNode(err) => match err {
                MindMapNodeError::NodeNotFound => (StatusCode::NOT_FOUND, err.to_string()),
                MindMapNodeError::Database(db_err) => database_status(db_err),
            },
            ApiError::Database(db_err) => database_status(db_err),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let error_message = if status_code.is_server_error() {
            tracing::error!(
                status = %status_code,
                error = %self,
                "API request failed"
            );
            if Environment::from_env().is_production() {
                "Internal server error".to_string()
            } else {
                error_message
            }
        } else {
            error_message
        };

        let response = ApiResponse::<()>::error(&error_message);
        (status_code, Json(response)).into_response()
    }
}
