use std::future::Future;

use axum::{
    extract::{Path, Request, State},
    middleware::Next,
    response::Response,
};
use db::{
    DBService, DbErr,
    models::{mind_map_node::MindMapNode, project::Project, task::Task},
};
use uuid::Uuid;

use crate::{AppState, error::ApiError};

pub trait ModelLoaderDeps {
    fn db_service(&self) -> &DBService;
}

impl ModelLoaderDeps for AppState {
    fn db_service(&self) -> &DBService {
        self.db()
    }
}

/// Resolves a model by id or produces the enveloped 404/500 the handler
/// would otherwise have to build itself.
async fn fetch_model_or_error<M, Fut>(
    model_name: &'static str,
    model_id: Uuid,
    load_future: Fut,
) -> Result<M, ApiError>
where
    Fut: Future<Output = Result<Option<M>, DbErr>>,
{
    match load_future.await {
        Ok(Some(model)) => Ok(model),
        Ok(None) => {
            tracing::warn!("{model_name} {model_id} not found");
            Err(ApiError::NotFound(format!("{model_name} not found")))
        }
        Err(error) => {
            tracing::error!("Failed to fetch {model_name} {model_id}: {error}");
            Err(ApiError::Database(error))
        }
    }
}

async fn load_request_extension<M, Fut>(
    request: Request,
    next: Next,
    model_name: &'static str,
    model_id: Uuid,
    load_future: Fut,
) -> Result<Response, ApiError>
where
    M: Clone + Send + Sync + 'static,
    Fut: Future<Output = Result<Option<M>, DbErr>>,
{
    let model = fetch_model_or_error(model_name, model_id, load_future).await?;
    let mut request = request;
    request.extensions_mut().insert(model);
    Ok(next.run(request).await)
}

pub async fn load_project_middleware<S>(
    State(state): State<S>,
    Path(project_id): Path<Uuid>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError>
where
    S: ModelLoaderDeps,
{
    load_request_extension(
        request,
        next,
        "Project",
        project_id,
        Project::find_by_id(&state.db_service().pool, project_id),
    )
    .await
}

pub async fn load_task_middleware<S>(
    State(state): State<S>,
    Path(task_id): Path<Uuid>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError>
where
    S: ModelLoaderDeps,
{
    load_request_extension(
        request,
        next,
        "Task",
        task_id,
        Task::find_by_id(&state.db_service().pool, task_id),
    )
    .await
}

pub async fn load_mind_map_node_middleware<S>(
    State(state): State<S>,
    Path(node_id): Path<Uuid>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError>
where
    S: ModelLoaderDeps,
{
    load_request_extension(
        request,
        next,
        "Mind map node",
        node_id,
        MindMapNode::find_by_id(&state.db_service().pool, node_id),
    )
    .await
}

#[cfg(test)]
mod tests {
    use axum::{http::StatusCode, response::IntoResponse};

    use super::fetch_model_or_error;

    #[tokio::test]
    async fn fetch_model_or_error_maps_missing_model_to_not_found() {
        let result = fetch_model_or_error::<String, _>("Project", uuid::Uuid::new_v4(), async {
            Ok(None)
        })
        .await;

        let response = result.unwrap_err().into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn fetch_model_or_error_maps_fetch_failure_to_internal_error() {
        let result = fetch_model_or_error::<String, _>("Project", uuid::Uuid::new_v4(), async {
            Err(db::DbErr::Custom("db unavailable".to_string()))
        })
        .await;

        let response = result.unwrap_err().into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
