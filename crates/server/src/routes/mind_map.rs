use axum::{
    Extension, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::{get, post, put},
};
use db::{
    TransactionTrait,
    models::{
        mind_map_node::{
            CreateMindMapNode, MindMapNode, NodeHierarchy, UpdateMindMapNode,
        },
        project::{Project, ProjectError},
        task::{Task, TaskStatus},
    },
};
use serde::Deserialize;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{
    AppState, error::ApiError, extract::Json, middleware::load_mind_map_node_middleware,
};

#[derive(Debug, Deserialize)]
pub struct UpdateNodePositionRequest {
    pub x_position: f64,
    pub y_position: f64,
}

#[derive(Debug, Default, Deserialize)]
pub struct ConvertToTaskRequest {
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub position: Option<i32>,
}

pub async fn get_nodes(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<MindMapNode>>>, ApiError> {
    let nodes = MindMapNode::find_all(&state.db().pool).await?;
    Ok(ResponseJson(ApiResponse::success(nodes)))
}

pub async fn get_node(
    Extension(node): Extension<MindMapNode>,
) -> Result<ResponseJson<ApiResponse<MindMapNode>>, ApiError> {
    Ok(ResponseJson(ApiResponse::success(node)))
}

pub async fn create_node(
    State(state): State<AppState>,
    Json(payload): Json<CreateMindMapNode>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<MindMapNode>>), ApiError> {
    if payload.title.trim().is_empty() {
        return Err(ApiError::BadRequest("Node title is required".to_string()));
    }

    let pool = &state.db().pool;
    Project::find_by_id(pool, payload.project_id)
        .await?
        .ok_or(ProjectError::ProjectNotFound)?;

    if let Some(parent_id) = payload.parent_id {
        MindMapNode::find_by_id(pool, parent_id)
            .await?
            .ok_or(ApiError::NotFound("Parent node not found".to_string()))?;
    }

    let node = MindMapNode::create(pool, &payload, Uuid::new_v4()).await?;
    tracing::info!(node_id = %node.id, "Mind map node created");
    Ok((StatusCode::CREATED, ResponseJson(ApiResponse::success(node))))
}

pub async fn update_node(
    Extension(existing_node): Extension<MindMapNode>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateMindMapNode>,
) -> Result<ResponseJson<ApiResponse<MindMapNode>>, ApiError> {
    if let Some(title) = payload.title.as_deref()
        && title.trim().is_empty()
    {
        return Err(ApiError::BadRequest(
            "Node title cannot be empty".to_string(),
        ));
    }

    let pool = &state.db().pool;
    if let Some(Some(parent_id)) = payload.parent_id {
        if parent_id == existing_node.id {
            return Err(ApiError::BadRequest(
                "Node cannot be its own parent".to_string(),
            ));
        }
        MindMapNode::find_by_id(pool, parent_id)
            .await?
            .ok_or(ApiError::NotFound("Parent node not found".to_string()))?;
    }

    let node = MindMapNode::update(pool, existing_node.id, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(node)))
}

pub async fn update_node_position(
    Extension(node): Extension<MindMapNode>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateNodePositionRequest>,
) -> Result<ResponseJson<ApiResponse<MindMapNode>>, ApiError> {
    let node = MindMapNode::update_position(
        &state.db().pool,
        node.id,
        payload.x_position,
        payload.y_position,
    )
    .await?;
    Ok(ResponseJson(ApiResponse::success(node)))
}

/// Children first, then the node, one transaction: a crash mid-delete cannot
/// leave a child pointing at a missing parent.
pub async fn delete_node(
    Extension(node): Extension<MindMapNode>,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<MindMapNode>>, ApiError> {
    let txn = state.db().pool.begin().await?;
    let deleted = MindMapNode::delete(&txn, node.id)
        .await?
        .ok_or(ApiError::NotFound("Mind map node not found".to_string()))?;
    txn.commit().await?;

    tracing::info!(node_id = %deleted.id, "Mind map node deleted");
    Ok(ResponseJson(ApiResponse::success(deleted)))
}

pub async fn convert_node_to_task(
    Extension(node): Extension<MindMapNode>,
    State(state): State<AppState>,
    payload: Option<Json<ConvertToTaskRequest>>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<Task>>), ApiError> {
    let payload = payload.map(|Json(payload)| payload).unwrap_or_default();

    let txn = state.db().pool.begin().await?;
    let task = MindMapNode::convert_to_task(
        &txn,
        node.id,
        Uuid::new_v4(),
        payload.status.unwrap_or_default(),
        payload.position.unwrap_or(0),
    )
    .await?;
    txn.commit().await?;

    tracing::info!(node_id = %node.id, task_id = %task.id, "Mind map node converted to task");
    Ok((StatusCode::CREATED, ResponseJson(ApiResponse::success(task))))
}

pub async fn get_project_hierarchy(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<NodeHierarchy>>, ApiError> {
    let pool = &state.db().pool;
    Project::find_by_id(pool, project_id)
        .await?
        .ok_or(ProjectError::ProjectNotFound)?;

    let hierarchy = MindMapNode::hierarchy(pool, project_id).await?;
    Ok(ResponseJson(ApiResponse::success(hierarchy)))
}

pub async fn get_node_children(
    State(state): State<AppState>,
    Path(node_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Vec<MindMapNode>>>, ApiError> {
    let pool = &state.db().pool;
    MindMapNode::find_by_id(pool, node_id)
        .await?
        .ok_or(ApiError::NotFound("Parent node not found".to_string()))?;

    let children = MindMapNode::find_children(pool, node_id).await?;
    Ok(ResponseJson(ApiResponse::success(children)))
}

pub fn router(state: &AppState) -> Router<AppState> {
    let node_id_router = Router::new()
        .route("/", get(get_node).put(update_node).delete(delete_node))
        .route("/position", put(update_node_position))
        .route("/convert-to-task", post(convert_node_to_task))
        .layer(from_fn_with_state(
            state.clone(),
            load_mind_map_node_middleware::<AppState>,
        ));

    let mind_map_router = Router::new()
        .route("/", get(get_nodes).post(create_node))
        .route("/projects/{id}/hierarchy", get(get_project_hierarchy))
        .route("/nodes/{id}/children", get(get_node_children))
        .nest("/{id}", node_id_router);

    Router::new().nest("/mind-map", mind_map_router)
}
