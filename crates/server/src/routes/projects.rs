use axum::{
    Extension, Router,
    extract::State,
    http::StatusCode,
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::get,
};
use db::{
    TransactionTrait,
    models::{
        mind_map_node::MindMapNode,
        project::{CreateProject, Project, ProjectWithDetails, UpdateProject},
        task::Task,
    },
};
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{
    AppState, error::ApiError, extract::Json, middleware::load_project_middleware,
};

const MAX_NAME_CHARS: usize = 255;
const MAX_DESCRIPTION_CHARS: usize = 1000;
const MAX_SYSTEM_PROMPT_CHARS: usize = 2000;

fn validate_name(name: &str) -> Result<(), ApiError> {
    if name.trim().is_empty() {
        return Err(ApiError::BadRequest("Project name is required".to_string()));
    }
    if name.trim().chars().count() > MAX_NAME_CHARS {
        return Err(ApiError::BadRequest(format!(
            "Project name must be at most {MAX_NAME_CHARS} characters"
        )));
    }
    Ok(())
}

fn validate_limit(value: Option<&str>, field: &str, max: usize) -> Result<(), ApiError> {
    if let Some(value) = value
        && value.chars().count() > max
    {
        return Err(ApiError::BadRequest(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(())
}

pub async fn get_projects(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<Project>>>, ApiError> {
    let projects = Project::find_all(&state.db().pool).await?;
    Ok(ResponseJson(ApiResponse::success(projects)))
}

pub async fn get_project(
    Extension(project): Extension<Project>,
) -> Result<ResponseJson<ApiResponse<Project>>, ApiError> {
    Ok(ResponseJson(ApiResponse::success(project)))
}

pub async fn create_project(
    State(state): State<AppState>,
    Json(payload): Json<CreateProject>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<Project>>), ApiError> {
    validate_name(&payload.name)?;
    validate_limit(payload.description.as_deref(), "Description", MAX_DESCRIPTION_CHARS)?;
    validate_limit(
        payload.system_prompt.as_deref(),
        "System prompt",
        MAX_SYSTEM_PROMPT_CHARS,
    )?;

    tracing::debug!("Creating project '{}'", payload.name);

    let project = Project::create(&state.db().pool, &payload, Uuid::new_v4()).await?;
    tracing::info!(project_id = %project.id, "Project created");
    Ok((StatusCode::CREATED, ResponseJson(ApiResponse::success(project))))
}

pub async fn update_project(
    Extension(existing_project): Extension<Project>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateProject>,
) -> Result<ResponseJson<ApiResponse<Project>>, ApiError> {
    if let Some(name) = payload.name.as_deref() {
        validate_name(name)?;
    }
    validate_limit(payload.description.as_deref(), "Description", MAX_DESCRIPTION_CHARS)?;
    validate_limit(
        payload.system_prompt.as_deref(),
        "System prompt",
        MAX_SYSTEM_PROMPT_CHARS,
    )?;

    let project = Project::update(&state.db().pool, existing_project.id, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(project)))
}

pub async fn delete_project(
    Extension(project): Extension<Project>,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Project>>, ApiError> {
    let deleted = Project::delete(&state.db().pool, project.id)
        .await?
        .ok_or(ApiError::NotFound("Project not found".to_string()))?;

    tracing::info!(project_id = %deleted.id, "Project deleted");
    Ok(ResponseJson(ApiResponse::success(deleted)))
}

pub async fn get_project_details(
    Extension(project): Extension<Project>,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<ProjectWithDetails>>, ApiError> {
    let txn = state.db().pool.begin().await?;
    let details = Project::find_with_details(&txn, project.id)
        .await?
        .ok_or(ApiError::NotFound("Project not found".to_string()))?;
    txn.commit().await?;

    Ok(ResponseJson(ApiResponse::success(details)))
}

pub async fn get_project_tasks(
    Extension(project): Extension<Project>,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<Task>>>, ApiError> {
    let tasks = Project::tasks(&state.db().pool, project.id).await?;
    Ok(ResponseJson(ApiResponse::success(tasks)))
}

pub async fn get_project_nodes(
    Extension(project): Extension<Project>,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<MindMapNode>>>, ApiError> {
    let nodes = Project::mind_map_nodes(&state.db().pool, project.id).await?;
    Ok(ResponseJson(ApiResponse::success(nodes)))
}

pub fn router(state: &AppState) -> Router<AppState> {
    let project_id_router = Router::new()
        .route(
            "/",
            get(get_project).put(update_project).delete(delete_project),
        )
        .route("/details", get(get_project_details))
        .route("/tasks", get(get_project_tasks))
        .route("/nodes", get(get_project_nodes))
        .layer(from_fn_with_state(
            state.clone(),
            load_project_middleware::<AppState>,
        ));

    let projects_router = Router::new()
        .route("/", get(get_projects).post(create_project))
        .nest("/{id}", project_id_router);

    Router::new().nest("/projects", projects_router)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::test_support::{request, test_app};

    #[tokio::test]
    async fn create_project_returns_created_row() {
        let app = test_app().await;

        let (status, body) = request(
            &app,
            "POST",
            "/api/projects",
            Some(json!({"name": "  Website  ", "description": "Marketing site"})),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["data"]["name"], json!("Website"));
        assert_eq!(body["data"]["description"], json!("Marketing site"));
        assert!(body["data"]["id"].as_str().is_some());
        assert!(body["data"]["created_at"].as_str().is_some());
        assert!(body["data"]["updated_at"].as_str().is_some());
    }

    #[tokio::test]
    async fn create_project_rejects_blank_name() {
        let app = test_app().await;

        let (status, body) =
            request(&app, "POST", "/api/projects", Some(json!({"name": "   "}))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], json!(false));
        assert!(body["error"].as_str().unwrap().contains("required"));
    }

    #[tokio::test]
    async fn create_project_rejects_oversized_fields() {
        let app = test_app().await;

        let (status, _) = request(
            &app,
            "POST",
            "/api/projects",
            Some(json!({"name": "x".repeat(256)})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = request(
            &app,
            "POST",
            "/api/projects",
            Some(json!({"name": "ok", "description": "d".repeat(1001)})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = request(
            &app,
            "POST",
            "/api/projects",
            Some(json!({"name": "ok", "system_prompt": "s".repeat(2001)})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn update_project_patches_and_missing_project_is_404() {
        let app = test_app().await;

        let (_, created) = request(
            &app,
            "POST",
            "/api/projects",
            Some(json!({"name": "Website", "description": "old"})),
        )
        .await;
        let id = created["data"]["id"].as_str().unwrap().to_string();

        let (status, body) = request(
            &app,
            "PUT",
            &format!("/api/projects/{id}"),
            Some(json!({"name": "Relaunch"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["name"], json!("Relaunch"));
        assert_eq!(body["data"]["description"], json!("old"));

        let (status, body) = request(
            &app,
            "PUT",
            &format!("/api/projects/{}", uuid::Uuid::new_v4()),
            Some(json!({"name": "Ghost"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], json!(false));
    }

    #[tokio::test]
    async fn delete_project_returns_row_and_cascades() {
        let app = test_app().await;

        let (_, created) =
            request(&app, "POST", "/api/projects", Some(json!({"name": "Doomed"}))).await;
        let id = created["data"]["id"].as_str().unwrap().to_string();

        request(
            &app,
            "POST",
            "/api/tasks",
            Some(json!({"project_id": id, "title": "orphan-to-be"})),
        )
        .await;

        let (status, body) =
            request(&app, "DELETE", &format!("/api/projects/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["name"], json!("Doomed"));

        let (status, _) = request(&app, "GET", &format!("/api/projects/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, tasks) = request(&app, "GET", "/api/tasks", None).await;
        assert_eq!(tasks["data"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn details_bundles_project_tasks_and_nodes() {
        let app = test_app().await;

        let (_, created) =
            request(&app, "POST", "/api/projects", Some(json!({"name": "Bundle"}))).await;
        let id = created["data"]["id"].as_str().unwrap().to_string();

        request(
            &app,
            "POST",
            "/api/tasks",
            Some(json!({"project_id": id, "title": "a task"})),
        )
        .await;
        request(
            &app,
            "POST",
            "/api/mind-map",
            Some(json!({"project_id": id, "title": "an idea"})),
        )
        .await;

        let (status, body) =
            request(&app, "GET", &format!("/api/projects/{id}/details"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["name"], json!("Bundle"));
        assert_eq!(body["data"]["tasks"].as_array().unwrap().len(), 1);
        assert_eq!(body["data"]["mind_map_nodes"].as_array().unwrap().len(), 1);

        let (status, body) =
            request(&app, "GET", &format!("/api/projects/{id}/tasks"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 1);

        let (status, body) =
            request(&app, "GET", &format!("/api/projects/{id}/nodes"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
    }
}
