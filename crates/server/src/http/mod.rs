use axum::{
    Router,
    http::{HeaderValue, StatusCode},
    response::Json as ResponseJson,
    routing::get,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use utils::response::ApiResponse;

use crate::{AppState, routes};

pub fn router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config()
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .merge(routes::projects::router(&state))
        .merge(routes::tasks::router(&state))
        .merge(routes::mind_map::router(&state));

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api", api_routes)
        .fallback(route_not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn route_not_found() -> (StatusCode, ResponseJson<ApiResponse<()>>) {
    (
        StatusCode::NOT_FOUND,
        ResponseJson(ApiResponse::error("Route not found")),
    )
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::test_support::{request, test_app};

    #[tokio::test]
    async fn health_reports_status_timestamp_and_uptime() {
        let app = test_app().await;

        let (status, body) = request(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], json!("ok"));
        assert!(body["timestamp"].as_str().is_some());
        assert!(body["uptime"].as_f64().is_some());
    }

    #[tokio::test]
    async fn unknown_routes_get_an_enveloped_404() {
        let app = test_app().await;

        let (status, body) = request(&app, "GET", "/api/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["error"], json!("Route not found"));
    }

    #[tokio::test]
    async fn malformed_json_bodies_are_enveloped_bad_requests() {
        let app = test_app().await;

        let (status, body) = request(
            &app,
            "POST",
            "/api/projects",
            Some(json!({"name": 42})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], json!(false));
        assert!(body["error"].as_str().is_some());
    }
}
