use axum::{extract::State, response::Json as ResponseJson};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub uptime: f64,
}

pub async fn health_check(State(state): State<AppState>) -> ResponseJson<HealthResponse> {
    ResponseJson(HealthResponse {
        status: "ok",
        timestamp: Utc::now(),
        uptime: state.uptime(),
    })
}
