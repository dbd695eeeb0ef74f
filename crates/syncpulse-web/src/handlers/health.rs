//! 상태 확인 핸들러.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::AppState;

/// 상태 확인 응답
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// 응답 시각 (RFC3339)
    pub timestamp: String,
    pub uptime_seconds: u64,
    pub version: &'static str,
}

/// GET /api/health
pub async fn get_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        timestamp: chrono::Utc::now().to_rfc3339(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        version: env!("CARGO_PKG_VERSION"),
    })
}
