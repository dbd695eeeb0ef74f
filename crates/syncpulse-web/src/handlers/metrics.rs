//! 대시보드 스냅샷 API 핸들러.

use axum::extract::State;
use axum::Json;

use syncpulse_core::models::dashboard::DashboardSnapshot;

use crate::AppState;

/// 현재 대시보드 스냅샷
///
/// GET /api/metrics
pub async fn get_metrics(State(state): State<AppState>) -> Json<DashboardSnapshot> {
    Json(state.dashboard.snapshot())
}
