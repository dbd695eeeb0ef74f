//! 알림 API 핸들러.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use syncpulse_core::models::alert::{Alert, AlertStats};

use crate::error::ApiError;
use crate::AppState;

/// 기본 조회 개수
const DEFAULT_ALERT_LIMIT: usize = 50;

/// 알림 목록 쿼리
#[derive(Debug, Deserialize)]
pub struct AlertsQuery {
    /// 최대 조회 개수 (기본: 50)
    pub limit: Option<usize>,
}

/// 알림 목록 응답
#[derive(Debug, Serialize)]
pub struct AlertsResponse {
    /// 최신순
    pub alerts: Vec<Alert>,
    pub count: usize,
}

/// 최근 알림 조회
///
/// GET /api/alerts?limit=
pub async fn list_alerts(
    State(state): State<AppState>,
    Query(params): Query<AlertsQuery>,
) -> Json<AlertsResponse> {
    let alerts = state
        .dispatcher
        .recent(params.limit.unwrap_or(DEFAULT_ALERT_LIMIT));
    Json(AlertsResponse {
        count: alerts.len(),
        alerts,
    })
}

/// 알림 통계
///
/// GET /api/alerts/stats
pub async fn get_alert_stats(State(state): State<AppState>) -> Json<AlertStats> {
    Json(state.dispatcher.stats(0))
}

/// 알림 해결 처리
///
/// POST /api/alerts/{id}/resolve
pub async fn resolve_alert(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Alert>, ApiError> {
    Ok(Json(state.dispatcher.resolve(&id)?))
}
