//! API 라우트 정의.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers;
use crate::AppState;

/// API 라우트 생성
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // 대시보드 스냅샷
        .route("/metrics", get(handlers::metrics::get_metrics))
        // 상태 확인
        .route("/health", get(handlers::health::get_health))
        // 알림
        .route("/alerts", get(handlers::alerts::list_alerts))
        .route("/alerts/stats", get(handlers::alerts::get_alert_stats))
        .route("/alerts/{id}/resolve", post(handlers::alerts::resolve_alert))
        // 임계값
        .route("/thresholds", get(handlers::thresholds::get_thresholds))
        .route("/thresholds/{kind}", put(handlers::thresholds::update_threshold))
        // 리포트
        .route("/reports/{kind}", post(handlers::reports::generate_report))
}
