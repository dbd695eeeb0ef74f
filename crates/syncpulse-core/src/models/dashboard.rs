//! 실시간 대시보드 스냅샷 모델.
//!
//! WebSocket 푸시와 `/api/metrics` 조회가 같은 구조체를 사용한다.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::alert::Alert;
use crate::models::metrics::{BusinessMetrics, SeriesSummary, TrendDirection};

/// 알림 요약
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlertSummary {
    pub total: usize,
    pub unresolved: usize,
    pub last_hour: usize,
    pub by_severity: BTreeMap<String, usize>,
}

/// 대시보드 스냅샷
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    pub timestamp: DateTime<Utc>,
    pub uptime_seconds: u64,
    pub performance: BTreeMap<String, SeriesSummary>,
    pub business: BusinessMetrics,
    /// 최근 알림 (최신순)
    pub recent_alerts: Vec<Alert>,
    pub alert_summary: AlertSummary,
    pub trends: BTreeMap<String, TrendDirection>,
    pub last_sync_at: Option<DateTime<Utc>>,
}
