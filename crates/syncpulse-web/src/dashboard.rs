//! 실시간 대시보드.
//!
//! 주기마다 스냅샷을 한 번 직렬화해 등록된 모든 뷰어에 동시 푸시한다.
//! 레지스트리 잠금은 복사 시점에만 잡고 네트워크 쓰기 중에는 잡지 않는다.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;
use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use syncpulse_alert::AlertDispatcher;
use syncpulse_core::config::DashboardConfig;
use syncpulse_core::error::CoreError;
use syncpulse_core::models::dashboard::{AlertSummary, DashboardSnapshot};
use syncpulse_core::ports::viewer::ViewerConnection;
use syncpulse_metrics::MetricsCollector;

// ============================================================
// 연결 레지스트리
// ============================================================

/// 뷰어 연결 멤버십
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: Mutex<HashMap<String, Arc<dyn ViewerConnection>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 연결 등록 후 ID 반환
    pub fn register(&self, conn: Arc<dyn ViewerConnection>) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        self.connections.lock().insert(id.clone(), conn);
        debug!("뷰어 연결 등록: {id}");
        id
    }

    /// 연결 해제. 이미 없으면 false.
    pub fn unregister(&self, id: &str) -> bool {
        let removed = self.connections.lock().remove(id).is_some();
        if removed {
            debug!("뷰어 연결 해제: {id}");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.connections.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.lock().is_empty()
    }

    /// 현재 연결 복사본
    fn entries(&self) -> Vec<(String, Arc<dyn ViewerConnection>)> {
        self.connections
            .lock()
            .iter()
            .map(|(id, conn)| (id.clone(), conn.clone()))
            .collect()
    }
}

// ============================================================
// 대시보드
// ============================================================

/// 실시간 대시보드
pub struct LiveDashboard {
    collector: Arc<MetricsCollector>,
    dispatcher: Arc<AlertDispatcher>,
    registry: ConnectionRegistry,
    recent_alerts_limit: usize,
    push_timeout: Duration,
    tick: Duration,
}

impl LiveDashboard {
    pub fn new(
        collector: Arc<MetricsCollector>,
        dispatcher: Arc<AlertDispatcher>,
        config: &DashboardConfig,
    ) -> Self {
        Self {
            collector,
            dispatcher,
            registry: ConnectionRegistry::new(),
            recent_alerts_limit: config.recent_alerts_limit,
            push_timeout: Duration::from_millis(config.push_timeout_ms.max(1)),
            tick: Duration::from_secs(config.tick_interval_secs.max(1)),
        }
    }

    /// 푸시 주기 변경 (테스트용)
    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// 현재 대시보드 스냅샷
    pub fn snapshot(&self) -> DashboardSnapshot {
        let metrics = self.collector.snapshot();
        let stats = self.dispatcher.stats(self.recent_alerts_limit);
        let now = Utc::now();
        let last_hour = self.dispatcher.count_since(now - chrono::Duration::hours(1));

        let trends = metrics
            .series
            .iter()
            .map(|(name, summary)| (name.clone(), summary.direction))
            .collect();

        DashboardSnapshot {
            timestamp: now,
            uptime_seconds: metrics.uptime_seconds,
            performance: metrics.series,
            business: metrics.business,
            alert_summary: AlertSummary {
                total: stats.total,
                unresolved: stats.unresolved,
                last_hour,
                by_severity: stats.by_severity,
            },
            recent_alerts: stats.recent,
            trends,
            last_sync_at: metrics.last_sync_at,
        }
    }

    /// 직렬화된 스냅샷
    pub fn snapshot_json(&self) -> Result<String, CoreError> {
        Ok(serde_json::to_string(&self.snapshot())?)
    }

    /// 한 번 푸시. 실패하거나 타임아웃된 연결은 제거한다. 성공한 연결 수를 반환한다.
    pub async fn broadcast_once(&self) -> Result<usize, CoreError> {
        let entries = self.registry.entries();
        if entries.is_empty() {
            return Ok(0);
        }
        let payload = self.snapshot_json()?;
        let timeout = self.push_timeout;

        let results = join_all(entries.iter().map(|(id, conn)| {
            let payload = payload.as_str();
            async move {
                match tokio::time::timeout(timeout, conn.push(payload)).await {
                    Ok(Ok(())) => None,
                    Ok(Err(e)) => {
                        debug!("뷰어 푸시 실패 ({id}): {e}");
                        Some(id.clone())
                    }
                    Err(_) => {
                        debug!("뷰어 푸시 타임아웃 ({id})");
                        Some(id.clone())
                    }
                }
            }
        }))
        .await;

        let failed: Vec<String> = results.into_iter().flatten().collect();
        for id in &failed {
            self.registry.unregister(id);
        }
        if !failed.is_empty() {
            warn!("응답 없는 뷰어 {}개 제거", failed.len());
        }
        Ok(entries.len() - failed.len())
    }

    /// 주기 푸시 루프
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(self.tick);
        interval.tick().await;
        info!("대시보드 푸시 루프 시작 (주기: {:?})", self.tick);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.broadcast_once().await {
                        warn!("대시보드 스냅샷 푸시 실패: {e}");
                    }
                }
                _ = shutdown.changed() => {
                    info!("대시보드 푸시 루프 종료");
                    break;
                }
            }
        }
    }
}
