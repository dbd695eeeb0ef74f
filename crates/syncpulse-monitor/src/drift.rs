//! 드리프트 모니터.
//!
//! `Stopped → Running → Stopped` 상태 기계. 매 틱마다 검사 종류별 태스크를
//! `JoinSet`으로 동시에 실행하고, 임계값을 넘은 값에 대해 알림을 만들어
//! `AlertPublisher`로 넘긴다. 한 검사의 panic은 다른 검사에 영향을 주지 않는다.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};

use syncpulse_core::config::{MetricsConfig, MonitorConfig};
use syncpulse_core::error::CoreError;
use syncpulse_core::models::alert::{Alert, Severity};
use syncpulse_core::models::check::CheckKind;
use syncpulse_core::models::metrics::series;
use syncpulse_core::ports::publisher::AlertPublisher;
use syncpulse_metrics::MetricsCollector;

/// 알림 source 필드 값
pub const MONITOR_SOURCE: &str = "drift_monitor";

/// 검사 하나의 측정 결과
struct Measurement {
    value: f64,
    details: Vec<(&'static str, Value)>,
}

struct MonitorInner {
    collector: Arc<MetricsCollector>,
    publisher: Arc<dyn AlertPublisher>,
    thresholds: RwLock<BTreeMap<CheckKind, f64>>,
}

struct RunningLoop {
    stop_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// 임계값 기반 드리프트 모니터
pub struct DriftMonitor {
    inner: Arc<MonitorInner>,
    interval: Duration,
    running: Mutex<Option<RunningLoop>>,
}

impl DriftMonitor {
    /// 설정의 임계값 테이블과 검사 주기로 생성
    pub fn new(
        collector: Arc<MetricsCollector>,
        publisher: Arc<dyn AlertPublisher>,
        metrics: &MetricsConfig,
        monitor: &MonitorConfig,
    ) -> Self {
        let mut thresholds = BTreeMap::new();
        for (name, value) in &metrics.alert_thresholds {
            match name.parse::<CheckKind>() {
                Ok(kind) => {
                    thresholds.insert(kind, *value);
                }
                Err(_) => warn!("알 수 없는 임계값 항목 무시: {name}"),
            }
        }

        Self {
            inner: Arc::new(MonitorInner {
                collector,
                publisher,
                thresholds: RwLock::new(thresholds),
            }),
            interval: Duration::from_secs(monitor.check_interval_secs.max(1)),
            running: Mutex::new(None),
        }
    }

    /// 검사 주기 지정 (빌더)
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    // ============================================================
    // 생명주기
    // ============================================================

    /// 주기 루프 시작. 이미 실행 중이면 `AlreadyRunning`.
    pub fn start(&self) -> Result<(), CoreError> {
        let mut running = self.running.lock();
        if running.is_some() {
            return Err(CoreError::AlreadyRunning("drift_monitor".to_string()));
        }

        let (stop_tx, mut stop_rx) = watch::channel(false);
        let inner = self.inner.clone();
        let period = self.interval;

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // 첫 tick은 즉시 완료되므로 건너뛴다
            interval.tick().await;

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let alerts = inner.run_checks().await;
                        debug!("드리프트 검사 완료: 알림 {}건", alerts.len());
                    }
                    _ = stop_rx.changed() => {
                        info!("드리프트 모니터 루프 종료");
                        break;
                    }
                }
            }
        });

        *running = Some(RunningLoop { stop_tx, handle });
        info!("드리프트 모니터 시작 (주기 {}초)", period.as_secs());
        Ok(())
    }

    /// 루프 정지. 진행 중인 틱이 끝날 때까지 기다린다. 정지 상태면 `NotRunning`.
    pub async fn stop(&self) -> Result<(), CoreError> {
        let running = self.running.lock().take();
        let Some(running) = running else {
            return Err(CoreError::NotRunning("drift_monitor".to_string()));
        };

        let _ = running.stop_tx.send(true);
        if let Err(e) = running.handle.await {
            error!("드리프트 모니터 루프 비정상 종료: {e}");
        }
        info!("드리프트 모니터 정지");
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.running.lock().is_some()
    }

    /// 틱 한 번을 즉시 실행하고 생성된 알림을 반환
    pub async fn check_now(&self) -> Vec<Alert> {
        self.inner.run_checks().await
    }

    // ============================================================
    // 임계값
    // ============================================================

    /// 임계값 변경. 알 수 없는 종류, 비유한 값, 0 이하 값은 `Validation`.
    pub fn update_threshold(&self, kind: &str, value: f64) -> Result<(), CoreError> {
        let kind: CheckKind = kind.parse()?;
        if !value.is_finite() || value <= 0.0 {
            return Err(CoreError::validation(
                kind.as_str(),
                format!("임계값은 양의 유한수여야 함: {value}"),
            ));
        }
        self.inner.thresholds.write().insert(kind, value);
        info!("임계값 변경: {kind} = {value}");
        Ok(())
    }

    /// 임계값 테이블 복사본
    pub fn thresholds(&self) -> BTreeMap<String, f64> {
        self.inner
            .thresholds
            .read()
            .iter()
            .map(|(kind, value)| (kind.as_str().to_string(), *value))
            .collect()
    }

    pub fn threshold(&self, kind: CheckKind) -> Option<f64> {
        self.inner.thresholds.read().get(&kind).copied()
    }
}

impl MonitorInner {
    async fn run_checks(self: &Arc<Self>) -> Vec<Alert> {
        let thresholds = self.thresholds.read().clone();
        let mut set = JoinSet::new();

        for kind in CheckKind::ALL {
            let Some(threshold) = thresholds.get(&kind).copied() else {
                debug!("임계값 없음, 검사 생략: {kind}");
                continue;
            };
            let inner = self.clone();
            set.spawn(async move {
                let alert = inner.evaluate(kind, threshold)?;
                inner.publish(&alert).await;
                Some((kind, alert))
            });
        }

        let mut produced = Vec::new();
        while let Some(result) = set.join_next().await {
            match result {
                Ok(Some(entry)) => produced.push(entry),
                Ok(None) => {}
                Err(e) => error!("드리프트 검사 태스크 실패: {e}"),
            }
        }

        produced.sort_by_key(|(kind, _)| *kind);
        produced.into_iter().map(|(_, alert)| alert).collect()
    }

    async fn publish(&self, alert: &Alert) {
        match self.publisher.publish(alert.clone()).await {
            Ok(()) => {}
            Err(CoreError::AlertRateLimited { limit_per_hour }) => {
                debug!("알림 한도 초과로 미전달 ({limit_per_hour}/h): {}", alert.id);
            }
            Err(e) => warn!("알림 발행 실패 ({}): {e}", alert.kind),
        }
    }

    /// 검사 하나 평가. 데이터가 없거나 임계값 이하면 None.
    fn evaluate(&self, kind: CheckKind, threshold: f64) -> Option<Alert> {
        let measurement = self.measure(kind)?;
        let value = measurement.value;
        if value <= threshold {
            return None;
        }

        let ratio = value / threshold;
        let severity = Severity::from_ratio(ratio);
        let mut alert = Alert::new(
            kind.alert_kind(),
            severity,
            describe(kind, value, threshold),
            MONITOR_SOURCE,
        )
        .with_detail("check", kind.as_str())
        .with_detail("value", value)
        .with_detail("threshold", threshold)
        .with_detail("ratio", ratio);
        for (key, detail) in measurement.details {
            alert = alert.with_detail(key, detail);
        }

        info!(
            "드리프트 감지: {} = {value:.2} (임계값 {threshold:.2}, {})",
            kind, severity
        );
        Some(alert)
    }

    fn measure(&self, kind: CheckKind) -> Option<Measurement> {
        let collector = &self.collector;
        match kind {
            CheckKind::SyncDelayMinutes => {
                let last = collector.last_sync_at()?;
                let minutes = (Utc::now() - last).num_milliseconds() as f64 / 60_000.0;
                let business = collector.business();
                Some(Measurement {
                    value: minutes,
                    details: vec![
                        ("last_sync_at", Value::from(last.to_rfc3339())),
                        ("total_sync_operations", Value::from(business.total_sync_operations)),
                    ],
                })
            }
            CheckKind::ErrorRatePercent => {
                let value = collector.latest(series::ERROR_RATE)?;
                let business = collector.business();
                Some(Measurement {
                    value,
                    details: vec![
                        ("failed_syncs", Value::from(business.failed_syncs)),
                        ("total_sync_operations", Value::from(business.total_sync_operations)),
                    ],
                })
            }
            CheckKind::MemoryUsageMb => latest_with_trend(collector, series::MEMORY_USAGE_MB),
            CheckKind::DiskUsagePercent => latest_with_trend(collector, series::DISK_USAGE_PERCENT),
            CheckKind::ResponseTimeMs => average_with_p95(collector, series::RESPONSE_TIME_MS),
            CheckKind::SyncDurationSeconds => average_with_p95(collector, series::SYNC_DURATION),
        }
    }
}

fn latest_with_trend(collector: &MetricsCollector, name: &str) -> Option<Measurement> {
    let value = collector.latest(name)?;
    Some(Measurement {
        value,
        details: vec![("trend", Value::from(collector.trend(name)))],
    })
}

fn average_with_p95(collector: &MetricsCollector, name: &str) -> Option<Measurement> {
    let samples = collector.series_len(name);
    if samples == 0 {
        return None;
    }
    Some(Measurement {
        value: collector.average(name),
        details: vec![
            ("p95", Value::from(collector.percentile(name, 95.0))),
            ("samples", Value::from(samples as u64)),
        ],
    })
}

fn describe(kind: CheckKind, value: f64, threshold: f64) -> String {
    match kind {
        CheckKind::SyncDelayMinutes => {
            format!("마지막 동기화 이후 {value:.0}분 경과 (임계값 {threshold:.0}분)")
        }
        CheckKind::ErrorRatePercent => {
            format!("동기화 실패율 {value:.1}% (임계값 {threshold:.1}%)")
        }
        CheckKind::MemoryUsageMb => {
            format!("메모리 사용량 {value:.0}MB (임계값 {threshold:.0}MB)")
        }
        CheckKind::DiskUsagePercent => {
            format!("디스크 사용률 {value:.1}% (임계값 {threshold:.1}%)")
        }
        CheckKind::ResponseTimeMs => {
            format!("평균 응답 시간 {value:.0}ms (임계값 {threshold:.0}ms)")
        }
        CheckKind::SyncDurationSeconds => {
            format!("평균 동기화 소요 시간 {value:.1}초 (임계값 {threshold:.1}초)")
        }
    }
}
