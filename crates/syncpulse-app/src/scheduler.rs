//! 주기 작업 스케줄러.
//!
//! 리소스 샘플링, 대시보드 푸시, 리포트 생성(종류별), 보존 정리(1시간)를
//! 각자의 타이머로 띄운다. 드리프트 모니터는 자체 start/stop을 가진다.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use syncpulse_report::retention::cleanup_expired_reports;

use crate::pipeline::Pipeline;

/// 보존 정리 주기
pub const RETENTION_INTERVAL: Duration = Duration::from_secs(3600);

/// 주기 작업 스케줄러
pub struct Scheduler<'a> {
    pipeline: &'a Pipeline,
    retention_interval: Duration,
}

impl<'a> Scheduler<'a> {
    pub fn new(pipeline: &'a Pipeline) -> Self {
        Self {
            pipeline,
            retention_interval: RETENTION_INTERVAL,
        }
    }

    /// 보존 정리 주기 변경 (테스트용)
    pub fn with_retention_interval(mut self, interval: Duration) -> Self {
        self.retention_interval = interval;
        self
    }

    /// 모든 주기 작업 시작. (작업 이름, 핸들) 목록을 돌려준다.
    pub fn spawn_all(&self, shutdown: watch::Receiver<bool>) -> Vec<(String, JoinHandle<()>)> {
        let p = self.pipeline;
        let mut handles = Vec::new();

        handles.push((
            "resource-sampler".to_string(),
            tokio::spawn(
                p.sampler
                    .clone()
                    .run(p.config.sample_interval(), shutdown.clone()),
            ),
        ));

        if p.config.dashboard.enabled {
            handles.push((
                "dashboard-push".to_string(),
                tokio::spawn(p.dashboard.clone().run(shutdown.clone())),
            ));
        }

        if p.config.report.automatic_generation {
            for kind in &p.config.report.schedule {
                handles.push((
                    format!("report-{kind}"),
                    tokio::spawn(p.reports.clone().schedule_loop(*kind, shutdown.clone())),
                ));
            }
        }

        handles.push((
            "retention".to_string(),
            tokio::spawn(retention_loop(
                p.reports.output_dir().to_path_buf(),
                p.config.report.retention_days,
                p.sink.clone(),
                p.config.metrics.retention_days,
                self.retention_interval,
                shutdown,
            )),
        ));

        info!("주기 작업 {}개 시작", handles.len());
        handles
    }
}

/// 리포트 파일과 저장소 샘플 보존 정리
async fn retention_loop(
    report_dir: std::path::PathBuf,
    report_retention_days: u32,
    sink: Option<Arc<syncpulse_storage::SqliteSink>>,
    sample_retention_days: u32,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut interval = tokio::time::interval(period);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                match cleanup_expired_reports(&report_dir, report_retention_days).await {
                    Ok(removed) => debug!("리포트 보존 정리: {removed}개 삭제"),
                    Err(e) => warn!("리포트 보존 정리 실패: {e}"),
                }

                if let Some(sink) = sink.as_ref().filter(|_| sample_retention_days > 0) {
                    let cutoff = Utc::now() - chrono::Duration::days(i64::from(sample_retention_days));
                    let sink = sink.clone();
                    match tokio::task::spawn_blocking(move || sink.cleanup_before(cutoff)).await {
                        Ok(Ok(deleted)) => debug!("샘플 보존 정리: {deleted}건 삭제"),
                        Ok(Err(e)) => warn!("샘플 보존 정리 실패: {e}"),
                        Err(e) => warn!("샘플 보존 정리 태스크 실패: {e}"),
                    }
                }
            }
            _ = shutdown.changed() => {
                info!("보존 정리 루프 종료");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syncpulse_core::config::AppConfig;

    #[tokio::test]
    async fn all_loops_stop_on_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default_config();
        config.report.output_dir = dir.path().join("reports");
        config.metrics.sample_interval_secs = 1;
        let pipeline = Pipeline::build(config).unwrap();

        let (tx, rx) = watch::channel(false);
        let handles = Scheduler::new(&pipeline).spawn_all(rx);
        // 샘플러 + 대시보드 + 리포트 3종 + 보존 정리
        assert_eq!(handles.len(), 6);
        assert!(handles.iter().any(|(name, _)| name == "report-weekly"));

        tokio::time::sleep(Duration::from_millis(50)).await;
        tx.send(true).unwrap();
        for (_, handle) in handles {
            tokio::time::timeout(Duration::from_secs(5), handle)
                .await
                .unwrap()
                .unwrap();
        }
    }

    #[tokio::test]
    async fn retention_loop_cleans_sink_samples() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default_config();
        config.report.output_dir = dir.path().join("reports");
        config.report.automatic_generation = false;
        config.dashboard.enabled = false;
        config.storage.enabled = true;
        config.storage.db_path = Some(dir.path().join("samples.db"));
        config.metrics.retention_days = 1;
        let pipeline = Pipeline::build(config).unwrap();

        let sink = pipeline.sink.clone().unwrap();
        sink.insert(&syncpulse_core::models::metrics::SampleRecord {
            series: "memory_usage_mb".to_string(),
            kind: syncpulse_core::models::metrics::SampleKind::Gauge,
            value: 1.0,
            recorded_at: Utc::now() - chrono::Duration::days(3),
        })
        .unwrap();

        let (tx, rx) = watch::channel(false);
        let handles = Scheduler::new(&pipeline)
            .with_retention_interval(Duration::from_millis(20))
            .spawn_all(rx);
        tokio::time::sleep(Duration::from_millis(100)).await;
        tx.send(true).unwrap();
        for (_, handle) in handles {
            handle.await.unwrap();
        }

        assert!(sink
            .recent_samples("memory_usage_mb", 10)
            .unwrap()
            .iter()
            .all(|s| s.recorded_at > Utc::now() - chrono::Duration::days(1)));
    }

    #[tokio::test]
    async fn zero_sample_retention_skips_sink_cleanup() {
        let dir = tempfile::tempdir().unwrap();
        let sink = Arc::new(syncpulse_storage::SqliteSink::open_in_memory().unwrap());
        sink.insert(&syncpulse_core::models::metrics::SampleRecord {
            series: "memory_usage_mb".to_string(),
            kind: syncpulse_core::models::metrics::SampleKind::Gauge,
            value: 1.0,
            recorded_at: Utc::now(),
        })
        .unwrap();

        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(retention_loop(
            dir.path().join("reports"),
            0,
            Some(sink.clone()),
            0,
            Duration::from_millis(20),
            rx,
        ));
        tokio::time::sleep(Duration::from_millis(100)).await;
        tx.send(true).unwrap();
        handle.await.unwrap();

        assert_eq!(sink.sample_count().unwrap(), 1);
    }
}
