//! 파이프라인 전체 흐름 통합 테스트.
//!
//! 수집기 → 드리프트 모니터 → 디스패처 → 채널/리포트/저장소.

use std::time::Duration;

use chrono::Utc;
use syncpulse_app::Pipeline;
use syncpulse_core::config::AppConfig;
use syncpulse_core::error::CoreError;
use syncpulse_core::models::alert::{Alert, Severity};
use syncpulse_core::models::check::alert_kind;
use syncpulse_core::models::metrics::{series, SyncOperation};
use syncpulse_core::models::report::{ReportKind, ReportPeriod};

fn base_config(dir: &std::path::Path) -> AppConfig {
    let mut config = AppConfig::default_config();
    config.report.output_dir = dir.join("reports");
    config.report.automatic_generation = false;
    config.dashboard.enabled = false;
    config
}

#[tokio::test]
async fn stale_sync_raises_single_drift_alert() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::build(base_config(dir.path())).unwrap();

    pipeline.collector.record_sync_operation(
        SyncOperation::new(Duration::from_secs(10), true)
            .with_commits(3)
            .completed_at(Utc::now() - chrono::Duration::minutes(45)),
    );

    let alerts = pipeline.monitor.check_now().await;
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].kind, alert_kind::SYNC_DRIFT);
    assert_eq!(alerts[0].severity, Severity::High);
    assert_eq!(pipeline.dispatcher.history_len(), 1);
}

#[tokio::test]
async fn healthy_pipeline_raises_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::build(base_config(dir.path())).unwrap();

    pipeline
        .collector
        .record_sync_operation(SyncOperation::new(Duration::from_secs(5), true));

    assert!(pipeline.monitor.check_now().await.is_empty());
    assert_eq!(pipeline.dispatcher.history_len(), 0);
}

#[tokio::test]
async fn chat_channel_respects_hourly_limit() {
    let mut server = mockito::Server::new_async().await;
    let hook = server
        .mock("POST", "/hook")
        .with_status(200)
        .expect(1)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut config = base_config(dir.path());
    config.alert.slack_enabled = true;
    config.alert.webhook_url = format!("{}/hook", server.url());
    config.alert.rate_limit_per_hour = 1;
    config.alert.retry_attempts = 1;
    let pipeline = Pipeline::build(config).unwrap();
    assert_eq!(pipeline.dispatcher.channel_names(), vec!["chat".to_string()]);

    pipeline
        .dispatcher
        .send(Alert::new("sync_drift", Severity::High, "첫 알림", "test"))
        .await
        .unwrap();
    let second = pipeline
        .dispatcher
        .send(Alert::new("sync_drift", Severity::High, "두 번째 알림", "test"))
        .await;

    assert!(matches!(
        second,
        Err(CoreError::AlertRateLimited { limit_per_hour: 1 })
    ));
    assert_eq!(pipeline.dispatcher.history_len(), 1);
    hook.assert_async().await;
}

#[tokio::test]
async fn report_reflects_recorded_activity() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::build(base_config(dir.path())).unwrap();

    for i in 0..4 {
        pipeline.collector.record_sync_operation(
            SyncOperation::new(Duration::from_secs(20), i != 3).with_commits(2),
        );
    }
    pipeline.monitor.check_now().await;

    let period = ReportPeriod::ending_at(ReportKind::Daily, Utc::now() + chrono::Duration::seconds(1));
    let report = pipeline.reports.generate(ReportKind::Daily, period);
    assert_eq!(report.summary.total_syncs, 4);
    assert_eq!(report.summary.commits_processed, 8);
    assert!((report.summary.success_rate - 75.0).abs() < 1e-9);
    // 실패율 25% > 5% 임계값
    assert_eq!(
        report.alerts.by_kind.get(alert_kind::HIGH_ERROR_RATE),
        Some(&1)
    );

    let formats = pipeline.reports.formats().to_vec();
    let outcome = pipeline.reports.save(&report, &formats).await;
    assert!(outcome.is_complete());
    assert_eq!(outcome.written.len(), formats.len());
    for path in &outcome.written {
        assert!(path.starts_with(dir.path().join("reports")));
        assert!(path.exists());
    }
}

#[tokio::test]
async fn storage_mirrors_samples_to_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = base_config(dir.path());
    config.storage.enabled = true;
    config.storage.db_path = Some(dir.path().join("samples.db"));
    let pipeline = Pipeline::build(config).unwrap();

    pipeline
        .collector
        .record_sync_operation(SyncOperation::new(Duration::from_millis(1500), true));
    pipeline.collector.shutdown_sink().await;

    let sink = pipeline.sink.clone().unwrap();
    let samples = sink.recent_samples(series::SYNC_DURATION, 10).unwrap();
    assert_eq!(samples.len(), 1);
    assert!((samples[0].value - 1.5).abs() < 1e-9);
    assert!(sink.sample_count().unwrap() >= 1);
}
