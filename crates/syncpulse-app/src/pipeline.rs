//! 컴포넌트 와이어링.
//!
//! 설정 하나로 수집기 → 모니터 → 디스패처 → 리포트/대시보드를 조립한다.
//! 전역 상태 없이 호출마다 독립된 파이프라인이 만들어진다.

use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use syncpulse_alert::AlertDispatcher;
use syncpulse_core::config::AppConfig;
use syncpulse_core::error::CoreError;
use syncpulse_core::ports::publisher::AlertPublisher;
use syncpulse_core::ports::sink::MetricsSink;
use syncpulse_metrics::MetricsCollector;
use syncpulse_monitor::{DriftMonitor, ResourceSampler};
use syncpulse_network::build_channels;
use syncpulse_report::ReportBuilder;
use syncpulse_storage::SqliteSink;
use syncpulse_web::{AppState, LiveDashboard, WebServer};

/// 조립된 파이프라인
pub struct Pipeline {
    pub config: AppConfig,
    pub collector: Arc<MetricsCollector>,
    pub dispatcher: Arc<AlertDispatcher>,
    pub monitor: Arc<DriftMonitor>,
    pub sampler: Arc<ResourceSampler>,
    pub reports: Arc<ReportBuilder>,
    pub dashboard: Arc<LiveDashboard>,
    /// 샘플 저장소 (`storage.enabled`일 때만)
    pub sink: Option<Arc<SqliteSink>>,
    pub started_at: Instant,
}

impl Pipeline {
    /// 설정 검증 후 조립. 저장소를 켜면 미러링 워커를 띄우므로 tokio 런타임 안에서 호출해야 한다.
    pub fn build(config: AppConfig) -> Result<Self, CoreError> {
        config.validate()?;

        let sink = if config.storage.enabled {
            let path = config.storage.db_path.as_deref().ok_or_else(|| {
                CoreError::Config("저장소 활성화 시 storage.db_path 필수".to_string())
            })?;
            Some(Arc::new(SqliteSink::open(path)?))
        } else {
            None
        };

        let mut collector = MetricsCollector::from_config(&config.metrics);
        if let Some(sink) = &sink {
            let sink: Arc<dyn MetricsSink> = sink.clone();
            collector = collector.with_sink(sink, config.storage.sink_queue_capacity);
        }
        let collector = Arc::new(collector);

        let channels = build_channels(&config.alert)?;
        let dispatcher = Arc::new(AlertDispatcher::new(&config.alert, channels));
        info!("알림 채널: {:?}", dispatcher.channel_names());

        let publisher: Arc<dyn AlertPublisher> = dispatcher.clone();
        let monitor = Arc::new(DriftMonitor::new(
            collector.clone(),
            publisher,
            &config.metrics,
            &config.monitor,
        ));
        let sampler = Arc::new(ResourceSampler::new(collector.clone()));
        let reports = Arc::new(ReportBuilder::new(
            collector.clone(),
            dispatcher.clone(),
            monitor.clone(),
            &config.report,
        ));
        let dashboard = Arc::new(LiveDashboard::new(
            collector.clone(),
            dispatcher.clone(),
            &config.dashboard,
        ));

        Ok(Self {
            config,
            collector,
            dispatcher,
            monitor,
            sampler,
            reports,
            dashboard,
            sink,
            started_at: Instant::now(),
        })
    }

    /// 웹 핸들러 상태
    pub fn app_state(&self) -> AppState {
        AppState {
            collector: self.collector.clone(),
            dispatcher: self.dispatcher.clone(),
            monitor: self.monitor.clone(),
            reports: self.reports.clone(),
            dashboard: self.dashboard.clone(),
            started_at: self.started_at,
        }
    }

    /// 대시보드 웹 서버
    pub fn web_server(&self) -> WebServer {
        WebServer::new(self.app_state(), self.config.dashboard.clone())
    }
}
