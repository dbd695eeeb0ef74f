//! 호스트 리소스 샘플러.
//!
//! sysinfo로 현재 프로세스 RSS와 디스크 사용률을 읽어
//! `memory_usage_mb`, `disk_usage_percent` 게이지로 기록한다.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use sysinfo::{Disks, Pid, ProcessesToUpdate, System};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use syncpulse_core::error::CoreError;
use syncpulse_core::models::metrics::series;
use syncpulse_metrics::MetricsCollector;

/// 샘플 한 번의 결과
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResourceSample {
    /// 프로세스 RSS (MB)
    pub memory_mb: u64,
    /// 전체 디스크 사용률 (%), 디스크 정보가 없으면 None
    pub disk_percent: Option<u64>,
}

/// sysinfo 기반 리소스 샘플러
pub struct ResourceSampler {
    sys: Mutex<System>,
    pid: Pid,
    collector: Arc<MetricsCollector>,
}

impl ResourceSampler {
    /// 현재 프로세스를 대상으로 생성
    pub fn new(collector: Arc<MetricsCollector>) -> Self {
        let pid = Pid::from_u32(std::process::id());
        let mut sys = System::new();
        sys.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);

        Self {
            sys: Mutex::new(sys),
            pid,
            collector,
        }
    }

    /// 한 번 측정하고 수집기에 기록
    pub fn sample(&self) -> Result<ResourceSample, CoreError> {
        let memory_mb = {
            let mut sys = self
                .sys
                .lock()
                .map_err(|e| CoreError::Internal(format!("시스템 잠금 실패: {e}")))?;
            sys.refresh_processes(ProcessesToUpdate::Some(&[self.pid]), true);
            sys.process(self.pid)
                .map(|p| p.memory() / (1024 * 1024))
                .unwrap_or(0)
        };

        let disk_percent = {
            // 마운트 변화까지 반영하도록 매번 목록을 새로 읽는다
            let disks = Disks::new_with_refreshed_list();
            let (used, total) = disks.list().iter().fold((0u64, 0u64), |(used, total), d| {
                (
                    used + d.total_space().saturating_sub(d.available_space()),
                    total + d.total_space(),
                )
            });
            disk_usage_percent(used, total)
        };

        self.collector
            .record_gauge(series::MEMORY_USAGE_MB, memory_mb);
        if let Some(percent) = disk_percent {
            self.collector
                .record_gauge(series::DISK_USAGE_PERCENT, percent);
        }

        debug!(
            "리소스 샘플: 메모리 {memory_mb}MB, 디스크 {}",
            disk_percent.map_or_else(|| "-".to_string(), |p| format!("{p}%"))
        );
        Ok(ResourceSample {
            memory_mb,
            disk_percent,
        })
    }

    /// 블로킹 스레드에서 `sample()` 실행 (디스크/프로세스 스캔)
    pub async fn sample_blocking(self: &Arc<Self>) -> Result<ResourceSample, CoreError> {
        let sampler = Arc::clone(self);
        tokio::task::spawn_blocking(move || sampler.sample())
            .await
            .map_err(|e| CoreError::Internal(format!("리소스 샘플링 태스크 실패: {e}")))?
    }

    /// 주기 샘플링 루프
    pub async fn run(self: Arc<Self>, period: Duration, mut shutdown: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(period);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.sample_blocking().await {
                        warn!("리소스 샘플링 실패: {e}");
                    }
                }
                _ = shutdown.changed() => {
                    info!("리소스 샘플링 루프 종료");
                    break;
                }
            }
        }
    }
}

/// 사용률 (%) 반올림. 전체 용량이 0이면 None.
fn disk_usage_percent(used: u64, total: u64) -> Option<u64> {
    if total == 0 {
        return None;
    }
    Some((used as f64 / total as f64 * 100.0).round() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disk_percent_rounding() {
        assert_eq!(disk_usage_percent(0, 0), None);
        assert_eq!(disk_usage_percent(50, 200), Some(25));
        assert_eq!(disk_usage_percent(2, 3), Some(67));
        assert_eq!(disk_usage_percent(10, 10), Some(100));
    }

    #[test]
    fn sample_records_memory_gauge() {
        let collector = Arc::new(MetricsCollector::new(10));
        let sampler = ResourceSampler::new(collector.clone());
        let sample = sampler.sample().unwrap();

        assert_eq!(collector.series_len(series::MEMORY_USAGE_MB), 1);
        assert_eq!(
            collector.latest(series::MEMORY_USAGE_MB),
            Some(sample.memory_mb as f64)
        );
        if sample.disk_percent.is_some() {
            assert_eq!(collector.series_len(series::DISK_USAGE_PERCENT), 1);
        }
    }

    #[tokio::test(flavor = "current_thread")]
    async fn blocking_sample_records_gauges() {
        let collector = Arc::new(MetricsCollector::new(10));
        let sampler = Arc::new(ResourceSampler::new(collector.clone()));

        let sample = sampler.sample_blocking().await.unwrap();
        assert_eq!(
            collector.latest(series::MEMORY_USAGE_MB),
            Some(sample.memory_mb as f64)
        );
    }

    #[tokio::test]
    async fn run_loop_stops_on_shutdown() {
        let collector = Arc::new(MetricsCollector::new(10));
        let sampler = Arc::new(ResourceSampler::new(collector.clone()));
        let (tx, rx) = watch::channel(false);

        let handle = tokio::spawn(sampler.run(Duration::from_millis(10), rx));
        tokio::time::sleep(Duration::from_millis(35)).await;
        tx.send(true).unwrap();
        handle.await.unwrap();

        assert!(collector.series_len(series::MEMORY_USAGE_MB) >= 1);
    }
}
