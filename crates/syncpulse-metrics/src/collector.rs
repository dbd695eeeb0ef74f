//! 메트릭 수집기.
//!
//! 모든 시리즈와 비즈니스 카운터를 하나의 `RwLock`으로 보호한다.
//! 기록은 배타 잠금, 조회는 공유 잠금으로 수행되며 스냅샷은 단일 잠금
//! 획득 안에서 만들어지므로 필드 간 찢어진 읽기가 없다.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::{debug, warn};

use syncpulse_core::config::MetricsConfig;
use syncpulse_core::models::metrics::{
    series, BusinessMetrics, MetricsSnapshot, SampleKind, SampleRecord, SyncOperation,
};
use syncpulse_core::ports::sink::MetricsSink;

use crate::series::SampleSeries;
use crate::sink_writer::SinkWriter;
use crate::stats;

#[derive(Default)]
struct CollectorState {
    series: HashMap<String, SampleSeries>,
    business: BusinessMetrics,
    last_sync_at: Option<DateTime<Utc>>,
}

impl CollectorState {
    fn push(
        &mut self,
        name: &str,
        kind: SampleKind,
        value: f64,
        at: DateTime<Utc>,
        max_samples: usize,
    ) {
        let series = self
            .series
            .entry(name.to_string())
            .or_insert_with(|| SampleSeries::new(kind, max_samples));
        if series.kind() != kind {
            debug!(
                "시리즈 {name} 종류 불일치: 기존 {}, 기록 {}",
                series.kind().as_str(),
                kind.as_str()
            );
        }
        series.push(value, at);
    }
}

/// 스레드 안전한 인메모리 메트릭 수집기
pub struct MetricsCollector {
    state: RwLock<CollectorState>,
    max_samples: usize,
    started_at: Instant,
    sink: Option<SinkWriter>,
}

impl MetricsCollector {
    /// 시리즈당 최대 샘플 수를 지정하여 생성
    pub fn new(max_samples: usize) -> Self {
        Self {
            state: RwLock::new(CollectorState::default()),
            max_samples: max_samples.max(1),
            started_at: Instant::now(),
            sink: None,
        }
    }

    /// 설정에서 생성
    pub fn from_config(config: &MetricsConfig) -> Self {
        Self::new(config.max_samples)
    }

    /// 저장소 미러링 활성화 (빌더). Tokio 런타임 안에서 호출해야 한다.
    pub fn with_sink(mut self, sink: Arc<dyn MetricsSink>, queue_capacity: usize) -> Self {
        self.sink = Some(SinkWriter::spawn(sink, queue_capacity));
        self
    }

    pub fn max_samples(&self) -> usize {
        self.max_samples
    }

    // ============================================================
    // 기록
    // ============================================================

    /// 소요 시간 기록 (초 단위로 저장)
    pub fn record_duration(&self, name: &str, value: Duration) {
        self.record(name, SampleKind::Duration, value.as_secs_f64());
    }

    /// 정수 카운트 기록
    pub fn record_count(&self, name: &str, value: u64) {
        self.record(name, SampleKind::Count, value as f64);
    }

    /// 실수 비율 기록. 비유한 값은 무시한다.
    pub fn record_ratio(&self, name: &str, value: f64) {
        if !value.is_finite() {
            warn!("비유한 비율 무시: {name}={value}");
            return;
        }
        self.record(name, SampleKind::Ratio, value);
    }

    /// 게이지 기록
    pub fn record_gauge(&self, name: &str, value: u64) {
        self.record(name, SampleKind::Gauge, value as f64);
    }

    /// 응답 시간 기록 (`response_time_ms` 시리즈)
    pub fn record_response_time(&self, elapsed: Duration) {
        self.record(
            series::RESPONSE_TIME_MS,
            SampleKind::Gauge,
            elapsed.as_secs_f64() * 1_000.0,
        );
    }

    fn record(&self, name: &str, kind: SampleKind, value: f64) {
        let now = Utc::now();
        self.state
            .write()
            .push(name, kind, value, now, self.max_samples);
        self.mirror(name, kind, value, now);
    }

    /// 동기화 작업 결과 반영.
    ///
    /// 소요 시간/커밋 수/충돌 수 시리즈와 비즈니스 카운터를 갱신하고
    /// 누적 실패율을 `error_rate` 시리즈에 기록한다. 마지막 동기화 시각은
    /// 성공한 작업만 갱신한다.
    pub fn record_sync_operation(&self, op: SyncOperation) {
        let at = op.completed_at;
        let duration_secs = op.duration.as_secs_f64();
        let error_rate = {
            let mut state = self.state.write();
            let max = self.max_samples;
            state.push(series::SYNC_DURATION, SampleKind::Duration, duration_secs, at, max);
            state.push(series::COMMIT_THROUGHPUT, SampleKind::Count, op.commits as f64, at, max);
            state.push(
                series::CONFLICT_COUNT,
                SampleKind::Count,
                op.conflicts_detected as f64,
                at,
                max,
            );

            let business = &mut state.business;
            business.total_sync_operations += 1;
            if op.success {
                business.successful_syncs += 1;
            } else {
                business.failed_syncs += 1;
            }
            business.commits_processed += op.commits;
            business.conflicts_detected += op.conflicts_detected;
            business.conflicts_resolved += op.conflicts_resolved;
            business.branches_synced += op.branches;
            let error_rate = business.error_rate();

            if op.success && state.last_sync_at.map_or(true, |last| at > last) {
                state.last_sync_at = Some(at);
            }
            state.push(series::ERROR_RATE, SampleKind::Ratio, error_rate, at, max);
            error_rate
        };

        self.mirror(series::SYNC_DURATION, SampleKind::Duration, duration_secs, at);
        self.mirror(series::COMMIT_THROUGHPUT, SampleKind::Count, op.commits as f64, at);
        self.mirror(
            series::CONFLICT_COUNT,
            SampleKind::Count,
            op.conflicts_detected as f64,
            at,
        );
        self.mirror(series::ERROR_RATE, SampleKind::Ratio, error_rate, at);
    }

    fn mirror(&self, name: &str, kind: SampleKind, value: f64, at: DateTime<Utc>) {
        if let Some(sink) = &self.sink {
            sink.enqueue(SampleRecord {
                series: name.to_string(),
                kind,
                value,
                recorded_at: at,
            });
        }
    }

    // ============================================================
    // 조회
    // ============================================================

    /// 시리즈 평균 (없으면 0.0)
    pub fn average(&self, name: &str) -> f64 {
        self.with_values(name, |values| stats::average(values))
    }

    /// 시리즈 백분위 (정렬 후 인덱스 선택, 없으면 0.0)
    pub fn percentile(&self, name: &str, p: f64) -> f64 {
        self.with_values(name, |values| stats::percentile(values, p))
    }

    /// 시리즈 추세 기울기 (없으면 0.0)
    pub fn trend(&self, name: &str) -> f64 {
        self.with_values(name, |values| stats::trend(values))
    }

    /// 가장 최근 값
    pub fn latest(&self, name: &str) -> Option<f64> {
        self.state.read().series.get(name).and_then(|s| s.latest())
    }

    pub fn series_len(&self, name: &str) -> usize {
        self.state.read().series.get(name).map_or(0, |s| s.len())
    }

    /// 기록된 시리즈 이름 (정렬)
    pub fn series_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.state.read().series.keys().cloned().collect();
        names.sort();
        names
    }

    /// 시리즈 값 복사 (삽입 순서)
    pub fn values(&self, name: &str) -> Vec<f64> {
        self.state
            .read()
            .series
            .get(name)
            .map(|s| s.values())
            .unwrap_or_default()
    }

    pub fn business(&self) -> BusinessMetrics {
        self.state.read().business.clone()
    }

    /// 마지막 성공 동기화 시각
    pub fn last_sync_at(&self) -> Option<DateTime<Utc>> {
        self.state.read().last_sync_at
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// 전체 상태의 일관된 스냅샷 (잠금 1회)
    pub fn snapshot(&self) -> MetricsSnapshot {
        let state = self.state.read();
        MetricsSnapshot {
            taken_at: Utc::now(),
            uptime_seconds: self.started_at.elapsed().as_secs(),
            series: state
                .series
                .iter()
                .map(|(name, series)| (name.clone(), series.summary()))
                .collect(),
            business: state.business.clone(),
            last_sync_at: state.last_sync_at,
        }
    }

    fn with_values<F>(&self, name: &str, f: F) -> f64
    where
        F: FnOnce(&[f64]) -> f64,
    {
        let state = self.state.read();
        match state.series.get(name) {
            Some(series) => f(&series.values()),
            None => 0.0,
        }
    }

    // ============================================================
    // 미러링 상태
    // ============================================================

    /// 미러링 큐를 닫고 남은 샘플 저장 완료까지 대기
    pub async fn shutdown_sink(&self) {
        if let Some(sink) = &self.sink {
            sink.shutdown().await;
        }
    }

    /// 큐 포화로 버려진 샘플 수
    pub fn dropped_samples(&self) -> u64 {
        self.sink.as_ref().map_or(0, |s| s.dropped())
    }

    /// 저장 성공한 샘플 수
    pub fn mirrored_samples(&self) -> u64 {
        self.sink.as_ref().map_or(0, |s| s.written())
    }
}
