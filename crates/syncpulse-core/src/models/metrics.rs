//! 메트릭 모델.
//!
//! 샘플 시리즈 요약, 비즈니스 카운터, 외부 협력자가 보고하는 동기화 작업.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// 잘 알려진 시리즈 이름
pub mod series {
    /// 동기화 소요 시간 (초)
    pub const SYNC_DURATION: &str = "sync_duration";
    /// 동기화당 처리 커밋 수
    pub const COMMIT_THROUGHPUT: &str = "commit_throughput";
    /// 누적 실패율 (%)
    pub const ERROR_RATE: &str = "error_rate";
    /// 프로세스 메모리 (MB)
    pub const MEMORY_USAGE_MB: &str = "memory_usage_mb";
    /// 디스크 사용률 (%)
    pub const DISK_USAGE_PERCENT: &str = "disk_usage_percent";
    /// 응답 시간 (ms)
    pub const RESPONSE_TIME_MS: &str = "response_time_ms";
    /// 동기화당 충돌 수
    pub const CONFLICT_COUNT: &str = "conflict_count";
}

/// 추세 판단 기울기 허용 오차
pub const TREND_EPSILON: f64 = 1e-3;

/// 샘플 종류
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SampleKind {
    /// 소요 시간 (초 단위로 저장)
    Duration,
    /// 정수 카운트
    Count,
    /// 실수 비율
    Ratio,
    /// 부호 없는 게이지
    Gauge,
}

impl SampleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SampleKind::Duration => "duration",
            SampleKind::Count => "count",
            SampleKind::Ratio => "ratio",
            SampleKind::Gauge => "gauge",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "duration" => Some(SampleKind::Duration),
            "count" => Some(SampleKind::Count),
            "ratio" => Some(SampleKind::Ratio),
            "gauge" => Some(SampleKind::Gauge),
            _ => None,
        }
    }
}

/// 저장소로 미러링되는 단일 샘플
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleRecord {
    pub series: String,
    pub kind: SampleKind,
    pub value: f64,
    pub recorded_at: DateTime<Utc>,
}

/// 추세 방향
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
}

impl TrendDirection {
    /// 기울기 → 방향 (|slope| ≤ TREND_EPSILON이면 Stable)
    pub fn from_slope(slope: f64) -> Self {
        if slope > TREND_EPSILON {
            TrendDirection::Increasing
        } else if slope < -TREND_EPSILON {
            TrendDirection::Decreasing
        } else {
            TrendDirection::Stable
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TrendDirection::Increasing => "increasing",
            TrendDirection::Decreasing => "decreasing",
            TrendDirection::Stable => "stable",
        }
    }
}

/// 시리즈 집계 요약
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesSummary {
    pub kind: SampleKind,
    pub count: usize,
    pub average: f64,
    pub min: f64,
    pub peak: f64,
    pub latest: f64,
    pub p50: f64,
    pub p95: f64,
    pub p99: f64,
    pub trend: f64,
    pub direction: TrendDirection,
}

/// 비즈니스 카운터
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BusinessMetrics {
    pub total_sync_operations: u64,
    pub successful_syncs: u64,
    pub failed_syncs: u64,
    pub commits_processed: u64,
    pub conflicts_detected: u64,
    pub conflicts_resolved: u64,
    pub branches_synced: u64,
}

impl BusinessMetrics {
    /// 성공률 (%). 동기화 기록이 없으면 100.
    pub fn success_rate(&self) -> f64 {
        if self.total_sync_operations == 0 {
            return 100.0;
        }
        self.successful_syncs as f64 / self.total_sync_operations as f64 * 100.0
    }

    /// 실패율 (%). 동기화 기록이 없으면 0.
    pub fn error_rate(&self) -> f64 {
        if self.total_sync_operations == 0 {
            return 0.0;
        }
        self.failed_syncs as f64 / self.total_sync_operations as f64 * 100.0
    }
}

/// 외부 협력자(동기화 엔진)가 보고하는 동기화 작업 결과
#[derive(Debug, Clone)]
pub struct SyncOperation {
    pub duration: Duration,
    pub success: bool,
    pub commits: u64,
    pub conflicts_detected: u64,
    pub conflicts_resolved: u64,
    pub branches: u64,
    pub completed_at: DateTime<Utc>,
}

impl SyncOperation {
    /// 완료 시각을 현재로 하는 작업 결과
    pub fn new(duration: Duration, success: bool) -> Self {
        Self {
            duration,
            success,
            commits: 0,
            conflicts_detected: 0,
            conflicts_resolved: 0,
            branches: 0,
            completed_at: Utc::now(),
        }
    }

    pub fn with_commits(mut self, commits: u64) -> Self {
        self.commits = commits;
        self
    }

    pub fn with_conflicts(mut self, detected: u64, resolved: u64) -> Self {
        self.conflicts_detected = detected;
        self.conflicts_resolved = resolved;
        self
    }

    pub fn with_branches(mut self, branches: u64) -> Self {
        self.branches = branches;
        self
    }

    pub fn completed_at(mut self, at: DateTime<Utc>) -> Self {
        self.completed_at = at;
        self
    }
}

/// 수집기 전체 상태의 일관된 스냅샷
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub taken_at: DateTime<Utc>,
    pub uptime_seconds: u64,
    pub series: BTreeMap<String, SeriesSummary>,
    pub business: BusinessMetrics,
    pub last_sync_at: Option<DateTime<Utc>>,
}

impl MetricsSnapshot {
    pub fn summary(&self, name: &str) -> Option<&SeriesSummary> {
        self.series.get(name)
    }

    /// 시리즈 평균 (없으면 0.0)
    pub fn average(&self, name: &str) -> f64 {
        self.summary(name).map(|s| s.average).unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trend_direction_uses_epsilon() {
        assert_eq!(TrendDirection::from_slope(0.5), TrendDirection::Increasing);
        assert_eq!(TrendDirection::from_slope(-0.5), TrendDirection::Decreasing);
        assert_eq!(TrendDirection::from_slope(TREND_EPSILON / 2.0), TrendDirection::Stable);
        assert_eq!(TrendDirection::from_slope(0.0), TrendDirection::Stable);
    }

    #[test]
    fn business_rates() {
        let empty = BusinessMetrics::default();
        assert_eq!(empty.success_rate(), 100.0);
        assert_eq!(empty.error_rate(), 0.0);

        let metrics = BusinessMetrics {
            total_sync_operations: 20,
            successful_syncs: 19,
            failed_syncs: 1,
            ..Default::default()
        };
        assert!((metrics.success_rate() - 95.0).abs() < 1e-9);
        assert!((metrics.error_rate() - 5.0).abs() < 1e-9);
    }
}
