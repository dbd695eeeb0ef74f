//! 유한 길이 샘플 시리즈.
//!
//! 용량을 넘으면 가장 오래된 샘플부터 제거한다 (FIFO).

use chrono::{DateTime, Utc};
use std::collections::VecDeque;

use syncpulse_core::models::metrics::{SampleKind, SeriesSummary, TrendDirection};

use crate::stats;

/// 단일 관측값
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub value: f64,
    pub recorded_at: DateTime<Utc>,
}

/// 이름 붙은 샘플 시리즈 (링 버퍼)
#[derive(Debug, Clone)]
pub struct SampleSeries {
    kind: SampleKind,
    samples: VecDeque<Sample>,
    capacity: usize,
}

impl SampleSeries {
    /// 새 시리즈 생성 (용량은 최소 1)
    pub fn new(kind: SampleKind, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            kind,
            samples: VecDeque::with_capacity(capacity.min(1_024)),
            capacity,
        }
    }

    /// 샘플 추가. 용량 초과로 밀려난 샘플을 반환한다.
    pub fn push(&mut self, value: f64, recorded_at: DateTime<Utc>) -> Option<Sample> {
        let evicted = if self.samples.len() >= self.capacity {
            self.samples.pop_front()
        } else {
            None
        };
        self.samples.push_back(Sample { value, recorded_at });
        evicted
    }

    pub fn kind(&self) -> SampleKind {
        self.kind
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// 가장 최근 값
    pub fn latest(&self) -> Option<f64> {
        self.samples.back().map(|s| s.value)
    }

    /// 삽입 순서대로 값 복사
    pub fn values(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.value).collect()
    }

    /// 삽입 순서대로 샘플 순회
    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }

    /// 전체 집계 요약
    pub fn summary(&self) -> SeriesSummary {
        let values = self.values();
        let mut sorted = values.clone();
        sorted.sort_by(f64::total_cmp);
        let trend = stats::trend(&values);

        SeriesSummary {
            kind: self.kind,
            count: values.len(),
            average: stats::average(&values),
            min: sorted.first().copied().unwrap_or(0.0),
            peak: sorted.last().copied().unwrap_or(0.0),
            latest: self.latest().unwrap_or(0.0),
            p50: stats::percentile_sorted(&sorted, 50.0),
            p95: stats::percentile_sorted(&sorted, 95.0),
            p99: stats::percentile_sorted(&sorted, 99.0),
            trend,
            direction: TrendDirection::from_slope(trend),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifo_eviction() {
        let mut series = SampleSeries::new(SampleKind::Gauge, 3);
        let now = Utc::now();
        assert!(series.push(1.0, now).is_none());
        assert!(series.push(2.0, now).is_none());
        assert!(series.push(3.0, now).is_none());

        let evicted = series.push(4.0, now).unwrap();
        assert_eq!(evicted.value, 1.0);
        let evicted = series.push(5.0, now).unwrap();
        assert_eq!(evicted.value, 2.0);

        assert_eq!(series.len(), 3);
        assert_eq!(series.values(), vec![3.0, 4.0, 5.0]);
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let mut series = SampleSeries::new(SampleKind::Count, 0);
        series.push(1.0, Utc::now());
        series.push(2.0, Utc::now());
        assert_eq!(series.len(), 1);
        assert_eq!(series.latest(), Some(2.0));
    }

    #[test]
    fn summary_of_increasing_series() {
        let mut series = SampleSeries::new(SampleKind::Duration, 100);
        for i in 1..=10 {
            series.push(i as f64, Utc::now());
        }
        let summary = series.summary();
        assert_eq!(summary.count, 10);
        assert_eq!(summary.min, 1.0);
        assert_eq!(summary.peak, 10.0);
        assert_eq!(summary.latest, 10.0);
        assert!((summary.average - 5.5).abs() < 1e-9);
        assert_eq!(summary.p50, 6.0);
        assert_eq!(summary.p99, 10.0);
        assert_eq!(summary.direction, TrendDirection::Increasing);
    }

    #[test]
    fn empty_summary_is_zero() {
        let summary = SampleSeries::new(SampleKind::Ratio, 10).summary();
        assert_eq!(summary.count, 0);
        assert_eq!(summary.average, 0.0);
        assert_eq!(summary.p95, 0.0);
        assert_eq!(summary.direction, TrendDirection::Stable);
    }
}
