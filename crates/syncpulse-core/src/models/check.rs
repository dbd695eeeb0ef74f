//! 드리프트 검사 종류.
//!
//! 임계값 테이블의 키이며, 각 검사가 발행하는 알림 종류를 결정한다.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// 알림 종류 이름
pub mod alert_kind {
    pub const SYNC_DRIFT: &str = "sync_drift";
    pub const HIGH_ERROR_RATE: &str = "high_error_rate";
    pub const HIGH_MEMORY_USAGE: &str = "high_memory_usage";
    pub const HIGH_DISK_USAGE: &str = "high_disk_usage";
    pub const SLOW_RESPONSE: &str = "slow_response";
    pub const SLOW_SYNC: &str = "slow_sync";
}

/// 드리프트 검사 종류
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    /// 마지막 동기화 이후 경과 시간 (분)
    SyncDelayMinutes,
    /// 동기화 실패율 (%)
    ErrorRatePercent,
    /// 프로세스 메모리 사용량 (MB)
    MemoryUsageMb,
    /// 디스크 사용률 (%)
    DiskUsagePercent,
    /// 평균 응답 시간 (ms)
    ResponseTimeMs,
    /// 평균 동기화 소요 시간 (초)
    SyncDurationSeconds,
}

impl CheckKind {
    /// 모니터가 평가하는 전체 검사 종류
    pub const ALL: [CheckKind; 6] = [
        CheckKind::SyncDelayMinutes,
        CheckKind::ErrorRatePercent,
        CheckKind::MemoryUsageMb,
        CheckKind::DiskUsagePercent,
        CheckKind::ResponseTimeMs,
        CheckKind::SyncDurationSeconds,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CheckKind::SyncDelayMinutes => "sync_delay_minutes",
            CheckKind::ErrorRatePercent => "error_rate_percent",
            CheckKind::MemoryUsageMb => "memory_usage_mb",
            CheckKind::DiskUsagePercent => "disk_usage_percent",
            CheckKind::ResponseTimeMs => "response_time_ms",
            CheckKind::SyncDurationSeconds => "sync_duration_seconds",
        }
    }

    /// 기본 임계값
    pub fn default_threshold(&self) -> f64 {
        match self {
            CheckKind::SyncDelayMinutes => 30.0,
            CheckKind::ErrorRatePercent => 5.0,
            CheckKind::MemoryUsageMb => 1024.0,
            CheckKind::DiskUsagePercent => 90.0,
            CheckKind::ResponseTimeMs => 2000.0,
            CheckKind::SyncDurationSeconds => 300.0,
        }
    }

    /// 위반 시 발행하는 알림 종류
    pub fn alert_kind(&self) -> &'static str {
        match self {
            CheckKind::SyncDelayMinutes => alert_kind::SYNC_DRIFT,
            CheckKind::ErrorRatePercent => alert_kind::HIGH_ERROR_RATE,
            CheckKind::MemoryUsageMb => alert_kind::HIGH_MEMORY_USAGE,
            CheckKind::DiskUsagePercent => alert_kind::HIGH_DISK_USAGE,
            CheckKind::ResponseTimeMs => alert_kind::SLOW_RESPONSE,
            CheckKind::SyncDurationSeconds => alert_kind::SLOW_SYNC,
        }
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CheckKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CheckKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| CoreError::validation("kind", format!("알 수 없는 검사 종류: {s}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_roundtrip() {
        for kind in CheckKind::ALL {
            assert_eq!(kind.as_str().parse::<CheckKind>().unwrap(), kind);
        }
    }

    #[test]
    fn unknown_kind_is_validation_error() {
        let err = "cpu_temperature".parse::<CheckKind>().unwrap_err();
        assert!(matches!(err, CoreError::Validation { .. }));
    }

    #[test]
    fn serde_matches_as_str() {
        let json = serde_json::to_string(&CheckKind::SyncDelayMinutes).unwrap();
        assert_eq!(json, "\"sync_delay_minutes\"");
    }
}
