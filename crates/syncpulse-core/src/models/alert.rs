//! 알림 모델.
//!
//! 드리프트 모니터가 생성하고 디스패처 이력이 소유하는 알림 구조체와
//! 심각도, 통계 타입.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// 임계값 대비 비율이 이 값 이상이면 Critical
pub const CRITICAL_RATIO: f64 = 2.0;
/// 임계값 대비 비율이 이 값 이상이면 High
pub const HIGH_RATIO: f64 = 1.5;
/// 임계값 대비 비율이 이 값 이상이면 Medium
pub const MEDIUM_RATIO: f64 = 1.2;

/// 알림 심각도 (순서 비교 가능)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// 전체 심각도 (낮은 순)
    pub const ALL: [Severity; 4] = [
        Severity::Low,
        Severity::Medium,
        Severity::High,
        Severity::Critical,
    ];

    /// 임계값 대비 비율로 심각도 산출
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio >= CRITICAL_RATIO {
            Severity::Critical
        } else if ratio >= HIGH_RATIO {
            Severity::High
        } else if ratio >= MEDIUM_RATIO {
            Severity::Medium
        } else {
            Severity::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }

    /// 채팅 첨부 색상
    pub fn color(&self) -> &'static str {
        match self {
            Severity::Low => "#36a64f",
            Severity::Medium => "#daa038",
            Severity::High => "#ff8c00",
            Severity::Critical => "#d00000",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 알림
///
/// 생성 후 `resolved`/`resolved_at` 외에는 변경되지 않는다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    /// `{kind}_{unix_millis}_{8 hex}` 형식의 고유 ID
    pub id: String,
    /// 알림 종류 (예: "sync_drift")
    pub kind: String,
    /// 심각도
    pub severity: Severity,
    /// 사람이 읽는 메시지
    pub message: String,
    /// 종류별 상세 값 (측정값, 임계값, 비율 등)
    #[serde(default)]
    pub details: BTreeMap<String, serde_json::Value>,
    /// 생성 시각
    pub timestamp: DateTime<Utc>,
    /// 생성 컴포넌트
    pub source: String,
    /// 해결 여부
    #[serde(default)]
    pub resolved: bool,
    /// 해결 시각
    #[serde(default)]
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Alert {
    /// 새 알림 생성 (ID/타임스탬프 자동 할당)
    pub fn new(
        kind: impl Into<String>,
        severity: Severity,
        message: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        let kind = kind.into();
        let timestamp = Utc::now();
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        let id = format!("{}_{}_{}", kind, timestamp.timestamp_millis(), &suffix[..8]);
        Self {
            id,
            kind,
            severity,
            message: message.into(),
            details: BTreeMap::new(),
            timestamp,
            source: source.into(),
            resolved: false,
            resolved_at: None,
        }
    }

    /// 상세 값 추가 (빌더)
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    /// 생성 시각 지정 (빌더, 테스트/재생용)
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// 해결 처리. 이미 해결된 알림은 최초 해결 시각을 유지한다.
    pub fn mark_resolved(&mut self, at: DateTime<Utc>) {
        if !self.resolved {
            self.resolved = true;
            self.resolved_at = Some(at);
        }
    }
}

/// 알림 이력 통계
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlertStats {
    /// 이력 내 전체 알림 수
    pub total: usize,
    /// 종류별 건수
    pub by_kind: BTreeMap<String, usize>,
    /// 심각도별 건수
    pub by_severity: BTreeMap<String, usize>,
    /// 미해결 건수
    pub unresolved: usize,
    /// 가장 최근 알림 시각
    pub last_alert_at: Option<DateTime<Utc>>,
    /// 최근 알림 (최신순)
    pub recent: Vec<Alert>,
    /// 시간당 한도로 거부된 누적 건수
    pub rate_limited: u64,
    /// 모든 채널 전달 성공 누적 건수
    pub delivered: u64,
    /// 하나 이상 채널 실패 누적 건수
    pub delivery_failures: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_boundaries() {
        assert_eq!(Severity::from_ratio(2.0), Severity::Critical);
        assert_eq!(Severity::from_ratio(1.99), Severity::High);
        assert_eq!(Severity::from_ratio(1.5), Severity::High);
        assert_eq!(Severity::from_ratio(1.2), Severity::Medium);
        assert_eq!(Severity::from_ratio(1.01), Severity::Low);
    }

    #[test]
    fn alert_id_format() {
        let alert = Alert::new("slow_sync", Severity::Low, "msg", "test");
        let parts: Vec<&str> = alert.id.rsplitn(3, '_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].len(), 8);
        assert!(parts[0].chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(parts[1].parse::<i64>().unwrap(), alert.timestamp.timestamp_millis());
        assert_eq!(parts[2], "slow_sync");
    }

    #[test]
    fn ids_are_unique_within_same_millisecond() {
        let a = Alert::new("sync_drift", Severity::Low, "m", "s");
        let b = Alert::new("sync_drift", Severity::Low, "m", "s");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn resolve_keeps_first_timestamp() {
        let mut alert = Alert::new("sync_drift", Severity::High, "m", "s");
        let first = Utc::now();
        alert.mark_resolved(first);
        alert.mark_resolved(first + chrono::Duration::seconds(10));
        assert!(alert.resolved);
        assert_eq!(alert.resolved_at, Some(first));
    }

    #[test]
    fn severity_serializes_lowercase() {
        let json = serde_json::to_string(&Severity::Critical).unwrap();
        assert_eq!(json, "\"critical\"");
    }
}
