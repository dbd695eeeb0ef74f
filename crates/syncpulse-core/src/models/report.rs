//! 리포트 모델.
//!
//! 리포트 종류/기간/출력 형식과, 생성 후 변경되지 않는 리포트 구조체.

use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::models::alert::Alert;
use crate::models::metrics::{BusinessMetrics, SeriesSummary, TrendDirection};

/// 리포트 종류
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    Daily,
    Weekly,
    Monthly,
}

impl ReportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::Daily => "daily",
            ReportKind::Weekly => "weekly",
            ReportKind::Monthly => "monthly",
        }
    }

    /// 리포트 제목 접두어
    pub fn title(&self) -> &'static str {
        match self {
            ReportKind::Daily => "일간 동기화 리포트",
            ReportKind::Weekly => "주간 동기화 리포트",
            ReportKind::Monthly => "월간 동기화 리포트",
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(ReportKind::Daily),
            "weekly" => Ok(ReportKind::Weekly),
            "monthly" => Ok(ReportKind::Monthly),
            other => Err(CoreError::validation(
                "report_kind",
                format!("알 수 없는 리포트 종류: {other}"),
            )),
        }
    }
}

/// 리포트 출력 형식
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Json,
    Html,
    Markdown,
}

impl ReportFormat {
    /// 파일 확장자
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Json => "json",
            ReportFormat::Html => "html",
            ReportFormat::Markdown => "md",
        }
    }
}

/// 리포트 집계 기간 `[start, end)`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReportPeriod {
    pub kind: ReportKind,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ReportPeriod {
    /// `end`에서 끝나는 한 주기
    pub fn ending_at(kind: ReportKind, end: DateTime<Utc>) -> Self {
        let start = match kind {
            ReportKind::Daily => end - Duration::days(1),
            ReportKind::Weekly => end - Duration::days(7),
            ReportKind::Monthly => end
                .checked_sub_months(Months::new(1))
                .unwrap_or(end - Duration::days(30)),
        };
        Self { kind, start, end }
    }

    /// 직전 주기
    pub fn previous(&self) -> Self {
        Self::ending_at(self.kind, self.start)
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at < self.end
    }
}

/// 직전 리포트 대비 변화량 (직전 리포트가 없으면 None)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HeadlineDeltas {
    pub total_syncs: Option<i64>,
    pub success_rate: Option<f64>,
    pub average_sync_duration_secs: Option<f64>,
    pub error_rate: Option<f64>,
    pub commits_processed: Option<i64>,
    /// 직전 기간 알림 이력과 비교한 변화량
    pub alerts_in_period: i64,
}

/// 핵심 지표 요약
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total_syncs: u64,
    pub success_rate: f64,
    pub average_sync_duration_secs: f64,
    pub error_rate: f64,
    pub alerts_in_period: usize,
    pub commits_processed: u64,
    pub deltas: HeadlineDeltas,
}

/// 성능 섹션
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PerformanceSection {
    pub series: BTreeMap<String, SeriesSummary>,
    pub uptime_seconds: u64,
}

/// 알림 섹션
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlertsSection {
    pub total: usize,
    pub by_kind: BTreeMap<String, usize>,
    pub by_severity: BTreeMap<String, usize>,
    pub unresolved: usize,
    pub critical_unresolved: usize,
    pub previous_period_total: usize,
    /// 기간 내 최근 알림 (최신순)
    pub recent: Vec<Alert>,
}

/// 시리즈별 추세
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendEntry {
    pub series: String,
    pub slope: f64,
    pub direction: TrendDirection,
}

/// 추세 섹션
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrendsSection {
    pub entries: Vec<TrendEntry>,
}

impl TrendsSection {
    pub fn direction_of(&self, series: &str) -> Option<TrendDirection> {
        self.entries
            .iter()
            .find(|entry| entry.series == series)
            .map(|entry| entry.direction)
    }
}

/// 비즈니스 섹션
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BusinessSection {
    pub metrics: BusinessMetrics,
    pub last_sync_at: Option<DateTime<Utc>>,
}

/// 생성된 리포트 (불변)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub id: String,
    pub title: String,
    pub generated_at: DateTime<Utc>,
    pub period: ReportPeriod,
    pub summary: ReportSummary,
    pub performance: PerformanceSection,
    pub alerts: AlertsSection,
    pub trends: TrendsSection,
    pub business: BusinessSection,
    pub recommendations: Vec<String>,
    /// 부록 (임계값 테이블, 디스패처 통계 등)
    pub appendices: BTreeMap<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn monthly_period_uses_calendar_months() {
        let end = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let period = ReportPeriod::ending_at(ReportKind::Monthly, end);
        assert_eq!(period.start, Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap());

        let previous = period.previous();
        assert_eq!(previous.end, period.start);
        assert_eq!(previous.start, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn period_is_half_open() {
        let end = Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap();
        let period = ReportPeriod::ending_at(ReportKind::Daily, end);
        assert!(period.contains(period.start));
        assert!(!period.contains(end));
    }

    #[test]
    fn report_kind_parse() {
        assert_eq!("weekly".parse::<ReportKind>().unwrap(), ReportKind::Weekly);
        assert!("hourly".parse::<ReportKind>().is_err());
    }
}
