//! 리포트 빌더.
//!
//! `generate()`는 수집기 스냅샷, 기간 내 알림, 직전 기간 알림, 모니터 임계값으로
//! 불변 `Report`를 만든다. 핵심 지표 변화량은 같은 종류의 직전 정기 리포트와 비교한다.
//! 요청 시 생성(`generate`)은 비교 기준을 바꾸지 않고, 정기 생성(`generate_scheduled`)만
//! 다음 정기 리포트의 기준으로 남는다.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use serde_json::json;
use tracing::{info, warn};

use syncpulse_alert::AlertDispatcher;
use syncpulse_core::config::ReportConfig;
use syncpulse_core::models::alert::{Alert, Severity};
use syncpulse_core::models::metrics::{series, MetricsSnapshot, TrendDirection};
use syncpulse_core::models::report::{
    AlertsSection, BusinessSection, HeadlineDeltas, PerformanceSection, Report, ReportFormat,
    ReportKind, ReportPeriod, ReportSummary, TrendEntry, TrendsSection,
};
use syncpulse_metrics::MetricsCollector;
use syncpulse_monitor::DriftMonitor;

use crate::render;

// ============================================================
// 권고 규칙 기준값
// ============================================================

/// 평균 동기화 시간이 이 값(초)을 넘으면 최적화 권고
pub const SLOW_SYNC_SECS: f64 = 60.0;
/// 기간 내 알림 수가 이 값을 넘으면 임계값 재검토 권고
pub const ALERT_VOLUME_LIMIT: usize = 50;
/// 실패율(%)이 이 값을 넘으면 실패 원인 조사 권고
pub const ERROR_RATE_LIMIT: f64 = 5.0;
/// 성공률(%)이 이 값 미만이면 안정성 점검 권고
pub const SUCCESS_RATE_FLOOR: f64 = 95.0;
/// 리포트에 포함하는 최근 알림 수
pub const RECENT_ALERTS_IN_REPORT: usize = 20;

/// 형식별 저장 결과
#[derive(Debug, Default)]
pub struct SaveOutcome {
    /// 저장된 파일 경로
    pub written: Vec<PathBuf>,
    /// 실패한 형식과 사유
    pub failures: Vec<(ReportFormat, String)>,
}

impl SaveOutcome {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// 리포트 빌더
pub struct ReportBuilder {
    collector: Arc<MetricsCollector>,
    dispatcher: Arc<AlertDispatcher>,
    monitor: Arc<DriftMonitor>,
    output_dir: PathBuf,
    formats: Vec<ReportFormat>,
    last_reports: Mutex<HashMap<ReportKind, Report>>,
}

impl ReportBuilder {
    pub fn new(
        collector: Arc<MetricsCollector>,
        dispatcher: Arc<AlertDispatcher>,
        monitor: Arc<DriftMonitor>,
        config: &ReportConfig,
    ) -> Self {
        Self {
            collector,
            dispatcher,
            monitor,
            output_dir: config.output_dir.clone(),
            formats: config.report_formats.clone(),
            last_reports: Mutex::new(HashMap::new()),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// 설정된 기본 출력 형식
    pub fn formats(&self) -> &[ReportFormat] {
        &self.formats
    }

    /// 같은 종류의 직전 정기 리포트 (변화량 비교 기준)
    pub fn last_report(&self, kind: ReportKind) -> Option<Report> {
        self.last_reports.lock().get(&kind).cloned()
    }

    // ============================================================
    // 생성
    // ============================================================

    /// 요청 시 리포트 생성. 정기 리포트 비교 기준은 그대로 둔다.
    pub fn generate(&self, kind: ReportKind, period: ReportPeriod) -> Report {
        self.build(kind, period)
    }

    /// 정기 리포트 생성. 결과가 같은 종류의 다음 정기 리포트 비교 기준이 된다.
    pub fn generate_scheduled(&self, kind: ReportKind, period: ReportPeriod) -> Report {
        let report = self.build(kind, period);
        self.last_reports.lock().insert(kind, report.clone());
        report
    }

    fn build(&self, kind: ReportKind, period: ReportPeriod) -> Report {
        let snapshot = self.collector.snapshot();
        let alerts = self.dispatcher.alerts_between(period.start, period.end);
        let previous = period.previous();
        let previous_alerts = self
            .dispatcher
            .alerts_between(previous.start, previous.end)
            .len();

        let business = snapshot.business.clone();
        let last = self.last_report(kind);
        let summary = build_summary(&snapshot, alerts.len(), previous_alerts, last.as_ref());
        let alerts_section = build_alerts_section(&alerts, previous_alerts);
        let trends = build_trends(&snapshot);
        let recommendations = recommend(&summary, &alerts_section, &trends);

        let mut appendices = BTreeMap::new();
        appendices.insert("thresholds".to_string(), json!(self.monitor.thresholds()));
        let stats = self.dispatcher.stats(0);
        appendices.insert(
            "dispatcher".to_string(),
            json!({
                "history_size": stats.total,
                "rate_limited": stats.rate_limited,
                "delivered": stats.delivered,
                "delivery_failures": stats.delivery_failures,
                "channels": self.dispatcher.channel_names(),
            }),
        );
        appendices.insert(
            "collector".to_string(),
            json!({
                "max_samples": self.collector.max_samples(),
                "dropped_samples": self.collector.dropped_samples(),
            }),
        );

        let generated_at = Utc::now();
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        let report = Report {
            id: format!("rpt_{}_{}", period.end.format("%Y%m%d"), &suffix[..8]),
            title: format!(
                "{} ({} ~ {})",
                kind.title(),
                period.start.format("%Y-%m-%d"),
                period.end.format("%Y-%m-%d")
            ),
            generated_at,
            period,
            summary,
            performance: PerformanceSection {
                series: snapshot.series.clone(),
                uptime_seconds: snapshot.uptime_seconds,
            },
            alerts: alerts_section,
            trends,
            business: BusinessSection {
                metrics: business,
                last_sync_at: snapshot.last_sync_at,
            },
            recommendations,
            appendices,
        };

        info!("리포트 생성: {} ({})", report.id, kind);
        report
    }

    // ============================================================
    // 저장
    // ============================================================

    /// 형식별로 독립적으로 렌더링/저장. 한 형식의 실패가 다른 형식을 막지 않는다.
    pub async fn save(&self, report: &Report, formats: &[ReportFormat]) -> SaveOutcome {
        let mut outcome = SaveOutcome::default();

        if let Err(e) = tokio::fs::create_dir_all(&self.output_dir).await {
            warn!("리포트 디렉토리 생성 실패 ({}): {e}", self.output_dir.display());
            for format in formats {
                outcome.failures.push((*format, e.to_string()));
            }
            return outcome;
        }

        for format in formats {
            let path = self.output_dir.join(report_file_name(report, *format));
            let result = match render::render(report, *format) {
                Ok(content) => tokio::fs::write(&path, content)
                    .await
                    .map_err(|e| e.to_string()),
                Err(e) => Err(e.to_string()),
            };
            match result {
                Ok(()) => {
                    info!("리포트 저장: {}", path.display());
                    outcome.written.push(path);
                }
                Err(e) => {
                    warn!("리포트 저장 실패 ({:?}): {e}", format);
                    outcome.failures.push((*format, e));
                }
            }
        }
        outcome
    }
}

/// `{report_id}_{period_type}.{ext}`
pub fn report_file_name(report: &Report, format: ReportFormat) -> String {
    format!(
        "{}_{}.{}",
        report.id,
        report.period.kind.as_str(),
        format.extension()
    )
}

fn build_summary(
    snapshot: &MetricsSnapshot,
    alerts_in_period: usize,
    previous_alerts: usize,
    last: Option<&Report>,
) -> ReportSummary {
    let business = &snapshot.business;
    let total_syncs = business.total_sync_operations;
    let success_rate = business.success_rate();
    let error_rate = business.error_rate();
    let average_sync_duration_secs = snapshot.average(series::SYNC_DURATION);
    let commits_processed = business.commits_processed;

    let deltas = HeadlineDeltas {
        total_syncs: last.map(|r| total_syncs as i64 - r.summary.total_syncs as i64),
        success_rate: last.map(|r| success_rate - r.summary.success_rate),
        average_sync_duration_secs: last
            .map(|r| average_sync_duration_secs - r.summary.average_sync_duration_secs),
        error_rate: last.map(|r| error_rate - r.summary.error_rate),
        commits_processed: last
            .map(|r| commits_processed as i64 - r.summary.commits_processed as i64),
        alerts_in_period: alerts_in_period as i64 - previous_alerts as i64,
    };

    ReportSummary {
        total_syncs,
        success_rate,
        average_sync_duration_secs,
        error_rate,
        alerts_in_period,
        commits_processed,
        deltas,
    }
}

fn build_alerts_section(alerts: &[Alert], previous_period_total: usize) -> AlertsSection {
    let mut section = AlertsSection {
        total: alerts.len(),
        previous_period_total,
        ..Default::default()
    };
    for alert in alerts {
        *section.by_kind.entry(alert.kind.clone()).or_insert(0) += 1;
        *section
            .by_severity
            .entry(alert.severity.as_str().to_string())
            .or_insert(0) += 1;
        if !alert.resolved {
            section.unresolved += 1;
            if alert.severity == Severity::Critical {
                section.critical_unresolved += 1;
            }
        }
    }
    section.recent = alerts
        .iter()
        .rev()
        .take(RECENT_ALERTS_IN_REPORT)
        .cloned()
        .collect();
    section
}

fn build_trends(snapshot: &MetricsSnapshot) -> TrendsSection {
    TrendsSection {
        entries: snapshot
            .series
            .iter()
            .map(|(name, summary)| TrendEntry {
                series: name.clone(),
                slope: summary.trend,
                direction: summary.direction,
            })
            .collect(),
    }
}

/// 고정 규칙 기반 권고 문구
fn recommend(
    summary: &ReportSummary,
    alerts: &AlertsSection,
    trends: &TrendsSection,
) -> Vec<String> {
    let mut out = Vec::new();

    if summary.average_sync_duration_secs > SLOW_SYNC_SECS {
        out.push(format!(
            "평균 동기화 시간이 {:.1}초로 {SLOW_SYNC_SECS:.0}초를 초과함: 동기화 대상 범위와 배치 크기 최적화를 검토하세요",
            summary.average_sync_duration_secs
        ));
    }
    if summary.alerts_in_period > ALERT_VOLUME_LIMIT {
        out.push(format!(
            "기간 내 알림이 {}건으로 {ALERT_VOLUME_LIMIT}건을 초과함: 임계값이 너무 민감한지 재검토하세요",
            summary.alerts_in_period
        ));
    }
    if summary.error_rate > ERROR_RATE_LIMIT {
        out.push(format!(
            "동기화 실패율이 {:.1}%로 {ERROR_RATE_LIMIT:.0}%를 초과함: 실패 원인을 조사하세요",
            summary.error_rate
        ));
    }
    if summary.total_syncs > 0 && summary.success_rate < SUCCESS_RATE_FLOOR {
        out.push(format!(
            "동기화 성공률이 {:.1}%로 {SUCCESS_RATE_FLOOR:.0}% 미만: 원격 저장소 연결과 충돌 처리 안정성을 점검하세요",
            summary.success_rate
        ));
    }
    if trends.direction_of(series::MEMORY_USAGE_MB) == Some(TrendDirection::Increasing) {
        out.push("메모리 사용량이 증가 추세: 메모리 누수 여부를 확인하세요".to_string());
    }
    if alerts.critical_unresolved > 0 {
        out.push(format!(
            "미해결 critical 알림 {}건: 우선 분류하여 처리하세요",
            alerts.critical_unresolved
        ));
    }
    out
}
