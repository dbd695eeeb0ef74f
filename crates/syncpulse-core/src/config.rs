//! 파이프라인 설정 구조체.
//!
//! 메트릭 보존/샘플링, 드리프트 검사 주기, 알림 채널, 리포트, 대시보드,
//! 샘플 저장소 설정을 정의한다. 파일/환경변수 로드는 바이너리가 담당하고
//! 코어는 읽기만 한다.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::CoreError;
use crate::models::check::CheckKind;
use crate::models::report::{ReportFormat, ReportKind};

/// 최상위 애플리케이션 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// 메트릭 수집 설정
    #[serde(default)]
    pub metrics: MetricsConfig,
    /// 드리프트 모니터 설정
    #[serde(default)]
    pub monitor: MonitorConfig,
    /// 알림 전달 설정
    #[serde(default)]
    pub alert: AlertConfig,
    /// 리포트 설정
    #[serde(default)]
    pub report: ReportConfig,
    /// 실시간 대시보드 설정
    #[serde(default)]
    pub dashboard: DashboardConfig,
    /// 샘플 저장소 설정
    #[serde(default)]
    pub storage: StorageConfig,
}

// ============================================================
// 메트릭 설정
// ============================================================

/// 메트릭 수집 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// 저장소에 보관하는 원시 샘플 보존 기간 (일)
    #[serde(default = "default_metrics_retention_days")]
    pub retention_days: u32,
    /// 호스트 리소스 샘플링 주기 (초)
    #[serde(default = "default_sample_interval_secs")]
    pub sample_interval_secs: u64,
    /// 시리즈당 최대 샘플 수
    #[serde(default = "default_max_samples")]
    pub max_samples: usize,
    /// 검사 종류별 임계값
    #[serde(default = "default_alert_thresholds")]
    pub alert_thresholds: BTreeMap<String, f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            retention_days: default_metrics_retention_days(),
            sample_interval_secs: default_sample_interval_secs(),
            max_samples: default_max_samples(),
            alert_thresholds: default_alert_thresholds(),
        }
    }
}

// ============================================================
// 드리프트 모니터 설정
// ============================================================

/// 드리프트 모니터 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// 검사 주기 (초)
    #[serde(default = "default_check_interval_secs")]
    pub check_interval_secs: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            check_interval_secs: default_check_interval_secs(),
        }
    }
}

// ============================================================
// 알림 설정
// ============================================================

/// 알림 전달 설정: 이메일(SMTP) + 채팅 웹훅
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertConfig {
    /// 이메일 채널 활성화
    #[serde(default)]
    pub email_enabled: bool,
    /// 채팅 웹훅 채널 활성화
    #[serde(default)]
    pub slack_enabled: bool,
    /// SMTP 릴레이 호스트
    #[serde(default)]
    pub smtp_host: String,
    /// SMTP 포트
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    /// SMTP 사용자명
    #[serde(default)]
    pub smtp_username: String,
    /// SMTP 비밀번호
    #[serde(default)]
    pub smtp_password: String,
    /// 발신 주소
    #[serde(default)]
    pub from_email: String,
    /// 수신 주소 목록
    #[serde(default)]
    pub to_emails: Vec<String>,
    /// 웹훅 URL
    #[serde(default)]
    pub webhook_url: String,
    /// 채팅 채널 이름 (예: "#ops-alerts")
    #[serde(default)]
    pub channel: Option<String>,
    /// 채팅 봇 표시 이름
    #[serde(default)]
    pub username: Option<String>,
    /// 채팅 봇 아이콘 이모지
    #[serde(default)]
    pub icon_emoji: Option<String>,
    /// 웹훅 본문 서명 키 (None이면 서명 생략)
    #[serde(default)]
    pub signing_secret: Option<String>,
    /// 채널 요청 타임아웃 (초)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// 알림 이력 최대 크기
    #[serde(default = "default_max_history_size")]
    pub max_history_size: usize,
    /// 채널당 전달 시도 횟수
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    /// 재시도 간격 (초)
    #[serde(default = "default_retry_delay_seconds")]
    pub retry_delay_seconds: u64,
    /// 시간당 최대 알림 수 (0 = 무제한)
    #[serde(default)]
    pub rate_limit_per_hour: u32,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            email_enabled: false,
            slack_enabled: false,
            smtp_host: String::new(),
            smtp_port: default_smtp_port(),
            smtp_username: String::new(),
            smtp_password: String::new(),
            from_email: String::new(),
            to_emails: Vec::new(),
            webhook_url: String::new(),
            channel: None,
            username: None,
            icon_emoji: None,
            signing_secret: None,
            request_timeout_secs: default_request_timeout_secs(),
            max_history_size: default_max_history_size(),
            retry_attempts: default_retry_attempts(),
            retry_delay_seconds: default_retry_delay_seconds(),
            rate_limit_per_hour: 0,
        }
    }
}

impl AlertConfig {
    /// 재시도 간격을 Duration으로 반환
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_seconds)
    }

    /// 채널 요청 타임아웃을 Duration으로 반환
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

// ============================================================
// 리포트 설정
// ============================================================

/// 리포트 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// 리포트 출력 디렉토리
    #[serde(default = "default_report_output_dir")]
    pub output_dir: PathBuf,
    /// 저장할 출력 형식
    #[serde(default = "default_report_formats")]
    pub report_formats: Vec<ReportFormat>,
    /// 자동 생성할 리포트 종류
    #[serde(default = "default_report_schedule")]
    pub schedule: Vec<ReportKind>,
    /// 리포트 파일 보존 기간 (일)
    #[serde(default = "default_report_retention_days")]
    pub retention_days: u32,
    /// 스케줄 기반 자동 생성 여부
    #[serde(default = "default_true")]
    pub automatic_generation: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_report_output_dir(),
            report_formats: default_report_formats(),
            schedule: default_report_schedule(),
            retention_days: default_report_retention_days(),
            automatic_generation: true,
        }
    }
}

// ============================================================
// 대시보드 설정
// ============================================================

/// 실시간 대시보드 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// 대시보드 서버 활성화 여부
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// 서버 포트 (기본: 8080)
    #[serde(default = "default_dashboard_port")]
    pub port: u16,
    /// 외부 접근 허용 여부 (false: 127.0.0.1 only)
    #[serde(default)]
    pub allow_external: bool,
    /// 스냅샷 푸시 주기 (초)
    #[serde(default = "default_tick_interval_secs")]
    pub tick_interval_secs: u64,
    /// 스냅샷에 포함할 최근 알림 수
    #[serde(default = "default_recent_alerts_limit")]
    pub recent_alerts_limit: usize,
    /// 연결당 푸시 타임아웃 (밀리초)
    #[serde(default = "default_push_timeout_ms")]
    pub push_timeout_ms: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: default_dashboard_port(),
            allow_external: false,
            tick_interval_secs: default_tick_interval_secs(),
            recent_alerts_limit: default_recent_alerts_limit(),
            push_timeout_ms: default_push_timeout_ms(),
        }
    }
}

// ============================================================
// 저장소 설정
// ============================================================

/// 샘플 저장소 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// 샘플 미러링 활성화 여부
    #[serde(default)]
    pub enabled: bool,
    /// SQLite DB 파일 경로 (None이면 플랫폼 기본 경로)
    #[serde(default)]
    pub db_path: Option<PathBuf>,
    /// 미러링 작업 큐 용량
    #[serde(default = "default_sink_queue_capacity")]
    pub sink_queue_capacity: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            db_path: None,
            sink_queue_capacity: default_sink_queue_capacity(),
        }
    }
}

/// 보존 기간 상한 (일)
pub const MAX_RETENTION_DAYS: u32 = 3_650;

// ============================================================
// AppConfig impl
// ============================================================

impl AppConfig {
    /// 기본 설정값 반환
    pub fn default_config() -> Self {
        Self {
            metrics: MetricsConfig::default(),
            monitor: MonitorConfig::default(),
            alert: AlertConfig::default(),
            report: ReportConfig::default(),
            dashboard: DashboardConfig::default(),
            storage: StorageConfig::default(),
        }
    }

    /// 드리프트 검사 주기를 Duration으로 반환
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.monitor.check_interval_secs)
    }

    /// 대시보드 푸시 주기를 Duration으로 반환
    pub fn dashboard_tick(&self) -> Duration {
        Duration::from_secs(self.dashboard.tick_interval_secs)
    }

    /// 리소스 샘플링 주기를 Duration으로 반환
    pub fn sample_interval(&self) -> Duration {
        Duration::from_secs(self.metrics.sample_interval_secs)
    }

    /// 필드 간 제약 조건 검증
    ///
    /// 활성화된 채널에 전송 파라미터가 없거나 주기가 0이면 설정 에러.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.metrics.max_samples == 0 {
            return Err(CoreError::validation("metrics.max_samples", "0보다 커야 함"));
        }
        if self.monitor.check_interval_secs == 0 {
            return Err(CoreError::validation(
                "monitor.check_interval_secs",
                "0보다 커야 함",
            ));
        }
        if self.metrics.sample_interval_secs == 0 {
            return Err(CoreError::validation(
                "metrics.sample_interval_secs",
                "0보다 커야 함",
            ));
        }
        for (field, days) in [
            ("metrics.retention_days", self.metrics.retention_days),
            ("report.retention_days", self.report.retention_days),
        ] {
            if !(1..=MAX_RETENTION_DAYS).contains(&days) {
                return Err(CoreError::validation(
                    field,
                    format!("보존 기간은 1-{MAX_RETENTION_DAYS}일 사이여야 함: {days}"),
                ));
            }
        }
        if self.dashboard.tick_interval_secs == 0 {
            return Err(CoreError::validation(
                "dashboard.tick_interval_secs",
                "0보다 커야 함",
            ));
        }
        if self.alert.max_history_size == 0 {
            return Err(CoreError::validation(
                "alert.max_history_size",
                "0보다 커야 함",
            ));
        }
        for (name, value) in &self.metrics.alert_thresholds {
            if name.parse::<CheckKind>().is_err() {
                return Err(CoreError::validation(
                    "metrics.alert_thresholds",
                    format!("알 수 없는 검사 종류: {name}"),
                ));
            }
            if !value.is_finite() || *value <= 0.0 {
                return Err(CoreError::validation(
                    "metrics.alert_thresholds",
                    format!("{name} 임계값은 양수여야 함: {value}"),
                ));
            }
        }
        if self.alert.email_enabled {
            if self.alert.smtp_host.is_empty() {
                return Err(CoreError::validation("alert.smtp_host", "이메일 활성화 시 필수"));
            }
            if self.alert.from_email.is_empty() || self.alert.to_emails.is_empty() {
                return Err(CoreError::validation(
                    "alert.to_emails",
                    "이메일 활성화 시 발신/수신 주소 필수",
                ));
            }
        }
        if self.alert.slack_enabled && self.alert.webhook_url.is_empty() {
            return Err(CoreError::validation("alert.webhook_url", "웹훅 활성화 시 필수"));
        }
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::default_config()
    }
}

// ============================================================
// 기본값 함수
// ============================================================

fn default_true() -> bool {
    true
}

fn default_metrics_retention_days() -> u32 {
    30
}
fn default_sample_interval_secs() -> u64 {
    60
}
fn default_max_samples() -> usize {
    1_000
}
fn default_alert_thresholds() -> BTreeMap<String, f64> {
    CheckKind::ALL
        .iter()
        .map(|kind| (kind.as_str().to_string(), kind.default_threshold()))
        .collect()
}
fn default_check_interval_secs() -> u64 {
    30
}
fn default_smtp_port() -> u16 {
    587
}
fn default_request_timeout_secs() -> u64 {
    10
}
fn default_max_history_size() -> usize {
    1_000
}
fn default_retry_attempts() -> u32 {
    3
}
fn default_retry_delay_seconds() -> u64 {
    5
}
fn default_report_output_dir() -> PathBuf {
    PathBuf::from("reports")
}
fn default_report_formats() -> Vec<ReportFormat> {
    vec![ReportFormat::Json, ReportFormat::Html]
}
fn default_report_schedule() -> Vec<ReportKind> {
    vec![ReportKind::Daily, ReportKind::Weekly, ReportKind::Monthly]
}
fn default_report_retention_days() -> u32 {
    90
}
fn default_dashboard_port() -> u16 {
    8080
}
fn default_tick_interval_secs() -> u64 {
    5
}
fn default_recent_alerts_limit() -> usize {
    20
}
fn default_push_timeout_ms() -> u64 {
    2_000
}
fn default_sink_queue_capacity() -> usize {
    1_024
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_thresholds_cover_every_check_kind() {
        let config = MetricsConfig::default();
        for kind in CheckKind::ALL {
            assert!(config.alert_thresholds.contains_key(kind.as_str()));
        }
        assert_eq!(config.alert_thresholds["sync_delay_minutes"], 30.0);
    }

    #[test]
    fn default_config_is_valid() {
        assert!(AppConfig::default_config().validate().is_ok());
    }

    #[test]
    fn email_without_host_is_rejected() {
        let mut config = AppConfig::default_config();
        config.alert.email_enabled = true;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("smtp_host"));
    }

    #[test]
    fn webhook_without_url_is_rejected() {
        let mut config = AppConfig::default_config();
        config.alert.slack_enabled = true;
        assert!(config.validate().is_err());
    }

    #[test]
    fn retention_days_must_be_in_range() {
        let mut config = AppConfig::default_config();
        config.report.retention_days = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("report.retention_days"));

        let mut config = AppConfig::default_config();
        config.metrics.retention_days = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("metrics.retention_days"));

        let mut config = AppConfig::default_config();
        config.metrics.retention_days = MAX_RETENTION_DAYS + 1;
        assert!(config.validate().is_err());

        config.metrics.retention_days = MAX_RETENTION_DAYS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn unknown_threshold_kind_is_rejected() {
        let mut config = AppConfig::default_config();
        config
            .metrics
            .alert_thresholds
            .insert("cpu_temperature".to_string(), 80.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_json_uses_defaults() {
        let json = r#"{ "alert": { "rate_limit_per_hour": 10 } }"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.alert.rate_limit_per_hour, 10);
        assert_eq!(config.alert.retry_attempts, 3);
        assert_eq!(config.metrics.max_samples, 1_000);
        assert_eq!(config.report.report_formats.len(), 2);
    }

    #[test]
    fn duration_accessors() {
        let config = AppConfig::default_config();
        assert_eq!(config.check_interval(), Duration::from_secs(30));
        assert_eq!(config.dashboard_tick(), Duration::from_secs(5));
        assert_eq!(config.alert.retry_delay(), Duration::from_secs(5));
    }
}
