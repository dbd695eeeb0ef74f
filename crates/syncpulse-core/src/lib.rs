//! # syncpulse-core
//!
//! SyncPulse 도메인 모델, 포트(trait) 정의, 에러 타입.
//! 모든 크레이트가 공유하는 핵심 타입과 인터페이스를 제공한다.
//!
//! ## 구조
//!
//! - [`models`]: 도메인 데이터 구조체 (serde Serialize/Deserialize)
//! - [`ports`]: Hexagonal Architecture 포트 인터페이스 (async_trait)
//! - [`error`]: 핵심 에러 타입 (thiserror)
//! - [`config`]: 파이프라인 설정 구조체

pub mod config;
pub mod error;
pub mod models;
pub mod ports;

#[cfg(test)]
mod tests {
    use crate::models::alert::{Alert, Severity};

    #[test]
    fn alert_serde_roundtrip() {
        let alert = Alert::new(
            "sync_drift",
            Severity::High,
            "마지막 동기화 이후 45분 경과",
            "drift_monitor",
        )
        .with_detail("value", 45.0)
        .with_detail("threshold", 30.0);

        let json = serde_json::to_string(&alert).unwrap();
        let deserialized: Alert = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialized.id, alert.id);
        assert_eq!(deserialized.severity, Severity::High);
        assert_eq!(deserialized.details["threshold"], 30.0);
        assert!(!deserialized.resolved);
    }

    #[test]
    fn severity_ordering() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
    }

    #[test]
    fn config_defaults() {
        let config = crate::config::AppConfig::default_config();
        assert_eq!(config.metrics.max_samples, 1_000);
        assert_eq!(config.monitor.check_interval_secs, 30);
        assert_eq!(config.dashboard.tick_interval_secs, 5);
        assert_eq!(config.alert.retry_attempts, 3);
        assert!(!config.alert.email_enabled);
        assert!(!config.alert.slack_enabled);
    }
}
