//! # syncpulse-network
//!
//! `NotificationChannel` 포트 구현.
//! 이메일(lettre SMTP 제출)과 채팅 웹훅(reqwest POST + HMAC 서명)을 제공하며,
//! [`build_channels`]가 설정에서 활성화된 채널만 생성한다.
//!
//! ## 사용 예시
//!
//! ```rust,ignore
//! use syncpulse_network::build_channels;
//!
//! let channels = build_channels(&config.alert)?;
//! let dispatcher = AlertDispatcher::new(&config.alert, channels);
//! ```

pub mod email;
pub mod webhook;

use std::sync::Arc;

use syncpulse_core::config::AlertConfig;
use syncpulse_core::error::CoreError;
use syncpulse_core::ports::channel::NotificationChannel;
use tracing::info;

pub use email::EmailChannel;
pub use webhook::WebhookChannel;

/// 설정에서 활성화된 채널 목록 생성 (이메일 → 채팅 순서)
///
/// 비활성화된 채널은 목록에 포함되지 않는다. 활성화된 채널의
/// 전송 파라미터가 잘못되면 `CoreError::Config`.
pub fn build_channels(config: &AlertConfig) -> Result<Vec<Arc<dyn NotificationChannel>>, CoreError> {
    let mut channels: Vec<Arc<dyn NotificationChannel>> = Vec::new();

    if config.email_enabled {
        channels.push(Arc::new(EmailChannel::from_config(config)?));
    }
    if config.slack_enabled {
        channels.push(Arc::new(WebhookChannel::from_config(config)?));
    }

    info!(
        "알림 채널 구성: [{}]",
        channels
            .iter()
            .map(|c| c.name().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );
    Ok(channels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_channels_are_skipped() {
        let channels = build_channels(&AlertConfig::default()).unwrap();
        assert!(channels.is_empty());
    }

    #[test]
    fn webhook_only() {
        let config = AlertConfig {
            slack_enabled: true,
            webhook_url: "http://127.0.0.1:9/hook".to_string(),
            ..Default::default()
        };
        let channels = build_channels(&config).unwrap();
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].name(), "chat");
    }

    #[tokio::test]
    async fn both_channels_in_order() {
        let config = AlertConfig {
            email_enabled: true,
            smtp_host: "smtp.example.com".to_string(),
            from_email: "syncpulse@example.com".to_string(),
            to_emails: vec!["ops@example.com".to_string()],
            slack_enabled: true,
            webhook_url: "http://127.0.0.1:9/hook".to_string(),
            ..Default::default()
        };
        let channels = build_channels(&config).unwrap();
        let names: Vec<&str> = channels.iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["email", "chat"]);
    }

    #[test]
    fn invalid_recipient_is_config_error() {
        let config = AlertConfig {
            email_enabled: true,
            smtp_host: "smtp.example.com".to_string(),
            from_email: "syncpulse@example.com".to_string(),
            to_emails: vec!["not an address".to_string()],
            ..Default::default()
        };
        assert!(matches!(build_channels(&config), Err(CoreError::Config(_))));
    }
}
