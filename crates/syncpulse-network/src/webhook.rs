//! 채팅 웹훅 알림 채널.
//!
//! 심각도별 색상 첨부 하나를 담은 JSON을 타임아웃이 걸린 POST로 보낸다.
//! 서명 키가 설정되면 `{timestamp}.{body}`의 HMAC-SHA256을 헤더로 첨부한다.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde_json::{json, Map, Value};
use sha2::Sha256;
use tracing::{debug, warn};

use syncpulse_core::config::AlertConfig;
use syncpulse_core::error::CoreError;
use syncpulse_core::models::alert::Alert;
use syncpulse_core::ports::channel::NotificationChannel;

use crate::email::display_value;

/// 본문 서명 헤더
pub const SIGNATURE_HEADER: &str = "X-SyncPulse-Signature";
/// 서명 시각 헤더 (unix 초)
pub const TIMESTAMP_HEADER: &str = "X-SyncPulse-Timestamp";

/// 429 응답에 Retry-After가 없을 때 대기 시간
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

type HmacSha256 = Hmac<Sha256>;

/// reqwest 기반 채팅 웹훅 채널
pub struct WebhookChannel {
    client: reqwest::Client,
    url: String,
    channel: Option<String>,
    username: Option<String>,
    icon_emoji: Option<String>,
    signing_secret: Option<String>,
}

impl WebhookChannel {
    /// 알림 설정에서 생성
    pub fn from_config(config: &AlertConfig) -> Result<Self, CoreError> {
        if config.webhook_url.is_empty() {
            return Err(CoreError::Config("웹훅 URL이 비어 있음".to_string()));
        }
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| CoreError::Network(format!("HTTP 클라이언트 빌드 실패: {e}")))?;

        Ok(Self {
            client,
            url: config.webhook_url.clone(),
            channel: config.channel.clone(),
            username: config.username.clone(),
            icon_emoji: config.icon_emoji.clone(),
            signing_secret: config.signing_secret.clone().filter(|s| !s.is_empty()),
        })
    }

    /// 전송할 JSON 본문
    pub fn payload(&self, alert: &Alert) -> Value {
        let fields: Vec<Value> = alert
            .details
            .iter()
            .map(|(key, value)| {
                json!({
                    "title": key,
                    "value": display_value(value),
                    "short": true,
                })
            })
            .collect();

        let mut body = Map::new();
        body.insert(
            "text".to_string(),
            Value::from(format!(
                "[{}] {}",
                alert.severity.as_str().to_uppercase(),
                alert.message
            )),
        );
        if let Some(channel) = &self.channel {
            body.insert("channel".to_string(), Value::from(channel.as_str()));
        }
        if let Some(username) = &self.username {
            body.insert("username".to_string(), Value::from(username.as_str()));
        }
        if let Some(icon) = &self.icon_emoji {
            body.insert("icon_emoji".to_string(), Value::from(icon.as_str()));
        }
        body.insert(
            "attachments".to_string(),
            json!([{
                "color": alert.severity.color(),
                "title": format!("{} - {}", alert.kind, alert.source),
                "text": alert.message,
                "fields": fields,
                "ts": alert.timestamp.timestamp(),
            }]),
        );
        Value::Object(body)
    }

    /// 응답 상태 코드 → 에러 매핑
    async fn check_response(resp: reqwest::Response) -> Result<(), CoreError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }

        let retry_after = resp
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());
        let text = resp.text().await.unwrap_or_else(|e| {
            warn!("웹훅 응답 본문 읽기 실패: {e}");
            String::new()
        });

        match status.as_u16() {
            429 => Err(CoreError::RateLimit {
                retry_after_secs: retry_after.unwrap_or(DEFAULT_RETRY_AFTER_SECS),
            }),
            502..=504 => Err(CoreError::ServiceUnavailable(format!("HTTP {status}: {text}"))),
            _ => Err(CoreError::Internal(format!("웹훅 에러 ({status}): {text}"))),
        }
    }
}

#[async_trait]
impl NotificationChannel for WebhookChannel {
    fn name(&self) -> &str {
        "chat"
    }

    async fn deliver(&self, alert: &Alert) -> Result<(), CoreError> {
        let body = serde_json::to_vec(&self.payload(alert))?;

        let mut request = self
            .client
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, "application/json");
        if let Some(secret) = &self.signing_secret {
            let timestamp = Utc::now().timestamp();
            request = request
                .header(TIMESTAMP_HEADER, timestamp.to_string())
                .header(SIGNATURE_HEADER, sign_payload(secret, timestamp, &body)?);
        }

        let resp = request
            .body(body)
            .send()
            .await
            .map_err(|e| CoreError::Network(format!("웹훅 요청 실패: {e}")))?;
        Self::check_response(resp).await?;

        debug!("채팅 알림 전송: {}", alert.id);
        Ok(())
    }
}

/// `sha256=<base64(HMAC-SHA256(secret, "{timestamp}.{body}"))>`
pub fn sign_payload(secret: &str, timestamp: i64, body: &[u8]) -> Result<String, CoreError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| CoreError::Config(format!("서명 키 오류: {e}")))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(body);
    Ok(format!("sha256={}", BASE64.encode(mac.finalize().into_bytes())))
}
