//! 이메일 알림 채널.
//!
//! 설정된 릴레이로 인증 SMTP 제출. 알림 한 건당 메시지 한 통,
//! HTML 본문, 수신자 목록은 설정에서 가져온다.

use std::time::Duration;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::debug;

use syncpulse_core::config::AlertConfig;
use syncpulse_core::error::CoreError;
use syncpulse_core::models::alert::Alert;
use syncpulse_core::ports::channel::NotificationChannel;

/// SMTPS (implicit TLS) 포트
const SMTPS_PORT: u16 = 465;

/// lettre 기반 이메일 채널
pub struct EmailChannel {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Vec<Mailbox>,
}

impl EmailChannel {
    /// 알림 설정에서 생성. 주소 형식이나 릴레이 설정이 잘못되면 `Config`.
    pub fn from_config(config: &AlertConfig) -> Result<Self, CoreError> {
        let from = parse_mailbox(&config.from_email)?;
        let to = config
            .to_emails
            .iter()
            .map(|addr| parse_mailbox(addr))
            .collect::<Result<Vec<_>, _>>()?;
        if to.is_empty() {
            return Err(CoreError::Config("이메일 수신자가 없음".to_string()));
        }

        let builder = if config.smtp_port == SMTPS_PORT {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
        }
        .map_err(|e| CoreError::Config(format!("SMTP 릴레이 설정 실패: {e}")))?;

        let mut builder = builder
            .port(config.smtp_port)
            .timeout(Some(Duration::from_secs(config.request_timeout_secs)));
        if !config.smtp_username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.smtp_username.clone(),
                config.smtp_password.clone(),
            ));
        }

        Ok(Self {
            transport: builder.build(),
            from,
            to,
        })
    }

    /// 메일 메시지 구성
    fn build_message(&self, alert: &Alert) -> Result<Message, CoreError> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(subject(alert))
            .header(ContentType::TEXT_HTML);
        for recipient in &self.to {
            builder = builder.to(recipient.clone());
        }
        builder
            .body(render_html(alert))
            .map_err(|e| CoreError::Internal(format!("메일 메시지 구성 실패: {e}")))
    }
}

#[async_trait]
impl NotificationChannel for EmailChannel {
    fn name(&self) -> &str {
        "email"
    }

    async fn deliver(&self, alert: &Alert) -> Result<(), CoreError> {
        let message = self.build_message(alert)?;
        self.transport
            .send(message)
            .await
            .map_err(|e| CoreError::Network(format!("SMTP 전송 실패: {e}")))?;
        debug!("이메일 알림 전송: {} → {}명", alert.id, self.to.len());
        Ok(())
    }
}

fn parse_mailbox(addr: &str) -> Result<Mailbox, CoreError> {
    addr.parse::<Mailbox>()
        .map_err(|e| CoreError::Config(format!("이메일 주소 형식 오류 ({addr}): {e}")))
}

/// 제목: `[SEVERITY] kind - source`
pub fn subject(alert: &Alert) -> String {
    format!(
        "[{}] {} - {}",
        alert.severity.as_str().to_uppercase(),
        alert.kind,
        alert.source
    )
}

/// 외부 리소스 없이 렌더링되는 HTML 본문
pub fn render_html(alert: &Alert) -> String {
    let rows: String = alert
        .details
        .iter()
        .map(|(key, value)| {
            format!(
                "<tr><th style=\"text-align:left;padding:4px 12px 4px 0\">{}</th><td>{}</td></tr>",
                escape_html(key),
                escape_html(&display_value(value))
            )
        })
        .collect();

    format!(
        concat!(
            "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>{title}</title></head>",
            "<body style=\"font-family:sans-serif\">",
            "<h2 style=\"color:{color}\">{title}</h2>",
            "<p>{message}</p>",
            "<table>",
            "<tr><th style=\"text-align:left;padding:4px 12px 4px 0\">id</th><td>{id}</td></tr>",
            "<tr><th style=\"text-align:left;padding:4px 12px 4px 0\">severity</th><td>{severity}</td></tr>",
            "<tr><th style=\"text-align:left;padding:4px 12px 4px 0\">timestamp</th><td>{timestamp}</td></tr>",
            "{rows}",
            "</table></body></html>"
        ),
        title = escape_html(&subject(alert)),
        color = alert.severity.color(),
        message = escape_html(&alert.message),
        id = escape_html(&alert.id),
        severity = alert.severity,
        timestamp = alert.timestamp.to_rfc3339(),
        rows = rows,
    )
}

/// 상세 값 표시 문자열 (문자열은 따옴표 없이)
pub(crate) fn display_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
