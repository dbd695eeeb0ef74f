//! 알림 전달 채널 포트.
//!
//! 구현: `syncpulse-network` crate (lettre SMTP, reqwest 웹훅)

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::alert::Alert;

/// 알림 전달 채널
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// 채널 이름 (부분 실패 메시지의 접두어)
    fn name(&self) -> &str;

    /// 전달 대상 여부
    fn is_enabled(&self) -> bool {
        true
    }

    /// 알림 한 건 전달 (재시도는 호출자 책임)
    async fn deliver(&self, alert: &Alert) -> Result<(), CoreError>;
}
