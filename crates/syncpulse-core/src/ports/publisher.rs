//! 알림 발행 포트.
//!
//! 구현: `syncpulse-alert` crate (`AlertDispatcher`)

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::alert::Alert;

/// 드리프트 모니터가 생성한 알림을 넘겨받는 쪽
#[async_trait]
pub trait AlertPublisher: Send + Sync {
    async fn publish(&self, alert: Alert) -> Result<(), CoreError>;
}
