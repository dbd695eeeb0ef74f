//! 실시간 뷰어 연결 포트.
//!
//! 구현: `syncpulse-web` crate (WebSocket 연결)

use async_trait::async_trait;

use crate::error::CoreError;

/// 대시보드 스냅샷을 수신하는 연결 하나
#[async_trait]
pub trait ViewerConnection: Send + Sync {
    /// 직렬화된 스냅샷 전송. 실패하면 레지스트리에서 제거된다.
    async fn push(&self, payload: &str) -> Result<(), CoreError>;
}
