//! 샘플 저장소 포트.
//!
//! 구현: `syncpulse-storage` crate (rusqlite)

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::metrics::SampleRecord;

/// 원시 샘플 미러링 대상
///
/// 수집기는 이 포트의 실패를 호출자에게 전파하지 않는다.
#[async_trait]
pub trait MetricsSink: Send + Sync {
    /// 샘플 한 건 저장
    async fn store(&self, record: &SampleRecord) -> Result<(), CoreError>;
}
