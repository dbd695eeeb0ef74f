//! SyncPulse 도메인 모델.
//!
//! 파이프라인 컴포넌트 간에 주고받는 데이터 구조체를 정의한다.
//! 외부로 노출되는 모델은 `serde` Serialize/Deserialize를 구현한다.

pub mod alert;
pub mod check;
pub mod dashboard;
pub mod metrics;
pub mod report;
