//! # syncpulse-monitor
//!
//! 주기적으로 수집기 집계값을 임계값 테이블과 비교해 알림을 발행하는
//! 드리프트 모니터와, 호스트 메모리/디스크 게이지를 기록하는 리소스 샘플러.

pub mod drift;
pub mod system;

pub use drift::DriftMonitor;
pub use system::ResourceSampler;
