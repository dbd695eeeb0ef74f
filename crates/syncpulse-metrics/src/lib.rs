//! # syncpulse-metrics
//!
//! 스레드 안전한 인메모리 메트릭 수집기.
//! 유한 길이 샘플 시리즈에 기록하고 평균/백분위/추세를 계산하며,
//! 설정된 경우 샘플을 저장소 포트로 비동기 미러링한다.

pub mod collector;
pub mod series;
pub mod sink_writer;
pub mod stats;

pub use collector::MetricsCollector;
