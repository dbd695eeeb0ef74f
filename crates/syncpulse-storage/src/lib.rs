//! # syncpulse-storage
//!
//! 로컬 저장소 어댑터.
//! 수집기가 미러링하는 원시 샘플을 SQLite에 저장하고,
//! 스키마 마이그레이션과 보존 기간 정리를 담당한다.
//!
//! ## 모듈
//! - `sqlite`: 샘플 저장소 (MetricsSink 구현)
//! - `migration`: 스키마 마이그레이션

pub mod migration;
pub mod sqlite;

pub use sqlite::SqliteSink;
