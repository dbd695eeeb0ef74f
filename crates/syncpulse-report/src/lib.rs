//! # syncpulse-report
//!
//! 수집기 스냅샷, 알림 이력, 모니터 임계값을 모아 주기 리포트를 만들고
//! JSON/HTML/Markdown으로 저장한다.
//!
//! - [`builder`]: 리포트 생성/저장, 권고 규칙
//! - [`render`]: 출력 형식별 렌더러
//! - [`schedule`]: 주기 경계 계산과 스케줄 루프
//! - [`retention`]: 오래된 리포트 파일 정리

pub mod builder;
pub mod render;
pub mod retention;
pub mod schedule;

pub use builder::{ReportBuilder, SaveOutcome};
