//! # syncpulse-app
//!
//! SyncPulse 바이너리의 조립 계층.
//! 설정 로드, 컴포넌트 와이어링, 주기 작업 스케줄링, 라이프사이클 관리.
//!
//! ## 모듈
//! - `settings`: 설정 파일 + 환경변수 로드, 데이터 경로 결정
//! - `pipeline`: 컴포넌트 생성과 연결 (DI)
//! - `scheduler`: 리소스 샘플링, 대시보드 푸시, 리포트, 보존 정리 루프
//! - `lifecycle`: 종료 신호 전파, 작업 회수

pub mod lifecycle;
pub mod pipeline;
pub mod scheduler;
pub mod settings;

pub use pipeline::Pipeline;
