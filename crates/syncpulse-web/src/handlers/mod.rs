//! API 핸들러 모듈.

pub mod alerts;
pub mod health;
pub mod metrics;
pub mod reports;
pub mod thresholds;
pub mod ws;
