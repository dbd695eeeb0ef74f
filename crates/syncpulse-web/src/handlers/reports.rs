//! 리포트 API 핸들러.
//!
//! 요청 시점에 끝나는 한 주기 리포트를 생성하고 설정된 형식으로 저장한다.

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use syncpulse_core::models::report::{ReportKind, ReportPeriod, ReportSummary};

use crate::error::ApiError;
use crate::AppState;

/// 리포트 생성 응답
#[derive(Debug, Serialize)]
pub struct ReportResponse {
    pub id: String,
    pub title: String,
    pub period: ReportPeriod,
    pub summary: ReportSummary,
    pub recommendations: Vec<String>,
    /// 저장된 파일 경로
    pub files: Vec<String>,
    /// 저장 실패 (형식: 사유)
    pub failures: Vec<String>,
}

/// POST /api/reports/{kind}
pub async fn generate_report(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<Json<ReportResponse>, ApiError> {
    let kind: ReportKind = kind.parse()?;
    let period = ReportPeriod::ending_at(kind, Utc::now());
    let report = state.reports.generate(kind, period);
    let outcome = state.reports.save(&report, state.reports.formats()).await;

    Ok(Json(ReportResponse {
        id: report.id,
        title: report.title,
        period: report.period,
        summary: report.summary,
        recommendations: report.recommendations,
        files: outcome
            .written
            .iter()
            .map(|p| p.display().to_string())
            .collect(),
        failures: outcome
            .failures
            .iter()
            .map(|(format, reason)| format!("{}: {reason}", format.extension()))
            .collect(),
    }))
}
