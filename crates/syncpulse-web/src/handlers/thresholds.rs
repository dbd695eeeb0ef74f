//! 임계값 조회/변경 핸들러.

use std::collections::BTreeMap;

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

use crate::error::ApiError;
use crate::AppState;

/// 임계값 변경 요청
#[derive(Debug, Deserialize)]
pub struct UpdateThresholdRequest {
    pub value: f64,
}

/// GET /api/thresholds
pub async fn get_thresholds(State(state): State<AppState>) -> Json<BTreeMap<String, f64>> {
    Json(state.monitor.thresholds())
}

/// 런타임 임계값 변경. 알 수 없는 종류나 양수가 아닌 값은 400.
///
/// PUT /api/thresholds/{kind}
pub async fn update_threshold(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Json(body): Json<UpdateThresholdRequest>,
) -> Result<Json<BTreeMap<String, f64>>, ApiError> {
    state.monitor.update_threshold(&kind, body.value)?;
    Ok(Json(state.monitor.thresholds()))
}
