//! 수치 집계 헬퍼.
//!
//! 빈 입력이나 퇴화된 회귀는 에러 대신 0.0으로 수렴한다.

/// 산술 평균. 빈 입력은 0.0.
pub fn average(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// 백분위 값 (보간 없음).
///
/// 정렬된 복사본에서 `⌊len·p/100⌋` 위치를 선택하고 마지막 원소로 clamp한다.
/// `p`는 `[0, 100]`으로 제한된다. 빈 입력은 0.0.
pub fn percentile(values: &[f64], p: f64) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    percentile_sorted(&sorted, p)
}

/// 이미 오름차순 정렬된 입력의 백분위 값
pub fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let p = if p.is_nan() { 0.0 } else { p.clamp(0.0, 100.0) };
    let index = (sorted.len() as f64 * p / 100.0).floor() as usize;
    sorted[index.min(sorted.len() - 1)]
}

/// 인덱스 대비 값의 최소제곱 기울기.
///
/// 2개 미만, 인덱스 분산 0, 비유한 결과는 0.0.
pub fn trend(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let mean_x = (n - 1) as f64 / 2.0;
    let mean_y = average(values);

    let mut covariance = 0.0;
    let mut variance = 0.0;
    for (i, y) in values.iter().enumerate() {
        let dx = i as f64 - mean_x;
        covariance += dx * (y - mean_y);
        variance += dx * dx;
    }

    if variance == 0.0 {
        return 0.0;
    }
    let slope = covariance / variance;
    if slope.is_finite() {
        slope
    } else {
        0.0
    }
}

/// 최솟값. 빈 입력은 0.0.
pub fn min(values: &[f64]) -> f64 {
    values.iter().copied().reduce(f64::min).unwrap_or(0.0)
}

/// 최댓값. 빈 입력은 0.0.
pub fn max(values: &[f64]) -> f64 {
    values.iter().copied().reduce(f64::max).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_inputs_are_zero() {
        assert_eq!(average(&[]), 0.0);
        assert_eq!(percentile(&[], 50.0), 0.0);
        assert_eq!(trend(&[]), 0.0);
        assert_eq!(trend(&[42.0]), 0.0);
        assert_eq!(min(&[]), 0.0);
        assert_eq!(max(&[]), 0.0);
    }

    #[test]
    fn percentile_index_rule() {
        let values = [10.0, 20.0, 30.0, 40.0];
        // ⌊4·50/100⌋ = 2
        assert_eq!(percentile(&values, 50.0), 30.0);
        assert_eq!(percentile(&values, 0.0), 10.0);
        assert_eq!(percentile(&values, 100.0), 40.0);
        assert_eq!(percentile(&values, 99.0), 40.0);
    }

    #[test]
    fn percentile_sorts_before_indexing() {
        assert_eq!(percentile(&[5.0, 1.0, 3.0], 50.0), 3.0);
        assert_eq!(percentile(&[5.0, 1.0, 3.0], 0.0), 1.0);
    }

    #[test]
    fn percentile_clamps_p() {
        let values = [1.0, 2.0, 3.0];
        assert_eq!(percentile(&values, 250.0), 3.0);
        assert_eq!(percentile(&values, -10.0), 1.0);
        assert_eq!(percentile(&values, f64::NAN), 1.0);
    }

    #[test]
    fn trend_sign() {
        assert!(trend(&[1.0, 2.0, 3.0, 4.0, 5.0]) > 0.0);
        assert!((trend(&[1.0, 3.0, 5.0, 7.0]) - 2.0).abs() < 1e-9);
        assert!(trend(&[9.0, 6.0, 3.0]) < 0.0);
        assert_eq!(trend(&[7.0, 7.0, 7.0, 7.0]), 0.0);
    }

    #[test]
    fn trend_non_finite_collapses_to_zero() {
        assert_eq!(trend(&[-f64::MAX, 0.0, f64::MAX]), 0.0);
        assert_eq!(trend(&[f64::INFINITY, 1.0]), 0.0);
    }
}
