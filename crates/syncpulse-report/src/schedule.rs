//! 리포트 스케줄링.
//!
//! 경계는 모두 UTC 기준: 일간은 다음 자정, 주간은 다음 월요일 00:00,
//! 월간은 다음 달 1일 00:00.

use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use tokio::sync::watch;
use tracing::{info, warn};

use syncpulse_core::models::report::{ReportKind, ReportPeriod};

use crate::builder::ReportBuilder;

/// `now` 이후(엄격히 큼) 첫 주기 경계
pub fn next_boundary(kind: ReportKind, now: DateTime<Utc>) -> DateTime<Utc> {
    let today = now.date_naive();
    let date = match kind {
        ReportKind::Daily => today.succ_opt(),
        ReportKind::Weekly => {
            let days = 7 - i64::from(today.weekday().num_days_from_monday());
            today.checked_add_signed(Duration::days(days))
        }
        ReportKind::Monthly => {
            if today.month() == 12 {
                NaiveDate::from_ymd_opt(today.year() + 1, 1, 1)
            } else {
                NaiveDate::from_ymd_opt(today.year(), today.month() + 1, 1)
            }
        }
    };

    date.and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
        .unwrap_or_else(|| now + Duration::days(1))
}

impl ReportBuilder {
    /// 다음 경계까지 대기 → 생성/저장 반복. 종료 신호는 대기 중에 감지한다.
    pub async fn schedule_loop(self: Arc<Self>, kind: ReportKind, mut shutdown: watch::Receiver<bool>) {
        info!("{} 리포트 스케줄 시작", kind);
        loop {
            let now = Utc::now();
            let boundary = next_boundary(kind, now);
            let wait = (boundary - now).to_std().unwrap_or_default();

            tokio::select! {
                _ = tokio::time::sleep(wait) => {
                    let period = ReportPeriod::ending_at(kind, boundary);
                    let report = self.generate_scheduled(kind, period);
                    let outcome = self.save(&report, self.formats()).await;
                    if outcome.is_complete() {
                        info!("{} 리포트 저장 완료: {}개 파일", kind, outcome.written.len());
                    } else {
                        warn!(
                            "{} 리포트 일부 저장 실패: 성공 {}, 실패 {}",
                            kind,
                            outcome.written.len(),
                            outcome.failures.len()
                        );
                    }
                }
                _ = shutdown.changed() => {
                    info!("{} 리포트 스케줄 루프 종료", kind);
                    break;
                }
            }
        }
    }
}
