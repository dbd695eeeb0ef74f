//! SQLite 샘플 저장소 (`MetricsSink` 포트 구현).

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Connection;
use tracing::{debug, info, warn};

use syncpulse_core::error::CoreError;
use syncpulse_core::models::metrics::{SampleKind, SampleRecord};
use syncpulse_core::ports::sink::MetricsSink;

use crate::migration;

/// 문자열 비교로 시간 순서가 유지되는 고정 형식
fn format_ts(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// SQLite 샘플 저장소
pub struct SqliteSink {
    conn: Mutex<Connection>,
}

impl SqliteSink {
    /// 파일 기반 저장소 생성
    pub fn open(path: &Path) -> Result<Self, CoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)
            .map_err(|e| CoreError::Internal(format!("SQLite 열기 실패: {e}")))?;

        conn.execute_batch(
            "
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            PRAGMA temp_store=MEMORY;
            ",
        )
        .map_err(|e| CoreError::Internal(format!("PRAGMA 설정 실패: {e}")))?;

        migration::run_migrations(&conn)
            .map_err(|e| CoreError::Internal(format!("마이그레이션 실패: {e}")))?;

        info!("SQLite 저장소 초기화: {}", path.display());

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// 인메모리 저장소 생성 (테스트용)
    pub fn open_in_memory() -> Result<Self, CoreError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| CoreError::Internal(format!("인메모리 SQLite 생성 실패: {e}")))?;

        migration::run_migrations(&conn)
            .map_err(|e| CoreError::Internal(format!("마이그레이션 실패: {e}")))?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, CoreError> {
        self.conn
            .lock()
            .map_err(|e| CoreError::Internal(format!("잠금 획득 실패: {e}")))
    }

    /// 샘플 한 건 저장 (동기)
    pub fn insert(&self, record: &SampleRecord) -> Result<(), CoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO metric_samples (series, kind, value, recorded_at) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![
                record.series,
                record.kind.as_str(),
                record.value,
                format_ts(record.recorded_at),
            ],
        )
        .map_err(|e| CoreError::Internal(format!("샘플 저장 실패: {e}")))?;
        Ok(())
    }

    /// 시리즈의 최근 샘플 (최신순)
    pub fn recent_samples(&self, series: &str, limit: usize) -> Result<Vec<SampleRecord>, CoreError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT series, kind, value, recorded_at
                 FROM metric_samples
                 WHERE series = ?1
                 ORDER BY recorded_at DESC, id DESC
                 LIMIT ?2",
            )
            .map_err(|e| CoreError::Internal(format!("쿼리 준비 실패: {e}")))?;

        let rows = stmt
            .query_map(rusqlite::params![series, limit as i64], |row| {
                let series: String = row.get(0)?;
                let kind: String = row.get(1)?;
                let value: f64 = row.get(2)?;
                let ts: String = row.get(3)?;
                Ok((series, kind, value, ts))
            })
            .map_err(|e| CoreError::Internal(format!("쿼리 실행 실패: {e}")))?;

        let mut records = Vec::new();
        for row in rows {
            let (series, kind, value, ts) =
                row.map_err(|e| CoreError::Internal(format!("행 읽기 실패: {e}")))?;
            let Some(kind) = SampleKind::parse(&kind) else {
                warn!("알 수 없는 샘플 종류 건너뜀: {kind}");
                continue;
            };
            let recorded_at = match DateTime::parse_from_rfc3339(&ts) {
                Ok(dt) => dt.with_timezone(&Utc),
                Err(e) => {
                    warn!("샘플 시각 파싱 실패 ({ts}): {e}");
                    continue;
                }
            };
            records.push(SampleRecord {
                series,
                kind,
                value,
                recorded_at,
            });
        }
        Ok(records)
    }

    /// `cutoff` 이전 샘플 삭제. 삭제 건수 반환.
    pub fn cleanup_before(&self, cutoff: DateTime<Utc>) -> Result<usize, CoreError> {
        let conn = self.lock()?;
        let deleted = conn
            .execute(
                "DELETE FROM metric_samples WHERE recorded_at < ?1",
                rusqlite::params![format_ts(cutoff)],
            )
            .map_err(|e| CoreError::Internal(format!("샘플 정리 실패: {e}")))?;

        if deleted > 0 {
            info!("보존 기간 지난 샘플 {deleted}건 삭제");
        }
        Ok(deleted)
    }

    /// 저장된 샘플 수
    pub fn sample_count(&self) -> Result<u64, CoreError> {
        let conn = self.lock()?;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM metric_samples", [], |row| row.get(0))
            .map_err(|e| CoreError::Internal(format!("샘플 수 조회 실패: {e}")))?;
        Ok(count.max(0) as u64)
    }
}

#[async_trait]
impl MetricsSink for SqliteSink {
    async fn store(&self, record: &SampleRecord) -> Result<(), CoreError> {
        self.insert(record)?;
        debug!("샘플 저장: {} = {}", record.series, record.value);
        Ok(())
    }
}
