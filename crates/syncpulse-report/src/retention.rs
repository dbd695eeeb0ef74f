//! 리포트 보존 정리.

use std::path::Path;
use std::time::{Duration, SystemTime};

use tracing::{debug, info, warn};

use syncpulse_core::error::CoreError;

/// 정리 대상 확장자
const REPORT_EXTENSIONS: [&str; 3] = ["json", "html", "md"];

/// `retention_days`보다 오래된 리포트 파일 삭제. 삭제한 파일 수를 반환한다.
/// 디렉토리가 없거나 `retention_days`가 0(정리 안 함)이면 0.
pub async fn cleanup_expired_reports(dir: &Path, retention_days: u32) -> Result<usize, CoreError> {
    if retention_days == 0 {
        debug!("리포트 보존 기간 0일: 정리 생략");
        return Ok(0);
    }

    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e.into()),
    };

    let max_age = Duration::from_secs(u64::from(retention_days) * 86_400);
    let cutoff = SystemTime::now()
        .checked_sub(max_age)
        .unwrap_or(SystemTime::UNIX_EPOCH);

    let mut removed = 0;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_report = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| REPORT_EXTENSIONS.contains(&ext));
        if !is_report {
            continue;
        }

        let metadata = match entry.metadata().await {
            Ok(m) if m.is_file() => m,
            Ok(_) => continue,
            Err(e) => {
                warn!("리포트 메타데이터 조회 실패 ({}): {e}", path.display());
                continue;
            }
        };
        let modified = match metadata.modified() {
            Ok(t) => t,
            Err(e) => {
                warn!("리포트 수정 시각 조회 실패 ({}): {e}", path.display());
                continue;
            }
        };

        if modified < cutoff {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {
                    debug!("만료 리포트 삭제: {}", path.display());
                    removed += 1;
                }
                Err(e) => warn!("만료 리포트 삭제 실패 ({}): {e}", path.display()),
            }
        }
    }

    if removed > 0 {
        info!("만료 리포트 {removed}개 삭제 ({})", dir.display());
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn age_file(path: &Path, days: u64) {
        let file = std::fs::File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() - Duration::from_secs(days * 86_400))
            .unwrap();
    }

    #[tokio::test]
    async fn removes_only_expired_report_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("rpt_old_daily.json"), "{}").unwrap();
        std::fs::write(dir.path().join("rpt_old_daily.md"), "#").unwrap();
        std::fs::write(dir.path().join("rpt_new_daily.json"), "{}").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "keep").unwrap();
        age_file(&dir.path().join("rpt_old_daily.json"), 10);
        age_file(&dir.path().join("rpt_old_daily.md"), 10);
        age_file(&dir.path().join("notes.txt"), 10);

        // 보존 기간 30일이면 모두 유지
        assert_eq!(cleanup_expired_reports(dir.path(), 30).await.unwrap(), 0);

        // 보존 기간 7일이면 10일 지난 리포트만 삭제
        assert_eq!(cleanup_expired_reports(dir.path(), 7).await.unwrap(), 2);
        assert!(dir.path().join("notes.txt").exists());
        assert!(dir.path().join("rpt_new_daily.json").exists());
        assert!(!dir.path().join("rpt_old_daily.json").exists());
    }

    #[tokio::test]
    async fn zero_retention_keeps_everything() {
        let dir = tempfile::tempdir().unwrap();
        let fresh = dir.path().join("rpt_fresh_daily.json");
        let old = dir.path().join("rpt_old_daily.html");
        std::fs::write(&fresh, "{}").unwrap();
        std::fs::write(&old, "<html></html>").unwrap();
        age_file(&old, 400);

        assert_eq!(cleanup_expired_reports(dir.path(), 0).await.unwrap(), 0);
        assert!(fresh.exists());
        assert!(old.exists());
    }

    #[tokio::test]
    async fn missing_directory_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert_eq!(cleanup_expired_reports(&missing, 1).await.unwrap(), 0);
    }
}
