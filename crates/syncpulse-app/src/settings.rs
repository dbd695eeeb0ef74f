//! 설정 로드.
//!
//! 기본값 위에 설정 파일(JSON/TOML/YAML)과 `SYNCPULSE__*` 환경변수를 순서대로 덮어쓴다.
//! 예: `SYNCPULSE__DASHBOARD__PORT=9000`, `SYNCPULSE__ALERT__TO_EMAILS=a@x.io,b@x.io`

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use directories::ProjectDirs;

use syncpulse_core::config::AppConfig;
use syncpulse_core::error::CoreError;

/// 환경변수 접두어
pub const ENV_PREFIX: &str = "SYNCPULSE";

/// 기본 DB 파일 이름
pub const DB_FILE_NAME: &str = "syncpulse.db";

/// 설정 로드. `path`가 주어지면 파일이 반드시 존재해야 한다.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, CoreError> {
    let mut builder = Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(File::from(path).required(true));
    }

    let settings = builder
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("alert.to_emails")
                .with_list_parse_key("report.report_formats")
                .with_list_parse_key("report.schedule"),
        )
        .build()
        .map_err(|e| CoreError::Config(format!("설정 로드 실패: {e}")))?;

    settings
        .try_deserialize::<AppConfig>()
        .map_err(|e| CoreError::Config(format!("설정 해석 실패: {e}")))
}

/// 데이터 디렉토리 결정 (CLI 인자 또는 플랫폼별 기본 경로)
///
/// # 플랫폼별 기본 경로:
/// - macOS: `~/Library/Application Support/io.syncpulse.syncpulse`
/// - Windows: `%APPDATA%\syncpulse\syncpulse\data`
/// - Linux: `~/.local/share/syncpulse`
pub fn resolve_data_dir(cli: Option<&Path>) -> PathBuf {
    cli.map(Path::to_path_buf)
        .or_else(|| {
            ProjectDirs::from("io", "syncpulse", "syncpulse").map(|p| p.data_dir().to_path_buf())
        })
        .unwrap_or_else(|| PathBuf::from("."))
}

/// 상대 경로 설정을 데이터 디렉토리 기준으로 고정
pub fn anchor_paths(config: &mut AppConfig, data_dir: &Path) {
    if config.report.output_dir.is_relative() {
        config.report.output_dir = data_dir.join(&config.report.output_dir);
    }
    match &config.storage.db_path {
        Some(path) if path.is_relative() => {
            config.storage.db_path = Some(data_dir.join(path));
        }
        Some(_) => {}
        None => config.storage.db_path = Some(data_dir.join(DB_FILE_NAME)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_config_error() {
        let err = load_config(Some(Path::new("/nonexistent/syncpulse.toml"))).unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
    }

    #[test]
    fn toml_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("syncpulse.toml");
        std::fs::write(
            &path,
            r#"
[monitor]
check_interval_secs = 10

[dashboard]
port = 9191

[metrics.alert_thresholds]
sync_delay_minutes = 15.0
"#,
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.monitor.check_interval_secs, 10);
        assert_eq!(config.dashboard.port, 9191);
        assert_eq!(config.metrics.alert_thresholds["sync_delay_minutes"], 15.0);
        // 지정하지 않은 섹션은 기본값
        assert_eq!(config.alert.max_history_size, 1000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn relative_paths_are_anchored() {
        let mut config = AppConfig::default_config();
        anchor_paths(&mut config, Path::new("/var/lib/syncpulse"));
        assert_eq!(
            config.report.output_dir,
            PathBuf::from("/var/lib/syncpulse/reports")
        );
        assert_eq!(
            config.storage.db_path,
            Some(PathBuf::from("/var/lib/syncpulse").join(DB_FILE_NAME))
        );
    }

    #[test]
    fn cli_data_dir_wins() {
        assert_eq!(
            resolve_data_dir(Some(Path::new("/tmp/sp"))),
            PathBuf::from("/tmp/sp")
        );
    }
}
