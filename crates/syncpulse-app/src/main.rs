//! # syncpulse
//!
//! SyncPulse 바이너리 진입점.
//! 설정 로드, 파이프라인 조립, 주기 작업과 대시보드 서버 실행, 종료 처리.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use syncpulse_app::lifecycle::LifecycleManager;
use syncpulse_app::scheduler::Scheduler;
use syncpulse_app::settings::{anchor_paths, load_config, resolve_data_dir};
use syncpulse_app::Pipeline;

/// 종료 시 작업 대기 제한
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Git 동기화 파이프라인 운영 텔레메트리
#[derive(Parser, Debug)]
#[command(name = "syncpulse")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// 설정 파일 경로 (JSON/TOML/YAML)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, short = 'l', default_value = "info")]
    log_level: String,

    /// 대시보드 포트 (설정 파일보다 우선)
    #[arg(long, short = 'p')]
    port: Option<u16>,

    /// 데이터 저장 경로 (리포트, SQLite)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// 대시보드 서버 비활성화
    #[arg(long)]
    no_dashboard: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_filter = [
        "syncpulse",
        "syncpulse_app",
        "syncpulse_core",
        "syncpulse_metrics",
        "syncpulse_monitor",
        "syncpulse_network",
        "syncpulse_alert",
        "syncpulse_report",
        "syncpulse_storage",
        "syncpulse_web",
        "tower_http",
    ]
    .iter()
    .map(|target| format!("{target}={}", args.log_level))
    .collect::<Vec<_>>()
    .join(",");
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_filter)),
        )
        .init();

    info!("SyncPulse 시작 (v{})", env!("CARGO_PKG_VERSION"));

    // 설정 로드
    let mut config = load_config(args.config.as_deref()).context("설정 로드 실패")?;
    if let Some(port) = args.port {
        config.dashboard.port = port;
    }
    if args.no_dashboard {
        config.dashboard.enabled = false;
    }
    let data_dir = resolve_data_dir(args.data_dir.as_deref());
    anchor_paths(&mut config, &data_dir);
    info!("데이터 디렉토리: {}", data_dir.display());

    // ── 컴포넌트 조립 ──
    let pipeline = Pipeline::build(config).context("파이프라인 조립 실패")?;
    let mut lifecycle = LifecycleManager::new();

    // 드리프트 모니터
    pipeline.monitor.start()?;

    // 주기 작업
    for (name, handle) in Scheduler::new(&pipeline).spawn_all(lifecycle.subscribe()) {
        lifecycle.track(name, handle);
    }

    // 대시보드 서버
    if pipeline.config.dashboard.enabled {
        let server = pipeline.web_server();
        let shutdown_rx = lifecycle.subscribe();
        lifecycle.track(
            "web-server",
            tokio::spawn(async move {
                if let Err(e) = server.run(shutdown_rx).await {
                    error!("대시보드 서버 실패: {e}");
                }
            }),
        );
    }

    info!("SyncPulse 실행 중 (Ctrl+C로 종료)");
    lifecycle.wait_for_signal().await;

    // ── 종료 ──
    if let Err(e) = pipeline.monitor.stop().await {
        warn!("드리프트 모니터 정지 실패: {e}");
    }
    let drained = lifecycle.drain(SHUTDOWN_GRACE).await;
    info!(
        "작업 회수: 정상 {}, 실패 {}, 중단 {}",
        drained.finished, drained.failed, drained.aborted
    );
    pipeline.collector.shutdown_sink().await;

    info!("SyncPulse 종료");
    Ok(())
}
