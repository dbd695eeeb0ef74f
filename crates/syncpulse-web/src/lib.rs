//! # syncpulse-web
//!
//! 실시간 대시보드 서버.
//! Axum 기반 REST API + WebSocket 스냅샷 푸시.
//!
//! ## 기능
//! - 대시보드 스냅샷 조회 / WebSocket 주기 푸시
//! - 상태 확인
//! - 알림 목록, 통계, 해결 처리
//! - 런타임 임계값 조회/변경
//! - 요청 시 리포트 생성

pub mod dashboard;
pub mod error;
pub mod handlers;
pub mod routes;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Request, State};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use syncpulse_alert::AlertDispatcher;
use syncpulse_core::config::DashboardConfig;
use syncpulse_metrics::MetricsCollector;
use syncpulse_monitor::DriftMonitor;
use syncpulse_report::ReportBuilder;

pub use dashboard::{ConnectionRegistry, LiveDashboard};

/// 포트 바인드 최대 시도 횟수
const MAX_PORT_ATTEMPTS: u16 = 10;

/// 웹 서버 애플리케이션 상태
#[derive(Clone)]
pub struct AppState {
    pub collector: Arc<MetricsCollector>,
    pub dispatcher: Arc<AlertDispatcher>,
    pub monitor: Arc<DriftMonitor>,
    pub reports: Arc<ReportBuilder>,
    pub dashboard: Arc<LiveDashboard>,
    /// 프로세스 시작 시각 (health uptime)
    pub started_at: Instant,
}

/// API 요청 처리 시간을 응답 시간 시리즈에 기록
async fn track_response_time(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let started = Instant::now();
    let response = next.run(request).await;
    state.collector.record_response_time(started.elapsed());
    response
}

/// 전체 라우터 (API + WebSocket)
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = routes::api_routes().layer(middleware::from_fn_with_state(
        state.clone(),
        track_response_time,
    ));

    Router::new()
        .nest("/api", api)
        .route("/ws", get(handlers::ws::ws_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// 대시보드 웹 서버
pub struct WebServer {
    config: DashboardConfig,
    state: AppState,
}

impl WebServer {
    pub fn new(state: AppState, config: DashboardConfig) -> Self {
        Self { config, state }
    }

    /// 포트 바인드
    ///
    /// 설정 포트에서 시작하여, 이미 사용 중이면 다음 포트를 시도합니다.
    /// 최대 10개 포트를 시도한 후 실패하면 에러를 반환합니다.
    pub async fn bind(&self) -> Result<TcpListener, std::io::Error> {
        let host = if self.config.allow_external {
            "0.0.0.0"
        } else {
            "127.0.0.1"
        };

        let base_port = self.config.port;
        let mut last_error = None;

        for attempt in 0..MAX_PORT_ATTEMPTS {
            // 포트 오버플로우 체크
            let Some(port) = base_port.checked_add(attempt) else {
                break;
            };

            let addr: SocketAddr = match format!("{host}:{port}").parse() {
                Ok(a) => a,
                Err(e) => {
                    error!("잘못된 주소 {host}:{port}: {e}");
                    continue;
                }
            };

            match TcpListener::bind(addr).await {
                Ok(listener) => {
                    if attempt > 0 {
                        warn!("포트 {base_port} 사용 불가, 대체 포트 {port} 사용");
                    }
                    return Ok(listener);
                }
                Err(e) if e.kind() == std::io::ErrorKind::AddrInUse => {
                    warn!("포트 {port} 이미 사용 중, 다음 포트 시도...");
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::AddrInUse,
                format!(
                    "포트 {}-{} 모두 사용 불가",
                    base_port,
                    base_port.saturating_add(MAX_PORT_ATTEMPTS - 1)
                ),
            )
        }))
    }

    /// 바인드된 리스너로 서버 실행 (graceful shutdown)
    pub async fn serve(
        self,
        listener: TcpListener,
        mut shutdown_rx: watch::Receiver<bool>,
    ) -> Result<(), std::io::Error> {
        if let Ok(addr) = listener.local_addr() {
            info!("대시보드 서버 시작: http://{addr}");
        }

        axum::serve(listener, router(self.state))
            .with_graceful_shutdown(async move {
                loop {
                    if *shutdown_rx.borrow() {
                        info!("웹 서버 종료 신호 수신");
                        break;
                    }
                    if shutdown_rx.changed().await.is_err() {
                        break;
                    }
                }
            })
            .await?;

        info!("대시보드 서버 종료");
        Ok(())
    }

    /// 바인드 + 실행
    pub async fn run(self, shutdown_rx: watch::Receiver<bool>) -> Result<(), std::io::Error> {
        let listener = self.bind().await?;
        self.serve(listener, shutdown_rx).await
    }

    /// 설정 포트 기준 URL
    pub fn url(&self) -> String {
        format!("http://localhost:{}", self.config.port)
    }
}
