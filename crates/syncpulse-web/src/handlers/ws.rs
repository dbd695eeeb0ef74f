//! WebSocket 실시간 스트림 핸들러.
//!
//! 연결마다 유한 큐와 쓰기 태스크를 둔다. 대시보드 푸시는 큐에 넣기만 하고,
//! 실제 소켓 쓰기는 쓰기 태스크가 담당한다. 수신 프레임은 close 외에는 무시한다.

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use syncpulse_core::error::CoreError;
use syncpulse_core::ports::viewer::ViewerConnection;

use crate::AppState;

/// 연결당 대기 스냅샷 최대 개수
const VIEWER_QUEUE_CAPACITY: usize = 16;

/// WebSocket 뷰어 (쓰기 태스크로 가는 큐 송신단)
struct WsViewer {
    tx: mpsc::Sender<String>,
}

#[async_trait]
impl ViewerConnection for WsViewer {
    async fn push(&self, payload: &str) -> Result<(), CoreError> {
        self.tx
            .send(payload.to_string())
            .await
            .map_err(|_| CoreError::Network("뷰어 연결 종료".to_string()))
    }
}

/// GET /ws
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::channel::<String>(VIEWER_QUEUE_CAPACITY);

    // 접속 직후 스냅샷 한 번
    match state.dashboard.snapshot_json() {
        Ok(payload) => {
            if tx.try_send(payload).is_err() {
                warn!("초기 스냅샷 큐잉 실패");
            }
        }
        Err(e) => warn!("초기 스냅샷 직렬화 실패: {e}"),
    }

    let registry = state.dashboard.registry();
    let id = registry.register(Arc::new(WsViewer { tx }));
    info!("WebSocket 뷰어 연결: {id} (총 {}개)", registry.len());

    let mut writer = tokio::spawn(async move {
        while let Some(payload) = rx.recv().await {
            if sender.send(Message::Text(payload.into())).await.is_err() {
                break;
            }
        }
        let _ = sender.close().await;
    });

    loop {
        tokio::select! {
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
            _ = &mut writer => {
                debug!("WebSocket 쓰기 태스크 종료: {id}");
                break;
            }
        }
    }

    registry.unregister(&id);
    writer.abort();
    info!("WebSocket 뷰어 연결 종료: {id}");
}
