//! 저장소 미러링 작업 큐.
//!
//! 유한 mpsc 큐 + 단일 워커 태스크. 큐가 가득 차면 샘플을 버리고
//! 카운트한다. `shutdown()`은 큐를 닫고 남은 샘플을 모두 저장한 뒤 반환한다.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use syncpulse_core::models::metrics::SampleRecord;
use syncpulse_core::ports::sink::MetricsSink;

/// 미러링 큐 핸들
pub struct SinkWriter {
    tx: Mutex<Option<mpsc::Sender<SampleRecord>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    dropped: AtomicU64,
    written: Arc<AtomicU64>,
    failed: Arc<AtomicU64>,
}

impl SinkWriter {
    /// 워커 태스크 시작. Tokio 런타임 안에서 호출해야 한다.
    pub fn spawn(sink: Arc<dyn MetricsSink>, capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let written = Arc::new(AtomicU64::new(0));
        let failed = Arc::new(AtomicU64::new(0));
        let worker = tokio::spawn(run_worker(sink, rx, written.clone(), failed.clone()));

        Self {
            tx: Mutex::new(Some(tx)),
            worker: Mutex::new(Some(worker)),
            dropped: AtomicU64::new(0),
            written,
            failed,
        }
    }

    /// 샘플을 큐에 넣는다. 호출자를 막지 않는다.
    pub fn enqueue(&self, record: SampleRecord) {
        let guard = self.tx.lock();
        let Some(tx) = guard.as_ref() else {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return;
        };
        match tx.try_send(record) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(record)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                warn!("샘플 미러링 큐 가득 참, 샘플 폐기: {}", record.series);
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// 큐를 닫고 워커가 남은 샘플을 모두 처리할 때까지 대기
    pub async fn shutdown(&self) {
        self.tx.lock().take();
        let worker = self.worker.lock().take();
        if let Some(worker) = worker {
            if let Err(e) = worker.await {
                warn!("샘플 미러링 워커 비정상 종료: {e}");
            }
        }
    }

    /// 큐 포화/종료로 버려진 샘플 수
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// 저장 성공한 샘플 수
    pub fn written(&self) -> u64 {
        self.written.load(Ordering::Relaxed)
    }

    /// 저장 실패한 샘플 수
    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }
}

async fn run_worker(
    sink: Arc<dyn MetricsSink>,
    mut rx: mpsc::Receiver<SampleRecord>,
    written: Arc<AtomicU64>,
    failed: Arc<AtomicU64>,
) {
    while let Some(record) = rx.recv().await {
        match sink.store(&record).await {
            Ok(()) => {
                written.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                failed.fetch_add(1, Ordering::Relaxed);
                warn!("샘플 저장 실패 ({}): {e}", record.series);
            }
        }
    }
    debug!("샘플 미러링 워커 종료");
}
