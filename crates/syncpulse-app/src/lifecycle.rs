//! 프로세스 수명 관리.
//!
//! 종료 신호 하나를 모든 주기 작업이 구독하고, 종료 시 등록된 작업을
//! 유예 시간 안에서 회수한다.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// 종료 시 작업 회수 결과
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DrainReport {
    /// 정상 종료한 작업 수
    pub finished: usize,
    /// panic 등으로 실패한 작업 수
    pub failed: usize,
    /// 유예 시간 안에 끝나지 않아 중단한 작업 수
    pub aborted: usize,
}

/// 종료 신호와 백그라운드 작업 핸들 보관
pub struct LifecycleManager {
    shutdown_tx: watch::Sender<bool>,
    tasks: Vec<(String, JoinHandle<()>)>,
}

impl LifecycleManager {
    pub fn new() -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            shutdown_tx,
            tasks: Vec::new(),
        }
    }

    /// 종료 수신기
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.shutdown_tx.subscribe()
    }

    /// 종료 시 회수할 작업 등록
    pub fn track(&mut self, name: impl Into<String>, handle: JoinHandle<()>) {
        self.tasks.push((name.into(), handle));
    }

    /// 등록된 작업 수
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_shutting_down(&self) -> bool {
        *self.shutdown_tx.borrow()
    }

    /// 종료 신호 발송 (중복 호출 무시)
    pub fn shutdown(&self) {
        let changed = self.shutdown_tx.send_if_modified(|stopping| {
            if *stopping {
                false
            } else {
                *stopping = true;
                true
            }
        });
        if changed {
            info!("종료 신호 발송 (작업 {}개)", self.tasks.len());
        }
    }

    /// 종료 신호 후 작업별로 `grace` 동안 대기, 넘기면 중단
    pub async fn drain(&mut self, grace: Duration) -> DrainReport {
        self.shutdown();

        let mut report = DrainReport::default();
        for (name, mut handle) in self.tasks.drain(..) {
            match tokio::time::timeout(grace, &mut handle).await {
                Ok(Ok(())) => {
                    debug!("작업 종료: {name}");
                    report.finished += 1;
                }
                Ok(Err(e)) => {
                    warn!("작업 실패 ({name}): {e}");
                    report.failed += 1;
                }
                Err(_) => {
                    warn!("작업 종료 대기 시간 초과, 중단: {name}");
                    handle.abort();
                    report.aborted += 1;
                }
            }
        }
        report
    }

    /// SIGINT/SIGTERM(비 unix는 Ctrl+C) 대기 후 종료 신호 발송
    pub async fn wait_for_signal(&self) {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};

            match (
                signal(SignalKind::interrupt()),
                signal(SignalKind::terminate()),
            ) {
                (Ok(mut sigint), Ok(mut sigterm)) => {
                    tokio::select! {
                        _ = sigint.recv() => info!("SIGINT 수신"),
                        _ = sigterm.recv() => info!("SIGTERM 수신"),
                    }
                }
                _ => {
                    warn!("시그널 핸들러 등록 실패, Ctrl+C만 대기");
                    wait_ctrl_c().await;
                }
            }
        }

        #[cfg(not(unix))]
        {
            wait_ctrl_c().await;
        }

        self.shutdown();
    }
}

impl Default for LifecycleManager {
    fn default() -> Self {
        Self::new()
    }
}

async fn wait_ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Ctrl+C 수신"),
        Err(e) => warn!("Ctrl+C 핸들러 등록 실패: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shutdown_is_idempotent() {
        let lm = LifecycleManager::new();
        let rx = lm.subscribe();
        assert!(!lm.is_shutting_down());

        lm.shutdown();
        lm.shutdown();
        assert!(*rx.borrow());
        assert!(lm.is_shutting_down());
    }

    #[tokio::test]
    async fn drain_collects_cooperative_tasks() {
        let mut lm = LifecycleManager::new();
        for i in 0..3 {
            let mut rx = lm.subscribe();
            lm.track(
                format!("loop-{i}"),
                tokio::spawn(async move {
                    let _ = rx.changed().await;
                }),
            );
        }
        assert_eq!(lm.task_count(), 3);

        let report = lm.drain(Duration::from_secs(1)).await;
        assert_eq!(report.finished, 3);
        assert_eq!(lm.task_count(), 0);
    }

    #[tokio::test]
    async fn drain_aborts_stuck_and_counts_panics() {
        let mut lm = LifecycleManager::new();
        lm.track(
            "stuck",
            tokio::spawn(async {
                tokio::time::sleep(Duration::from_secs(60)).await;
            }),
        );
        lm.track("panics", tokio::spawn(async { panic!("boom") }));

        let report = lm.drain(Duration::from_millis(50)).await;
        assert_eq!(
            report,
            DrainReport {
                finished: 0,
                failed: 1,
                aborted: 1,
            }
        );
    }
}
