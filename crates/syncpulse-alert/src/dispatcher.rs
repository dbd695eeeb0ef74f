//! 알림 디스패처.
//!
//! `send()` 흐름:
//! 1. 잠금 안에서 최근 1시간 이력 수를 한도와 비교 (초과 시 `AlertRateLimited`)
//! 2. 이력에 추가하고 잠금 해제
//! 3. 활성화된 채널마다 독립적으로 재시도하며 동시에 전달
//! 4. 실패한 채널만 모아 `PartialDelivery`로 반환

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use syncpulse_core::config::AlertConfig;
use syncpulse_core::error::{ChannelFailure, CoreError};
use syncpulse_core::models::alert::{Alert, AlertStats};
use syncpulse_core::ports::channel::NotificationChannel;
use syncpulse_core::ports::publisher::AlertPublisher;

use crate::history::AlertHistory;

/// 시간당 한도 집계 구간 (초)
const RATE_LIMIT_WINDOW_SECS: i64 = 3_600;

struct DispatcherState {
    history: AlertHistory,
    rate_limited: u64,
    delivered: u64,
    delivery_failures: u64,
}

/// 알림 디스패처
pub struct AlertDispatcher {
    state: RwLock<DispatcherState>,
    channels: Vec<Arc<dyn NotificationChannel>>,
    rate_limit_per_hour: u32,
    retry_attempts: u32,
    retry_delay: Duration,
}

impl AlertDispatcher {
    /// 알림 설정과 채널 목록으로 생성
    pub fn new(config: &AlertConfig, channels: Vec<Arc<dyn NotificationChannel>>) -> Self {
        Self {
            state: RwLock::new(DispatcherState {
                history: AlertHistory::new(config.max_history_size),
                rate_limited: 0,
                delivered: 0,
                delivery_failures: 0,
            }),
            channels,
            rate_limit_per_hour: config.rate_limit_per_hour,
            retry_attempts: config.retry_attempts.max(1),
            retry_delay: config.retry_delay(),
        }
    }

    /// 재시도 간격 지정 (빌더)
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// 채널 이름 (등록 순서)
    pub fn channel_names(&self) -> Vec<String> {
        self.channels.iter().map(|c| c.name().to_string()).collect()
    }

    // ============================================================
    // 전송
    // ============================================================

    /// 알림 한 건 처리
    pub async fn send(&self, alert: Alert) -> Result<(), CoreError> {
        {
            let mut state = self.state.write();
            if self.rate_limit_per_hour > 0 {
                let cutoff = Utc::now() - chrono::Duration::seconds(RATE_LIMIT_WINDOW_SECS);
                let recent = state.history.count_since(cutoff);
                if recent >= self.rate_limit_per_hour as usize {
                    state.rate_limited += 1;
                    warn!(
                        "알림 한도 초과 ({}/h), 전달 생략: {}",
                        self.rate_limit_per_hour, alert.id
                    );
                    return Err(CoreError::AlertRateLimited {
                        limit_per_hour: self.rate_limit_per_hour,
                    });
                }
            }
            state.history.push(alert.clone());
        }

        let enabled: Vec<Arc<dyn NotificationChannel>> = self
            .channels
            .iter()
            .filter(|c| c.is_enabled())
            .cloned()
            .collect();
        let results = join_all(
            enabled
                .iter()
                .map(|channel| self.deliver_with_retry(&**channel, &alert)),
        )
        .await;

        let failures: Vec<ChannelFailure> = enabled
            .iter()
            .zip(results)
            .filter_map(|(channel, result)| {
                result.err().map(|e| ChannelFailure {
                    channel: channel.name().to_string(),
                    message: e.to_string(),
                })
            })
            .collect();

        let mut state = self.state.write();
        if failures.is_empty() {
            state.delivered += 1;
            debug!("알림 전달 완료: {} ({}개 채널)", alert.id, enabled.len());
            Ok(())
        } else {
            state.delivery_failures += 1;
            let err = CoreError::PartialDelivery { failures };
            warn!("알림 전달 일부 실패 ({}): {err}", alert.id);
            Err(err)
        }
    }

    async fn deliver_with_retry(
        &self,
        channel: &dyn NotificationChannel,
        alert: &Alert,
    ) -> Result<(), CoreError> {
        let mut attempt = 1;
        loop {
            match channel.deliver(alert).await {
                Ok(()) => return Ok(()),
                Err(e) if attempt >= self.retry_attempts => {
                    warn!(
                        "{} 채널 전달 포기 ({attempt}회 시도): {e}",
                        channel.name()
                    );
                    return Err(e);
                }
                Err(e) => {
                    debug!(
                        "{} 채널 전달 실패 (시도 {attempt}/{}): {e}, {:?} 후 재시도",
                        channel.name(),
                        self.retry_attempts,
                        self.retry_delay
                    );
                    attempt += 1;
                    tokio::time::sleep(self.retry_delay).await;
                }
            }
        }
    }

    // ============================================================
    // 조회
    // ============================================================

    /// 이력 단일 순회로 통계 계산
    pub fn stats(&self, recent_n: usize) -> AlertStats {
        let state = self.state.read();
        let mut stats = AlertStats {
            total: state.history.len(),
            rate_limited: state.rate_limited,
            delivered: state.delivered,
            delivery_failures: state.delivery_failures,
            ..Default::default()
        };

        for alert in state.history.iter() {
            *stats.by_kind.entry(alert.kind.clone()).or_insert(0) += 1;
            *stats
                .by_severity
                .entry(alert.severity.as_str().to_string())
                .or_insert(0) += 1;
            if !alert.resolved {
                stats.unresolved += 1;
            }
            if stats.last_alert_at.map_or(true, |last| alert.timestamp > last) {
                stats.last_alert_at = Some(alert.timestamp);
            }
        }
        stats.recent = state.history.recent(recent_n);
        stats
    }

    /// 전체 이력 복사본 (오래된 순)
    pub fn history(&self) -> Vec<Alert> {
        self.state.read().history.to_vec()
    }

    pub fn history_len(&self) -> usize {
        self.state.read().history.len()
    }

    /// 최근 알림 (최신순)
    pub fn recent(&self, limit: usize) -> Vec<Alert> {
        self.state.read().history.recent(limit)
    }

    /// `cutoff` 이후 생성된 알림 수
    pub fn count_since(&self, cutoff: DateTime<Utc>) -> usize {
        self.state.read().history.count_since(cutoff)
    }

    /// `[from, to)` 구간 알림 (오래된 순)
    pub fn alerts_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Vec<Alert> {
        self.state.read().history.between(from, to)
    }

    /// 알림 해결 처리. 이미 해결된 알림은 그대로 반환한다.
    pub fn resolve(&self, id: &str) -> Result<Alert, CoreError> {
        let resolved = self.state.write().history.resolve(id, Utc::now());
        match resolved {
            Some(alert) => {
                info!("알림 해결: {id}");
                Ok(alert)
            }
            None => Err(CoreError::NotFound {
                resource_type: "Alert".to_string(),
                id: id.to_string(),
            }),
        }
    }
}

#[async_trait]
impl AlertPublisher for AlertDispatcher {
    async fn publish(&self, alert: Alert) -> Result<(), CoreError> {
        self.send(alert).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use syncpulse_core::models::alert::Severity;

    /// 호출 횟수를 세는 채널. `fail_first`회까지 실패한다.
    struct MockChannel {
        name: &'static str,
        enabled: bool,
        fail_first: u32,
        delay: Duration,
        calls: AtomicU32,
    }

    impl MockChannel {
        fn ok(name: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                enabled: true,
                fail_first: 0,
                delay: Duration::ZERO,
                calls: AtomicU32::new(0),
            })
        }

        fn failing(name: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                enabled: true,
                fail_first: u32::MAX,
                delay: Duration::ZERO,
                calls: AtomicU32::new(0),
            })
        }

        fn flaky(name: &'static str, fail_first: u32) -> Arc<Self> {
            Arc::new(Self {
                name,
                enabled: true,
                fail_first,
                delay: Duration::ZERO,
                calls: AtomicU32::new(0),
            })
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl NotificationChannel for MockChannel {
        fn name(&self) -> &str {
            self.name
        }

        fn is_enabled(&self) -> bool {
            self.enabled
        }

        async fn deliver(&self, _alert: &Alert) -> Result<(), CoreError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if call <= self.fail_first {
                return Err(CoreError::Network(format!("{} 연결 거부", self.name)));
            }
            Ok(())
        }
    }

    fn config(rate_limit: u32, max_history: usize) -> AlertConfig {
        AlertConfig {
            rate_limit_per_hour: rate_limit,
            max_history_size: max_history,
            retry_attempts: 3,
            retry_delay_seconds: 0,
            ..Default::default()
        }
    }

    fn alert(kind: &str, severity: Severity) -> Alert {
        Alert::new(kind, severity, "테스트 알림", "test")
    }

    #[tokio::test]
    async fn rate_limit_rejects_exactly_one() {
        let channel = MockChannel::ok("chat");
        let dispatcher = AlertDispatcher::new(&config(3, 100), vec![channel.clone()]);

        let mut rejected = 0;
        for _ in 0..4 {
            match dispatcher.send(alert("sync_drift", Severity::Low)).await {
                Ok(()) => {}
                Err(CoreError::AlertRateLimited { limit_per_hour }) => {
                    assert_eq!(limit_per_hour, 3);
                    rejected += 1;
                }
                Err(e) => panic!("예상치 못한 에러: {e}"),
            }
        }

        assert_eq!(rejected, 1);
        assert_eq!(dispatcher.history_len(), 3);
        assert_eq!(channel.calls(), 3);
        assert_eq!(dispatcher.stats(10).rate_limited, 1);
    }

    #[tokio::test]
    async fn old_alerts_do_not_count_toward_limit() {
        let dispatcher = AlertDispatcher::new(&config(1, 100), vec![]);
        let old = alert("sync_drift", Severity::Low)
            .with_timestamp(Utc::now() - chrono::Duration::hours(2));
        dispatcher.send(old).await.unwrap();
        dispatcher.send(alert("sync_drift", Severity::Low)).await.unwrap();
        assert_eq!(dispatcher.history_len(), 2);
    }

    #[tokio::test]
    async fn zero_limit_is_unlimited() {
        let dispatcher = AlertDispatcher::new(&config(0, 100), vec![]);
        for _ in 0..20 {
            dispatcher.send(alert("slow_sync", Severity::Low)).await.unwrap();
        }
        assert_eq!(dispatcher.history_len(), 20);
    }

    #[tokio::test]
    async fn history_bound_keeps_latest() {
        let dispatcher = AlertDispatcher::new(&config(0, 5), vec![]);
        let mut ids = Vec::new();
        for _ in 0..8 {
            let a = alert("slow_sync", Severity::Low);
            ids.push(a.id.clone());
            dispatcher.send(a).await.unwrap();
        }
        let history: Vec<String> = dispatcher.history().into_iter().map(|a| a.id).collect();
        assert_eq!(history, ids[3..].to_vec());
    }

    #[tokio::test]
    async fn partial_failure_mentions_only_failed_channel() {
        let email = MockChannel::failing("email");
        let chat = MockChannel::ok("chat");
        let dispatcher = AlertDispatcher::new(&config(0, 100), vec![email.clone(), chat.clone()]);

        let err = dispatcher
            .send(alert("high_error_rate", Severity::High))
            .await
            .unwrap_err();

        match &err {
            CoreError::PartialDelivery { failures } => {
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].channel, "email");
            }
            other => panic!("PartialDelivery 예상: {other}"),
        }
        let message = err.to_string();
        assert!(message.starts_with("partial failure: [email: "));
        assert!(!message.contains("chat"));

        assert_eq!(chat.calls(), 1);
        assert_eq!(email.calls(), 3);
        assert_eq!(dispatcher.history_len(), 1);

        let stats = dispatcher.stats(5);
        assert_eq!(stats.delivery_failures, 1);
        assert_eq!(stats.delivered, 0);
    }

    #[tokio::test]
    async fn retry_recovers_from_transient_failure() {
        let flaky = MockChannel::flaky("chat", 2);
        let dispatcher = AlertDispatcher::new(&config(0, 100), vec![flaky.clone()]);
        dispatcher.send(alert("slow_response", Severity::Medium)).await.unwrap();
        assert_eq!(flaky.calls(), 3);
        assert_eq!(dispatcher.stats(1).delivered, 1);
    }

    #[tokio::test]
    async fn zero_retry_attempts_still_tries_once() {
        let failing = MockChannel::failing("chat");
        let mut cfg = config(0, 100);
        cfg.retry_attempts = 0;
        let dispatcher = AlertDispatcher::new(&cfg, vec![failing.clone()]);
        assert!(dispatcher.send(alert("slow_sync", Severity::Low)).await.is_err());
        assert_eq!(failing.calls(), 1);
    }

    #[tokio::test]
    async fn disabled_channel_is_skipped() {
        let disabled = Arc::new(MockChannel {
            name: "email",
            enabled: false,
            fail_first: u32::MAX,
            delay: Duration::ZERO,
            calls: AtomicU32::new(0),
        });
        let dispatcher = AlertDispatcher::new(&config(0, 100), vec![disabled.clone()]);
        dispatcher.send(alert("slow_sync", Severity::Low)).await.unwrap();
        assert_eq!(disabled.calls(), 0);
    }

    #[tokio::test]
    async fn lock_is_released_during_delivery() {
        let slow = Arc::new(MockChannel {
            name: "chat",
            enabled: true,
            fail_first: 0,
            delay: Duration::from_millis(200),
            calls: AtomicU32::new(0),
        });
        let dispatcher = Arc::new(AlertDispatcher::new(&config(0, 100), vec![slow]));

        let sender = dispatcher.clone();
        let handle = tokio::spawn(async move { sender.send(alert("sync_drift", Severity::High)).await });

        tokio::time::sleep(Duration::from_millis(50)).await;
        // 전달이 끝나기 전에 이력과 통계를 읽을 수 있어야 한다
        assert_eq!(dispatcher.history_len(), 1);
        assert_eq!(dispatcher.stats(1).total, 1);
        assert!(!handle.is_finished());

        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn stats_single_pass() {
        let dispatcher = AlertDispatcher::new(&config(0, 100), vec![]);
        dispatcher.send(alert("sync_drift", Severity::High)).await.unwrap();
        dispatcher.send(alert("sync_drift", Severity::Critical)).await.unwrap();
        let last = alert("slow_sync", Severity::Low);
        let last_id = last.id.clone();
        dispatcher.send(last).await.unwrap();
        dispatcher.resolve(&last_id).unwrap();

        let stats = dispatcher.stats(2);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.by_kind["sync_drift"], 2);
        assert_eq!(stats.by_kind["slow_sync"], 1);
        assert_eq!(stats.by_severity["critical"], 1);
        assert_eq!(stats.unresolved, 2);
        assert_eq!(stats.recent.len(), 2);
        assert_eq!(stats.recent[0].id, last_id);
        assert!(stats.last_alert_at.is_some());
    }

    #[tokio::test]
    async fn resolve_unknown_is_not_found() {
        let dispatcher = AlertDispatcher::new(&config(0, 100), vec![]);
        assert!(matches!(
            dispatcher.resolve("nope"),
            Err(CoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn publisher_port_delegates_to_send() {
        let chat = MockChannel::ok("chat");
        let dispatcher = AlertDispatcher::new(&config(0, 100), vec![chat.clone()]);
        let publisher: &dyn AlertPublisher = &dispatcher;
        publisher.publish(alert("sync_drift", Severity::Low)).await.unwrap();
        assert_eq!(chat.calls(), 1);
        assert_eq!(dispatcher.channel_names(), vec!["chat".to_string()]);
    }
}
