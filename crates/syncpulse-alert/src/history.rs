//! 알림 이력 (FIFO, 최대 크기 제한).

use chrono::{DateTime, Utc};
use std::collections::VecDeque;

use syncpulse_core::models::alert::Alert;

/// 유한 길이 알림 이력
#[derive(Debug)]
pub struct AlertHistory {
    entries: VecDeque<Alert>,
    max_size: usize,
}

impl AlertHistory {
    /// 새 이력 생성 (최대 크기는 최소 1)
    pub fn new(max_size: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            max_size: max_size.max(1),
        }
    }

    /// 알림 추가. 가득 차면 가장 오래된 항목을 제거한다.
    pub fn push(&mut self, alert: Alert) {
        if self.entries.len() >= self.max_size {
            self.entries.pop_front();
        }
        self.entries.push_back(alert);
    }

    /// `cutoff` 이후 생성된 알림 수
    pub fn count_since(&self, cutoff: DateTime<Utc>) -> usize {
        self.entries
            .iter()
            .rev()
            .filter(|alert| alert.timestamp >= cutoff)
            .count()
    }

    /// 최근 알림 (최신순)
    pub fn recent(&self, limit: usize) -> Vec<Alert> {
        self.entries.iter().rev().take(limit).cloned().collect()
    }

    /// `[from, to)` 구간에 생성된 알림 (오래된 순)
    pub fn between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Vec<Alert> {
        self.entries
            .iter()
            .filter(|alert| alert.timestamp >= from && alert.timestamp < to)
            .cloned()
            .collect()
    }

    /// 해결 처리. 대상이 없으면 None.
    pub fn resolve(&mut self, id: &str, at: DateTime<Utc>) -> Option<Alert> {
        let alert = self.entries.iter_mut().rev().find(|alert| alert.id == id)?;
        alert.mark_resolved(at);
        Some(alert.clone())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Alert> {
        self.entries.iter()
    }

    pub fn to_vec(&self) -> Vec<Alert> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use syncpulse_core::models::alert::Severity;

    fn alert(kind: &str) -> Alert {
        Alert::new(kind, Severity::Low, "m", "test")
    }

    #[test]
    fn bounded_keeps_most_recent() {
        let mut history = AlertHistory::new(3);
        let alerts: Vec<Alert> = (0..5).map(|i| alert(&format!("k{i}"))).collect();
        for a in &alerts {
            history.push(a.clone());
        }
        assert_eq!(history.len(), 3);
        let kinds: Vec<String> = history.iter().map(|a| a.kind.clone()).collect();
        assert_eq!(kinds, vec!["k2", "k3", "k4"]);
    }

    #[test]
    fn recent_is_newest_first() {
        let mut history = AlertHistory::new(10);
        history.push(alert("a"));
        history.push(alert("b"));
        history.push(alert("c"));
        let recent: Vec<String> = history.recent(2).into_iter().map(|a| a.kind).collect();
        assert_eq!(recent, vec!["c", "b"]);
    }

    #[test]
    fn count_since_and_between() {
        let now = Utc::now();
        let mut history = AlertHistory::new(10);
        history.push(alert("old").with_timestamp(now - Duration::hours(2)));
        history.push(alert("recent").with_timestamp(now - Duration::minutes(5)));
        history.push(alert("now").with_timestamp(now));

        assert_eq!(history.count_since(now - Duration::hours(1)), 2);
        let window = history.between(now - Duration::hours(3), now);
        assert_eq!(window.len(), 2);
        assert_eq!(window[0].kind, "old");
    }

    #[test]
    fn resolve_marks_entry() {
        let mut history = AlertHistory::new(10);
        let a = alert("x");
        let id = a.id.clone();
        history.push(a);

        let resolved = history.resolve(&id, Utc::now()).unwrap();
        assert!(resolved.resolved);
        assert!(history.iter().next().unwrap().resolved);
        assert!(history.resolve("missing", Utc::now()).is_none());
    }
}
