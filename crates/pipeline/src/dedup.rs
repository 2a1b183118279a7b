//! TTL 기반 중복 제거 윈도우
//!
//! [`DedupWindow`]는 원본 라인의 [지문](crate::fingerprint)을 키로 마지막 허용 시각을 기록하고,
//! 같은 지문이 TTL 안에 다시 들어오면 차단합니다.
//!
//! - 정책: 고유 원본 라인당 TTL 창마다 최대 한 번 전달
//! - 차단된 호출은 기록 시각을 갱신하지 않으므로 창은 첫 허용 시점부터 흐릅니다.
//! - 만료 레코드는 매 호출마다 함께 정리합니다 (별도 청소 태스크 없음).
//! - 지문은 잘린 해시이므로 충돌한 서로 다른 라인은 함께 억제될 수 있습니다.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::fingerprint::fingerprint;

/// 중복 제거 윈도우
pub struct DedupWindow {
    /// 레코드 유효 기간
    ttl: Duration,
    /// 지문 -> 마지막 허용 시각
    records: HashMap<String, Instant>,
    /// 허용된 총 라인 수
    total_admitted: u64,
    /// 중복으로 억제된 라인 수
    total_suppressed: u64,
}

impl DedupWindow {
    /// 주어진 TTL로 빈 윈도우를 만듭니다.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            records: HashMap::new(),
            total_admitted: 0,
            total_suppressed: 0,
        }
    }

    /// 현재 시각 기준으로 라인 허용 여부를 결정합니다.
    pub fn allow(&mut self, raw: &str) -> bool {
        self.allow_at(raw, Instant::now())
    }

    /// `now` 시각 기준으로 라인 허용 여부를 결정합니다.
    ///
    /// 먼저 나이가 TTL을 넘은 레코드를 모두 제거한 뒤, 살아 있는 레코드가 있으면
    /// `false`를 반환하고 그렇지 않으면 `now`로 기록한 뒤 `true`를 반환합니다.
    pub fn allow_at(&mut self, raw: &str, now: Instant) -> bool {
        let key = fingerprint(raw);
        self.evict_expired(now);

        if self.records.contains_key(&key) {
            self.total_suppressed += 1;
            tracing::debug!(fingerprint = %key, "line suppressed by dedup window");
            return false;
        }

        self.records.insert(key, now);
        self.total_admitted += 1;
        true
    }

    fn evict_expired(&mut self, now: Instant) {
        let ttl = self.ttl;
        self.records
            .retain(|_, seen| now.saturating_duration_since(*seen) <= ttl);
    }

    /// 설정된 TTL
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// 현재 보관 중인 레코드 수 (다음 호출 전까지 만료 레코드 포함)
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// 보관 중인 레코드가 없는지
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 허용된 총 라인 수
    pub fn total_admitted(&self) -> u64 {
        self.total_admitted
    }

    /// 억제된 총 라인 수
    pub fn total_suppressed(&self) -> u64 {
        self.total_suppressed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINE: &str = "2026-01-01T00:00:00Z [ERROR] Database connection failed";

    #[test]
    fn first_call_is_admitted() {
        let mut window = DedupWindow::new(Duration::from_secs(60));
        assert!(window.allow(LINE));
        assert_eq!(window.total_admitted(), 1);
    }

    #[test]
    fn repeat_within_ttl_is_blocked() {
        let mut window = DedupWindow::new(Duration::from_secs(60));
        assert!(window.allow(LINE));
        assert!(!window.allow(LINE));
        assert_eq!(window.total_suppressed(), 1);
    }

    #[test]
    fn readmitted_after_ttl() {
        let mut window = DedupWindow::new(Duration::from_secs(60));
        let t0 = Instant::now();
        assert!(window.allow_at(LINE, t0));
        assert!(!window.allow_at(LINE, t0 + Duration::from_secs(30)));
        assert!(window.allow_at(LINE, t0 + Duration::from_secs(61)));
    }

    #[test]
    fn age_equal_to_ttl_is_still_blocked() {
        let mut window = DedupWindow::new(Duration::from_secs(10));
        let t0 = Instant::now();
        assert!(window.allow_at(LINE, t0));
        assert!(!window.allow_at(LINE, t0 + Duration::from_secs(10)));
    }

    #[test]
    fn blocked_call_does_not_refresh_timestamp() {
        let mut window = DedupWindow::new(Duration::from_secs(10));
        let t0 = Instant::now();
        assert!(window.allow_at(LINE, t0));
        assert!(!window.allow_at(LINE, t0 + Duration::from_secs(9)));
        // 차단 시 갱신했다면 t0+9 기준으로 t0+15는 여전히 차단됨
        assert!(window.allow_at(LINE, t0 + Duration::from_secs(15)));
    }

    #[test]
    fn distinct_lines_tracked_independently() {
        let mut window = DedupWindow::new(Duration::from_secs(60));
        assert!(window.allow("a"));
        assert!(window.allow("b"));
        assert!(!window.allow("a"));
        assert!(!window.allow("b"));
        assert_eq!(window.len(), 2);
    }

    #[test]
    fn expired_records_are_evicted_on_any_call() {
        let mut window = DedupWindow::new(Duration::from_secs(5));
        let t0 = Instant::now();
        for i in 0..100 {
            window.allow_at(&format!("line {i}"), t0);
        }
        assert_eq!(window.len(), 100);

        assert!(window.allow_at("fresh", t0 + Duration::from_secs(6)));
        assert_eq!(window.len(), 1);
    }

    #[test]
    fn real_sleep_past_ttl_readmits() {
        let mut window = DedupWindow::new(Duration::from_millis(20));
        assert!(window.allow(LINE));
        assert!(!window.allow(LINE));
        std::thread::sleep(Duration::from_millis(40));
        assert!(window.allow(LINE));
    }

    #[test]
    fn zero_ttl_blocks_only_same_instant() {
        let mut window = DedupWindow::new(Duration::ZERO);
        let t0 = Instant::now();
        assert!(window.allow_at(LINE, t0));
        assert!(!window.allow_at(LINE, t0));
        assert!(window.allow_at(LINE, t0 + Duration::from_nanos(1)));
    }

    #[test]
    fn empty_window() {
        let window = DedupWindow::new(Duration::from_secs(1));
        assert!(window.is_empty());
        assert_eq!(window.ttl(), Duration::from_secs(1));
    }
}
