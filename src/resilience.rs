//! Client-side resilience: sliding-window rate limiter, circuit breaker,
//! and retry backoff, coordinated by a `ResilienceManager` the client
//! consults around every request.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::error::DripError;

// --- Rate limiter ---

/// Sliding-window rate limiter. At most `max_requests` acquisitions succeed
/// within any `window`; acquisitions outside the window expire.
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    hits: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            hits: Mutex::new(VecDeque::new()),
        }
    }

    pub fn try_acquire(&self) -> bool {
        let mut hits = self.hits.lock().expect("rate limiter lock poisoned");
        let now = Instant::now();
        Self::evict(&mut hits, now, self.window);
        if hits.len() < self.max_requests {
            hits.push_back(now);
            true
        } else {
            false
        }
    }

    /// How many acquisitions are still available in the current window.
    pub fn remaining(&self) -> usize {
        let mut hits = self.hits.lock().expect("rate limiter lock poisoned");
        Self::evict(&mut hits, Instant::now(), self.window);
        self.max_requests.saturating_sub(hits.len())
    }

    /// Time until the oldest hit expires, when the limit is exhausted.
    pub fn wait_time(&self) -> Option<Duration> {
        let mut hits = self.hits.lock().expect("rate limiter lock poisoned");
        let now = Instant::now();
        Self::evict(&mut hits, now, self.window);
        if hits.len() < self.max_requests {
            return None;
        }
        hits.front()
            .map(|oldest| self.window.saturating_sub(now.duration_since(*oldest)))
    }

    fn evict(hits: &mut VecDeque<Instant>, now: Instant, window: Duration) {
        while let Some(front) = hits.front() {
            if now.duration_since(*front) >= window {
                hits.pop_front();
            } else {
                break;
            }
        }
    }
}

// --- Circuit breaker ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CircuitState::Closed => write!(f, "closed"),
            CircuitState::Open => write!(f, "open"),
            CircuitState::HalfOpen => write!(f, "half_open"),
        }
    }
}

struct BreakerInner {
    state: CircuitState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
}

/// Circuit breaker over consecutive failures. Opens at `failure_threshold`,
/// admits one trial request (half-open) after `reset_timeout`, closes again
/// on a successful trial.
pub struct CircuitBreaker {
    failure_threshold: u32,
    reset_timeout: Duration,
    inner: Mutex<BreakerInner>,
}

pub const DEFAULT_RESET_TIMEOUT: Duration = Duration::from_secs(30);

impl CircuitBreaker {
    pub fn new(failure_threshold: u32) -> Self {
        Self::with_reset_timeout(failure_threshold, DEFAULT_RESET_TIMEOUT)
    }

    pub fn with_reset_timeout(failure_threshold: u32, reset_timeout: Duration) -> Self {
        Self {
            failure_threshold,
            reset_timeout,
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                opened_at: None,
            }),
        }
    }

    pub fn state(&self) -> CircuitState {
        self.inner.lock().expect("breaker lock poisoned").state
    }

    pub fn failure_count(&self) -> u32 {
        self.inner
            .lock()
            .expect("breaker lock poisoned")
            .consecutive_failures
    }

    pub fn allow_request(&self) -> bool {
        let mut inner = self.inner.lock().expect("breaker lock poisoned");
        match inner.state {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => {
                let elapsed = inner
                    .opened_at
                    .map(|t| t.elapsed())
                    .unwrap_or(Duration::ZERO);
                if elapsed >= self.reset_timeout {
                    inner.state = CircuitState::HalfOpen;
                    true
                } else {
                    false
                }
            }
        }
    }

    pub fn record_success(&self) {
        let mut inner = self.inner.lock().expect("breaker lock poisoned");
        inner.consecutive_failures = 0;
        if inner.state == CircuitState::HalfOpen {
            inner.state = CircuitState::Closed;
            inner.opened_at = None;
        }
    }

    pub fn record_failure(&self) {
        let mut inner = self.inner.lock().expect("breaker lock poisoned");
        inner.consecutive_failures += 1;
        let tripped = inner.state == CircuitState::HalfOpen
            || inner.consecutive_failures >= self.failure_threshold;
        if tripped {
            inner.state = CircuitState::Open;
            inner.opened_at = Some(Instant::now());
        }
    }
}

// --- Retry policy ---

/// Exponential backoff for transport errors, 429s, and 5xx responses.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// No retries at all: a single attempt.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay before retry number `attempt` (the first retry is attempt 0).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = self
            .base_delay
            .saturating_mul(2u32.saturating_pow(attempt));
        exp.min(self.max_delay)
    }
}

// --- Manager ---

#[derive(Debug, Clone)]
pub struct ResilienceConfig {
    pub enabled: bool,
    pub rate_limit_requests: usize,
    pub rate_limit_window: Duration,
    pub circuit_breaker_threshold: u32,
    pub circuit_breaker_reset: Duration,
    pub retry: RetryPolicy,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            rate_limit_requests: 100,
            rate_limit_window: Duration::from_secs(60),
            circuit_breaker_threshold: 5,
            circuit_breaker_reset: DEFAULT_RESET_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }
}

/// Snapshot of request counters.
#[derive(Debug, Clone, Serialize)]
pub struct ResilienceMetrics {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub rate_limited_requests: u64,
    pub rejected_requests: u64,
}

/// Health snapshot: circuit state plus rate-limit headroom.
#[derive(Debug, Clone, Serialize)]
pub struct ResilienceHealth {
    pub healthy: bool,
    pub circuit_state: CircuitState,
    pub rate_limit_remaining: usize,
}

#[derive(Default)]
struct Counters {
    total: AtomicU64,
    successful: AtomicU64,
    failed: AtomicU64,
    rate_limited: AtomicU64,
    rejected: AtomicU64,
}

pub struct ResilienceManager {
    enabled: bool,
    limiter: RateLimiter,
    breaker: CircuitBreaker,
    counters: Counters,
}

impl ResilienceManager {
    pub fn new(config: ResilienceConfig) -> Self {
        Self {
            enabled: config.enabled,
            limiter: RateLimiter::new(config.rate_limit_requests, config.rate_limit_window),
            breaker: CircuitBreaker::with_reset_timeout(
                config.circuit_breaker_threshold,
                config.circuit_breaker_reset,
            ),
            counters: Counters::default(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Gate a request: counts it, then rejects when the breaker is open or
    /// the rate limit is exhausted.
    pub fn before_request(&self) -> Result<(), DripError> {
        if !self.enabled {
            return Ok(());
        }
        self.counters.total.fetch_add(1, Ordering::Relaxed);
        if !self.breaker.allow_request() {
            self.counters.rejected.fetch_add(1, Ordering::Relaxed);
            return Err(DripError::CircuitOpen);
        }
        if !self.limiter.try_acquire() {
            self.counters.rate_limited.fetch_add(1, Ordering::Relaxed);
            return Err(DripError::RateLimited);
        }
        Ok(())
    }

    pub fn after_request(&self, success: bool) {
        if !self.enabled {
            return;
        }
        if success {
            self.counters.successful.fetch_add(1, Ordering::Relaxed);
            self.breaker.record_success();
        } else {
            self.counters.failed.fetch_add(1, Ordering::Relaxed);
            self.breaker.record_failure();
        }
    }

    pub fn metrics(&self) -> ResilienceMetrics {
        ResilienceMetrics {
            total_requests: self.counters.total.load(Ordering::Relaxed),
            successful_requests: self.counters.successful.load(Ordering::Relaxed),
            failed_requests: self.counters.failed.load(Ordering::Relaxed),
            rate_limited_requests: self.counters.rate_limited.load(Ordering::Relaxed),
            rejected_requests: self.counters.rejected.load(Ordering::Relaxed),
        }
    }

    pub fn health(&self) -> ResilienceHealth {
        let circuit_state = self.breaker.state();
        ResilienceHealth {
            healthy: circuit_state != CircuitState::Open,
            circuit_state,
            rate_limit_remaining: self.limiter.remaining(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limiter_allows_within_limit() {
        let limiter = RateLimiter::new(10, Duration::from_secs(1));
        for _ in 0..10 {
            assert!(limiter.try_acquire());
        }
        assert!(!limiter.try_acquire());
    }

    #[test]
    fn rate_limiter_resets_after_window() {
        let limiter = RateLimiter::new(2, Duration::from_millis(50));
        assert!(limiter.try_acquire());
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());
        std::thread::sleep(Duration::from_millis(75));
        assert!(limiter.try_acquire());
    }

    #[test]
    fn rate_limiter_tracks_remaining() {
        let limiter = RateLimiter::new(5, Duration::from_secs(1));
        assert_eq!(limiter.remaining(), 5);
        limiter.try_acquire();
        assert_eq!(limiter.remaining(), 4);
        limiter.try_acquire();
        limiter.try_acquire();
        assert_eq!(limiter.remaining(), 2);
    }

    #[test]
    fn rate_limiter_reports_wait_time_when_exhausted() {
        let limiter = RateLimiter::new(1, Duration::from_millis(500));
        assert!(limiter.wait_time().is_none());
        limiter.try_acquire();
        let wait = limiter.wait_time().expect("limit exhausted");
        assert!(wait <= Duration::from_millis(500));
    }

    #[test]
    fn rate_limiter_exact_under_concurrency() {
        use std::sync::Arc;
        let limiter = Arc::new(RateLimiter::new(10, Duration::from_secs(1)));
        let handles: Vec<_> = (0..15)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                std::thread::spawn(move || limiter.try_acquire())
            })
            .collect();
        let granted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(granted, 10);
    }

    #[test]
    fn breaker_starts_closed() {
        let cb = CircuitBreaker::new(3);
        assert_eq!(cb.state(), CircuitState::Closed);
        assert!(cb.allow_request());
    }

    #[test]
    fn breaker_opens_on_threshold_failures() {
        let cb = CircuitBreaker::new(3);
        for _ in 0..3 {
            cb.record_failure();
        }
        assert_eq!(cb.state(), CircuitState::Open);
        assert!(!cb.allow_request());
    }

    #[test]
    fn breaker_half_open_after_timeout_then_closes_on_success() {
        let cb = CircuitBreaker::with_reset_timeout(2, Duration::from_millis(50));
        cb.record_failure();
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Open);
        std::thread::sleep(Duration::from_millis(75));
        assert!(cb.allow_request());
        assert_eq!(cb.state(), CircuitState::HalfOpen);
        cb.record_success();
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[test]
    fn breaker_reopens_on_half_open_failure() {
        let cb = CircuitBreaker::with_reset_timeout(2, Duration::from_millis(50));
        cb.record_failure();
        cb.record_failure();
        std::thread::sleep(Duration::from_millis(75));
        cb.allow_request();
        assert_eq!(cb.state(), CircuitState::HalfOpen);
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Open);
    }

    #[test]
    fn breaker_counts_consecutive_failures_only() {
        let cb = CircuitBreaker::new(3);
        cb.record_failure();
        cb.record_failure();
        assert_eq!(cb.failure_count(), 2);
        cb.record_success();
        assert_eq!(cb.failure_count(), 0);
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[test]
    fn retry_delay_doubles_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(500),
        };
        assert_eq!(policy.delay_for(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for(2), Duration::from_millis(400));
        assert_eq!(policy.delay_for(3), Duration::from_millis(500));
        assert_eq!(policy.delay_for(10), Duration::from_millis(500));
    }

    #[test]
    fn manager_tracks_metrics() {
        let manager = ResilienceManager::new(ResilienceConfig::default());
        assert!(manager.is_enabled());
        manager.before_request().unwrap();
        manager.after_request(true);
        manager.before_request().unwrap();
        manager.after_request(false);

        let metrics = manager.metrics();
        assert_eq!(metrics.total_requests, 2);
        assert_eq!(metrics.successful_requests, 1);
        assert_eq!(metrics.failed_requests, 1);
    }

    #[test]
    fn manager_opens_breaker_and_reports_unhealthy() {
        let manager = ResilienceManager::new(ResilienceConfig {
            circuit_breaker_threshold: 3,
            ..ResilienceConfig::default()
        });
        for _ in 0..3 {
            manager.before_request().unwrap();
            manager.after_request(false);
        }
        let health = manager.health();
        assert!(!health.healthy);
        assert_eq!(health.circuit_state, CircuitState::Open);
        assert!(matches!(
            manager.before_request(),
            Err(DripError::CircuitOpen)
        ));
    }

    #[test]
    fn manager_rate_limits() {
        let manager = ResilienceManager::new(ResilienceConfig {
            rate_limit_requests: 2,
            ..ResilienceConfig::default()
        });
        manager.before_request().unwrap();
        manager.before_request().unwrap();
        assert!(matches!(
            manager.before_request(),
            Err(DripError::RateLimited)
        ));
        assert_eq!(manager.metrics().rate_limited_requests, 1);
    }

    #[test]
    fn disabled_manager_is_a_no_op() {
        let manager = ResilienceManager::new(ResilienceConfig {
            enabled: false,
            rate_limit_requests: 0,
            ..ResilienceConfig::default()
        });
        assert!(!manager.is_enabled());
        manager.before_request().unwrap();
        manager.after_request(false);
        assert_eq!(manager.metrics().total_requests, 0);
    }
}
