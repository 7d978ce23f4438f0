//! Circuit breaker for outbound calls.
//!
//! # State Machine
//!
//! ```text
//! CLOSED → OPEN (failure rate >= threshold over the sliding window)
//! OPEN → HALF_OPEN (wait duration elapsed)
//! HALF_OPEN → CLOSED (test calls succeed)
//! HALF_OPEN → OPEN (a test call fails)
//! ```

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CircuitState {
    /// Calls flow normally.
    Closed,
    /// Calls are rejected without being attempted.
    Open,
    /// A limited number of test calls are let through.
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "CLOSED"),
            Self::Open => write!(f, "OPEN"),
            Self::HalfOpen => write!(f, "HALF_OPEN"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Failure rate (0.0-1.0) at which the circuit opens.
    pub failure_rate_threshold: f64,
    /// Number of most recent calls considered.
    pub sliding_window_size: usize,
    /// Calls required in the window before the rate is evaluated.
    pub minimum_calls: usize,
    /// How long the circuit stays open before testing again.
    pub wait_duration_in_open: Duration,
    /// Successful test calls required to close again.
    pub permitted_calls_in_half_open: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_rate_threshold: 0.5,
            sliding_window_size: 20,
            minimum_calls: 5,
            wait_duration_in_open: Duration::from_secs(30),
            permitted_calls_in_half_open: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Success,
    Failure,
}

#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    state: RwLock<CircuitState>,
    window: RwLock<VecDeque<Outcome>>,
    opened_at: RwLock<Option<Instant>>,
    half_open_calls: AtomicU32,
    half_open_successes: AtomicU32,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            state: RwLock::new(CircuitState::Closed),
            window: RwLock::new(VecDeque::new()),
            opened_at: RwLock::new(None),
            half_open_calls: AtomicU32::new(0),
            half_open_successes: AtomicU32::new(0),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> CircuitState {
        self.check_open_elapsed();
        *self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_call_permitted(&self) -> bool {
        match self.state() {
            CircuitState::Closed => true,
            CircuitState::Open => false,
            CircuitState::HalfOpen => {
                self.half_open_calls.fetch_add(1, Ordering::Relaxed)
                    < self.config.permitted_calls_in_half_open
            }
        }
    }

    pub fn record_success(&self) {
        self.record(Outcome::Success);
    }

    pub fn record_failure(&self) {
        self.record(Outcome::Failure);
    }

    fn record(&self, outcome: Outcome) {
        let state = *self.state.read().unwrap_or_else(PoisonError::into_inner);
        match state {
            CircuitState::Closed => {
                let mut window = self.window.write().unwrap_or_else(PoisonError::into_inner);
                window.push_back(outcome);
                while window.len() > self.config.sliding_window_size {
                    window.pop_front();
                }
                if window.len() < self.config.minimum_calls {
                    return;
                }
                let failures = window.iter().filter(|o| **o == Outcome::Failure).count();
                let rate = failures as f64 / window.len() as f64;
                drop(window);
                if rate >= self.config.failure_rate_threshold {
                    self.transition_to_open();
                }
            }
            CircuitState::HalfOpen => {
                if outcome == Outcome::Failure {
                    self.transition_to_open();
                    return;
                }
                let successes = self.half_open_successes.fetch_add(1, Ordering::Relaxed) + 1;
                if successes >= self.config.permitted_calls_in_half_open {
                    self.transition_to_closed();
                }
            }
            CircuitState::Open => {
                tracing::warn!(name = %self.name, "call recorded while circuit is open");
            }
        }
    }

    /// Moves OPEN to HALF_OPEN once the wait has elapsed. A HALF_OPEN circuit
    /// whose test calls never reported back is re-armed after the same wait.
    fn check_open_elapsed(&self) {
        let state = *self.state.read().unwrap_or_else(PoisonError::into_inner);
        let Some(since) = *self.opened_at.read().unwrap_or_else(PoisonError::into_inner) else {
            return;
        };
        if since.elapsed() < self.config.wait_duration_in_open {
            return;
        }
        match state {
            CircuitState::Open => self.transition_to_half_open(),
            CircuitState::HalfOpen
                if self.half_open_calls.load(Ordering::Relaxed)
                    >= self.config.permitted_calls_in_half_open =>
            {
                tracing::warn!(name = %self.name, "half-open test call abandoned, re-admitting");
                self.rearm_half_open();
            }
            _ => {}
        }
    }

    fn transition_to_open(&self) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let previous = *state;
        if previous == CircuitState::Open {
            return;
        }
        *state = CircuitState::Open;
        drop(state);

        *self.opened_at.write().unwrap_or_else(PoisonError::into_inner) = Some(Instant::now());

        metrics::counter!("circuit_breaker_opened_total", "name" => self.name.clone())
            .increment(1);
        tracing::warn!(
            name = %self.name,
            from = %previous,
            break_for = ?self.config.wait_duration_in_open,
            "circuit breaker opened"
        );
    }

    fn transition_to_half_open(&self) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if *state != CircuitState::Open {
            return;
        }
        *state = CircuitState::HalfOpen;
        drop(state);

        self.rearm_half_open();
        tracing::info!(name = %self.name, "circuit breaker half-open, testing");
    }

    fn rearm_half_open(&self) {
        self.half_open_calls.store(0, Ordering::Relaxed);
        self.half_open_successes.store(0, Ordering::Relaxed);
        *self.opened_at.write().unwrap_or_else(PoisonError::into_inner) = Some(Instant::now());
    }

    fn transition_to_closed(&self) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if *state == CircuitState::Closed {
            return;
        }
        *state = CircuitState::Closed;
        drop(state);

        self.window
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        *self.opened_at.write().unwrap_or_else(PoisonError::into_inner) = None;
        tracing::info!(name = %self.name, "circuit breaker closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breaker(wait: Duration) -> CircuitBreaker {
        CircuitBreaker::new(
            "test",
            CircuitBreakerConfig {
                wait_duration_in_open: wait,
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_stays_closed_below_minimum_calls() {
        let cb = breaker(Duration::from_secs(30));
        for _ in 0..4 {
            cb.record_failure();
        }
        assert_eq!(cb.state(), CircuitState::Closed);
        assert!(cb.is_call_permitted());
    }

    #[test]
    fn test_opens_at_failure_threshold() {
        let cb = breaker(Duration::from_secs(30));
        for _ in 0..3 {
            cb.record_success();
        }
        for _ in 0..3 {
            cb.record_failure();
        }
        assert_eq!(cb.state(), CircuitState::Open);
        assert!(!cb.is_call_permitted());
    }

    #[test]
    fn test_mostly_successful_calls_keep_it_closed() {
        let cb = breaker(Duration::from_secs(30));
        for i in 0..20 {
            if i % 4 == 0 {
                cb.record_failure();
            } else {
                cb.record_success();
            }
        }
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[test]
    fn test_half_open_success_closes() {
        let cb = breaker(Duration::from_millis(10));
        for _ in 0..5 {
            cb.record_failure();
        }
        assert_eq!(cb.state(), CircuitState::Open);

        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(cb.state(), CircuitState::HalfOpen);
        assert!(cb.is_call_permitted());
        assert!(!cb.is_call_permitted());

        cb.record_success();
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[test]
    fn test_half_open_failure_reopens() {
        let cb = breaker(Duration::from_millis(10));
        for _ in 0..5 {
            cb.record_failure();
        }
        std::thread::sleep(Duration::from_millis(30));
        assert!(cb.is_call_permitted());

        cb.record_failure();
        assert_eq!(
            *cb.state.read().unwrap_or_else(PoisonError::into_inner),
            CircuitState::Open
        );
    }

    #[test]
    fn test_abandoned_test_call_is_readmitted() {
        let cb = breaker(Duration::from_millis(20));
        for _ in 0..5 {
            cb.record_failure();
        }
        std::thread::sleep(Duration::from_millis(30));
        // Admitted but never reports an outcome.
        assert!(cb.is_call_permitted());
        assert!(!cb.is_call_permitted());

        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(cb.state(), CircuitState::HalfOpen);
        assert!(cb.is_call_permitted());

        cb.record_success();
        assert_eq!(cb.state(), CircuitState::Closed);
    }
}
