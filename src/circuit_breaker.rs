//! # Circuit Breaker Module
//!
//! Stops hammering a recipe backend that keeps failing. After a run of
//! transient lookup failures the breaker opens and lookups fail fast until the
//! reset window has passed.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::config::RecoveryConfig;

/// Circuit breaker for ingredient lookups
///
/// # State Machine
///
/// - **Closed**: Normal operation, lookups pass through
/// - **Open**: Failure threshold reached, lookups fail fast
/// - **Half-Open**: Reset window elapsed, the next lookup decides
///
/// # Configuration
///
/// Uses `RecoveryConfig` for:
/// - `circuit_breaker_threshold`: Failures before opening (default: 5)
/// - `circuit_breaker_reset_secs`: Time before attempting reset (default: 60s)
#[derive(Debug)]
pub struct CircuitBreaker {
    state: Mutex<BreakerState>,
    threshold: u32,
    reset_after: Duration,
}

#[derive(Debug, Default)]
struct BreakerState {
    failure_count: u32,
    last_failure_time: Option<Instant>,
}

impl CircuitBreaker {
    /// Create a new circuit breaker with the given configuration
    ///
    /// ```rust
    /// use msosihub::config::RecoveryConfig;
    /// use msosihub::circuit_breaker::CircuitBreaker;
    ///
    /// let breaker = CircuitBreaker::new(&RecoveryConfig::default());
    /// assert!(!breaker.is_open());
    /// ```
    pub fn new(config: &RecoveryConfig) -> Self {
        Self::with_settings(
            config.circuit_breaker_threshold,
            Duration::from_secs(config.circuit_breaker_reset_secs),
        )
    }

    pub fn with_settings(threshold: u32, reset_after: Duration) -> Self {
        Self {
            state: Mutex::new(BreakerState::default()),
            threshold: threshold.max(1),
            reset_after,
        }
    }

    fn state(&self) -> MutexGuard<'_, BreakerState> {
        // The state is two plain counters; a poisoned lock still holds usable data
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Check if the circuit is open (blocking lookups)
    ///
    /// Resets to closed once the reset window has elapsed.
    pub fn is_open(&self) -> bool {
        let mut state = self.state();
        if state.failure_count < self.threshold {
            return false;
        }
        match state.last_failure_time {
            Some(last_time) if last_time.elapsed() < self.reset_after => true,
            _ => {
                *state = BreakerState::default();
                false
            }
        }
    }

    /// Record a failed lookup
    pub fn record_failure(&self) {
        let mut state = self.state();
        state.failure_count += 1;
        state.last_failure_time = Some(Instant::now());
    }

    /// Record a successful lookup, closing the circuit
    pub fn record_success(&self) {
        *self.state() = BreakerState::default();
    }

    pub fn failure_count(&self) -> u32 {
        self.state().failure_count
    }
}
