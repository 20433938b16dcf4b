//! Bounded polling with exponential backoff
//!
//! Cloud deletions are submitted, not performed: the API returns before the
//! resource is gone. [`wait_until`] wraps the "submit, then poll until
//! absent or give up" pattern shared by the node terminator and anything
//! else that has to observe an asynchronous deletion finish.

use std::time::Duration;
use tokio::time::sleep;

/// Backoff schedule for one polling loop
#[derive(Debug, Clone)]
pub struct WaitConfig {
    /// Maximum number of probe attempts
    pub max_retries: u32,

    /// Delay before the second attempt
    pub initial_delay_ms: u64,

    /// Upper bound for any single delay
    pub max_delay_ms: u64,

    /// Backoff multiplier
    pub multiplier: f64,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            max_retries: 20,
            initial_delay_ms: 1000,
            max_delay_ms: 15000,
            multiplier: 2.0,
        }
    }
}

impl WaitConfig {
    /// Delay to sleep after the given zero-based attempt
    pub fn delay_for_attempt(&self, attempt: u32) -> u64 {
        let delay = self.initial_delay_ms as f64 * self.multiplier.powi(attempt as i32);
        (delay as u64).min(self.max_delay_ms)
    }

    /// Total time the loop can spend sleeping before it gives up
    pub fn worst_case(&self) -> Duration {
        let total: u64 = (0..self.max_retries.saturating_sub(1))
            .map(|a| self.delay_for_attempt(a))
            .sum();
        Duration::from_millis(total)
    }
}

/// Terminal outcome of a polling loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The probe reported the condition satisfied
    Satisfied,
    /// All attempts were used up; the caller logs this as a warning
    GaveUp,
}

/// Poll `probe` until it returns `true` or the attempts run out.
///
/// The probe owns its own error handling: a probe that cannot tell (API
/// error, resource still listed) returns `false` and the loop keeps going.
/// Giving up is an expected terminal outcome, not an error, so callers can
/// degrade it to a warning.
pub async fn wait_until<F, Fut>(config: &WaitConfig, mut probe: F) -> WaitOutcome
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for attempt in 0..config.max_retries {
        if probe().await {
            return WaitOutcome::Satisfied;
        }

        if attempt + 1 < config.max_retries {
            let delay_ms = config.delay_for_attempt(attempt);
            tracing::debug!(attempt, delay_ms, "condition not met, waiting");
            sleep(Duration::from_millis(delay_ms)).await;
        }
    }

    WaitOutcome::GaveUp
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_delay_calculation() {
        let config = WaitConfig {
            max_retries: 5,
            initial_delay_ms: 1000,
            max_delay_ms: 10000,
            multiplier: 2.0,
        };

        assert_eq!(config.delay_for_attempt(0), 1000);
        assert_eq!(config.delay_for_attempt(1), 2000);
        assert_eq!(config.delay_for_attempt(2), 4000);
        assert_eq!(config.delay_for_attempt(3), 8000);
        assert_eq!(config.delay_for_attempt(4), 10000); // capped at max
    }

    #[test]
    fn test_worst_case_sums_capped_delays() {
        let config = WaitConfig {
            max_retries: 3,
            initial_delay_ms: 1000,
            max_delay_ms: 1500,
            multiplier: 2.0,
        };
        // attempts 0 and 1 sleep: 1000 + 1500
        assert_eq!(config.worst_case(), Duration::from_millis(2500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_satisfied_on_later_attempt() {
        let config = WaitConfig {
            max_retries: 5,
            initial_delay_ms: 10,
            max_delay_ms: 50,
            multiplier: 2.0,
        };
        let calls = AtomicU32::new(0);

        let outcome = wait_until(&config, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move { n >= 2 }
        })
        .await;

        assert_eq!(outcome, WaitOutcome::Satisfied);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_retries() {
        let config = WaitConfig {
            max_retries: 4,
            initial_delay_ms: 10,
            max_delay_ms: 50,
            multiplier: 2.0,
        };
        let calls = AtomicU32::new(0);

        let outcome = wait_until(&config, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { false }
        })
        .await;

        assert_eq!(outcome, WaitOutcome::GaveUp);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }
}
