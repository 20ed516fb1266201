//! Injected request latency.
//!
//! A debug hook for exercising caller timeouts: every read-path handler
//! sleeps for the current value before touching the store. Values are
//! milliseconds; zero or negative means no delay.

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use crate::error::CatalogError;

/// Process-wide latency setting, shared by reference through `AppState`.
///
/// Reads and writes are atomic. Requests that already read the value are not
/// affected by a later `set`.
#[derive(Debug, Default)]
pub struct LatencyControl {
    millis: AtomicI64,
}

/// Result of a successful update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatencyChange {
    pub old_ms: i64,
    pub new_ms: i64,
}

impl fmt::Display for LatencyChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{old-latency-ms: {}, new-latency-ms: {}}}",
            self.old_ms, self.new_ms
        )
    }
}

impl LatencyControl {
    pub fn new(initial_ms: i64) -> Self {
        Self {
            millis: AtomicI64::new(initial_ms),
        }
    }

    /// Current delay in milliseconds.
    pub fn get(&self) -> i64 {
        self.millis.load(Ordering::SeqCst)
    }

    /// Replace the delay, returning the previous value.
    pub fn set(&self, new_ms: i64) -> i64 {
        let old = self.millis.swap(new_ms, Ordering::SeqCst);
        metrics::gauge!("catalog_latency_injected_ms").set(new_ms as f64);
        old
    }

    /// Parse a base-10 integer from a request parameter and store it.
    ///
    /// Leaves the stored value untouched when `raw` does not parse.
    pub fn set_from_param(&self, raw: &str) -> Result<LatencyChange, CatalogError> {
        let new_ms: i64 = raw.parse().map_err(|_| CatalogError::InvalidLatency)?;
        let old_ms = self.set(new_ms);
        Ok(LatencyChange { old_ms, new_ms })
    }

    /// Delay a read-path request should sleep for right now.
    pub fn current_delay(&self) -> Duration {
        Duration::from_millis(self.get().max(0) as u64)
    }

    /// Sleep for the current delay.
    pub async fn delay(&self) {
        let delay = self.current_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_set_returns_previous() {
        let latency = LatencyControl::default();
        assert_eq!(latency.get(), 0);
        assert_eq!(latency.set(250), 0);
        assert_eq!(latency.set(10), 250);
        assert_eq!(latency.get(), 10);
    }

    #[test]
    fn test_set_from_param() {
        let latency = LatencyControl::new(5);
        let change = latency.set_from_param("100").unwrap();
        assert_eq!(change, LatencyChange { old_ms: 5, new_ms: 100 });
        assert_eq!(change.to_string(), "{old-latency-ms: 5, new-latency-ms: 100}");
        assert_eq!(latency.set_from_param("+7").unwrap().new_ms, 7);
        assert_eq!(latency.set_from_param("-3").unwrap().new_ms, -3);
    }

    #[test]
    fn test_bad_param_leaves_value() {
        let latency = LatencyControl::new(42);
        for bad in ["", "abc", "1.5", " 10", "10ms", "99999999999999999999"] {
            assert_eq!(latency.set_from_param(bad), Err(CatalogError::InvalidLatency));
            assert_eq!(latency.get(), 42);
        }
    }

    #[test]
    fn test_negative_means_no_delay() {
        let latency = LatencyControl::new(-50);
        assert_eq!(latency.current_delay(), Duration::ZERO);
        latency.set(30);
        assert_eq!(latency.current_delay(), Duration::from_millis(30));
    }

    #[test]
    fn test_concurrent_sets_leave_one_value() {
        let latency = Arc::new(LatencyControl::default());
        let values: Vec<i64> = (1..=16).map(|i| i * 1_000_003).collect();
        let handles: Vec<_> = values
            .iter()
            .map(|&v| {
                let latency = latency.clone();
                std::thread::spawn(move || {
                    for _ in 0..1_000 {
                        latency.set(v);
                        let seen = latency.get();
                        assert!(seen % 1_000_003 == 0 && seen > 0);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert!(values.contains(&latency.get()));
    }

    #[tokio::test]
    async fn test_delay_sleeps_for_current_value() {
        let latency = LatencyControl::new(40);
        let start = tokio::time::Instant::now();
        latency.delay().await;
        assert!(start.elapsed() >= Duration::from_millis(40));
    }
}
