//! Background Expiry Sweeper
//!
//! Lazy expiry only reclaims a key when something touches it. A key that
//! expires and is never read again would otherwise sit in memory forever, so
//! this module runs an optional Tokio task that periodically purges expired
//! entries ("active expiry").
//!
//! ## Design
//!
//! The sweeper:
//! 1. Sleeps for the current interval
//! 2. Calls [`StorageEngine::cleanup_expired`], which locks one shard at a time
//! 3. Adapts the interval to how many keys it found expired
//!
//! Because each shard is swept under the same write lock commands use, the
//! sweeper can never remove an entry out from under an in-flight command.

use crate::storage::StorageEngine;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, trace};

/// Configuration for the expiry sweeper.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpiryConfig {
    /// Starting interval between sweeps (default: 100ms)
    pub base_interval: Duration,

    /// Fastest the sweeper will run (default: 10ms)
    pub min_interval: Duration,

    /// Slowest the sweeper will run (default: 1s)
    pub max_interval: Duration,

    /// Halve the interval when more than this fraction of keys expired
    pub speedup_threshold: f64,

    /// Double the interval when less than this fraction of keys expired
    pub slowdown_threshold: f64,
}

impl Default for ExpiryConfig {
    fn default() -> Self {
        Self {
            base_interval: Duration::from_millis(100),
            min_interval: Duration::from_millis(10),
            max_interval: Duration::from_secs(1),
            speedup_threshold: 0.25,
            slowdown_threshold: 0.01,
        }
    }
}

impl ExpiryConfig {
    /// Computes the next sweep interval from the last sweep's results.
    fn next_interval(&self, current: Duration, scanned: u64, expired: u64) -> Duration {
        if scanned == 0 {
            return (current * 2).min(self.max_interval);
        }

        let rate = expired as f64 / scanned as f64;
        if rate > self.speedup_threshold {
            (current / 2).max(self.min_interval)
        } else if rate < self.slowdown_threshold && expired == 0 {
            (current * 2).min(self.max_interval)
        } else {
            current
        }
    }
}

/// A handle to the running expiry sweeper.
///
/// When this handle is dropped, the sweeper task stops.
#[derive(Debug)]
pub struct ExpirySweeper {
    shutdown_tx: watch::Sender<bool>,
}

impl ExpirySweeper {
    /// Spawns the sweeper onto the current Tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn start(engine: Arc<StorageEngine>, config: ExpiryConfig) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        info!(
            base_interval_ms = config.base_interval.as_millis() as u64,
            "Background expiry sweeper started"
        );
        tokio::spawn(sweeper_loop(engine, config, shutdown_rx));

        Self { shutdown_tx }
    }

    /// Stops the sweeper. Called automatically on drop.
    ///
    /// Returns `true` only for the call that actually stopped it.
    pub fn stop(&self) -> bool {
        let stopped = self
            .shutdown_tx
            .send_if_modified(|stopped| !std::mem::replace(stopped, true));
        if stopped {
            info!("Background expiry sweeper stopped");
        }
        stopped
    }

    /// Whether [`stop`](Self::stop) has been called.
    pub fn is_stopped(&self) -> bool {
        *self.shutdown_tx.borrow()
    }
}

impl Drop for ExpirySweeper {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn sweeper_loop(
    engine: Arc<StorageEngine>,
    config: ExpiryConfig,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut interval = config.base_interval;

    loop {
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            result = shutdown_rx.changed() => {
                if result.is_err() || *shutdown_rx.borrow() {
                    debug!("Expiry sweeper received shutdown signal");
                    return;
                }
            }
        }

        let scanned = engine.len();
        let expired = engine.cleanup_expired();
        let next = config.next_interval(interval, scanned, expired);

        if next < interval {
            debug!(
                expired,
                new_interval_ms = next.as_millis() as u64,
                "High expiry rate, speeding up sweeper"
            );
        } else if next > interval {
            trace!(
                new_interval_ms = next.as_millis() as u64,
                "Low expiry rate, slowing down sweeper"
            );
        }
        interval = next;

        if expired > 0 {
            debug!(expired, keys_remaining = engine.len(), "Expired keys cleaned up");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Value;
    use bytes::Bytes;
    use std::time::Instant;

    fn set_with_ttl(engine: &StorageEngine, key: &str, ttl: Duration) {
        engine.set(
            &Bytes::from(key.to_string()),
            Value::string("value"),
            Some(Instant::now() + ttl),
        );
    }

    #[tokio::test]
    async fn test_sweeper_cleans_expired_keys() {
        let engine = Arc::new(StorageEngine::new());

        for i in 0..10 {
            set_with_ttl(&engine, &format!("key{}", i), Duration::from_millis(50));
        }
        engine.set(&Bytes::from("persistent"), Value::string("value"), None);
        assert_eq!(engine.len(), 11);

        let config = ExpiryConfig {
            base_interval: Duration::from_millis(10),
            ..Default::default()
        };
        let _sweeper = ExpirySweeper::start(Arc::clone(&engine), config);

        tokio::time::sleep(Duration::from_millis(200)).await;

        // Nothing touched the keys, so only the sweeper could have removed them
        assert_eq!(engine.len(), 1);
        assert!(engine.exists(b"persistent"));
    }

    #[tokio::test]
    async fn test_sweeper_stops_on_drop() {
        let engine = Arc::new(StorageEngine::new());
        let config = ExpiryConfig {
            base_interval: Duration::from_millis(10),
            ..Default::default()
        };

        {
            let _sweeper = ExpirySweeper::start(Arc::clone(&engine), config);
            tokio::time::sleep(Duration::from_millis(30)).await;
        }

        set_with_ttl(&engine, "key", Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(100)).await;

        // Still physically present, but lazy expiry hides it
        assert_eq!(engine.len(), 1);
        assert!(!engine.exists(b"key"));
        assert_eq!(engine.len(), 0);
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let engine = Arc::new(StorageEngine::new());
        let sweeper = ExpirySweeper::start(engine, ExpiryConfig::default());

        assert!(!sweeper.is_stopped());
        assert!(sweeper.stop());
        assert!(sweeper.is_stopped());
        assert!(!sweeper.stop());
    }

    #[test]
    fn test_next_interval_adapts() {
        let config = ExpiryConfig::default();
        let base = config.base_interval;

        assert_eq!(config.next_interval(base, 100, 50), base / 2);
        assert_eq!(config.next_interval(base, 100, 0), base * 2);
        assert_eq!(config.next_interval(base, 100, 5), base);
        assert_eq!(config.next_interval(base, 0, 0), base * 2);

        assert_eq!(
            config.next_interval(config.min_interval, 10, 10),
            config.min_interval
        );
        assert_eq!(
            config.next_interval(config.max_interval, 10, 0),
            config.max_interval
        );
    }
}
