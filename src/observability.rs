//! Observability hooks for store operations.
//!
//! Implement [`StoreMetrics`] to feed reads, commits, conflicts and aborts into
//! your monitoring system:
//!
//! ```ignore
//! use order_kit::observability::StoreMetrics;
//! use std::time::Duration;
//!
//! struct PrometheusMetrics;
//!
//! impl StoreMetrics for PrometheusMetrics {
//!     fn record_commit(&self, name: &str, attempts: u32, duration: Duration) {
//!         // counter!("tx_commits", "name" => name).inc();
//!         // histogram!("tx_latency").record(duration);
//!     }
//!     // ... implement other methods
//! }
//!
//! // let store = DocumentStore::new(backend)
//! //     .with_metrics(Box::new(PrometheusMetrics));
//! ```
//!
//! Methods left unimplemented fall back to logging via the `log` crate.
//! [`NoOpMetrics`] discards everything and is the store's default.
//!
//! | Hook | Fired when |
//! |------|------------|
//! | `record_read` | a point read outside a transaction completes |
//! | `record_commit` | a transaction commits |
//! | `record_conflict` | a commit is rejected and the unit of work will re-run |
//! | `record_abort` | a unit of work returns `Err` or retries are exhausted |
//! | `record_error` | a point operation fails |

use std::time::Duration;

/// Trait for store metrics collection.
pub trait StoreMetrics: Send + Sync {
    /// Record a point read.
    fn record_read(&self, key: &str, found: bool, duration: Duration) {
        debug!(
            "Store READ: {} ({}) took {:?}",
            key,
            if found { "hit" } else { "miss" },
            duration
        );
    }

    /// Record a committed transaction.
    fn record_commit(&self, name: &str, attempts: u32, duration: Duration) {
        debug!(
            "Store COMMIT: {} after {} attempt(s) took {:?}",
            name, attempts, duration
        );
    }

    /// Record a commit conflict that triggers a retry.
    fn record_conflict(&self, name: &str, attempt: u32) {
        debug!("Store CONFLICT: {} on attempt {}", name, attempt);
    }

    /// Record an aborted transaction.
    fn record_abort(&self, name: &str, error: &str) {
        debug!("Store ABORT: {}: {}", name, error);
    }

    /// Record an error.
    fn record_error(&self, key: &str, error: &str) {
        warn!("Store ERROR for {}: {}", key, error);
    }
}

/// Default metrics implementation (no-op).
#[derive(Clone, Default)]
pub struct NoOpMetrics;

impl StoreMetrics for NoOpMetrics {
    fn record_read(&self, _key: &str, _found: bool, _duration: Duration) {}
    fn record_commit(&self, _name: &str, _attempts: u32, _duration: Duration) {}
    fn record_conflict(&self, _name: &str, _attempt: u32) {}
    fn record_abort(&self, _name: &str, _error: &str) {}
    fn record_error(&self, _key: &str, _error: &str) {}
}
