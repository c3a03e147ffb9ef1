//! Atomic counters for the envelope bus.
//!
//! Each bus owns its own [`BusMetrics`]. Counters are incremented silently at
//! the call site; call [`BusMetrics::flush`] to emit current values as a
//! single `tracing::info!` event (e.g. on a daemon tick or at shutdown).

use std::sync::atomic::{AtomicU64, Ordering};

/// Lightweight atomic counters, no allocations, no locking.
#[derive(Debug)]
pub struct BusMetrics {
    published: AtomicU64,
    delivered: AtomicU64,
    delivery_failures: AtomicU64,
    dead_lettered: AtomicU64,
}

impl Default for BusMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl BusMetrics {
    pub const fn new() -> Self {
        Self {
            published: AtomicU64::new(0),
            delivered: AtomicU64::new(0),
            delivery_failures: AtomicU64::new(0),
            dead_lettered: AtomicU64::new(0),
        }
    }

    pub fn inc_published(&self) {
        self.published.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "published", "counter incremented");
    }

    pub fn inc_delivered(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "delivered", "counter incremented");
    }

    pub fn inc_delivery_failures(&self) {
        self.delivery_failures.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "delivery_failures", "counter incremented");
    }

    pub fn inc_dead_lettered(&self) {
        self.dead_lettered.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "dead_lettered", "counter incremented");
    }

    /// Emit all current counter values as a single `info!` event.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            published = self.published(),
            delivered = self.delivered(),
            delivery_failures = self.delivery_failures(),
            dead_lettered = self.dead_lettered(),
        );
    }

    /// Publishes that serialized successfully.
    pub fn published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }

    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    pub fn delivery_failures(&self) -> u64 {
        self.delivery_failures.load(Ordering::Relaxed)
    }

    pub fn dead_lettered(&self) -> u64 {
        self.dead_lettered.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        self.published.store(0, Ordering::Relaxed);
        self.delivered.store(0, Ordering::Relaxed);
        self.delivery_failures.store(0, Ordering::Relaxed);
        self.dead_lettered.store(0, Ordering::Relaxed);
    }
}
