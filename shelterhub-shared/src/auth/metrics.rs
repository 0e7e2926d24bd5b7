/// Authorization gate counters
///
/// Process-wide atomic counters describing gate outcomes. They are shared
/// by all requests (the only shared mutable state besides the store) and
/// exposed through the health endpoint.
///
/// `reverse_lookup_failures` counts storage errors hit while resolving a
/// shelter id from a record id. Those errors never fail the request (the
/// shelter id just stays unresolved), so this counter is how operators see
/// them.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters
#[derive(Debug, Default)]
pub struct GateMetrics {
    allowed: AtomicU64,
    denied: AtomicU64,
    rejected: AtomicU64,
    reverse_lookup_failures: AtomicU64,
}

/// Point-in-time copy of [`GateMetrics`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GateMetricsSnapshot {
    /// Requests that passed the gate
    pub allowed: u64,

    /// Requests denied for lack of a capability (403)
    pub denied: u64,

    /// Requests rejected before evaluation (401/400)
    pub rejected: u64,

    /// Storage errors swallowed during reverse shelter lookup
    pub reverse_lookup_failures: u64,
}

impl GateMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_allowed(&self) {
        self.allowed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_denied(&self) {
        self.denied.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reverse_lookup_failure(&self) {
        self.reverse_lookup_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> GateMetricsSnapshot {
        GateMetricsSnapshot {
            allowed: self.allowed.load(Ordering::Relaxed),
            denied: self.denied.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            reverse_lookup_failures: self.reverse_lookup_failures.load(Ordering::Relaxed),
        }
    }
}
