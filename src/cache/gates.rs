// Per-key sync gates.
// Cache instances sharing a key share one in-flight guard so syncs never overlap.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Guard enforcing at most one sync callback in flight per key.
#[derive(Clone, Default)]
pub struct SyncGate {
    busy: Arc<AtomicBool>,
}

impl SyncGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a sync as in flight. Returns `None` if one already is.
    pub fn try_acquire(&self) -> Option<SyncPermit> {
        self.busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| SyncPermit {
                busy: Arc::clone(&self.busy),
            })
    }

    /// Whether a sync is currently in flight.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }
}

/// Releases the gate when dropped, including on panic or early return.
pub struct SyncPermit {
    busy: Arc<AtomicBool>,
}

impl Drop for SyncPermit {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::SeqCst);
    }
}

/// In-process registry handing out one shared gate per cache key.
///
/// Multiple cache instances built over the same durable entry should take
/// their gate from a common registry; independent gates would let their
/// syncs race.
#[derive(Default)]
pub struct SyncGates {
    gates: Mutex<HashMap<String, SyncGate>>,
}

impl SyncGates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gate for `key`, created on first use.
    pub fn gate(&self, key: &str) -> SyncGate {
        self.gates
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key.to_string())
            .or_default()
            .clone()
    }
}
