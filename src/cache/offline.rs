// Offline-first cache for one keyed collection.
// Write-through durable persistence, offline flagging, and sync replay on reconnect.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::error::Result;
use crate::net::Connectivity;
use crate::storage::KeyValueStore;

use super::gates::{SyncGate, SyncGates};

/// Future returned by a sync callback.
pub type SyncFuture = Pin<Box<dyn Future<Output = Result<()>> + Send>>;

/// Caller-supplied reconciliation callback.
///
/// Must be safe to invoke repeatedly with the same or a newer value; the
/// cache re-invokes it after a failed attempt.
pub type SyncFn<T> = Arc<dyn Fn(T) -> SyncFuture + Send + Sync>;

/// Observable snapshot of cache state, the flags a view renders as
/// "Offline Mode" / "Syncing..." badges.
#[derive(Debug, Clone)]
pub struct CacheState<T> {
    pub data: Option<T>,
    pub loading: bool,
    pub is_online: bool,
    pub is_syncing: bool,
    pub pending_sync: bool,
}

struct Inner<T> {
    data: Option<T>,
    loading: bool,
    pending_sync: bool,
    loaded: bool,
}

/// Durable, auto-syncing cache of a JSON-serializable value.
///
/// The value is persisted write-through under `key`; a companion durable
/// entry `{key}_needs_sync` holds `"true"` while the latest write has not
/// been confirmed by the sync callback. Writes made offline are replayed
/// when the host reports connectivity restored.
///
/// No operation surfaces an error to the caller. Storage and sync failures
/// are logged and observable only through `pending_sync` / `is_syncing`.
pub struct OfflineCache<T> {
    key: String,
    needs_sync_key: String,
    sync_fn: Option<SyncFn<T>>,
    store: Arc<dyn KeyValueStore>,
    connectivity: Connectivity,
    gate: SyncGate,
    inner: Mutex<Inner<T>>,
}

/// Builder for [`OfflineCache`].
pub struct OfflineCacheBuilder<T> {
    key: String,
    initial_data: Option<T>,
    sync_fn: Option<SyncFn<T>>,
    gate: Option<SyncGate>,
}

impl<T> OfflineCacheBuilder<T>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// Seed value used until a persisted entry is loaded over it.
    pub fn initial_data(mut self, value: T) -> Self {
        self.initial_data = Some(value);
        self
    }

    /// Callback reconciling the local value with the authoritative source.
    pub fn sync_with<F, Fut>(mut self, sync_fn: F) -> Self
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.sync_fn = Some(Arc::new(move |value| {
            let fut: SyncFuture = Box::pin(sync_fn(value));
            fut
        }));
        self
    }

    /// Take the in-flight-sync gate from a shared registry, so independent
    /// instances over the same key cannot start overlapping syncs.
    pub fn shared_gates(mut self, gates: &SyncGates) -> Self {
        self.gate = Some(gates.gate(&self.key));
        self
    }

    pub fn build(self, store: Arc<dyn KeyValueStore>, connectivity: Connectivity) -> OfflineCache<T> {
        let needs_sync_key = format!("{}_needs_sync", self.key);
        OfflineCache {
            key: self.key,
            needs_sync_key,
            sync_fn: self.sync_fn,
            store,
            connectivity,
            gate: self.gate.unwrap_or_default(),
            inner: Mutex::new(Inner {
                data: self.initial_data,
                loading: true,
                pending_sync: false,
                loaded: false,
            }),
        }
    }
}

impl<T> OfflineCache<T>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    pub fn builder(key: impl Into<String>) -> OfflineCacheBuilder<T> {
        OfflineCacheBuilder {
            key: key.into(),
            initial_data: None,
            sync_fn: None,
            gate: None,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// One-time durable read. A persisted value overrides the seed; a read
    /// or parse failure is logged and leaves the seed in place. Subsequent
    /// calls are no-ops.
    pub fn load(&self) {
        let mut inner = self.lock();
        if inner.loaded {
            return;
        }
        inner.loaded = true;

        match self.store.get(&self.key) {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => inner.data = Some(value),
                Err(err) => warn!(key = %self.key, %err, "ignoring unreadable cached value"),
            },
            Ok(None) => {}
            Err(err) => warn!(key = %self.key, %err, "durable storage read failed"),
        }

        inner.loading = false;
    }

    /// Replace the current value, persist it, and attempt to reconcile.
    ///
    /// The in-memory value changes before the first await and is never
    /// rolled back; persistence and sync failures are logged and tracked
    /// through `pending_sync`. Offline writes are flagged for replay and
    /// make no sync attempt.
    pub async fn update(&self, new_value: T) {
        self.lock().data = Some(new_value.clone());

        match serde_json::to_string(&new_value) {
            Ok(raw) => {
                if let Err(err) = self.store.set(&self.key, &raw) {
                    warn!(key = %self.key, %err, "durable write failed, keeping in-memory value");
                }
            }
            Err(err) => {
                warn!(key = %self.key, %err, "value not serializable, keeping in-memory value");
            }
        }

        if !self.connectivity.is_online() {
            self.mark_needs_sync();
            return;
        }

        let Some(sync_fn) = &self.sync_fn else {
            return;
        };

        // Another sync for this key is in flight: park the write as pending
        // rather than start an overlapping attempt.
        let Some(permit) = self.gate.try_acquire() else {
            self.mark_needs_sync();
            return;
        };

        let outcome = sync_fn(new_value).await;
        drop(permit);

        match outcome {
            Ok(()) => self.clear_needs_sync(),
            Err(err) => {
                warn!(key = %self.key, %err, "sync failed, write parked for retry");
                self.mark_needs_sync();
            }
        }
    }

    /// React to the host's offline-to-online transition: re-arm
    /// `pending_sync` from the durable flag, then replay the current value
    /// if anything is outstanding.
    pub async fn network_restored(&self) {
        if self.sync_fn.is_some() {
            match self.store.get(&self.needs_sync_key) {
                Ok(Some(flag)) if flag == "true" => self.lock().pending_sync = true,
                Ok(_) => {}
                Err(err) => warn!(key = %self.key, %err, "could not read needs-sync flag"),
            }
        }
        self.sync_pending().await;
    }

    /// Re-run the pending-sync reaction, for callers that want to retry a
    /// failed replay without waiting for the next connectivity event.
    pub async fn retry_pending(&self) {
        self.sync_pending().await;
    }

    /// Spawn a task that calls [`network_restored`](Self::network_restored)
    /// on every offline-to-online edge of the connectivity signal. The task
    /// ends when the signal is dropped.
    pub fn spawn_reconnect_task(self: &Arc<Self>) -> JoinHandle<()> {
        let cache = Arc::clone(self);
        let mut rx = cache.connectivity.subscribe();
        tokio::spawn(async move {
            let mut was_online = *rx.borrow();
            while rx.changed().await.is_ok() {
                let online = *rx.borrow();
                if online && !was_online {
                    cache.network_restored().await;
                }
                was_online = online;
            }
        })
    }

    /// Clone of the current value, `None` before a seed or load.
    pub fn data(&self) -> Option<T> {
        self.lock().data.clone()
    }

    /// True until the initial durable read has run.
    pub fn loading(&self) -> bool {
        self.lock().loading
    }

    pub fn is_online(&self) -> bool {
        self.connectivity.is_online()
    }

    /// True while a sync callback for this key is in flight.
    pub fn is_syncing(&self) -> bool {
        self.gate.is_busy()
    }

    /// True when a durable write has not yet been confirmed by sync.
    pub fn pending_sync(&self) -> bool {
        self.lock().pending_sync
    }

    /// Full observable snapshot.
    pub fn state(&self) -> CacheState<T> {
        let inner = self.lock();
        CacheState {
            data: inner.data.clone(),
            loading: inner.loading,
            is_online: self.connectivity.is_online(),
            is_syncing: self.gate.is_busy(),
            pending_sync: inner.pending_sync,
        }
    }

    /// Invoke the sync callback with the current value if {online, pending,
    /// callback configured, value present} all hold and no sync is already
    /// in flight. Success clears the durable flag; failure leaves
    /// `pending_sync` armed for the next connectivity event or retry.
    async fn sync_pending(&self) {
        let Some(sync_fn) = &self.sync_fn else {
            return;
        };
        if !self.connectivity.is_online() {
            return;
        }

        let value = {
            let inner = self.lock();
            if !inner.pending_sync {
                return;
            }
            match &inner.data {
                Some(value) => value.clone(),
                None => return,
            }
        };

        let Some(permit) = self.gate.try_acquire() else {
            return;
        };

        let outcome = sync_fn(value).await;
        drop(permit);

        match outcome {
            Ok(()) => self.clear_needs_sync(),
            Err(err) => {
                warn!(key = %self.key, %err, "pending sync failed, will retry on next reconnect");
            }
        }
    }

    fn mark_needs_sync(&self) {
        if let Err(err) = self.store.set(&self.needs_sync_key, "true") {
            warn!(key = %self.key, %err, "could not persist needs-sync flag");
        }
        self.lock().pending_sync = true;
    }

    fn clear_needs_sync(&self) {
        if let Err(err) = self.store.remove(&self.needs_sync_key) {
            warn!(key = %self.key, %err, "could not clear needs-sync flag");
        }
        self.lock().pending_sync = false;
    }

    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
