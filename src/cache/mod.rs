// Offline cache subsystem.
// Durable write-through caching with pending-sync replay on reconnect.

pub mod gates;
pub mod offline;

pub use gates::{SyncGate, SyncGates};
pub use offline::{CacheState, OfflineCache, OfflineCacheBuilder, SyncFn, SyncFuture};
