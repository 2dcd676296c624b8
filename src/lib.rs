//! Offline-first data layer for a point-of-sale admin app.
//!
//! The core piece is [`OfflineCache`]: a keyed, durable, auto-syncing cache
//! of one JSON-serializable collection. Views fetch authoritative data from
//! the mock [`services`], push it into the cache, and render from its
//! observable flags; writes made offline are persisted locally and replayed
//! through the caller's sync callback once connectivity returns.
//!
//! Storage and connectivity are injected capabilities ([`KeyValueStore`],
//! [`Connectivity`]) so tests control both deterministically.

pub mod cache;
pub mod error;
pub mod net;
pub mod services;
pub mod storage;

pub use cache::{CacheState, OfflineCache, SyncGates};
pub use error::{PosError, Result};
pub use net::Connectivity;
pub use storage::{FileStore, KeyValueStore, MemoryStore};
