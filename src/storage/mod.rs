// Durable key-value storage capability.
// The cache persists through this trait so tests can substitute fakes.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::error::Result;

/// Durable key-value store, synchronous by contract.
///
/// Any operation may fail (storage unavailable, capacity exceeded); callers
/// are expected to handle errors rather than assume infallibility.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove the entry under `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}
