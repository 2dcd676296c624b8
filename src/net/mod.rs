// Host connectivity signal.
// Carries "is the network reachable" plus edge-triggered change events.

use std::sync::Arc;

use tokio::sync::watch;

/// Cloneable handle to the connectivity state. One signal can serve any
/// number of caches; tests flip it with `set_online`.
#[derive(Clone)]
pub struct Connectivity {
    state: Arc<watch::Sender<bool>>,
}

impl Connectivity {
    pub fn new(online: bool) -> Self {
        let (tx, _rx) = watch::channel(online);
        Self { state: Arc::new(tx) }
    }

    /// Current reachability.
    pub fn is_online(&self) -> bool {
        *self.state.borrow()
    }

    /// Record a connectivity change. Subscribers see an edge event even if
    /// the value is unchanged.
    pub fn set_online(&self, online: bool) {
        self.state.send_replace(online);
    }

    /// Subscribe to connectivity changes.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.state.subscribe()
    }
}

impl Default for Connectivity {
    fn default() -> Self {
        Self::new(true)
    }
}
