//! Network availability signal.
//!
//! The listener never opens or reopens the live channel while the gate
//! reports offline. Noticing that the network came back, and restarting
//! the listener, is the caller's job.

use std::sync::Arc;

use tokio::sync::watch;

pub trait ConnectivityGate: Send + Sync {
    fn is_online(&self) -> bool;
}

/// A gate that is always open.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysOnline;

impl ConnectivityGate for AlwaysOnline {
    fn is_online(&self) -> bool {
        true
    }
}

/// Shared, settable network status.
///
/// Clones share the same flag. [`subscribe`](NetworkStatus::subscribe)
/// hands out a receiver for callers who want to react to transitions.
#[derive(Debug, Clone)]
pub struct NetworkStatus {
    tx: Arc<watch::Sender<bool>>,
}

impl NetworkStatus {
    pub fn new(online: bool) -> Self {
        let (tx, _) = watch::channel(online);
        Self { tx: Arc::new(tx) }
    }

    pub fn set_online(&self, online: bool) {
        let changed = self.tx.send_if_modified(|current| {
            let changed = *current != online;
            *current = online;
            changed
        });
        if changed {
            tracing::info!(online, "Network status changed");
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

impl Default for NetworkStatus {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ConnectivityGate for NetworkStatus {
    fn is_online(&self) -> bool {
        *self.tx.borrow()
    }
}
