//! Shutdown coordination for the proxy.

use std::time::Duration;

use axum_server::Handle;
use tokio::sync::broadcast;

/// Coordinator for graceful shutdown.
///
/// Provides a broadcast channel that all long-running tasks can subscribe to.
#[derive(Debug)]
pub struct Shutdown {
    /// Broadcast channel sender.
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Trigger the shutdown signal.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Gracefully stop the server behind `handle` once shutdown is triggered.
    ///
    /// New connections are refused immediately; in-flight requests get
    /// `grace` to finish before their connections are dropped.
    pub fn drain_on_trigger(&self, handle: Handle, grace: Duration) -> tokio::task::JoinHandle<()> {
        let mut rx = self.subscribe();
        tokio::spawn(async move {
            // A dropped coordinator also means shutdown.
            let _ = rx.recv().await;
            tracing::info!(grace_secs = grace.as_secs(), "Draining in-flight requests");
            handle.graceful_shutdown(Some(grace));
        })
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
