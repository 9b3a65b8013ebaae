//! Drain signal for the HTTP server.
//!
//! [`serve`](crate::lifecycle::startup::serve) owns one [`Shutdown`]. The
//! server task holds its only receiver and starts axum's graceful drain when
//! the signal lands.

use tokio::sync::broadcast;

/// One-shot drain signal fanned out over a broadcast channel.
///
/// Capacity is one: a receiver only ever needs to see a single `()`.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// A receiver that resolves once [`trigger`](Shutdown::trigger) is called.
    /// Receivers created after the trigger never see it.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Tell every receiver to stop and return how many were listening.
    ///
    /// Zero means the server task had already exited.
    pub fn trigger(&self) -> usize {
        self.tx.send(()).unwrap_or(0)
    }

    /// Receivers not yet dropped. Falls to zero once the server task returns.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
