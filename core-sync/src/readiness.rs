//! Readiness gate holding public operations back until initialization.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;

/// One-way gate that holds callers back until initialization has finished.
///
/// `wait` costs a single atomic load once the gate is open.
#[derive(Debug)]
pub struct ReadinessGate {
    open: AtomicBool,
    tx: watch::Sender<bool>,
}

impl ReadinessGate {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self {
            open: AtomicBool::new(false),
            tx,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    /// Suspend until [`open`](Self::open) has been called.
    pub async fn wait(&self) {
        if self.is_open() {
            return;
        }
        let mut rx = self.tx.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = rx.wait_for(|open| *open).await;
    }

    /// Release every current and future waiter. Idempotent.
    pub fn open(&self) {
        self.open.store(true, Ordering::Release);
        self.tx.send_replace(true);
    }
}

impl Default for ReadinessGate {
    fn default() -> Self {
        Self::new()
    }
}
