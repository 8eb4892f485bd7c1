use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use tokio::{signal, sync::broadcast};

/// One-shot shutdown broadcast shared between the lifecycle controller, the
/// accept loop, and every connection task.
///
/// Triggering is a compare-and-swap: only the first caller wins, so at most
/// one logical shutdown sequence runs even under concurrent `stop` calls.
#[derive(Clone)]
pub struct ShutdownSignal {
    tx: broadcast::Sender<()>,
    initiated: Arc<AtomicBool>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(16);
        Self {
            tx,
            initiated: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Get a receiver for the shutdown broadcast
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Check if shutdown has been initiated
    pub fn is_triggered(&self) -> bool {
        self.initiated.load(Ordering::SeqCst)
    }

    /// Initiate shutdown. Returns true for the caller that actually
    /// triggered it; later callers get false and must not drive the
    /// shutdown sequence again.
    pub fn trigger(&self) -> bool {
        if self
            .initiated
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            // Receivers may already be gone; that is fine
            let _ = self.tx.send(());
            true
        } else {
            tracing::debug!("Shutdown already initiated, ignoring trigger");
            false
        }
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Wait for SIGINT (Ctrl+C) or, on Unix, SIGTERM.
///
/// Used by callers that run a server until the process is told to exit.
pub async fn wait_for_interrupt() {
    tokio::select! {
        _ = signal::ctrl_c() => {
            tracing::info!("Received SIGINT (Ctrl+C)");
        }
        _ = wait_for_sigterm() => {
            tracing::info!("Received SIGTERM");
        }
    }
}

#[cfg(unix)]
async fn wait_for_sigterm() {
    use tokio::signal::unix::{SignalKind, signal};
    let mut sigterm = signal(SignalKind::terminate()).expect("Failed to register SIGTERM handler");
    sigterm.recv().await;
}

#[cfg(not(unix))]
async fn wait_for_sigterm() {
    // On non-Unix systems, we only have Ctrl+C
    std::future::pending::<()>().await;
}
