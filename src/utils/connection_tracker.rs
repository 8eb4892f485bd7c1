//! Live connection accounting.
//!
//! Each accepted TCP connection registers with the tracker and holds a guard
//! for its lifetime; the guard releases the slot on drop, so the count stays
//! correct even when a connection task is aborted mid-flight.
use std::{
    net::SocketAddr,
    sync::{
        Arc,
        atomic::{AtomicU64, AtomicUsize, Ordering},
    },
};

/// Gauges over the server's accepted connections.
#[derive(Debug, Default)]
pub struct ConnectionTracker {
    active: AtomicUsize,
    total_accepted: AtomicU64,
}

impl ConnectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a newly accepted connection
    pub fn register(self: &Arc<Self>, remote_addr: SocketAddr) -> ConnectionGuard {
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.total_accepted.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(peer_addr = %remote_addr, active, "Connection accepted");
        ConnectionGuard {
            tracker: Arc::clone(self),
            remote_addr,
        }
    }

    /// Number of connections currently open
    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Number of connections accepted since startup
    pub fn total_accepted(&self) -> u64 {
        self.total_accepted.load(Ordering::Relaxed)
    }
}

/// Releases the connection slot when the serving task finishes or is aborted.
#[derive(Debug)]
pub struct ConnectionGuard {
    tracker: Arc<ConnectionTracker>,
    remote_addr: SocketAddr,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        let active = self.tracker.active.fetch_sub(1, Ordering::SeqCst) - 1;
        tracing::debug!(peer_addr = %self.remote_addr, active, "Connection closed");
    }
}
