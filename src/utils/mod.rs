pub mod connection_tracker;
pub mod shutdown;

pub use connection_tracker::{ConnectionGuard, ConnectionTracker};
pub use shutdown::{ShutdownSignal, wait_for_interrupt};
