pub mod engine;
pub mod http_bridge;

/// Re-export commonly used types from adapters
pub use engine::{RunningServer, ServerError, start};
pub use http_bridge::{Fault, HttpBridge};
