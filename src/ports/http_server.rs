use async_trait::async_trait;

/// HttpServer defines the port (interface) of a running server instance.
///
/// A started server exposes only its effective port and a stop operation;
/// there is no way back to a running state once stopped. Backends other than
/// the built-in tokio/hyper engine can plug in by implementing this trait.
#[async_trait]
pub trait HttpServer: Send + Sync {
    /// The effective listening port.
    ///
    /// Returns the configured port when it was non-zero, otherwise the
    /// ephemeral port assigned at bind time.
    fn port(&self) -> u16;

    /// Stop the server, honoring the configured stop policy.
    ///
    /// Never fails: a graceful wait that cannot complete within its timeout
    /// degrades to forced closure.
    async fn stop(&self);
}
