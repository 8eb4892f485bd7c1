//! Synapse - an embeddable HTTP server core.
//!
//! Synapse wraps a hyper-based transport engine behind a **neutral
//! request/response model** and a small lifecycle contract, following a
//! **hexagonal architecture**. You supply a [`Handler`] (`Request ->
//! Response`); the transport adapter translates the engine's native objects
//! into the neutral model and back, and the lifecycle controller owns the
//! bound engine instance from `start` to `stop`.
//!
//! # Features
//! - Neutral, engine-independent `Request` / `Response` value types with
//!   ordered, case-insensitively addressable headers and streaming bodies
//! - Catch-all handler registration over HTTP/1.1 and HTTP/2
//! - Connection provenance (client host, port, scheme) on every request
//! - A fault boundary: handler errors and panics become fixed error
//!   responses, never engine-visible failures
//! - Graceful or immediate stop, with a bounded drain of in-flight work
//! - Ephemeral-port binding with effective-port introspection
//! - Structured tracing via `tracing`
//!
//! # Quick Example
//! ```no_run
//! use std::sync::Arc;
//!
//! use synapse::{Handler, HandlerError, Request, Response, ServerConfig};
//!
//! # #[tokio::main] async fn main() -> eyre::Result<()> {
//! let handler = Arc::new(|req: Request| async move {
//!     Ok::<_, HandlerError>(Response::ok().with_body(format!("hello from {}", req.target())))
//! });
//!
//! let server = synapse::start(ServerConfig::ephemeral(), handler).await?;
//! println!("listening on port {}", server.port());
//! server.stop().await;
//! # Ok(()) }
//! ```
//!
//! # Architecture
//! The crate separates **ports** (traits) from **adapters**
//! (implementations) while keeping the neutral data model inside `core`.
//! End users should prefer the re-exports documented below instead of
//! reaching into internal modules directly.
//!
//! # Error Handling
//! All fallible APIs return a domain specific error type (`ServerError`,
//! `HandlerError`, `ValidationError`); `stop` never fails. Wire-level
//! concerns such as HTTP parsing, TLS, and connection pooling belong to the
//! underlying engine and are out of scope here.
pub mod config;
pub mod ports;
pub mod tracing_setup;
pub mod utils;

// These modules are implementation details and should not be directly used by users
pub mod adapters;
pub mod core;

// Re-export the specific types needed by embedders and the binary crate
pub use crate::{
    adapters::{HttpBridge, RunningServer, ServerError, start},
    config::{ServerConfig, StopMode},
    core::{Body, Headers, Method, Request, RequestSource, Response, Scheme},
    ports::{Handler, HandlerError, HttpServer},
};
