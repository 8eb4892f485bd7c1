//! Tokio/hyper transport engine binding and server lifecycle.
//!
//! `start` binds a tuned listening socket, registers the [`HttpBridge`] as
//! the catch-all route for every path, and spawns the accept loop. The
//! returned [`RunningServer`] exclusively owns the engine instance for its
//! whole lifetime: Created -> Running -> Stopped, with no way back. Accept
//! and connection tasks never touch lifecycle state; all transitions funnel
//! through `stop`.

use std::{io, net::SocketAddr, sync::Arc};

use async_trait::async_trait;
use axum::{Router, extract::ConnectInfo, routing::any};
use hyper::body::Incoming;
use hyper_util::{
    rt::{TokioExecutor, TokioIo},
    server::conn::auto,
};
use thiserror::Error;
use tokio::{
    net::{TcpListener, TcpSocket},
    sync::{Mutex as TokioMutex, broadcast, watch},
    task::{JoinHandle, JoinSet},
    time::timeout,
};
use tower::{Service, ServiceExt};

use crate::{
    adapters::http_bridge::HttpBridge,
    config::{ServerConfig, StopMode},
    ports::{Handler, HttpServer},
    utils::{ConnectionTracker, ShutdownSignal},
};

/// Accept backlog handed to the engine at bind time
const BACKLOG: u32 = 1024;

/// Errors surfaced by `start`. Bind failures are fatal: the caller decides
/// recovery, there is no retry built in.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ServerError {
    #[error("Invalid bind address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("Socket setup failed: {0}")]
    Socket(#[source] io::Error),
}

/// Bind the configured address and start serving `handler` on every path.
///
/// The socket is tuned the same way for every backend: TCP no-delay,
/// keep-alive, address reuse, and a fixed accept backlog. Returns once the
/// listener is live; requests are served from spawned tasks after that.
pub async fn start(
    config: ServerConfig,
    handler: Arc<dyn Handler>,
) -> Result<RunningServer, ServerError> {
    let addr = config
        .socket_addr()
        .map_err(|e| ServerError::InvalidAddress {
            address: config.bind_addr.clone().unwrap_or_else(|| "0.0.0.0".into()),
            reason: e.to_string(),
        })?;

    let socket = if addr.is_ipv4() {
        TcpSocket::new_v4()
    } else {
        TcpSocket::new_v6()
    }
    .map_err(ServerError::Socket)?;
    socket.set_reuseaddr(true).map_err(ServerError::Socket)?;
    socket.set_keepalive(true).map_err(ServerError::Socket)?;
    socket.set_nodelay(true).map_err(ServerError::Socket)?;
    socket
        .bind(addr)
        .map_err(|source| ServerError::Bind { addr, source })?;
    let listener = socket
        .listen(BACKLOG)
        .map_err(|source| ServerError::Bind { addr, source })?;
    let local_addr = listener.local_addr().map_err(ServerError::Socket)?;

    let bridge = Arc::new(HttpBridge::new(handler));
    let make_request_route = |bridge: Arc<HttpBridge>| {
        any(
            move |ConnectInfo(peer): ConnectInfo<SocketAddr>, req: axum::extract::Request| {
                let bridge = bridge.clone();
                async move { bridge.serve(req, peer).await }
            },
        )
    };
    let app = Router::new()
        .route("/{*path}", make_request_route(bridge.clone()))
        .route("/", make_request_route(bridge));

    let shutdown = ShutdownSignal::new();
    let tracker = Arc::new(ConnectionTracker::new());
    // Subscribe here, not inside the spawned task: a stop() racing the
    // accept loop's first poll must not broadcast before anyone listens.
    let shutdown_rx = shutdown.subscribe();
    let accept_task = tokio::spawn(accept_loop(
        listener,
        app,
        shutdown.clone(),
        shutdown_rx,
        config.stop_mode.clone(),
        tracker.clone(),
    ));

    tracing::info!(addr = %local_addr, "Server started");

    let (stopped, _) = watch::channel(false);
    Ok(RunningServer {
        local_addr,
        configured_port: config.port,
        advertised_host: config.advertised_host,
        stop_mode: config.stop_mode,
        shutdown,
        tracker,
        accept_task: TokioMutex::new(Some(accept_task)),
        stopped,
    })
}

/// A bound, running engine instance.
///
/// Created by [`start`]; destroyed by [`RunningServer::stop`]. Not
/// restartable after `stop`.
pub struct RunningServer {
    local_addr: SocketAddr,
    configured_port: u16,
    advertised_host: Option<String>,
    stop_mode: StopMode,
    shutdown: ShutdownSignal,
    tracker: Arc<ConnectionTracker>,
    accept_task: TokioMutex<Option<JoinHandle<()>>>,
    stopped: watch::Sender<bool>,
}

impl RunningServer {
    /// The effective listening port: the configured port when non-zero,
    /// otherwise the ephemeral port assigned at bind time.
    pub fn port(&self) -> u16 {
        if self.configured_port != 0 {
            self.configured_port
        } else {
            self.local_addr.port()
        }
    }

    /// Address the listener is actually bound to
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Number of currently open connections
    pub fn active_connections(&self) -> usize {
        self.tracker.active()
    }

    /// Base URI clients should use, preferring the advertised hostname
    pub fn base_uri(&self) -> String {
        let host = self
            .advertised_host
            .clone()
            .unwrap_or_else(|| self.local_addr.ip().to_string());
        format!("http://{}:{}", host, self.port())
    }

    /// Stop the server according to the configured stop policy.
    ///
    /// Immediate: terminate the accept loop and every active connection
    /// without waiting. Graceful: stop accepting, wait up to the configured
    /// timeout for in-flight connections to finish, then force closure
    /// regardless. Never fails, and is safe to call concurrently; only the
    /// first caller drives the shutdown sequence, but every caller returns
    /// only once the server has actually stopped.
    pub async fn stop(&self) {
        if !self.shutdown.trigger() {
            // Another caller is driving the shutdown; wait for it to finish.
            let _ = self.stopped.subscribe().wait_for(|stopped| *stopped).await;
            return;
        }

        tracing::info!(mode = ?self.stop_mode, "Server stopping");
        let handle = self.accept_task.lock().await.take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                if !e.is_cancelled() {
                    tracing::error!(error = %e, "Accept loop terminated abnormally");
                }
            }
        }
        let _ = self.stopped.send(true);
        tracing::info!("Server stopped");
    }
}

#[async_trait]
impl HttpServer for RunningServer {
    fn port(&self) -> u16 {
        RunningServer::port(self)
    }

    async fn stop(&self) {
        RunningServer::stop(self).await;
    }
}

/// Accept connections until the shutdown signal fires, then drain or force
/// per the stop policy. Serving each connection manually (instead of a
/// framework serve call) keeps every connection task owned here, so forced
/// closure can actually abort them.
async fn accept_loop(
    listener: TcpListener,
    app: Router,
    shutdown: ShutdownSignal,
    mut shutdown_rx: broadcast::Receiver<()>,
    stop_mode: StopMode,
    tracker: Arc<ConnectionTracker>,
) {
    let mut make_service = app.into_make_service_with_connect_info::<SocketAddr>();
    let mut connections: JoinSet<()> = JoinSet::new();

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, peer)) => {
                        if let Err(e) = stream.set_nodelay(true) {
                            tracing::debug!(error = %e, "Failed to set TCP_NODELAY on accepted socket");
                        }
                        let service = match make_service.call(peer).await {
                            Ok(service) => service,
                            Err(infallible) => match infallible {},
                        };
                        let guard = tracker.register(peer);
                        let conn_shutdown = shutdown.clone();
                        connections.spawn(async move {
                            let _guard = guard;
                            serve_connection(stream, service, conn_shutdown).await;
                        });
                    }
                    Err(e) => {
                        tracing::debug!(error = %e, "Accept error");
                    }
                }
            }
            _ = shutdown_rx.recv() => break,
            Some(finished) = connections.join_next(), if !connections.is_empty() => {
                log_connection_result(finished);
            }
        }
    }

    // No new connections from here on
    drop(listener);

    match stop_mode {
        StopMode::Immediate => {
            tracing::info!(
                connections = connections.len(),
                "Forcing immediate close of active connections"
            );
            connections.abort_all();
            drain(&mut connections).await;
        }
        StopMode::Graceful { timeout: grace } => {
            tracing::info!(
                connections = connections.len(),
                grace = ?grace,
                "Draining in-flight connections"
            );
            if timeout(grace, drain(&mut connections)).await.is_err() {
                tracing::warn!(
                    remaining = connections.len(),
                    "Grace period elapsed; forcing close"
                );
                connections.abort_all();
                drain(&mut connections).await;
            }
        }
    }
}

/// Serve one accepted connection through the hyper auto (HTTP/1 + HTTP/2)
/// builder. On shutdown the connection is asked to finish its in-flight
/// requests and stop; forced closure is the accept loop aborting this task.
async fn serve_connection<S>(stream: tokio::net::TcpStream, service: S, shutdown: ShutdownSignal)
where
    S: Service<
            hyper::Request<Incoming>,
            Response = hyper::Response<axum::body::Body>,
            Error = std::convert::Infallible,
        > + Clone
        + Send
        + 'static,
    S::Future: Send,
{
    let io = TokioIo::new(stream);
    let hyper_service = hyper::service::service_fn(move |request: hyper::Request<Incoming>| {
        service.clone().oneshot(request)
    });

    let builder = auto::Builder::new(TokioExecutor::new());
    let conn = builder.serve_connection_with_upgrades(io, hyper_service);
    let mut conn = std::pin::pin!(conn);

    let mut shutdown_rx = shutdown.subscribe();
    // The broadcast may have fired between accept and subscribe
    let mut draining = shutdown.is_triggered();
    if draining {
        conn.as_mut().graceful_shutdown();
    }

    loop {
        if draining {
            if let Err(e) = conn.as_mut().await {
                tracing::debug!(error = %e, "Connection ended with error");
            }
            break;
        }
        tokio::select! {
            result = conn.as_mut() => {
                if let Err(e) = result {
                    tracing::debug!(error = %e, "Connection ended with error");
                }
                break;
            }
            _ = shutdown_rx.recv() => {
                draining = true;
                conn.as_mut().graceful_shutdown();
            }
        }
    }
}

async fn drain(connections: &mut JoinSet<()>) {
    while let Some(finished) = connections.join_next().await {
        log_connection_result(finished);
    }
}

fn log_connection_result(result: Result<(), tokio::task::JoinError>) {
    if let Err(e) = result {
        if !e.is_cancelled() {
            tracing::warn!(error = %e, "Connection task failed");
        }
    }
}
