//! HTTP server implementation.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::signal;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use log::{debug, error, info, warn};

use crate::parser::{HttpRequest, Method};
use crate::server::config::ServerConfig;
use crate::server::connection::read_request;
use crate::server::error::Error;
use crate::server::registry::{ConnectionGuard, ConnectionId, ConnectionRegistry};
use crate::server::response::{HttpResponse, StatusCode};
use crate::server::router::Router;

/// An HTTP server.
///
/// Routes are registered up front; [`serve`](Self::serve) then consumes the
/// server, so the route table is never touched again while connections are
/// being handled.
pub struct HttpServer {
    /// The server configuration.
    pub config: ServerConfig,
    /// The routes.
    pub router: Router,
    registry: Arc<ConnectionRegistry>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ServerConfig) -> Self {
        Self::with_router(config, Router::new())
    }

    /// Create a server around an already populated router.
    pub fn with_router(config: ServerConfig, router: Router) -> Self {
        Self {
            config,
            router,
            registry: ConnectionRegistry::new(),
        }
    }

    /// Add a route to the server.
    pub fn route<F, Fut>(&mut self, method: Method, template: &str, handler: F) -> &mut Self
    where
        F: Fn(HttpRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<HttpResponse, Error>> + Send + 'static,
    {
        self.router.register(method, template, handler);
        self
    }

    /// The set of open connections, shared with the accept loop.
    ///
    /// Calling [`ConnectionRegistry::shutdown_all`] on it closes every open
    /// connection from outside the server.
    pub fn registry(&self) -> Arc<ConnectionRegistry> {
        Arc::clone(&self.registry)
    }

    /// Log the registered endpoints.
    fn display_server_info(&self) {
        info!("Registered endpoints:");
        for (method, route) in self.router.routes() {
            info!("  {method} {template}", template = route.template);
        }
    }

    /// Set up the TCP listener.
    async fn setup_listener(&self) -> Result<TcpListener, Error> {
        let listener = TcpListener::bind(&self.config.addr).await?;
        info!("Server listening on http://{addr}", addr = self.config.addr);
        Ok(listener)
    }

    /// Bind to the configured address and serve until Ctrl+C or SIGTERM.
    pub async fn start(self) -> Result<(), Error> {
        let listener = self.setup_listener().await?;
        self.serve(listener, shutdown_signal()).await
    }

    /// Accept connections on `listener` until `shutdown` resolves.
    ///
    /// On shutdown every open connection is closed; tasks get
    /// `shutdown_timeout` to unwind before this returns.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<(), Error>
    where
        F: Future<Output = ()>,
    {
        self.display_server_info();

        let HttpServer { config, router, registry } = self;
        let config = Arc::new(config);
        let router = Arc::new(router);

        // Create a semaphore to limit concurrent connections
        let semaphore = Arc::new(Semaphore::new(config.max_connections));

        // One task per connection; the set also surfaces panics.
        let mut tasks = JoinSet::new();

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                () = &mut shutdown => {
                    info!("Shutting down server...");
                    break;
                }

                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    Self::reap(joined);
                }

                accept_result = listener.accept() => {
                    match accept_result {
                        Ok((socket, addr)) => {
                            Self::handle_new_connection(
                                socket,
                                addr,
                                &semaphore,
                                &router,
                                &registry,
                                &config,
                                &mut tasks,
                            );
                        }
                        Err(e) => {
                            if Self::handle_accept_error(e).await {
                                break;
                            }
                        }
                    }
                }
            }
        }

        let closed = registry.shutdown_all();
        info!("Closed {closed} active connections");
        Self::perform_shutdown(&mut tasks, config.shutdown_timeout).await;

        Ok(())
    }

    /// Register an accepted connection and spawn its task.
    fn handle_new_connection(
        socket: TcpStream,
        addr: SocketAddr,
        semaphore: &Arc<Semaphore>,
        router: &Arc<Router>,
        registry: &Arc<ConnectionRegistry>,
        config: &Arc<ServerConfig>,
        tasks: &mut JoinSet<()>,
    ) {
        let permit = match Arc::clone(semaphore).try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                // Dropping the socket closes it.
                warn!("Connection limit reached, closing connection from {addr}");
                return;
            }
        };

        let id = registry.next_id();
        let guard = registry.register(id);
        info!("Received connection {id} from {addr}");

        let router = Arc::clone(router);
        let config = Arc::clone(config);

        tasks.spawn(async move {
            // The permit is dropped when the task completes, releasing the semaphore slot
            let _permit = permit;
            Self::serve_connection(socket, guard, &router, &config).await;
        });
    }

    /// Log a finished connection task. Panics stop at the task boundary.
    fn reap(joined: Result<(), JoinError>) {
        if let Err(e) = joined {
            if e.is_panic() {
                error!("Connection task panicked: {e}");
            } else {
                debug!("Connection task cancelled: {e}");
            }
        }
    }

    /// Handle accept errors. Returns true when the loop should stop.
    async fn handle_accept_error(e: std::io::Error) -> bool {
        error!("Error accepting connection: {e}");

        if e.kind() == std::io::ErrorKind::BrokenPipe {
            error!("Critical error accepting connection, shutting down");
            return true;
        }

        // For other errors, wait a bit before retrying
        tokio::time::sleep(Duration::from_millis(100)).await;
        false
    }

    /// Wait for connection tasks to finish after their connections were closed.
    async fn perform_shutdown(tasks: &mut JoinSet<()>, timeout: Duration) {
        info!("Waiting for {len} connection tasks to finish...", len = tasks.len());
        let drained = tokio::time::timeout(timeout, async {
            while let Some(joined) = tasks.join_next().await {
                Self::reap(joined);
            }
        })
        .await;

        if drained.is_err() {
            warn!("Shutdown timed out, aborting {len} tasks", len = tasks.len());
            tasks.abort_all();
        }

        info!("Server shutdown complete");
    }

    /// Own one registered connection from first read to release.
    ///
    /// Runs [`handle_connection`](Self::handle_connection) unless the registry
    /// closes the connection first, then shuts the stream down. The guard is
    /// dropped last, which removes the connection from the registry whatever
    /// happened before.
    pub async fn serve_connection<S>(
        mut socket: S,
        mut guard: ConnectionGuard,
        router: &Router,
        config: &ServerConfig,
    ) where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let id = guard.id();

        tokio::select! {
            result = Self::handle_connection(&mut socket, id, router, config) => {
                match result {
                    Ok(()) => debug!("Connection {id} served"),
                    Err(e) if e.is_routing_miss() => info!("Connection {id}: {e}"),
                    Err(e) => warn!("Connection {id} closed with error: {e}"),
                }
            }
            () = guard.closed() => {
                debug!("Connection {id} closed by shutdown");
            }
        }

        // The peer may already be gone.
        let _ = socket.shutdown().await;
        drop(socket);
        info!("Connection {id} closed");
        drop(guard);
    }

    /// Handle a single request on a connection.
    ///
    /// Routing misses are answered with a bare `400 Bad Request` status line
    /// and still returned as errors. Every other failure writes nothing.
    pub async fn handle_connection<S>(
        socket: &mut S,
        connection: ConnectionId,
        router: &Router,
        config: &ServerConfig,
    ) -> Result<(), Error>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let request = read_request(socket, connection, config).await?;
        debug!(
            "Connection {connection}: {method} {path} ({len} body bytes)",
            method = request.method(),
            path = request.path(),
            len = request.body.len()
        );

        match router.dispatch(request).await {
            Ok(response) => {
                debug!("Connection {connection}: sending {status}", status = response.status.as_u16());
                socket.write_all(&response.to_bytes()).await?;
                socket.flush().await?;
                Ok(())
            }
            Err(e) if e.is_routing_miss() => {
                let response = HttpResponse::new(StatusCode::BadRequest);
                socket.write_all(&response.to_bytes()).await?;
                socket.flush().await?;
                Err(e)
            }
            Err(e) => Err(e),
        }
    }
}

/// Resolves on Ctrl+C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Error setting up Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Error setting up SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, initiating shutdown"),
        () = terminate => info!("Received SIGTERM, initiating shutdown"),
    }
}
