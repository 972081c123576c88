//! TCP server for the semlock daemon.
//!
//! The server:
//! - Listens on a TCP address for client connections
//! - Assigns each connection a session id and spawns a ConnectionHandler
//! - Supports graceful shutdown via CancellationToken, waiting for every
//!   connection task to purge its session before returning
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │   DaemonServer  │
//! │                 │
//! │   TcpListener   │
//! └───────┬─────────┘
//!         │ accept()
//!         ▼
//! ┌─────────────────┐     ┌─────────────────┐
//! │ConnectionHandler│────▶│  RegistryHandle │
//! │  (per session)  │◀────│  (grants, PING) │
//! └─────────────────┘     └─────────────────┘
//! ```
//!
//! # Panic-Free Guarantees
//!
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - All fallible operations use `?`, pattern matching, or `unwrap_or`
//! - Connection errors are logged and only end that connection

mod connection;

pub use connection::{ConnectionError, ConnectionHandler};

use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use semlock_core::SessionId;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use crate::registry::RegistryHandle;

/// Upper bound on waiting for connection tasks at shutdown
const SHUTDOWN_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// TCP server for the semlock daemon.
pub struct DaemonServer {
    listener: TcpListener,

    /// Handle to the semaphore registry
    registry: RegistryHandle,

    /// Cancellation token for graceful shutdown
    cancel_token: CancellationToken,

    /// Source of session ids; the first connection is `session-1`
    session_counter: AtomicU64,

    /// Spawned connection handlers
    connections: TaskTracker,
}

impl DaemonServer {
    /// Binds the listening socket.
    ///
    /// # Arguments
    ///
    /// * `addr` - Address to listen on, e.g. `localhost:12345`
    /// * `registry` - Handle to the semaphore registry
    /// * `cancel_token` - Token for graceful shutdown
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Bind` if the address cannot be bound.
    pub async fn bind(
        addr: &str,
        registry: RegistryHandle,
        cancel_token: CancellationToken,
    ) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.to_string(),
                source,
            })?;

        Ok(Self {
            listener,
            registry,
            cancel_token,
            session_counter: AtomicU64::new(1),
            connections: TaskTracker::new(),
        })
    }

    /// Returns the address the server is listening on.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Runs the accept loop.
    ///
    /// Returns `Ok(())` once the cancellation token is triggered and every
    /// connection task has finished. An accept failure stops the loop and is
    /// returned; sessions that are already connected keep running until
    /// `drain` is called.
    pub async fn run(&self) -> Result<(), ServerError> {
        match self.local_addr() {
            Ok(addr) => info!(addr = %addr, "Daemon server listening"),
            Err(e) => debug!(error = %e, "Listening address unavailable"),
        }

        loop {
            tokio::select! {
                _ = self.cancel_token.cancelled() => {
                    info!("Server shutdown requested");
                    self.drain().await;
                    return Ok(());
                }

                result = self.listener.accept() => {
                    match result {
                        Ok((stream, peer)) => self.handle_connection(stream, peer),
                        Err(e) => {
                            error!(error = %e, "Failed to accept connection, no longer accepting");
                            return Err(ServerError::Accept(e));
                        }
                    }
                }
            }
        }
    }

    /// Waits for connection tasks to finish their registry cleanup.
    ///
    /// Handlers stop once the cancellation token fires, so call this after
    /// cancelling. Gives up after `SHUTDOWN_DRAIN_TIMEOUT`.
    pub async fn drain(&self) {
        self.connections.close();
        if timeout(SHUTDOWN_DRAIN_TIMEOUT, self.connections.wait())
            .await
            .is_err()
        {
            warn!(
                remaining = self.connections.len(),
                "Connection tasks still running at shutdown"
            );
        }
    }

    /// Handles a new client connection by spawning a handler task.
    fn handle_connection(&self, stream: TcpStream, peer: SocketAddr) {
        let session = SessionId::new(self.session_counter.fetch_add(1, Ordering::Relaxed));

        if let Err(e) = stream.set_nodelay(true) {
            debug!(session = %session, error = %e, "Failed to set TCP_NODELAY");
        }

        let (reader, writer) = stream.into_split();
        let handler = ConnectionHandler::new(
            session,
            peer,
            reader,
            writer,
            self.registry.clone(),
            self.cancel_token.child_token(),
        );

        self.connections.spawn(handler.run());
    }
}

/// Errors that can occur in server operations.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to accept connection: {0}")]
    Accept(#[source] io::Error),
}
