//! Connection handler for individual client connections.
//!
//! Each client connection gets its own `ConnectionHandler` that:
//! - Performs the `USERNAME` handshake
//! - Splits the inbound byte stream into lines
//! - Routes commands to the registry and writes the replies
//! - Forwards unsolicited messages (handoff grants, pings) from its outbox
//!
//! # Panic-Free Guarantees
//!
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - All fallible operations use `?`, pattern matching, or `unwrap_or`
//! - Connection errors are logged and result in graceful disconnect

use std::net::SocketAddr;
use std::time::Duration;

use futures::StreamExt;
use semlock_core::SessionId;
use semlock_protocol::{
    parse_handshake, ClientCommand, ProtocolError, ServerMessage, MAX_LINE_LENGTH,
};
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_util::codec::{FramedRead, LinesCodec, LinesCodecError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::registry::{DisconnectReason, RegistryError, RegistryHandle, OUTBOX_CAPACITY};

/// Write timeout (10 seconds)
const WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection handler for a single client.
///
/// Manages the lifecycle of a client connection including:
/// - Identity handshake
/// - Line processing loop
/// - Delivery of unsolicited messages
/// - Registry cleanup when the connection ends
pub struct ConnectionHandler {
    /// Session id assigned by the accept loop
    session: SessionId,

    peer: SocketAddr,

    /// Newline-delimited inbound lines
    lines: FramedRead<OwnedReadHalf, LinesCodec>,

    writer: BufWriter<OwnedWriteHalf>,

    /// Handle to the semaphore registry
    registry: RegistryHandle,

    cancel: CancellationToken,

    /// Whether the handshake registered this session
    registered: bool,
}

impl ConnectionHandler {
    /// Creates a new connection handler.
    ///
    /// # Arguments
    ///
    /// * `session` - Unique id for this connection
    /// * `peer` - Remote address, for logging
    /// * `reader` - Read half of the TCP stream
    /// * `writer` - Write half of the TCP stream
    /// * `registry` - Handle to the semaphore registry
    /// * `cancel` - Token for graceful shutdown
    pub fn new(
        session: SessionId,
        peer: SocketAddr,
        reader: OwnedReadHalf,
        writer: OwnedWriteHalf,
        registry: RegistryHandle,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            session,
            peer,
            lines: FramedRead::new(reader, LinesCodec::new_with_max_length(MAX_LINE_LENGTH)),
            writer: BufWriter::new(writer),
            registry,
            cancel,
            registered: false,
        }
    }

    /// Runs the connection handler.
    ///
    /// Performs the handshake, then processes lines until the connection
    /// ends. On exit the session is purged from the registry, which releases
    /// or hands off everything it held.
    pub async fn run(mut self) {
        debug!(session = %self.session, peer = %self.peer, "New client connected");

        let result = match self.handle_handshake().await {
            Ok(inbox) => self.process_lines(inbox).await,
            Err(e) => Err(e),
        };

        let reason = match &result {
            Ok(()) => DisconnectReason::PeerClosed,
            Err(e) => e.disconnect_reason(),
        };

        if let Err(e) = &result {
            debug!(session = %self.session, error = %e, "Connection closed");
        }

        if self.registered {
            self.registry.disconnect(self.session, reason).await;
        }

        info!(session = %self.session, peer = %self.peer, reason = %reason, "Client disconnected");
    }

    /// Handles the identity handshake.
    ///
    /// The first line must be `USERNAME <name>`. Anything else is answered
    /// with `ERROR` and ends the connection.
    async fn handle_handshake(
        &mut self,
    ) -> Result<mpsc::Receiver<ServerMessage>, ConnectionError> {
        let line = tokio::select! {
            _ = self.cancel.cancelled() => return Err(ConnectionError::Shutdown),
            next = self.lines.next() => next,
        };

        let line = match line {
            None => return Err(ConnectionError::Eof),
            Some(Ok(line)) => line,
            Some(Err(LinesCodecError::MaxLineLengthExceeded)) => {
                return self
                    .reject(ProtocolError::LineTooLong {
                        max: MAX_LINE_LENGTH,
                    })
                    .await;
            }
            Some(Err(LinesCodecError::Io(e))) => return Err(ConnectionError::Io(e.to_string())),
        };

        let username = match parse_handshake(line.trim()) {
            Ok(username) => username,
            Err(e) => return self.reject(e).await,
        };

        let (outbox, inbox) = mpsc::channel(OUTBOX_CAPACITY);
        self.registry
            .register(self.session, username.clone(), outbox)
            .await?;
        self.registered = true;

        info!(
            session = %self.session,
            peer = %self.peer,
            username = %username,
            "Client identified"
        );

        Ok(inbox)
    }

    /// Answers a bad handshake with `ERROR` and fails it.
    async fn reject<T>(&mut self, error: ProtocolError) -> Result<T, ConnectionError> {
        warn!(session = %self.session, peer = %self.peer, error = %error, "Handshake failed");
        // The connection closes either way
        let _ = self.send_message(&ServerMessage::error(&error)).await;
        Err(ConnectionError::Handshake(error))
    }

    /// Main line processing loop.
    ///
    /// Returns `Ok(())` when the peer closes the connection; every other
    /// exit is an error describing why the session ended.
    async fn process_lines(
        &mut self,
        mut inbox: mpsc::Receiver<ServerMessage>,
    ) -> Result<(), ConnectionError> {
        // FramedRead yields a single `None` after a decode error, then resumes
        let mut resuming_after_error = false;

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => return Err(ConnectionError::Shutdown),

                outbound = inbox.recv() => match outbound {
                    Some(message) => self.send_message(&message).await?,
                    // The registry dropped our outbox: we were evicted
                    None => return Err(ConnectionError::Evicted),
                },

                inbound = self.lines.next() => match inbound {
                    None if resuming_after_error => resuming_after_error = false,
                    None => {
                        debug!(session = %self.session, "Client sent EOF");
                        return Ok(());
                    }
                    Some(Ok(line)) => self.handle_line(&line).await?,
                    Some(Err(LinesCodecError::MaxLineLengthExceeded)) => {
                        resuming_after_error = true;
                        self.registry.touch(self.session).await;
                        self.send_message(&ServerMessage::error(ProtocolError::LineTooLong {
                            max: MAX_LINE_LENGTH,
                        }))
                        .await?;
                    }
                    Some(Err(LinesCodecError::Io(e))) => {
                        return Err(ConnectionError::Io(e.to_string()));
                    }
                },
            }
        }
    }

    /// Handles a single inbound line.
    async fn handle_line(&mut self, line: &str) -> Result<(), ConnectionError> {
        let line = line.trim();
        if line.is_empty() {
            self.registry.touch(self.session).await;
            return Ok(());
        }

        let command = match ClientCommand::parse(line) {
            Ok(command) => command,
            Err(e) => {
                debug!(session = %self.session, line = %line, error = %e, "Rejected line");
                self.registry.touch(self.session).await;
                return self.send_message(&ServerMessage::error(e)).await;
            }
        };

        match self.registry.execute(self.session, command).await {
            Ok(Some(reply)) => self.send_message(&reply).await,
            Ok(None) => Ok(()),
            Err(RegistryError::SessionNotFound(_)) => Err(ConnectionError::Evicted),
            Err(e) => Err(e.into()),
        }
    }

    /// Sends a message to the client.
    async fn send_message(&mut self, message: &ServerMessage) -> Result<(), ConnectionError> {
        let text = message.render();
        let writer = &mut self.writer;

        match timeout(WRITE_TIMEOUT, async {
            writer.write_all(text.as_bytes()).await?;
            writer.flush().await?;
            Ok::<(), std::io::Error>(())
        })
        .await
        {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(ConnectionError::Io(e.to_string())),
            Err(_) => Err(ConnectionError::WriteTimeout),
        }
    }
}

/// Errors that end a connection.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("Handshake rejected: {0}")]
    Handshake(ProtocolError),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Connection closed")]
    Eof,

    #[error("Write timeout")]
    WriteTimeout,

    #[error("Session evicted by the registry")]
    Evicted,

    #[error("Server shutting down")]
    Shutdown,

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),
}

impl ConnectionError {
    /// Why the session ends when this error stops its connection.
    pub fn disconnect_reason(&self) -> DisconnectReason {
        match self {
            Self::Handshake(_) => DisconnectReason::HandshakeFailed,
            Self::Eof => DisconnectReason::PeerClosed,
            Self::Io(_) | Self::WriteTimeout | Self::Evicted => DisconnectReason::ConnectionError,
            Self::Shutdown | Self::Registry(_) => DisconnectReason::Shutdown,
        }
    }
}
