//! Interactive session with the semlock daemon.
//!
//! A `Session` owns the server connection. It:
//! - Sends the `USERNAME` handshake on open
//! - Forwards each typed line to the server
//! - Prints every server line, except `PING`, which it answers with `PONG`
//! - Handles `EXIT` locally by closing the connection
//!
//! The session is generic over its byte streams so it can be driven by a
//! `TcpStream`, stdin/stdout, or in-memory pipes in tests.
//!
//! **Panic-Free Policy:** No `.unwrap()`, `.expect()`, `panic!()`,
//! `unreachable!()`, or `todo!()` in this module.

use futures::{Stream, StreamExt};
use semlock_core::Username;
use semlock_protocol::{PING, PONG};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_util::codec::{FramedRead, LinesCodec, LinesCodecError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::{ClientError, Result};

/// Longest server line accepted.
pub const SERVER_LINE_LIMIT: usize = 64 * 1024;

/// Client-local command that ends the session.
const EXIT: &str = "EXIT";

// ============================================================================
// Input Classification
// ============================================================================

/// What to do with one typed line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Close the connection without telling the server.
    Exit,

    /// Nothing to send.
    Blank,

    /// Forward to the server as-is (trimmed).
    Command(String),
}

impl Input {
    pub fn classify(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            Self::Blank
        } else if line.eq_ignore_ascii_case(EXIT) {
            Self::Exit
        } else {
            Self::Command(line.to_string())
        }
    }
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The user typed `EXIT`.
    UserExit,

    /// The input stream ended (e.g. Ctrl+D).
    InputClosed,

    /// The server closed the connection.
    ServerClosed,

    /// Cancelled, e.g. by Ctrl+C.
    Interrupted,
}

// ============================================================================
// Connection
// ============================================================================

/// Connects to the daemon at `addr` (`host:port`).
///
/// # Errors
///
/// Returns `ClientError::Connect` if the connection is refused or the host
/// cannot be resolved.
pub async fn connect(addr: &str) -> Result<TcpStream> {
    let stream = TcpStream::connect(addr)
        .await
        .map_err(|source| ClientError::Connect {
            addr: addr.to_string(),
            source,
        })?;
    if let Err(e) = stream.set_nodelay(true) {
        debug!(error = %e, "Failed to set TCP_NODELAY");
    }
    info!(addr = %addr, "Connected to daemon");
    Ok(stream)
}

/// Prompts for a username until a non-blank one is entered.
///
/// # Errors
///
/// - `ClientError::NoUsername` if input ends first
/// - `ClientError::Io` if the prompt cannot be written
pub async fn prompt_username<I, O>(input: &mut I, output: &mut O) -> Result<Username>
where
    I: Stream<Item = std::result::Result<String, LinesCodecError>> + Unpin,
    O: AsyncWrite + Unpin,
{
    loop {
        output.write_all(b"Username: ").await?;
        output.flush().await?;

        let line = input.next().await.ok_or(ClientError::NoUsername)??;
        match Username::new(&line) {
            Ok(username) => return Ok(username),
            Err(e) => {
                output.write_all(format!("{e}\n").as_bytes()).await?;
            }
        }
    }
}

// ============================================================================
// Session
// ============================================================================

/// An identified connection to the daemon.
pub struct Session<R, W> {
    server: FramedRead<R, LinesCodec>,
    writer: W,
}

impl<R, W> Session<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Sends the handshake and returns the ready session.
    ///
    /// The server does not acknowledge a valid handshake; a rejected one
    /// shows up as an `ERROR` line followed by the server closing.
    pub async fn open(reader: R, writer: W, username: &Username) -> Result<Self> {
        let mut session = Self {
            server: FramedRead::new(reader, LinesCodec::new_with_max_length(SERVER_LINE_LIMIT)),
            writer,
        };
        session.send(&format!("USERNAME {username}")).await?;
        Ok(session)
    }

    /// Runs the session until `EXIT`, end of input, server close or cancel.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` on I/O failure in either direction.
    pub async fn run<I, O>(
        mut self,
        input: &mut I,
        output: &mut O,
        cancel: CancellationToken,
    ) -> Result<SessionEnd>
    where
        I: Stream<Item = std::result::Result<String, LinesCodecError>> + Unpin,
        O: AsyncWrite + Unpin,
    {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => return Ok(SessionEnd::Interrupted),

                inbound = self.server.next() => match inbound {
                    None => return Ok(SessionEnd::ServerClosed),
                    Some(line) => self.handle_server_line(&line?, output).await?,
                },

                typed = input.next() => match typed {
                    None => return Ok(SessionEnd::InputClosed),
                    Some(line) => match Input::classify(&line?) {
                        Input::Exit => return Ok(SessionEnd::UserExit),
                        Input::Blank => {}
                        Input::Command(command) => self.send(&command).await?,
                    },
                },
            }
        }
    }

    async fn handle_server_line<O>(&mut self, line: &str, output: &mut O) -> Result<()>
    where
        O: AsyncWrite + Unpin,
    {
        if line == PING {
            debug!("Answering heartbeat");
            return self.send(PONG).await;
        }
        output.write_all(line.as_bytes()).await?;
        output.write_all(b"\n").await?;
        output.flush().await?;
        Ok(())
    }

    async fn send(&mut self, line: &str) -> Result<()> {
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;
        Ok(())
    }
}
