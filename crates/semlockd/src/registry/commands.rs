//! Registry actor commands, errors, and events.
//!
//! This module defines the message types for communicating with the `RegistryActor`:
//! - `RegistryCommand`: Commands sent to the actor
//! - `RegistryError`: Errors that can occur during registry operations
//! - `LockEvent`: Events published by the registry for subscribers
//!
//! All types are designed for async message passing and follow the panic-free policy.

use std::fmt;

use semlock_core::{SemaphoreName, SessionId, StatsSnapshot, Username};
use semlock_protocol::{ClientCommand, ServerMessage};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

// ============================================================================
// Registry Commands
// ============================================================================

/// Commands sent to the registry actor.
///
/// Each command is processed to completion before the next one starts, which
/// makes every command a single critical section over both the semaphore
/// table and the session directory. Request-response commands carry a
/// oneshot channel for the reply.
#[derive(Debug)]
pub enum RegistryCommand {
    /// Register an identified session.
    ///
    /// # Errors
    /// - `RegistryError::AlreadyIdentified` if the session is already registered
    Register {
        session: SessionId,
        username: Username,
        /// Channel for unsolicited messages (handoff grants, pings)
        outbox: mpsc::Sender<ServerMessage>,
        respond_to: oneshot::Sender<Result<(), RegistryError>>,
    },

    /// Execute one parsed client command on behalf of a session.
    ///
    /// Replies with the message to send back, or `None` for commands that
    /// have no reply (`PONG`).
    ///
    /// # Errors
    /// - `RegistryError::SessionNotFound` if the session was already evicted
    Execute {
        session: SessionId,
        command: ClientCommand,
        respond_to: oneshot::Sender<Result<Option<ServerMessage>, RegistryError>>,
    },

    /// Record inbound traffic from a session. Fire-and-forget.
    Touch { session: SessionId },

    /// Purge and unregister a session.
    ///
    /// Replies `true` if the session was still registered. Idempotent.
    Disconnect {
        session: SessionId,
        reason: DisconnectReason,
        respond_to: oneshot::Sender<bool>,
    },

    /// Run one heartbeat sweep. Fire-and-forget, sent by the heartbeat task.
    Heartbeat,

    /// Snapshot the global counters.
    Stats {
        respond_to: oneshot::Sender<StatsSnapshot>,
    },
}

// ============================================================================
// Registry Errors
// ============================================================================

/// Errors that can occur during registry operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The session is not (or no longer) registered.
    #[error("session not found: {0}")]
    SessionNotFound(SessionId),

    /// The session already supplied its identity.
    #[error("session already identified: {0}")]
    AlreadyIdentified(SessionId),

    /// The response channel was closed before receiving a response.
    ///
    /// This typically indicates the actor was shut down.
    #[error("response channel closed")]
    ChannelClosed,
}

// ============================================================================
// Lock Events
// ============================================================================

/// Why a session left the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    /// The peer closed the connection.
    PeerClosed,

    /// Reading from or writing to the connection failed.
    ConnectionError,

    /// The first message was not a valid identity line.
    HandshakeFailed,

    /// No traffic within the liveness deadline.
    LivenessTimeout,

    /// A heartbeat probe could not be delivered.
    ProbeFailed,

    /// The server is shutting down.
    Shutdown,
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PeerClosed => write!(f, "peer closed connection"),
            Self::ConnectionError => write!(f, "connection error"),
            Self::HandshakeFailed => write!(f, "handshake failed"),
            Self::LivenessTimeout => write!(f, "liveness deadline exceeded"),
            Self::ProbeFailed => write!(f, "heartbeat probe failed"),
            Self::Shutdown => write!(f, "server shutdown"),
        }
    }
}

/// Events published by the registry to subscribers.
///
/// The server's event recorder logs every event; tests subscribe to observe
/// state changes without polling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockEvent {
    SessionRegistered {
        session: SessionId,
        username: Username,
    },

    Granted {
        session: SessionId,
        name: SemaphoreName,
    },

    Queued {
        session: SessionId,
        name: SemaphoreName,
        position: usize,
    },

    /// The holder let go and nobody was waiting.
    Released {
        session: SessionId,
        name: SemaphoreName,
    },

    HandedOff {
        from: SessionId,
        to: SessionId,
        name: SemaphoreName,
    },

    /// The next waiter was unreachable; the semaphore is now free.
    HandoffFailed {
        from: SessionId,
        to: SessionId,
        name: SemaphoreName,
    },

    SessionClosed {
        session: SessionId,
        reason: DisconnectReason,
    },
}
