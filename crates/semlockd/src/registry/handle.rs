//! Client interface for interacting with the RegistryActor.
//!
//! The `RegistryHandle` provides a cheap-to-clone interface for sending commands
//! to the registry actor and subscribing to lock events.
//!
//! # Panic-Free Guarantees
//!
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - All fallible operations use `?`, pattern matching, or `unwrap_or`
//! - Channel errors are mapped to `RegistryError::ChannelClosed`

use semlock_core::{SessionId, StatsSnapshot, Username};
use semlock_protocol::{ClientCommand, ServerMessage};
use tokio::sync::{broadcast, mpsc, oneshot};

use super::commands::{DisconnectReason, LockEvent, RegistryCommand, RegistryError};

// ============================================================================
// Registry Handle
// ============================================================================

/// Handle for interacting with the registry actor.
///
/// This is a cheap-to-clone handle that can be shared across tasks.
/// All methods are async and communicate with the actor via channels.
///
/// # Usage
///
/// ```ignore
/// let handle = registry_handle.clone();
///
/// handle.register(session, username, outbox).await?;
/// let reply = handle.execute(session, ClientCommand::List).await?;
///
/// let mut rx = handle.subscribe();
/// while let Ok(event) = rx.recv().await {
///     // Handle event
/// }
/// ```
#[derive(Clone)]
pub struct RegistryHandle {
    /// Command sender to the actor
    sender: mpsc::Sender<RegistryCommand>,

    /// Event broadcaster for subscribing to updates
    event_sender: broadcast::Sender<LockEvent>,
}

impl RegistryHandle {
    /// Create a new registry handle.
    ///
    /// # Arguments
    ///
    /// * `sender` - The command channel sender for communicating with the actor
    /// * `event_sender` - The broadcast sender for subscribing to events
    pub fn new(
        sender: mpsc::Sender<RegistryCommand>,
        event_sender: broadcast::Sender<LockEvent>,
    ) -> Self {
        Self {
            sender,
            event_sender,
        }
    }

    /// Register an identified session together with its outbound channel.
    ///
    /// # Errors
    ///
    /// - `RegistryError::AlreadyIdentified` if the session is registered
    /// - `RegistryError::ChannelClosed` if the actor has shut down
    pub async fn register(
        &self,
        session: SessionId,
        username: Username,
        outbox: mpsc::Sender<ServerMessage>,
    ) -> Result<(), RegistryError> {
        let (tx, rx) = oneshot::channel();

        self.sender
            .send(RegistryCommand::Register {
                session,
                username,
                outbox,
                respond_to: tx,
            })
            .await
            .map_err(|_| RegistryError::ChannelClosed)?;

        rx.await.map_err(|_| RegistryError::ChannelClosed)?
    }

    /// Execute a client command and return the reply, if it has one.
    ///
    /// # Errors
    ///
    /// - `RegistryError::SessionNotFound` if the session was evicted
    /// - `RegistryError::ChannelClosed` if the actor has shut down
    pub async fn execute(
        &self,
        session: SessionId,
        command: ClientCommand,
    ) -> Result<Option<ServerMessage>, RegistryError> {
        let (tx, rx) = oneshot::channel();

        self.sender
            .send(RegistryCommand::Execute {
                session,
                command,
                respond_to: tx,
            })
            .await
            .map_err(|_| RegistryError::ChannelClosed)?;

        rx.await.map_err(|_| RegistryError::ChannelClosed)?
    }

    /// Record inbound traffic that carried no command.
    ///
    /// This is a fire-and-forget operation.
    pub async fn touch(&self, session: SessionId) {
        // Fire-and-forget: ignore send errors (actor may be shutting down)
        let _ = self.sender.send(RegistryCommand::Touch { session }).await;
    }

    /// Purge and unregister a session.
    ///
    /// Returns `true` if the session was still registered, `false` if it was
    /// already gone or the actor has shut down.
    pub async fn disconnect(&self, session: SessionId, reason: DisconnectReason) -> bool {
        let (tx, rx) = oneshot::channel();

        if self
            .sender
            .send(RegistryCommand::Disconnect {
                session,
                reason,
                respond_to: tx,
            })
            .await
            .is_err()
        {
            return false;
        }

        rx.await.unwrap_or(false)
    }

    /// Trigger one heartbeat sweep.
    ///
    /// Returns `false` if the actor has shut down.
    pub async fn heartbeat(&self) -> bool {
        self.sender.send(RegistryCommand::Heartbeat).await.is_ok()
    }

    /// Snapshot the global counters.
    ///
    /// # Errors
    ///
    /// - `RegistryError::ChannelClosed` if the actor has shut down
    pub async fn stats(&self) -> Result<StatsSnapshot, RegistryError> {
        let (tx, rx) = oneshot::channel();

        self.sender
            .send(RegistryCommand::Stats { respond_to: tx })
            .await
            .map_err(|_| RegistryError::ChannelClosed)?;

        rx.await.map_err(|_| RegistryError::ChannelClosed)
    }

    /// Subscribe to lock events.
    ///
    /// This is a synchronous operation - it doesn't communicate with the actor.
    pub fn subscribe(&self) -> broadcast::Receiver<LockEvent> {
        self.event_sender.subscribe()
    }
}
