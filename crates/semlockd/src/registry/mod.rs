//! Semaphore registry using Actor pattern.
//!
//! The registry is the central state manager for all semaphores and sessions.
//! It receives commands via a tokio mpsc channel and maintains the canonical
//! source of truth for who holds what and who is waiting.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌─────────────────┐     ┌─────────────────┐
//! │ Connection task │────▶│  RegistryActor  │────▶│Broadcast Channel│
//! └─────────────────┘     └─────────────────┘     └─────────────────┘
//!         ▲                       │                       │
//!         │   RegistryCommand     │   LockEvent           │
//!         │   (mpsc channel)      │   (broadcast)         │
//!         │                       ▼                       ▼
//!   session outbox        SemaphoreTable +         Event recorder,
//!   (grants, pings)       SessionDirectory         tests
//! ```
//!
//! # Panic-Free Guarantees
//!
//! All operations in this module follow the panic-free policy:
//! - No `.unwrap()` or `.expect()` in production code
//! - All fallible operations return `Result` or `Option`
//! - Channel operations handle closure gracefully

use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;

use crate::heartbeat::{spawn_heartbeat, HeartbeatConfig};

mod actor;
mod commands;
mod directory;
mod handle;
mod introspect;

pub use actor::RegistryActor;
pub use commands::{DisconnectReason, LockEvent, RegistryCommand, RegistryError};
pub use directory::OUTBOX_CAPACITY;
pub use handle::RegistryHandle;

/// Channel buffer sizes
const COMMAND_BUFFER: usize = 256;
const EVENT_BUFFER: usize = 256;

/// Spawn the registry actor and return a handle for interaction.
///
/// This function:
/// 1. Creates command and event channels
/// 2. Spawns the RegistryActor on a tokio task
/// 3. Spawns the heartbeat ticker, which stops when `cancel` fires
/// 4. Returns a RegistryHandle for client use
///
/// The actor itself stops once every handle (and the ticker) is dropped.
///
/// # Example
///
/// ```no_run
/// use semlockd::heartbeat::HeartbeatConfig;
/// use semlockd::registry::spawn_registry;
/// use tokio_util::sync::CancellationToken;
///
/// #[tokio::main]
/// async fn main() {
///     let handle = spawn_registry(HeartbeatConfig::default(), CancellationToken::new());
///     let stats = handle.stats().await;
/// }
/// ```
pub fn spawn_registry(heartbeat: HeartbeatConfig, cancel: CancellationToken) -> RegistryHandle {
    let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_BUFFER);
    let (event_tx, _) = broadcast::channel(EVENT_BUFFER);

    let actor = RegistryActor::new(cmd_rx, event_tx.clone(), heartbeat.deadline);
    tokio::spawn(actor.run());

    let handle = RegistryHandle::new(cmd_tx, event_tx);

    spawn_heartbeat(handle.clone(), heartbeat.interval, cancel);

    handle
}
