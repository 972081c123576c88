//! Event recorder - the daemon's audit trail.
//!
//! Subscribes to the registry's `LockEvent` broadcast and records every
//! event through `tracing`, so the console and the daily log file both carry
//! one line per state change.

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::registry::LockEvent;

/// Records one event.
pub fn record(event: &LockEvent) {
    match event {
        LockEvent::SessionRegistered { session, username } => {
            info!(session = %session, username = %username, "Session registered");
        }
        LockEvent::Granted { session, name } => {
            info!(session = %session, semaphore = %name, "Lock granted");
        }
        LockEvent::Queued {
            session,
            name,
            position,
        } => {
            info!(session = %session, semaphore = %name, position, "Lock queued");
        }
        LockEvent::Released { session, name } => {
            info!(session = %session, semaphore = %name, "Lock released");
        }
        LockEvent::HandedOff { from, to, name } => {
            info!(from = %from, to = %to, semaphore = %name, "Lock handed off");
        }
        LockEvent::HandoffFailed { from, to, name } => {
            warn!(from = %from, to = %to, semaphore = %name, "Lock handoff failed");
        }
        LockEvent::SessionClosed { session, reason } => {
            info!(session = %session, reason = %reason, "Session closed");
        }
    }
}

/// Spawns the recorder task.
///
/// Runs until `cancel` fires or every event sender is gone.
pub fn spawn_event_recorder(
    mut events: broadcast::Receiver<LockEvent>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Event recorder shutting down");
                    break;
                }

                result = events.recv() => {
                    match result {
                        Ok(event) => record(&event),
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            warn!(skipped = n, "Event recorder lagged, skipped events");
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            debug!("Event channel closed");
                            break;
                        }
                    }
                }
            }
        }
    })
}
