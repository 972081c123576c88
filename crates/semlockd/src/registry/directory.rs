//! Session directory - identity, liveness and outbound channel per session.
//!
//! Owned by the registry actor alongside the semaphore table. Each entry
//! keeps the sending half of the session's outbound channel; dropping the
//! entry closes that channel, which tells the connection task to hang up.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use semlock_core::{GrantNotifier, SemaphoreName, SessionId, Username};
use semlock_protocol::ServerMessage;
use tokio::sync::mpsc;
use tracing::debug;

use super::commands::{DisconnectReason, RegistryError};

/// Capacity of each session's outbound channel.
pub const OUTBOX_CAPACITY: usize = 64;

/// One live, identified session.
#[derive(Debug)]
pub struct SessionEntry {
    username: Username,
    last_liveness: Instant,
    outbox: mpsc::Sender<ServerMessage>,
}

/// All live sessions, keyed by id.
///
/// A `BTreeMap` keeps heartbeat sweeps in connection order, which keeps
/// eviction logs stable.
#[derive(Debug, Default)]
pub struct SessionDirectory {
    sessions: BTreeMap<SessionId, SessionEntry>,
}

impl SessionDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an identified session.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::AlreadyIdentified` if `session` is registered.
    pub fn register(
        &mut self,
        session: SessionId,
        username: Username,
        outbox: mpsc::Sender<ServerMessage>,
        now: Instant,
    ) -> Result<(), RegistryError> {
        if self.sessions.contains_key(&session) {
            return Err(RegistryError::AlreadyIdentified(session));
        }
        self.sessions.insert(
            session,
            SessionEntry {
                username,
                last_liveness: now,
                outbox,
            },
        );
        Ok(())
    }

    /// Refreshes a session's liveness. Returns false for unknown sessions.
    pub fn touch(&mut self, session: SessionId, now: Instant) -> bool {
        match self.sessions.get_mut(&session) {
            Some(entry) => {
                entry.last_liveness = now;
                true
            }
            None => false,
        }
    }

    /// Removes a session, closing its outbound channel.
    pub fn unregister(&mut self, session: SessionId) -> Option<SessionEntry> {
        self.sessions.remove(&session)
    }

    pub fn contains(&self, session: SessionId) -> bool {
        self.sessions.contains_key(&session)
    }

    /// Username for display; `"Unknown"` once the session is gone.
    pub fn resolve_username(&self, session: SessionId) -> String {
        self.sessions
            .get(&session)
            .map(|entry| entry.username.to_string())
            .unwrap_or_else(|| Username::UNKNOWN.to_string())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Queues a message for a session without waiting.
    ///
    /// Returns false if the session is unknown, its connection is gone, or
    /// its outbound buffer is full.
    pub fn try_deliver(&self, session: SessionId, message: ServerMessage) -> bool {
        let Some(entry) = self.sessions.get(&session) else {
            return false;
        };
        match entry.outbox.try_send(message) {
            Ok(()) => true,
            Err(e) => {
                debug!(session = %session, error = %e, "Outbound delivery failed");
                false
            }
        }
    }

    /// Probes every session and returns the ones to evict.
    ///
    /// Each session's liveness is read before its probe is sent, so a reply
    /// that arrives during this sweep only counts from the next one.
    pub fn sweep(&self, now: Instant, deadline: Duration) -> Vec<(SessionId, DisconnectReason)> {
        let mut dead = Vec::new();

        for (&session, entry) in &self.sessions {
            let last_seen = entry.last_liveness;
            if !self.try_deliver(session, ServerMessage::Ping) {
                dead.push((session, DisconnectReason::ProbeFailed));
            } else if now.saturating_duration_since(last_seen) > deadline {
                dead.push((session, DisconnectReason::LivenessTimeout));
            }
        }

        dead
    }
}

impl GrantNotifier for SessionDirectory {
    fn notify_granted(&mut self, session: SessionId, name: &SemaphoreName) -> bool {
        self.try_deliver(session, ServerMessage::LockGranted(name.clone()))
    }
}
