//! Registry actor - owns all semaphore and session state and processes commands.
//!
//! The RegistryActor is the single owner of the semaphore table and the
//! session directory. It receives commands via an mpsc channel and publishes
//! events via broadcast. Because commands run one at a time, every lock,
//! release, purge and heartbeat sweep is atomic with respect to the others.
//!
//! # Panic-Free Guarantees
//!
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - All fallible operations use `?`, pattern matching, or `unwrap_or`
//! - Channel send failures are logged but don't panic

use std::time::{Duration, Instant};

use chrono::Utc;
use semlock_core::{
    AcquireOutcome, Handoff, ReleaseOutcome, SemaphoreName, SemaphoreTable, SessionId, Timestamp,
    Username,
};
use semlock_protocol::{ClientCommand, ProtocolError, ServerMessage};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use super::commands::{DisconnectReason, LockEvent, RegistryCommand, RegistryError};
use super::directory::SessionDirectory;
use super::introspect::{self, GlobalStats};

// ============================================================================
// Registry Actor
// ============================================================================

/// The registry actor - owns all coordination state.
///
/// # Ownership
///
/// The actor owns:
/// - `semaphores`: every semaphore ever referenced, with holder and queue
/// - `sessions`: live sessions with username, liveness and outbound channel
/// - `stats`: start time and processed-command counter
///
/// # Thread Safety
///
/// The actor runs in a single task and processes commands sequentially.
/// All state mutations happen within this single task.
pub struct RegistryActor {
    /// Command receiver
    receiver: mpsc::Receiver<RegistryCommand>,

    semaphores: SemaphoreTable,

    sessions: SessionDirectory,

    stats: GlobalStats,

    /// A session silent for longer than this is evicted by the next sweep.
    liveness_deadline: Duration,

    /// Event publisher for the event recorder and tests
    event_publisher: broadcast::Sender<LockEvent>,
}

impl RegistryActor {
    /// Creates a new registry actor.
    ///
    /// # Arguments
    ///
    /// * `receiver` - Channel for receiving commands
    /// * `event_publisher` - Broadcast channel for publishing events
    /// * `liveness_deadline` - Maximum silence before a session is evicted
    pub fn new(
        receiver: mpsc::Receiver<RegistryCommand>,
        event_publisher: broadcast::Sender<LockEvent>,
        liveness_deadline: Duration,
    ) -> Self {
        Self {
            receiver,
            semaphores: SemaphoreTable::new(),
            sessions: SessionDirectory::new(),
            stats: GlobalStats::new(now().at),
            liveness_deadline,
            event_publisher,
        }
    }

    /// Runs the actor event loop.
    ///
    /// Processes commands until the channel closes (all senders dropped).
    /// This is the main entry point - call this in a spawned task.
    pub async fn run(mut self) {
        info!("Registry actor starting");

        while let Some(cmd) = self.receiver.recv().await {
            self.handle_command(cmd);
        }

        info!(
            sessions = self.sessions.len(),
            semaphores = self.semaphores.len(),
            "Registry actor stopped"
        );
    }

    /// Dispatches a command to the appropriate handler.
    fn handle_command(&mut self, cmd: RegistryCommand) {
        match cmd {
            RegistryCommand::Register {
                session,
                username,
                outbox,
                respond_to,
            } => {
                let result = self.handle_register(session, username, outbox);
                // Ignore send error - client may have dropped the receiver
                let _ = respond_to.send(result);
            }
            RegistryCommand::Execute {
                session,
                command,
                respond_to,
            } => {
                let result = self.handle_execute(session, command);
                let _ = respond_to.send(result);
            }
            RegistryCommand::Touch { session } => {
                self.sessions.touch(session, now().at);
            }
            RegistryCommand::Disconnect {
                session,
                reason,
                respond_to,
            } => {
                let removed = self.handle_disconnect(session, reason);
                let _ = respond_to.send(removed);
            }
            RegistryCommand::Heartbeat => {
                self.handle_heartbeat();
            }
            RegistryCommand::Stats { respond_to } => {
                let snapshot =
                    introspect::stats(&self.semaphores, &self.sessions, &self.stats, now().at);
                let _ = respond_to.send(snapshot);
            }
        }
    }

    // ========================================================================
    // Command Handlers
    // ========================================================================

    fn handle_register(
        &mut self,
        session: SessionId,
        username: Username,
        outbox: mpsc::Sender<ServerMessage>,
    ) -> Result<(), RegistryError> {
        self.sessions
            .register(session, username.clone(), outbox, now().at)?;

        debug!(
            session = %session,
            username = %username,
            total_sessions = self.sessions.len(),
            "Session registered"
        );

        self.publish(LockEvent::SessionRegistered { session, username });
        Ok(())
    }

    /// Executes one client command.
    ///
    /// Any command is proof of life, so liveness is refreshed first.
    fn handle_execute(
        &mut self,
        session: SessionId,
        command: ClientCommand,
    ) -> Result<Option<ServerMessage>, RegistryError> {
        let now = now();
        if !self.sessions.touch(session, now.at) {
            return Err(RegistryError::SessionNotFound(session));
        }
        if command.is_user_command() {
            self.stats.record_command();
        }

        debug!(session = %session, command = %command, "Executing command");

        let reply = match command {
            ClientCommand::Lock(name) => self.handle_lock(session, name, now),
            ClientCommand::Release(name) => self.handle_release(session, name, now),
            ClientCommand::Info(name) => ServerMessage::Info(introspect::describe(
                &self.semaphores,
                &self.sessions,
                &name,
                now.at,
            )),
            ClientCommand::List => {
                ServerMessage::List(introspect::list(&self.semaphores, &self.sessions))
            }
            ClientCommand::Stats => ServerMessage::Stats(introspect::stats(
                &self.semaphores,
                &self.sessions,
                &self.stats,
                now.at,
            )),
            ClientCommand::Help => ServerMessage::Help,
            ClientCommand::Pong => return Ok(None),
            ClientCommand::Identify(_) => ServerMessage::error(ProtocolError::AlreadyIdentified),
        };

        Ok(Some(reply))
    }

    fn handle_lock(
        &mut self,
        session: SessionId,
        name: SemaphoreName,
        now: Timestamp,
    ) -> ServerMessage {
        match self.semaphores.acquire(&name, session, now) {
            AcquireOutcome::Granted => {
                debug!(session = %session, semaphore = %name, "Lock granted");
                self.publish(LockEvent::Granted {
                    session,
                    name: name.clone(),
                });
                ServerMessage::LockGranted(name)
            }
            AcquireOutcome::AlreadyHeld => {
                debug!(session = %session, semaphore = %name, "Lock already held by caller");
                ServerMessage::LockGranted(name)
            }
            AcquireOutcome::Queued { position } => {
                debug!(session = %session, semaphore = %name, position, "Lock queued");
                self.publish(LockEvent::Queued {
                    session,
                    name: name.clone(),
                    position,
                });
                ServerMessage::LockDenied { name, position }
            }
        }
    }

    fn handle_release(
        &mut self,
        session: SessionId,
        name: SemaphoreName,
        now: Timestamp,
    ) -> ServerMessage {
        match self
            .semaphores
            .release(&name, session, now, &mut self.sessions)
        {
            ReleaseOutcome::Released(handoff) => {
                self.publish_handoff(session, &name, handoff);
                ServerMessage::ReleaseOk(name)
            }
            ReleaseOutcome::Denied => {
                debug!(session = %session, semaphore = %name, "Release denied");
                ServerMessage::ReleaseDenied(name)
            }
        }
    }

    /// Purges and unregisters a session. Returns false if it was already gone.
    fn handle_disconnect(&mut self, session: SessionId, reason: DisconnectReason) -> bool {
        if !self.sessions.contains(session) {
            debug!(session = %session, reason = %reason, "Disconnect for unknown session");
            return false;
        }

        let report = self
            .semaphores
            .purge_session(session, now(), &mut self.sessions);
        for (name, handoff) in &report.handoffs {
            self.publish_handoff(session, name, *handoff);
        }

        let username = self.sessions.resolve_username(session);
        self.sessions.unregister(session);

        debug!(
            session = %session,
            username = %username,
            reason = %reason,
            released = report.handoffs.len(),
            dequeued = report.dequeued_from.len(),
            remaining_sessions = self.sessions.len(),
            "Session closed"
        );

        self.publish(LockEvent::SessionClosed { session, reason });
        true
    }

    /// Probes every session and evicts the dead ones.
    fn handle_heartbeat(&mut self) {
        let dead = self.sessions.sweep(now().at, self.liveness_deadline);

        if dead.is_empty() {
            debug!(sessions = self.sessions.len(), "Heartbeat sweep: all alive");
            return;
        }

        for (session, reason) in dead {
            // Use warn! so it shows up without RUST_LOG=debug
            warn!(session = %session, reason = %reason, "Evicting session");
            self.handle_disconnect(session, reason);
        }
    }

    // ========================================================================
    // Event Publishing
    // ========================================================================

    fn publish_handoff(&self, from: SessionId, name: &SemaphoreName, handoff: Handoff) {
        let event = match handoff {
            Handoff::Freed => {
                debug!(session = %from, semaphore = %name, "Lock released");
                LockEvent::Released {
                    session: from,
                    name: name.clone(),
                }
            }
            Handoff::Transferred(to) => {
                debug!(from = %from, to = %to, semaphore = %name, "Lock handed off");
                LockEvent::HandedOff {
                    from,
                    to,
                    name: name.clone(),
                }
            }
            Handoff::Failed(to) => {
                warn!(
                    from = %from,
                    to = %to,
                    semaphore = %name,
                    "Next waiter unreachable, semaphore left free"
                );
                LockEvent::HandoffFailed {
                    from,
                    to,
                    name: name.clone(),
                }
            }
        };
        self.publish(event);
    }

    fn publish(&self, event: LockEvent) {
        // Ignore if no subscribers
        let _ = self.event_publisher.send(event);
    }

    // ========================================================================
    // Accessors (for testing)
    // ========================================================================

    /// Returns the number of sessions currently registered.
    #[cfg(test)]
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

/// Current time. Reads the tokio clock so paused-time tests control it.
fn now() -> Timestamp {
    let at: Instant = tokio::time::Instant::now().into_std();
    Timestamp::new(at, Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::directory::OUTBOX_CAPACITY;
    use semlock_protocol::InfoBody;
    use tokio::sync::oneshot;

    const DEADLINE: Duration = Duration::from_secs(30);

    fn create_actor() -> (RegistryActor, broadcast::Receiver<LockEvent>) {
        let (_cmd_tx, cmd_rx) = mpsc::channel(16);
        let (event_tx, event_rx) = broadcast::channel(64);
        let actor = RegistryActor::new(cmd_rx, event_tx, DEADLINE);
        (actor, event_rx)
    }

    fn name(raw: &str) -> SemaphoreName {
        SemaphoreName::new(raw).unwrap()
    }

    fn register(
        actor: &mut RegistryActor,
        raw: u64,
        username: &str,
    ) -> mpsc::Receiver<ServerMessage> {
        let (outbox, inbox) = mpsc::channel(OUTBOX_CAPACITY);
        let (tx, _) = oneshot::channel();
        actor.handle_command(RegistryCommand::Register {
            session: SessionId::new(raw),
            username: Username::new(username).unwrap(),
            outbox,
            respond_to: tx,
        });
        inbox
    }

    async fn execute(
        actor: &mut RegistryActor,
        raw: u64,
        command: ClientCommand,
    ) -> Result<Option<ServerMessage>, RegistryError> {
        let (tx, rx) = oneshot::channel();
        actor.handle_command(RegistryCommand::Execute {
            session: SessionId::new(raw),
            command,
            respond_to: tx,
        });
        rx.await.unwrap()
    }

    async fn disconnect(actor: &mut RegistryActor, raw: u64, reason: DisconnectReason) -> bool {
        let (tx, rx) = oneshot::channel();
        actor.handle_command(RegistryCommand::Disconnect {
            session: SessionId::new(raw),
            reason,
            respond_to: tx,
        });
        rx.await.unwrap()
    }

    #[tokio::test]
    async fn test_register_session() {
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let (event_tx, mut event_rx) = broadcast::channel(16);
        let mut actor = RegistryActor::new(cmd_rx, event_tx, DEADLINE);

        let (outbox, _inbox) = mpsc::channel(OUTBOX_CAPACITY);
        let (respond_tx, respond_rx) = oneshot::channel();
        cmd_tx
            .send(RegistryCommand::Register {
                session: SessionId::new(1),
                username: Username::new("alice").unwrap(),
                outbox,
                respond_to: respond_tx,
            })
            .await
            .unwrap();

        // Process the command manually (actor not running in background)
        if let Some(cmd) = actor.receiver.recv().await {
            actor.handle_command(cmd);
        }

        assert!(respond_rx.await.unwrap().is_ok());
        assert_eq!(actor.session_count(), 1);

        let event = event_rx.try_recv().unwrap();
        assert!(matches!(event, LockEvent::SessionRegistered { .. }));
    }

    #[tokio::test]
    async fn test_register_duplicate_fails() {
        let (mut actor, _) = create_actor();
        let _alice = register(&mut actor, 1, "alice");

        let (outbox, _inbox) = mpsc::channel(OUTBOX_CAPACITY);
        let (tx, rx) = oneshot::channel();
        actor.handle_command(RegistryCommand::Register {
            session: SessionId::new(1),
            username: Username::new("mallory").unwrap(),
            outbox,
            respond_to: tx,
        });

        let result = rx.await.unwrap();
        assert!(matches!(result, Err(RegistryError::AlreadyIdentified(_))));
        assert_eq!(actor.session_count(), 1);
    }

    #[tokio::test]
    async fn test_execute_for_unknown_session_fails() {
        let (mut actor, _) = create_actor();

        let result = execute(&mut actor, 9, ClientCommand::Help).await;

        assert_eq!(result, Err(RegistryError::SessionNotFound(SessionId::new(9))));
    }

    #[tokio::test]
    async fn test_lock_queue_and_handoff() {
        let (mut actor, mut events) = create_actor();
        let _alice = register(&mut actor, 1, "alice");
        let mut bob = register(&mut actor, 2, "bob");

        let reply = execute(&mut actor, 1, ClientCommand::Lock(name("db"))).await;
        assert_eq!(reply, Ok(Some(ServerMessage::LockGranted(name("db")))));

        let reply = execute(&mut actor, 2, ClientCommand::Lock(name("db"))).await;
        assert_eq!(
            reply,
            Ok(Some(ServerMessage::LockDenied {
                name: name("db"),
                position: 1
            }))
        );

        let reply = execute(&mut actor, 1, ClientCommand::Release(name("db"))).await;
        assert_eq!(reply, Ok(Some(ServerMessage::ReleaseOk(name("db")))));

        // The waiter is told asynchronously through its outbound channel.
        assert_eq!(bob.try_recv().unwrap(), ServerMessage::LockGranted(name("db")));

        let handed_off = std::iter::from_fn(|| events.try_recv().ok()).any(|event| {
            event
                == LockEvent::HandedOff {
                    from: SessionId::new(1),
                    to: SessionId::new(2),
                    name: name("db"),
                }
        });
        assert!(handed_off);
    }

    #[tokio::test]
    async fn test_relock_by_holder_is_granted_without_change() {
        let (mut actor, _) = create_actor();
        let _alice = register(&mut actor, 1, "alice");

        execute(&mut actor, 1, ClientCommand::Lock(name("db"))).await.unwrap();
        let reply = execute(&mut actor, 1, ClientCommand::Lock(name("db"))).await;

        assert_eq!(reply, Ok(Some(ServerMessage::LockGranted(name("db")))));
        let Ok(Some(ServerMessage::Info(InfoBody::Found(info)))) =
            execute(&mut actor, 1, ClientCommand::Info(name("db"))).await
        else {
            panic!("expected INFO");
        };
        assert!(info.waiters.is_empty());
    }

    #[tokio::test]
    async fn test_release_by_non_holder_is_denied() {
        let (mut actor, _) = create_actor();
        let _alice = register(&mut actor, 1, "alice");
        let _bob = register(&mut actor, 2, "bob");
        execute(&mut actor, 1, ClientCommand::Lock(name("db"))).await.unwrap();

        let reply = execute(&mut actor, 2, ClientCommand::Release(name("db"))).await;
        assert_eq!(reply, Ok(Some(ServerMessage::ReleaseDenied(name("db")))));

        let reply = execute(&mut actor, 2, ClientCommand::Release(name("ghost"))).await;
        assert_eq!(reply, Ok(Some(ServerMessage::ReleaseDenied(name("ghost")))));

        let Ok(Some(ServerMessage::List(rows))) =
            execute(&mut actor, 2, ClientCommand::List).await
        else {
            panic!("expected LIST");
        };
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].holder.as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn test_info_does_not_create_semaphore() {
        let (mut actor, _) = create_actor();
        let _alice = register(&mut actor, 1, "alice");

        let reply = execute(&mut actor, 1, ClientCommand::Info(name("nonexistent"))).await;
        assert_eq!(
            reply,
            Ok(Some(ServerMessage::Info(InfoBody::NotFound(name("nonexistent")))))
        );

        let reply = execute(&mut actor, 1, ClientCommand::List).await;
        assert_eq!(reply, Ok(Some(ServerMessage::List(Vec::new()))));
    }

    #[tokio::test]
    async fn test_pong_has_no_reply_and_is_not_counted() {
        let (mut actor, _) = create_actor();
        let _alice = register(&mut actor, 1, "alice");

        assert_eq!(execute(&mut actor, 1, ClientCommand::Pong).await, Ok(None));
        let reply = execute(
            &mut actor,
            1,
            ClientCommand::Identify(Username::new("again").unwrap()),
        )
        .await;
        assert_eq!(
            reply,
            Ok(Some(ServerMessage::Error("already identified".to_string())))
        );
        execute(&mut actor, 1, ClientCommand::Help).await.unwrap();

        let (tx, rx) = oneshot::channel();
        actor.handle_command(RegistryCommand::Stats { respond_to: tx });
        let stats = rx.await.unwrap();
        assert_eq!(stats.commands_processed, 1);
        assert_eq!(stats.active_sessions, 1);
    }

    #[tokio::test]
    async fn test_disconnect_transfers_held_semaphores() {
        let (mut actor, mut events) = create_actor();
        let _alice = register(&mut actor, 1, "alice");
        let mut bob = register(&mut actor, 2, "bob");
        execute(&mut actor, 1, ClientCommand::Lock(name("db"))).await.unwrap();
        execute(&mut actor, 2, ClientCommand::Lock(name("db"))).await.unwrap();
        execute(&mut actor, 1, ClientCommand::Lock(name("cache"))).await.unwrap();
        while events.try_recv().is_ok() {}

        assert!(disconnect(&mut actor, 1, DisconnectReason::PeerClosed).await);

        assert_eq!(bob.try_recv().unwrap(), ServerMessage::LockGranted(name("db")));
        assert_eq!(actor.session_count(), 1);
        assert_eq!(actor.semaphores.held_count(), 1);

        let collected: Vec<LockEvent> = std::iter::from_fn(|| events.try_recv().ok()).collect();
        assert!(collected.contains(&LockEvent::Released {
            session: SessionId::new(1),
            name: name("cache"),
        }));
        assert_eq!(
            collected.last(),
            Some(&LockEvent::SessionClosed {
                session: SessionId::new(1),
                reason: DisconnectReason::PeerClosed,
            })
        );

        // Second disconnect is a no-op
        assert!(!disconnect(&mut actor, 1, DisconnectReason::PeerClosed).await);
    }

    #[tokio::test]
    async fn test_disconnect_removes_waiter_from_queues() {
        let (mut actor, _) = create_actor();
        let mut alice = register(&mut actor, 1, "alice");
        let _bob = register(&mut actor, 2, "bob");
        let _carol = register(&mut actor, 3, "carol");
        execute(&mut actor, 1, ClientCommand::Lock(name("db"))).await.unwrap();
        execute(&mut actor, 2, ClientCommand::Lock(name("db"))).await.unwrap();
        execute(&mut actor, 3, ClientCommand::Lock(name("db"))).await.unwrap();

        assert!(disconnect(&mut actor, 2, DisconnectReason::ConnectionError).await);

        let Ok(Some(ServerMessage::Info(InfoBody::Found(info)))) =
            execute(&mut actor, 1, ClientCommand::Info(name("db"))).await
        else {
            panic!("expected INFO");
        };
        assert_eq!(info.holder.as_deref(), Some("alice"));
        assert_eq!(info.waiters, vec!["carol".to_string()]);
        assert!(alice.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_failed_handoff_leaves_semaphore_free() {
        let (mut actor, mut events) = create_actor();
        let _alice = register(&mut actor, 1, "alice");
        let bob = register(&mut actor, 2, "bob");
        let _carol = register(&mut actor, 3, "carol");
        execute(&mut actor, 1, ClientCommand::Lock(name("db"))).await.unwrap();
        execute(&mut actor, 2, ClientCommand::Lock(name("db"))).await.unwrap();
        execute(&mut actor, 3, ClientCommand::Lock(name("db"))).await.unwrap();
        drop(bob);
        while events.try_recv().is_ok() {}

        execute(&mut actor, 1, ClientCommand::Release(name("db"))).await.unwrap();

        assert_eq!(
            events.try_recv().unwrap(),
            LockEvent::HandoffFailed {
                from: SessionId::new(1),
                to: SessionId::new(2),
                name: name("db"),
            }
        );
        let Ok(Some(ServerMessage::Info(InfoBody::Found(info)))) =
            execute(&mut actor, 1, ClientCommand::Info(name("db"))).await
        else {
            panic!("expected INFO");
        };
        assert_eq!(info.holder, None);
        assert_eq!(info.waiters, vec!["carol".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_heartbeat_evicts_silent_sessions() {
        let (mut actor, _) = create_actor();
        let mut chatty = register(&mut actor, 1, "chatty");
        let mut silent = register(&mut actor, 2, "silent");
        execute(&mut actor, 2, ClientCommand::Lock(name("db"))).await.unwrap();
        execute(&mut actor, 1, ClientCommand::Lock(name("db"))).await.unwrap();

        tokio::time::advance(Duration::from_secs(20)).await;
        actor.handle_command(RegistryCommand::Touch {
            session: SessionId::new(1),
        });
        tokio::time::advance(Duration::from_secs(11)).await;

        actor.handle_command(RegistryCommand::Heartbeat);

        assert_eq!(actor.session_count(), 1);
        assert_eq!(chatty.try_recv().unwrap(), ServerMessage::Ping);
        assert_eq!(chatty.try_recv().unwrap(), ServerMessage::LockGranted(name("db")));

        // The evicted session got its probe, then its channel was closed.
        assert_eq!(silent.try_recv().unwrap(), ServerMessage::Ping);
        assert!(matches!(
            silent.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_heartbeat_evicts_unreachable_sessions() {
        let (mut actor, mut events) = create_actor();
        let gone = register(&mut actor, 1, "gone");
        drop(gone);
        while events.try_recv().is_ok() {}

        actor.handle_command(RegistryCommand::Heartbeat);

        assert_eq!(actor.session_count(), 0);
        assert_eq!(
            events.try_recv().unwrap(),
            LockEvent::SessionClosed {
                session: SessionId::new(1),
                reason: DisconnectReason::ProbeFailed,
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_hold_time_and_uptime_follow_clock() {
        let (mut actor, _) = create_actor();
        let _alice = register(&mut actor, 1, "alice");
        execute(&mut actor, 1, ClientCommand::Lock(name("db"))).await.unwrap();

        tokio::time::advance(Duration::from_secs(5)).await;

        let Ok(Some(ServerMessage::Info(InfoBody::Found(info)))) =
            execute(&mut actor, 1, ClientCommand::Info(name("db"))).await
        else {
            panic!("expected INFO");
        };
        assert_eq!(info.held_for_secs, Some(5));

        let Ok(Some(ServerMessage::Stats(stats))) =
            execute(&mut actor, 1, ClientCommand::Stats).await
        else {
            panic!("expected STATS");
        };
        assert_eq!(stats.uptime.as_secs(), 5);
        assert_eq!(stats.semaphores_created, 1);
        assert_eq!(stats.active_semaphores, 1);
    }
}
