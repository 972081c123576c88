//! Named semaphores and the table that owns them.
//!
//! A semaphore here is a named mutex: at most one holder, plus a FIFO queue
//! of sessions waiting for the holder slot. Releasing and disconnecting share
//! one relinquish path so graceful and abrupt exits hand off identically.
//!
//! The table never talks to the network. Waking the next waiter goes through
//! the [`GrantNotifier`] seam, which the server implements over its
//! per-session outbound channels.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::{DomainError, DomainResult};
use crate::session::SessionId;

// ============================================================================
// Value Objects
// ============================================================================

/// Name of a semaphore as sent on the wire. Case-sensitive, single token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SemaphoreName(String);

impl SemaphoreName {
    /// Creates a semaphore name.
    ///
    /// # Errors
    ///
    /// - `DomainError::EmptySemaphoreName` if `raw` is empty
    /// - `DomainError::WhitespaceInSemaphoreName` if `raw` contains whitespace
    pub fn new(raw: impl Into<String>) -> DomainResult<Self> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(DomainError::EmptySemaphoreName);
        }
        if raw.chars().any(char::is_whitespace) {
            return Err(DomainError::WhitespaceInSemaphoreName { name: raw });
        }
        Ok(Self(raw))
    }

    /// Returns the underlying string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SemaphoreName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for SemaphoreName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A point in time carried as both a monotonic instant and a wall-clock time.
///
/// The instant drives hold-duration arithmetic; the wall-clock value is only
/// for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamp {
    pub at: Instant,
    pub wall: DateTime<Utc>,
}

impl Timestamp {
    pub fn new(at: Instant, wall: DateTime<Utc>) -> Self {
        Self { at, wall }
    }

    /// Captures the current time from the system clocks.
    pub fn now() -> Self {
        Self::new(Instant::now(), Utc::now())
    }
}

/// Ownership of a semaphore by one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grant {
    pub holder: SessionId,
    pub acquired: Timestamp,
}

// ============================================================================
// Grant Notification Seam
// ============================================================================

/// Delivers ownership to a session that was waiting in a queue.
///
/// Implementations must not block: the table calls this from inside the
/// registry's critical section.
pub trait GrantNotifier {
    /// Tells `session` it now holds `name`.
    ///
    /// Returns `false` if the session can no longer be reached.
    fn notify_granted(&mut self, session: SessionId, name: &SemaphoreName) -> bool;
}

// ============================================================================
// Operation Outcomes
// ============================================================================

/// Result of a lock request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireOutcome {
    /// The semaphore was free and now belongs to the caller.
    Granted,

    /// The caller already holds the semaphore; nothing changed.
    AlreadyHeld,

    /// The caller was appended to the wait queue at this 1-based position.
    Queued { position: usize },
}

/// What happened to the holder slot when its holder let go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handoff {
    /// Nobody was waiting; the semaphore is free.
    Freed,

    /// The longest waiter became the holder and was notified.
    Transferred(SessionId),

    /// The longest waiter was dequeued but could not be notified, so the
    /// semaphore is free. Later waiters are not tried.
    Failed(SessionId),
}

/// Result of a release request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// The caller held the semaphore and no longer does.
    Released(Handoff),

    /// The caller is not the holder; nothing changed.
    Denied,
}

/// Everything a session purge changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PurgeReport {
    /// Semaphores the purged session held, with what became of each.
    pub handoffs: Vec<(SemaphoreName, Handoff)>,

    /// Semaphores whose wait queue the purged session was removed from.
    pub dequeued_from: Vec<SemaphoreName>,
}

impl PurgeReport {
    /// Returns true if the purge touched nothing.
    pub fn is_empty(&self) -> bool {
        self.handoffs.is_empty() && self.dequeued_from.is_empty()
    }
}

// ============================================================================
// Semaphore
// ============================================================================

/// One named semaphore: optional holder plus FIFO wait queue.
///
/// Invariant: `grant` is `Some` exactly when the semaphore is held, so the
/// acquisition time cannot outlive the holder.
#[derive(Debug, Clone)]
pub struct Semaphore {
    name: SemaphoreName,
    grant: Option<Grant>,
    queue: VecDeque<SessionId>,
}

impl Semaphore {
    fn new(name: SemaphoreName) -> Self {
        Self {
            name,
            grant: None,
            queue: VecDeque::new(),
        }
    }

    pub fn name(&self) -> &SemaphoreName {
        &self.name
    }

    /// Returns the current holder, if any.
    pub fn holder(&self) -> Option<SessionId> {
        self.grant.map(|g| g.holder)
    }

    /// Returns the current grant (holder and acquisition time), if any.
    pub fn grant(&self) -> Option<&Grant> {
        self.grant.as_ref()
    }

    pub fn is_held(&self) -> bool {
        self.grant.is_some()
    }

    /// Waiting sessions, longest waiter first.
    pub fn waiters(&self) -> impl Iterator<Item = SessionId> + '_ {
        self.queue.iter().copied()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// How long the current holder has held the semaphore.
    pub fn hold_duration(&self, now: Instant) -> Option<Duration> {
        self.grant
            .map(|g| now.saturating_duration_since(g.acquired.at))
    }

    fn acquire(&mut self, session: SessionId, now: Timestamp) -> AcquireOutcome {
        match self.grant {
            None => {
                self.grant = Some(Grant {
                    holder: session,
                    acquired: now,
                });
                AcquireOutcome::Granted
            }
            Some(grant) if grant.holder == session => AcquireOutcome::AlreadyHeld,
            Some(_) => {
                self.queue.push_back(session);
                AcquireOutcome::Queued {
                    position: self.queue.len(),
                }
            }
        }
    }

    /// Gives up the holder slot, handing it to the longest waiter.
    ///
    /// A waiter that cannot be notified leaves the semaphore free; the next
    /// waiter stays queued.
    fn relinquish(&mut self, now: Timestamp, notifier: &mut impl GrantNotifier) -> Handoff {
        match self.queue.pop_front() {
            Some(next) => {
                self.grant = Some(Grant {
                    holder: next,
                    acquired: now,
                });
                if notifier.notify_granted(next, &self.name) {
                    Handoff::Transferred(next)
                } else {
                    self.grant = None;
                    Handoff::Failed(next)
                }
            }
            None => {
                self.grant = None;
                Handoff::Freed
            }
        }
    }

    /// Removes every queue occurrence of `session`; returns true if any.
    fn dequeue_all(&mut self, session: SessionId) -> bool {
        let before = self.queue.len();
        self.queue.retain(|waiter| *waiter != session);
        self.queue.len() != before
    }
}

// ============================================================================
// Semaphore Table
// ============================================================================

/// All semaphores ever referenced, in first-reference order.
///
/// Entries are created lazily by `acquire` and never removed, so the number
/// of entries is also the number of semaphores ever created.
#[derive(Debug, Default)]
pub struct SemaphoreTable {
    /// Storage in insertion order.
    entries: Vec<Semaphore>,

    /// Index for name → position lookups.
    index: HashMap<SemaphoreName, usize>,
}

impl SemaphoreTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests ownership of `name` for `session`, creating the semaphore on
    /// first reference.
    pub fn acquire(
        &mut self,
        name: &SemaphoreName,
        session: SessionId,
        now: Timestamp,
    ) -> AcquireOutcome {
        if let Some(semaphore) = self.get_mut(name) {
            return semaphore.acquire(session, now);
        }

        let mut semaphore = Semaphore::new(name.clone());
        let outcome = semaphore.acquire(session, now);
        self.index.insert(name.clone(), self.entries.len());
        self.entries.push(semaphore);
        debug!(semaphore = %name, total = self.entries.len(), "Semaphore created");
        outcome
    }

    /// Releases `name` on behalf of `session`.
    ///
    /// Only the holder may release. An unknown semaphore is never held, so
    /// releasing it is denied without creating it.
    pub fn release(
        &mut self,
        name: &SemaphoreName,
        session: SessionId,
        now: Timestamp,
        notifier: &mut impl GrantNotifier,
    ) -> ReleaseOutcome {
        let Some(semaphore) = self.get_mut(name) else {
            return ReleaseOutcome::Denied;
        };
        if semaphore.holder() != Some(session) {
            return ReleaseOutcome::Denied;
        }
        ReleaseOutcome::Released(semaphore.relinquish(now, notifier))
    }

    /// Removes every trace of `session`: held semaphores are handed off and
    /// queue entries dropped. Calling it again for the same session is a
    /// no-op.
    pub fn purge_session(
        &mut self,
        session: SessionId,
        now: Timestamp,
        notifier: &mut impl GrantNotifier,
    ) -> PurgeReport {
        let mut report = PurgeReport::default();

        for semaphore in &mut self.entries {
            // Dequeue first so a handoff can never land on the purged session.
            if semaphore.dequeue_all(session) {
                report.dequeued_from.push(semaphore.name.clone());
            }
            if semaphore.holder() == Some(session) {
                let handoff = semaphore.relinquish(now, notifier);
                report.handoffs.push((semaphore.name.clone(), handoff));
            }
        }

        report
    }

    /// Looks up a semaphore without creating it.
    pub fn get(&self, name: &SemaphoreName) -> Option<&Semaphore> {
        self.index
            .get(name)
            .and_then(|&slot| self.entries.get(slot))
    }

    fn get_mut(&mut self, name: &SemaphoreName) -> Option<&mut Semaphore> {
        let slot = *self.index.get(name)?;
        self.entries.get_mut(slot)
    }

    /// All semaphores in first-reference order.
    pub fn iter(&self) -> impl Iterator<Item = &Semaphore> {
        self.entries.iter()
    }

    /// Number of semaphores ever created.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of semaphores that currently have a holder.
    pub fn held_count(&self) -> usize {
        self.entries.iter().filter(|s| s.is_held()).count()
    }
}
