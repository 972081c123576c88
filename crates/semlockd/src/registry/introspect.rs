//! Read-only views over the registry for INFO, LIST and STATS.
//!
//! Pure functions: they compose the semaphore table, the session directory
//! and the global counters into snapshots and never mutate anything.

use std::time::Instant;

use semlock_core::{
    SemaphoreInfo, SemaphoreName, SemaphoreSummary, SemaphoreTable, StatsSnapshot,
};
use semlock_protocol::InfoBody;

use super::directory::SessionDirectory;

/// Process-wide counters that are not derivable from the table or directory.
#[derive(Debug, Clone, Copy)]
pub struct GlobalStats {
    pub started_at: Instant,
    pub commands_processed: u64,
}

impl GlobalStats {
    pub fn new(started_at: Instant) -> Self {
        Self {
            started_at,
            commands_processed: 0,
        }
    }

    pub fn record_command(&mut self) {
        self.commands_processed = self.commands_processed.saturating_add(1);
    }
}

/// Describes one semaphore, or reports it missing without creating it.
pub fn describe(
    table: &SemaphoreTable,
    sessions: &SessionDirectory,
    name: &SemaphoreName,
    now: Instant,
) -> InfoBody {
    let Some(semaphore) = table.get(name) else {
        return InfoBody::NotFound(name.clone());
    };

    let grant = semaphore.grant();
    InfoBody::Found(SemaphoreInfo {
        name: name.clone(),
        holder: grant.map(|g| sessions.resolve_username(g.holder)),
        held_for_secs: semaphore.hold_duration(now).map(|d| d.as_secs()),
        acquired_at: grant.map(|g| g.acquired.wall),
        waiters: semaphore
            .waiters()
            .map(|waiter| sessions.resolve_username(waiter))
            .collect(),
    })
}

/// Lists every semaphore in first-reference order.
pub fn list(table: &SemaphoreTable, sessions: &SessionDirectory) -> Vec<SemaphoreSummary> {
    table
        .iter()
        .map(|semaphore| SemaphoreSummary {
            name: semaphore.name().clone(),
            holder: semaphore
                .holder()
                .map(|holder| sessions.resolve_username(holder)),
            queue_len: semaphore.queue_len(),
        })
        .collect()
}

pub fn stats(
    table: &SemaphoreTable,
    sessions: &SessionDirectory,
    counters: &GlobalStats,
    now: Instant,
) -> StatsSnapshot {
    StatsSnapshot {
        uptime: now.saturating_duration_since(counters.started_at),
        active_sessions: sessions.len(),
        commands_processed: counters.commands_processed,
        semaphores_created: table.len(),
        active_semaphores: table.held_count(),
    }
}
