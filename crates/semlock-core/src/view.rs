//! Read-only snapshots of registry state.
//!
//! These are what INFO, LIST and STATS render. They carry usernames rather
//! than session ids, resolved at snapshot time, so they stay meaningful after
//! the sessions they mention disconnect.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::semaphore::SemaphoreName;

/// Detailed view of one semaphore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemaphoreInfo {
    pub name: SemaphoreName,

    /// Holder's username, `None` when free.
    pub holder: Option<String>,

    /// Whole seconds the current holder has held the semaphore.
    pub held_for_secs: Option<u64>,

    /// Wall-clock time the current holder acquired the semaphore.
    pub acquired_at: Option<DateTime<Utc>>,

    /// Waiting usernames, longest waiter first.
    pub waiters: Vec<String>,
}

impl SemaphoreInfo {
    pub fn queue_len(&self) -> usize {
        self.waiters.len()
    }
}

/// One row of the semaphore listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemaphoreSummary {
    pub name: SemaphoreName,
    pub holder: Option<String>,
    pub queue_len: usize,
}

/// Process-wide counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    pub uptime: Duration,
    pub active_sessions: usize,
    pub commands_processed: u64,
    pub semaphores_created: usize,

    /// Semaphores that currently have a holder.
    pub active_semaphores: usize,
}

/// Formats a duration as `H:MM:SS`. Hours are not wrapped at 24.
pub fn format_uptime(uptime: Duration) -> String {
    let total = uptime.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    format!("{hours}:{minutes:02}:{seconds:02}")
}
