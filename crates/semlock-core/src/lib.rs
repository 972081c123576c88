//! semlock Core - Shared types for named semaphore coordination
//!
//! This crate provides the domain types shared between the server
//! (semlockd), the wire protocol, and the interactive client:
//! - `session` - session identity (`SessionId`, `Username`)
//! - `semaphore` - the semaphore table and its FIFO handoff algorithm
//! - `view` - read-only snapshots rendered by INFO/LIST/STATS
//!
//! All code follows the panic-free policy: no `.unwrap()`, `.expect()`,
//! `panic!()`, `unreachable!()`, `todo!()`, or direct indexing `[i]`.

pub mod error;
pub mod semaphore;
pub mod session;
pub mod view;

// Re-exports for convenience
pub use error::{DomainError, DomainResult};
pub use semaphore::{
    AcquireOutcome, Grant, GrantNotifier, Handoff, PurgeReport, ReleaseOutcome, Semaphore,
    SemaphoreName, SemaphoreTable, Timestamp,
};
pub use session::{SessionId, Username};
pub use view::{format_uptime, SemaphoreInfo, SemaphoreSummary, StatsSnapshot};
