//! Server-to-client messages.
//!
//! Single-line messages render as one line. Multi-line responses render as
//! a marker line (`INFO_RESPONSE`, `LIST_RESPONSE`, ...), the body lines,
//! and a terminating blank line.

use semlock_core::{format_uptime, SemaphoreInfo, SemaphoreName, SemaphoreSummary, StatsSnapshot};

use crate::PING;

/// Body of the `HELP_RESPONSE`.
pub const HELP_LINES: &[&str] = &[
    "LOCK <name>     acquire a semaphore, or queue for it",
    "RELEASE <name>  release a semaphore you hold",
    "INFO <name>     show holder, hold time and queue of a semaphore",
    "LIST            list all semaphores",
    "STATS           show server statistics",
    "HELP            show this help",
    "EXIT            disconnect (client side)",
];

/// Result of an INFO lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InfoBody {
    Found(SemaphoreInfo),
    NotFound(SemaphoreName),
}

/// Messages sent from the server to a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    LockGranted(SemaphoreName),
    LockDenied { name: SemaphoreName, position: usize },
    ReleaseOk(SemaphoreName),
    ReleaseDenied(SemaphoreName),
    Error(String),
    Info(InfoBody),
    List(Vec<SemaphoreSummary>),
    Stats(StatsSnapshot),
    Help,

    /// Unsolicited liveness probe.
    Ping,
}

impl ServerMessage {
    /// Creates an error message from anything printable.
    pub fn error(description: impl std::fmt::Display) -> Self {
        Self::Error(description.to_string())
    }

    /// Renders the message as wire text, newline-terminated.
    pub fn render(&self) -> String {
        match self {
            Self::LockGranted(name) => format!("LOCK_GRANTED {name}\n"),
            Self::LockDenied { name, position } => {
                format!("LOCK_DENIED {name} (position {position})\n")
            }
            Self::ReleaseOk(name) => format!("RELEASE_OK {name}\n"),
            Self::ReleaseDenied(name) => format!("RELEASE_DENIED {name}\n"),
            Self::Error(description) => format!("ERROR {description}\n"),
            Self::Ping => format!("{PING}\n"),
            Self::Info(body) => multi_line("INFO_RESPONSE", info_lines(body)),
            Self::List(rows) => multi_line("LIST_RESPONSE", list_lines(rows)),
            Self::Stats(stats) => multi_line("STATS_RESPONSE", stats_lines(stats)),
            Self::Help => multi_line(
                "HELP_RESPONSE",
                HELP_LINES.iter().map(|line| (*line).to_string()).collect(),
            ),
        }
    }
}

fn multi_line(marker: &str, body: Vec<String>) -> String {
    let mut out = String::with_capacity(marker.len() + 1 + body.len() * 32 + 1);
    out.push_str(marker);
    out.push('\n');
    for line in body {
        out.push_str(&line);
        out.push('\n');
    }
    out.push('\n');
    out
}

fn info_lines(body: &InfoBody) -> Vec<String> {
    let info = match body {
        InfoBody::Found(info) => info,
        InfoBody::NotFound(name) => return vec![format!("Semaphore '{name}' not found")],
    };

    let mut lines = vec![
        format!("Semaphore: {}", info.name),
        format!("Holder: {}", info.holder.as_deref().unwrap_or("none")),
    ];
    if let Some(secs) = info.held_for_secs {
        lines.push(format!("Held for: {secs}s"));
    }
    if let Some(at) = info.acquired_at {
        lines.push(format!(
            "Acquired at: {}",
            at.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
        ));
    }
    lines.push(format!("Queue length: {}", info.queue_len()));
    if info.waiters.is_empty() {
        lines.push("Queue: (empty)".to_string());
    } else {
        lines.push(format!("Queue: {}", info.waiters.join(", ")));
    }
    lines
}

fn list_lines(rows: &[SemaphoreSummary]) -> Vec<String> {
    if rows.is_empty() {
        return vec!["(no semaphores)".to_string()];
    }
    rows.iter()
        .map(|row| {
            format!(
                "{}: holder={} queue={}",
                row.name,
                row.holder.as_deref().unwrap_or("free"),
                row.queue_len
            )
        })
        .collect()
}

fn stats_lines(stats: &StatsSnapshot) -> Vec<String> {
    vec![
        format!("Uptime: {}", format_uptime(stats.uptime)),
        format!("Active sessions: {}", stats.active_sessions),
        format!("Commands processed: {}", stats.commands_processed),
        format!("Semaphores created: {}", stats.semaphores_created),
        format!("Active semaphores: {}", stats.active_semaphores),
    ]
}
