//! Protocol errors.
//!
//! The `Display` text of each variant is sent verbatim after `ERROR `.

use semlock_core::DomainError;
use thiserror::Error;

/// Errors produced while parsing client lines.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("empty command")]
    EmptyLine,

    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("{command} expects {expected} argument(s), got {got}")]
    WrongArity {
        command: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("expected USERNAME <name> as first message")]
    ExpectedUsername,

    #[error("already identified")]
    AlreadyIdentified,

    #[error("line too long (max {max} bytes)")]
    LineTooLong { max: usize },

    #[error("{0}")]
    Domain(#[from] DomainError),
}
