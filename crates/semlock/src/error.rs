//! Error types for the semlock client.
//!
//! **Panic-Free Policy:** No `.unwrap()`, `.expect()`, `panic!()`,
//! `unreachable!()`, or `todo!()` in this module.

use std::io;

use semlock_core::DomainError;
use thiserror::Error;
use tokio_util::codec::LinesCodecError;

/// Errors raised by the interactive client.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The daemon could not be reached.
    ///
    /// Usually the daemon is not running, or is listening elsewhere.
    #[error("Failed to connect to {addr}: {source}. Is semlockd running?")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// The username given or typed at the prompt is unusable.
    #[error("Invalid username: {0}")]
    Username(#[from] DomainError),

    /// Input ended before a username was entered.
    #[error("No username entered")]
    NoUsername,

    /// A line from the server or the terminal exceeded the length limit.
    #[error("Line too long")]
    LineTooLong,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl From<LinesCodecError> for ClientError {
    fn from(err: LinesCodecError) -> Self {
        match err {
            LinesCodecError::MaxLineLengthExceeded => Self::LineTooLong,
            LinesCodecError::Io(e) => Self::Io(e),
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
