//! semlock Protocol - Line-oriented wire protocol
//!
//! Every message is one or more newline-terminated lines of text. Clients
//! send one command per line; the server answers with a single line or a
//! marker line followed by a body and a blank line.
//!
//! - `command` - `parse_handshake` and `ClientCommand` parsing of client lines
//! - `message` - server responses and their wire rendering
//! - `error` - `ProtocolError`, whose text becomes the `ERROR` description

pub mod command;
pub mod error;
pub mod message;

pub use command::{parse_handshake, ClientCommand};
pub use error::ProtocolError;
pub use message::{InfoBody, ServerMessage, HELP_LINES};

/// Default host the daemon listens on and clients connect to.
pub const DEFAULT_HOST: &str = "localhost";

/// Default TCP port.
pub const DEFAULT_PORT: u16 = 12345;

/// Longest accepted inbound line in bytes, excluding the newline.
pub const MAX_LINE_LENGTH: usize = 4096;

/// Unsolicited liveness probe sent by the server.
pub const PING: &str = "PING";

/// Client reply to `PING`.
pub const PONG: &str = "PONG";
