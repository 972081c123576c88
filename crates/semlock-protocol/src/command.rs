//! Client command parsing.
//!
//! Keywords are case-insensitive; arguments are taken verbatim, so
//! semaphore names stay case-sensitive.

use std::fmt;

use semlock_core::{SemaphoreName, Username};

use crate::error::ProtocolError;

const USERNAME: &str = "USERNAME";

/// A well-formed command from an identified client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    Lock(SemaphoreName),
    Release(SemaphoreName),
    Info(SemaphoreName),
    List,
    Stats,
    Help,

    /// Reply to a server `PING`.
    Pong,

    /// A repeated identity line. Only valid as the first message.
    Identify(Username),
}

impl ClientCommand {
    /// Parses one line (without its newline).
    ///
    /// # Errors
    ///
    /// - `ProtocolError::EmptyLine` for blank input
    /// - `ProtocolError::UnknownCommand` for an unrecognised keyword
    /// - `ProtocolError::WrongArity` for a wrong argument count
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        let mut tokens = line.split_whitespace();
        let keyword = tokens.next().ok_or(ProtocolError::EmptyLine)?;
        let args: Vec<&str> = tokens.collect();

        match keyword.to_ascii_uppercase().as_str() {
            "LOCK" => Ok(Self::Lock(single_name("LOCK", &args)?)),
            "RELEASE" => Ok(Self::Release(single_name("RELEASE", &args)?)),
            "INFO" => Ok(Self::Info(single_name("INFO", &args)?)),
            "LIST" => no_args("LIST", &args).map(|()| Self::List),
            "STATS" => no_args("STATS", &args).map(|()| Self::Stats),
            "HELP" => no_args("HELP", &args).map(|()| Self::Help),
            "PONG" => no_args("PONG", &args).map(|()| Self::Pong),
            USERNAME => Ok(Self::Identify(username_from(line)?)),
            _ => Err(ProtocolError::UnknownCommand(keyword.to_string())),
        }
    }

    /// Whether this command counts towards "commands processed".
    ///
    /// Heartbeat replies are protocol plumbing and a repeated identity line
    /// is a protocol error, so neither counts.
    pub fn is_user_command(&self) -> bool {
        !matches!(self, Self::Pong | Self::Identify(_))
    }
}

impl fmt::Display for ClientCommand {
    /// Renders the command as a wire line (without newline).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lock(name) => write!(f, "LOCK {name}"),
            Self::Release(name) => write!(f, "RELEASE {name}"),
            Self::Info(name) => write!(f, "INFO {name}"),
            Self::List => write!(f, "LIST"),
            Self::Stats => write!(f, "STATS"),
            Self::Help => write!(f, "HELP"),
            Self::Pong => write!(f, "PONG"),
            Self::Identify(username) => write!(f, "{USERNAME} {username}"),
        }
    }
}

/// Parses the mandatory first line of a connection.
///
/// The username is the rest of the line after the keyword, trimmed, so it
/// may contain spaces.
///
/// # Errors
///
/// - `ProtocolError::ExpectedUsername` if the line is not a `USERNAME` line
/// - `ProtocolError::Domain` if the username is blank
pub fn parse_handshake(line: &str) -> Result<Username, ProtocolError> {
    let keyword = line.split_whitespace().next().unwrap_or_default();
    if !keyword.eq_ignore_ascii_case(USERNAME) {
        return Err(ProtocolError::ExpectedUsername);
    }
    username_from(line)
}

/// Takes everything after the first token as the username.
fn username_from(line: &str) -> Result<Username, ProtocolError> {
    let trimmed = line.trim_start();
    let rest = trimmed
        .split_once(char::is_whitespace)
        .map(|(_, rest)| rest)
        .unwrap_or_default();
    Ok(Username::new(rest)?)
}

fn single_name(command: &'static str, args: &[&str]) -> Result<SemaphoreName, ProtocolError> {
    match args {
        [name] => Ok(SemaphoreName::new(*name)?),
        _ => Err(ProtocolError::WrongArity {
            command,
            expected: 1,
            got: args.len(),
        }),
    }
}

fn no_args(command: &'static str, args: &[&str]) -> Result<(), ProtocolError> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(ProtocolError::WrongArity {
            command,
            expected: 0,
            got: args.len(),
        })
    }
}
