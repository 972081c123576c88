//! semlock - Interactive client for the semlock daemon
//!
//! - `client` - connection, username prompt and the interactive session loop
//! - `error` - `ClientError`

pub mod client;
pub mod error;

pub use client::{connect, prompt_username, Input, Session, SessionEnd};
pub use error::{ClientError, Result};
