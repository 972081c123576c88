//! semlock - Type lock commands at a semlock daemon
//!
//! # Usage
//!
//! ```text
//! semlock --username alice
//! semlock --host lockserver --port 7000    # prompts for a username
//! ```
//!
//! Each typed line is sent as one command. Server heartbeats are answered
//! automatically. `EXIT`, Ctrl+D or Ctrl+C ends the session.

use std::io;

use anyhow::{Context, Result};
use clap::Parser;
use semlock::{connect, prompt_username, Session, SessionEnd};
use semlock_core::Username;
use semlock_protocol::{DEFAULT_HOST, DEFAULT_PORT, MAX_LINE_LENGTH};
use tokio_util::codec::{FramedRead, LinesCodec};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Logging stays quiet unless `RUST_LOG` asks for more.
const DEFAULT_LOG_FILTER: &str = "warn";

/// semlock - interactive client for the semlock daemon
#[derive(Parser, Debug)]
#[command(name = "semlock", version, about)]
struct Args {
    /// Daemon host
    #[arg(long, env = "SEMLOCK_HOST", default_value = DEFAULT_HOST)]
    host: String,

    /// Daemon port
    #[arg(short, long, env = "SEMLOCK_PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Name shown to other clients; prompted for when omitted
    #[arg(short, long)]
    username: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(io::stderr)
        .init();

    let mut input = FramedRead::new(
        tokio::io::stdin(),
        LinesCodec::new_with_max_length(MAX_LINE_LENGTH),
    );
    let mut output = tokio::io::stdout();

    let username = match args.username {
        Some(raw) => Username::new(raw).context("Invalid --username")?,
        None => prompt_username(&mut input, &mut output).await?,
    };

    let addr = format!("{}:{}", args.host, args.port);
    let stream = connect(&addr).await?;
    let (reader, writer) = stream.into_split();
    let session = Session::open(reader, writer, &username)
        .await
        .context("Failed to send handshake")?;

    eprintln!("Connected to {addr} as {username}. Type HELP for commands, EXIT to quit.");

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt.cancel();
        }
    });

    let end = session.run(&mut input, &mut output, cancel).await?;
    debug!(?end, "Session ended");
    if end == SessionEnd::ServerClosed {
        eprintln!("Connection closed by server");
    }

    Ok(())
}
