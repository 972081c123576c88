//! semlock Daemon - Named semaphore coordination server
//!
//! Clients connect over TCP, identify with `USERNAME <name>`, and then lock,
//! release and inspect named semaphores.
//!
//! # Usage
//!
//! ```bash
//! # Start on the default address (localhost:12345)
//! semlockd
//!
//! # Custom address and heartbeat timing
//! semlockd --host 0.0.0.0 --port 7000 --heartbeat-interval 5 --liveness-deadline 15
//!
//! # Mirror logs into a daily rotating file
//! SEMLOCK_LOG_DIR=/var/log/semlock semlockd
//!
//! # Enable debug logging
//! RUST_LOG=semlockd=debug semlockd
//! ```
//!
//! # Signal Handling
//!
//! - SIGTERM/SIGINT: Graceful shutdown

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;

use semlockd::config::{DaemonConfig, Overrides};
use semlockd::recorder::spawn_event_recorder;
use semlockd::registry::spawn_registry;
use semlockd::server::DaemonServer;

/// Filter used when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "semlockd=info,semlock_core=info,semlock_protocol=info";

/// Prefix of the daily log file; the date is appended.
const LOG_FILE_PREFIX: &str = "semlockd.log";

/// semlock daemon - named semaphore coordination server
#[derive(Parser, Debug)]
#[command(name = "semlockd", version, about)]
struct Args {
    /// Host to listen on [default: localhost]
    #[arg(long, env = "SEMLOCK_HOST")]
    host: Option<String>,

    /// Port to listen on [default: 12345]
    #[arg(short, long, env = "SEMLOCK_PORT")]
    port: Option<u16>,

    /// Seconds between heartbeat sweeps [default: 10]
    #[arg(long, value_name = "SECS")]
    heartbeat_interval: Option<u64>,

    /// Seconds of silence before a session is evicted [default: 30]
    #[arg(long, value_name = "SECS")]
    liveness_deadline: Option<u64>,

    /// Directory for the daily rotating log file
    #[arg(long, env = "SEMLOCK_LOG_DIR")]
    log_dir: Option<PathBuf>,

    /// Path to the TOML config file
    #[arg(short, long, env = "SEMLOCK_CONFIG")]
    config: Option<PathBuf>,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            host: self.host.clone(),
            port: self.port,
            heartbeat_interval_secs: self.heartbeat_interval,
            liveness_deadline_secs: self.liveness_deadline,
            log_dir: self.log_dir.clone(),
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = DaemonConfig::load(args.config.as_deref(), args.overrides())
        .context("Failed to load configuration")?;

    run_daemon(config)
}

/// Installs the console logger and, with a log directory, the daily file.
///
/// The returned guard flushes the file writer when dropped and must be held
/// for the life of the process.
fn init_logging(log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .init();

    Ok(guard)
}

/// Runs the daemon (async entry point).
#[tokio::main]
async fn run_daemon(config: DaemonConfig) -> Result<()> {
    let _log_guard = init_logging(config.log_dir.as_deref())?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        pid = process::id(),
        "semlock daemon starting"
    );

    // Create cancellation token for graceful shutdown
    let cancel_token = CancellationToken::new();

    // Setup signal handlers
    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        if let Err(e) = wait_for_shutdown_signal().await {
            error!(error = %e, "Error waiting for shutdown signal");
        }
        info!("Shutdown signal received");
        shutdown_token.cancel();
    });

    let registry = spawn_registry(config.heartbeat, cancel_token.clone());
    let _recorder = spawn_event_recorder(registry.subscribe(), cancel_token.clone());
    info!(
        heartbeat_interval_secs = config.heartbeat.interval.as_secs(),
        liveness_deadline_secs = config.heartbeat.deadline.as_secs(),
        "Semaphore registry started"
    );

    let addr = config.listen_addr();
    let server = match DaemonServer::bind(&addr, registry, cancel_token.clone()).await {
        Ok(server) => server,
        Err(e) => {
            error!(error = %e, "Server error");
            return Err(e.into());
        }
    };

    if let Err(e) = server.run().await {
        // Connected sessions keep working until shutdown
        error!(error = %e, "Accept loop stopped");
        cancel_token.cancelled().await;
        server.drain().await;
    }

    info!("semlock daemon stopped");
    Ok(())
}

/// Waits for a shutdown signal (SIGTERM or SIGINT).
async fn wait_for_shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;

        tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM");
            }
            _ = sigint.recv() => {
                info!("Received SIGINT");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        info!("Received Ctrl+C");
    }

    Ok(())
}
