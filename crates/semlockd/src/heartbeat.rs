//! Heartbeat monitor.
//!
//! A ticker task asks the registry for a sweep every interval. The sweep
//! itself runs inside the registry actor: it probes each session with `PING`
//! and evicts sessions that are unreachable or silent past the deadline.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::registry::RegistryHandle;

/// Default time between sweeps.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(10);

/// Default maximum silence before eviction.
pub const DEFAULT_LIVENESS_DEADLINE: Duration = Duration::from_secs(30);

/// Heartbeat timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeartbeatConfig {
    pub interval: Duration,
    pub deadline: Duration,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_HEARTBEAT_INTERVAL,
            deadline: DEFAULT_LIVENESS_DEADLINE,
        }
    }
}

/// Spawn the ticker that triggers heartbeat sweeps.
///
/// The first sweep happens one full interval after start. The task exits
/// when `cancel` fires or the registry is gone.
pub fn spawn_heartbeat(
    registry: RegistryHandle,
    period: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(interval_secs = period.as_secs(), "Heartbeat monitor started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Heartbeat monitor stopping: shutdown requested");
                    break;
                }
                _ = ticker.tick() => {
                    if !registry.heartbeat().await {
                        // Channel closed, actor stopped
                        debug!("Heartbeat monitor stopping: registry channel closed");
                        break;
                    }
                    debug!("Triggered heartbeat sweep");
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RegistryCommand;
    use tokio::sync::{broadcast, mpsc};

    fn create_test_handle() -> (RegistryHandle, mpsc::Receiver<RegistryCommand>) {
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let (event_tx, _) = broadcast::channel(16);
        (RegistryHandle::new(cmd_tx, event_tx), cmd_rx)
    }

    #[test]
    fn test_default_timing() {
        let config = HeartbeatConfig::default();
        assert_eq!(config.interval, Duration::from_secs(10));
        assert_eq!(config.deadline, Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_once_per_interval() {
        let (handle, mut rx) = create_test_handle();
        let cancel = CancellationToken::new();
        let _task = spawn_heartbeat(handle, Duration::from_secs(10), cancel.clone());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert!(matches!(rx.try_recv(), Ok(RegistryCommand::Heartbeat)));
        assert!(rx.try_recv().is_err());

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(matches!(rx.try_recv(), Ok(RegistryCommand::Heartbeat)));

        cancel.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_on_cancel() {
        let (handle, _rx) = create_test_handle();
        let cancel = CancellationToken::new();
        let task = spawn_heartbeat(handle, Duration::from_secs(10), cancel.clone());

        cancel.cancel();

        assert!(task.await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_when_registry_gone() {
        let (handle, rx) = create_test_handle();
        drop(rx);
        let task = spawn_heartbeat(handle, Duration::from_secs(1), CancellationToken::new());

        assert!(task.await.is_ok());
    }
}
