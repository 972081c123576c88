//! Robustness tests for the semlock daemon.
//!
//! These tests verify that the daemon handles:
//! - Clients that stop answering heartbeat probes
//! - Lines split across several TCP writes
//! - Over-long lines and invalid UTF-8
//! - Rapid connect/disconnect cycles
//!
//! Tests CAN use `.unwrap()` and `.expect()`; the panic-free behaviour of
//! production code is checked through assertions.

use std::net::SocketAddr;
use std::time::Duration;

use semlock_protocol::MAX_LINE_LENGTH;
use semlockd::heartbeat::HeartbeatConfig;
use semlockd::registry::{spawn_registry, LockEvent, RegistryHandle};
use semlockd::server::DaemonServer;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;

// ============================================================================
// Constants
// ============================================================================

const RECV_TIMEOUT: Duration = Duration::from_secs(10);

/// Grace period for server shutdown
const SHUTDOWN_GRACE_PERIOD: Duration = Duration::from_millis(100);

/// Delay between keep-alive lines that are not PONG
const CHATTER_DELAY: Duration = Duration::from_millis(300);

/// Delay between fragments of a split write
const FRAGMENT_DELAY: Duration = Duration::from_millis(20);

// ============================================================================
// Test Helpers
// ============================================================================

struct TestServer {
    addr: SocketAddr,
    registry: RegistryHandle,
    cancel_token: CancellationToken,
}

impl TestServer {
    async fn spawn(heartbeat: HeartbeatConfig) -> Self {
        let cancel_token = CancellationToken::new();
        let registry = spawn_registry(heartbeat, cancel_token.clone());

        let server = DaemonServer::bind("127.0.0.1:0", registry.clone(), cancel_token.clone())
            .await
            .expect("bind loopback");
        let addr = server.local_addr().expect("local addr");

        tokio::spawn(async move {
            let _ = server.run().await;
        });

        Self {
            addr,
            registry,
            cancel_token,
        }
    }

    async fn login(&self, username: &str) -> TestClient {
        let stream = TcpStream::connect(self.addr).await.expect("connect to server");
        let mut client = TestClient::new(stream);
        client.send(&format!("USERNAME {username}")).await;
        client
    }

    async fn shutdown(self) {
        self.cancel_token.cancel();
        sleep(SHUTDOWN_GRACE_PERIOD).await;
    }
}

struct TestClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl TestClient {
    fn new(stream: TcpStream) -> Self {
        let (reader, writer) = stream.into_split();
        Self {
            reader: BufReader::new(reader),
            writer,
        }
    }

    async fn send(&mut self, line: &str) {
        self.send_raw(format!("{line}\n").as_bytes()).await;
    }

    async fn send_raw(&mut self, bytes: &[u8]) {
        self.writer.write_all(bytes).await.unwrap();
        self.writer.flush().await.unwrap();
    }

    async fn try_recv(&mut self) -> Option<String> {
        let mut line = String::new();
        let read = timeout(RECV_TIMEOUT, self.reader.read_line(&mut line))
            .await
            .expect("timed out waiting for server")
            .unwrap_or(0);
        if read == 0 {
            return None;
        }
        Some(line.trim_end_matches(['\r', '\n']).to_string())
    }

    /// Receives the next non-PING line, answering each PING with PONG.
    async fn recv(&mut self) -> String {
        loop {
            let line = self.try_recv().await.expect("connection closed");
            if line == "PING" {
                self.send("PONG").await;
                continue;
            }
            return line;
        }
    }
}

fn fast_heartbeat() -> HeartbeatConfig {
    HeartbeatConfig {
        interval: Duration::from_secs(1),
        deadline: Duration::from_secs(2),
    }
}

// ============================================================================
// Heartbeat Tests
// ============================================================================

#[tokio::test]
async fn test_silent_holder_is_evicted_and_lock_handed_off() {
    let server = TestServer::spawn(fast_heartbeat()).await;
    let mut events = server.registry.subscribe();

    let mut silent = server.login("silent").await;
    let mut waiter = server.login("waiter").await;

    silent.send("LOCK db").await;
    assert_eq!(silent.recv().await, "LOCK_GRANTED db");
    waiter.send("LOCK db").await;
    assert_eq!(waiter.recv().await, "LOCK_DENIED db (position 1)");

    // `silent` never reads again, so it never answers a PING; `waiter`
    // answers every PING inside recv() until the grant arrives.
    assert_eq!(waiter.recv().await, "LOCK_GRANTED db");

    let closed = timeout(RECV_TIMEOUT, async {
        loop {
            if let Ok(LockEvent::SessionClosed { reason, .. }) = events.recv().await {
                return reason;
            }
        }
    })
    .await
    .unwrap();
    assert_eq!(closed.to_string(), "liveness deadline exceeded");

    drop(silent);
    server.shutdown().await;
}

#[tokio::test]
async fn test_responsive_client_survives_heartbeats() {
    let server = TestServer::spawn(fast_heartbeat()).await;
    let mut client = server.login("steady").await;

    client.send("LOCK db").await;
    assert_eq!(client.recv().await, "LOCK_GRANTED db");

    // Several deadlines pass; PINGs are answered as they arrive
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while tokio::time::Instant::now() < deadline {
        let line = client.try_recv().await.expect("connection closed");
        assert_eq!(line, "PING");
        client.send("PONG").await;
    }

    client.send("INFO db").await;
    assert_eq!(client.recv().await, "INFO_RESPONSE");
    assert_eq!(client.recv().await, "Semaphore: db");
    assert_eq!(client.recv().await, "Holder: steady");

    server.shutdown().await;
}

#[tokio::test]
async fn test_any_inbound_line_refreshes_liveness() {
    let server = TestServer::spawn(fast_heartbeat()).await;
    let mut client = server.login("chatty").await;

    // Never PONG; blank and unknown lines alone keep the session alive
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    let mut blank = true;
    while tokio::time::Instant::now() < deadline {
        client.send(if blank { "" } else { "FROB" }).await;
        blank = !blank;
        sleep(CHATTER_DELAY).await;
    }

    client.send("LIST").await;
    loop {
        let line = client.try_recv().await.expect("session was evicted");
        if line == "LIST_RESPONSE" {
            break;
        }
        assert!(line == "PING" || line.starts_with("ERROR"), "{line}");
    }

    server.shutdown().await;
}

// ============================================================================
// Framing Tests
// ============================================================================

#[tokio::test]
async fn test_partial_writes_are_reassembled() {
    let server = TestServer::spawn(HeartbeatConfig::default()).await;
    let mut client = server.login("alice").await;

    for fragment in [&b"LO"[..], b"CK d", b"b", b"\n"] {
        client.send_raw(fragment).await;
        sleep(FRAGMENT_DELAY).await;
    }

    assert_eq!(client.recv().await, "LOCK_GRANTED db");

    server.shutdown().await;
}

#[tokio::test]
async fn test_several_commands_in_one_write() {
    let server = TestServer::spawn(HeartbeatConfig::default()).await;
    let mut client = server.login("alice").await;

    client.send_raw(b"LOCK a\r\nLOCK b\nRELEASE a\n").await;

    assert_eq!(client.recv().await, "LOCK_GRANTED a");
    assert_eq!(client.recv().await, "LOCK_GRANTED b");
    assert_eq!(client.recv().await, "RELEASE_OK a");

    server.shutdown().await;
}

#[tokio::test]
async fn test_overlong_line_is_rejected_without_disconnect() {
    let server = TestServer::spawn(HeartbeatConfig::default()).await;
    let mut client = server.login("alice").await;

    let huge = format!("LOCK {}\n", "x".repeat(MAX_LINE_LENGTH * 2));
    client.send_raw(huge.as_bytes()).await;

    assert_eq!(
        client.recv().await,
        format!("ERROR line too long (max {MAX_LINE_LENGTH} bytes)")
    );

    client.send("LOCK db").await;
    assert_eq!(client.recv().await, "LOCK_GRANTED db");

    server.shutdown().await;
}

#[tokio::test]
async fn test_invalid_utf8_closes_connection_and_hands_off() {
    let server = TestServer::spawn(HeartbeatConfig::default()).await;
    let mut alice = server.login("alice").await;
    let mut bob = server.login("bob").await;

    alice.send("LOCK db").await;
    assert_eq!(alice.recv().await, "LOCK_GRANTED db");
    bob.send("LOCK db").await;
    assert_eq!(bob.recv().await, "LOCK_DENIED db (position 1)");

    alice.send_raw(b"\xff\xfe\n").await;

    assert_eq!(alice.try_recv().await, None);
    assert_eq!(bob.recv().await, "LOCK_GRANTED db");

    server.shutdown().await;
}

// ============================================================================
// Connection Churn Tests
// ============================================================================

#[tokio::test]
async fn test_rapid_connect_disconnect() {
    const CLIENTS: usize = 50;

    let server = TestServer::spawn(HeartbeatConfig::default()).await;
    let mut events = server.registry.subscribe();

    for i in 0..CLIENTS {
        let mut client = server.login(&format!("churn-{i}")).await;
        client.send("LOCK shared").await;
        drop(client);
    }

    // Every session is eventually cleaned up and the lock ends up free
    let settled = timeout(RECV_TIMEOUT, async {
        let mut closed = 0;
        while closed < CLIENTS {
            if let Ok(LockEvent::SessionClosed { .. }) = events.recv().await {
                closed += 1;
            }
        }
    })
    .await;
    assert!(settled.is_ok(), "sessions were not cleaned up");

    let stats = server.registry.stats().await.unwrap();
    assert_eq!(stats.active_sessions, 0);
    assert_eq!(stats.active_semaphores, 0);

    let mut observer = server.login("observer").await;
    observer.send("LOCK shared").await;
    assert_eq!(observer.recv().await, "LOCK_GRANTED shared");

    server.shutdown().await;
}

#[tokio::test]
async fn test_many_concurrent_waiters_are_served_in_order() {
    let server = TestServer::spawn(HeartbeatConfig::default()).await;
    let mut holder = server.login("holder").await;
    holder.send("LOCK db").await;
    assert_eq!(holder.recv().await, "LOCK_GRANTED db");

    let mut waiters = Vec::new();
    for i in 0..5 {
        let mut waiter = server.login(&format!("w{i}")).await;
        waiter.send("LOCK db").await;
        assert_eq!(
            waiter.recv().await,
            format!("LOCK_DENIED db (position {})", i + 1)
        );
        waiters.push(waiter);
    }

    holder.send("RELEASE db").await;
    assert_eq!(holder.recv().await, "RELEASE_OK db");

    for waiter in &mut waiters {
        assert_eq!(waiter.recv().await, "LOCK_GRANTED db");
        waiter.send("RELEASE db").await;
        assert_eq!(waiter.recv().await, "RELEASE_OK db");
    }

    server.shutdown().await;
}
