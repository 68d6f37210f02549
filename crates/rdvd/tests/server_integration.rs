//! Integration tests for the registration server.
//!
//! These tests drive the RegistrationServer over a real Unix socket and
//! check what clients observe on the wire.
//!
//! Tests CAN use `.unwrap()` and `.expect()` - this is allowed.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rdv_core::{ClientId, ClientTable, KnownClient, MAX_ADDRESS_LEN};
use rdv_protocol::{encode_request, request_registration, RegistrationReply};
use rdvd::config::DaemonConfig;
use rdvd::manager::RegistrationManager;
use rdvd::registry::{spawn_registry, RegistryHandle};
use rdvd::server::{RegistrationServer, ServerError};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;

// ============================================================================
// Constants
// ============================================================================

/// Maximum time to wait for server socket to appear
const SOCKET_WAIT_TIMEOUT: Duration = Duration::from_millis(500);

/// Interval between socket existence checks
const SOCKET_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Grace period for server shutdown
const SHUTDOWN_GRACE_PERIOD: Duration = Duration::from_millis(100);

/// Upper bound on any single exchange in these tests
const EXCHANGE_TIMEOUT: Duration = Duration::from_secs(5);

// ============================================================================
// Test Helpers
// ============================================================================

fn two_client_table() -> ClientTable {
    ClientTable::new(vec![
        KnownClient::new(1, "A", "a.sock"),
        KnownClient::new(2, "B", "b.sock"),
    ])
    .expect("valid table")
}

/// Test server context that manages server lifecycle and cleanup.
struct TestServer {
    socket_path: PathBuf,
    registry: RegistryHandle,
    cancel_token: CancellationToken,
    _temp_dir: TempDir, // Keep alive for RAII cleanup
}

impl TestServer {
    async fn spawn() -> Self {
        Self::spawn_with_read_timeout(Duration::from_secs(30)).await
    }

    async fn spawn_with_read_timeout(read_timeout: Duration) -> Self {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        let socket_path = temp_dir.path().join("server.socket");

        let registry = spawn_registry(two_client_table());
        let cancel_token = CancellationToken::new();

        let server =
            RegistrationServer::bind(socket_path.clone(), registry.clone(), cancel_token.clone())
                .expect("bind server")
                .with_read_timeout(read_timeout);

        tokio::spawn(async move {
            let _ = server.run().await;
        });

        TestServer {
            socket_path,
            registry,
            cancel_token,
            _temp_dir: temp_dir,
        }
    }

    async fn connect(&self) -> UnixStream {
        UnixStream::connect(&self.socket_path)
            .await
            .expect("connect to server")
    }

    /// Sends `raw` as the client id and returns everything received before EOF.
    async fn exchange(&self, raw: u16) -> Vec<u8> {
        let mut stream = self.connect().await;
        stream
            .write_all(&encode_request(ClientId::new(raw)))
            .await
            .unwrap();
        read_until_eof(&mut stream).await
    }

    async fn shutdown(self) {
        self.cancel_token.cancel();
        sleep(SHUTDOWN_GRACE_PERIOD).await;
    }
}

async fn read_until_eof(stream: &mut UnixStream) -> Vec<u8> {
    let mut reply = Vec::new();
    timeout(EXCHANGE_TIMEOUT, stream.read_to_end(&mut reply))
        .await
        .expect("server closed the connection in time")
        .expect("read reply");
    reply
}

async fn wait_for_socket(path: &Path) {
    let start = tokio::time::Instant::now();
    while start.elapsed() < SOCKET_WAIT_TIMEOUT {
        if path.exists() {
            break;
        }
        sleep(SOCKET_POLL_INTERVAL).await;
    }
    assert!(
        path.exists(),
        "Server socket did not appear within {SOCKET_WAIT_TIMEOUT:?}"
    );
}

// ============================================================================
// Handshake Scenarios
// ============================================================================

#[tokio::test]
async fn test_register_once_then_rejected() {
    let server = TestServer::spawn().await;

    assert_eq!(server.exchange(1).await, b"a.sock");

    // Same id again: closed with zero bytes
    assert!(server.exchange(1).await.is_empty());

    // Unknown id: closed with zero bytes
    assert!(server.exchange(99).await.is_empty());

    server.shutdown().await;
}

#[tokio::test]
async fn test_reserved_id_is_rejected() {
    let server = TestServer::spawn().await;

    assert!(server.exchange(0).await.is_empty());

    server.shutdown().await;
}

#[tokio::test]
async fn test_extra_bytes_after_id_are_ignored() {
    let server = TestServer::spawn().await;
    let mut stream = server.connect().await;

    let mut request = encode_request(ClientId::new(2)).to_vec();
    request.extend_from_slice(b"trailing junk");
    stream.write_all(&request).await.unwrap();

    assert_eq!(read_until_eof(&mut stream).await, b"b.sock");

    server.shutdown().await;
}

#[tokio::test]
async fn test_client_helper_against_server() {
    let server = TestServer::spawn().await;

    let reply = request_registration(&server.socket_path, ClientId::new(2))
        .await
        .unwrap();
    assert_eq!(reply, RegistrationReply::Assigned("b.sock".to_string()));

    let reply = request_registration(&server.socket_path, ClientId::new(2))
        .await
        .unwrap();
    assert_eq!(reply, RegistrationReply::Rejected);

    server.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_simultaneous_registrations_one_winner() {
    let server = TestServer::spawn().await;

    // Open both connections before either sends its id
    let mut first = server.connect().await;
    let mut second = server.connect().await;
    let request = encode_request(ClientId::new(2));

    let (a, b) = tokio::join!(
        async {
            first.write_all(&request).await.unwrap();
            read_until_eof(&mut first).await
        },
        async {
            second.write_all(&request).await.unwrap();
            read_until_eof(&mut second).await
        }
    );

    let mut replies = vec![a, b];
    replies.sort();
    assert_eq!(replies, vec![Vec::new(), b"b.sock".to_vec()]);

    server.shutdown().await;
}

#[tokio::test]
async fn test_longest_address_round_trips_through_server() {
    let temp_dir = tempfile::tempdir().unwrap();
    let socket_path = temp_dir.path().join("server.socket");
    let address = "x".repeat(MAX_ADDRESS_LEN);

    let table = ClientTable::new(vec![KnownClient::new(5, "LONG", address.clone())]).unwrap();
    let cancel_token = CancellationToken::new();
    let server =
        RegistrationServer::bind(socket_path.clone(), spawn_registry(table), cancel_token.clone())
            .unwrap();
    tokio::spawn(server.run());

    let reply = request_registration(&socket_path, ClientId::new(5)).await.unwrap();
    assert_eq!(reply, RegistrationReply::Assigned(address));

    cancel_token.cancel();
}

// ============================================================================
// Robustness
// ============================================================================

#[tokio::test]
async fn test_partial_id_does_not_register() {
    let server = TestServer::spawn().await;

    // One byte, then hang up
    let mut stream = server.connect().await;
    stream.write_all(&[1u8]).await.unwrap();
    drop(stream);

    // Immediate disconnect without sending anything
    drop(server.connect().await);

    sleep(Duration::from_millis(50)).await;
    let view = server.registry.lookup(ClientId::new(1)).await.unwrap();
    assert!(!view.is_registered());

    // The server keeps serving, and client 1 can still register
    assert_eq!(server.exchange(1).await, b"a.sock");

    server.shutdown().await;
}

#[tokio::test]
async fn test_stalled_client_does_not_block_others() {
    let server = TestServer::spawn().await;

    // Connected but silent
    let _stalled = server.connect().await;

    assert_eq!(server.exchange(2).await, b"b.sock");

    server.shutdown().await;
}

#[tokio::test]
async fn test_silent_client_is_dropped_after_timeout() {
    let server = TestServer::spawn_with_read_timeout(Duration::from_millis(100)).await;

    let mut stalled = server.connect().await;
    let reply = read_until_eof(&mut stalled).await;
    assert!(reply.is_empty());

    // No registration was consumed
    assert_eq!(server.exchange(1).await, b"a.sock");

    server.shutdown().await;
}

#[tokio::test]
async fn test_many_sequential_connections() {
    let server = TestServer::spawn().await;

    for _ in 0..50 {
        assert!(server.exchange(42).await.is_empty());
    }
    assert_eq!(server.exchange(1).await, b"a.sock");

    server.shutdown().await;
}

// ============================================================================
// Socket Lifecycle
// ============================================================================

#[tokio::test]
async fn test_stale_socket_file_is_replaced() {
    let temp_dir = tempfile::tempdir().unwrap();
    let socket_path = temp_dir.path().join("server.socket");
    std::fs::write(&socket_path, b"left over").unwrap();

    let registry = spawn_registry(two_client_table());
    let cancel_token = CancellationToken::new();
    let server = RegistrationServer::bind(socket_path.clone(), registry, cancel_token.clone())
        .expect("stale file should be replaced");
    assert_eq!(server.socket_path(), socket_path.as_path());

    tokio::spawn(server.run());

    let mut stream = UnixStream::connect(&socket_path).await.unwrap();
    stream.write_all(&encode_request(ClientId::new(1))).await.unwrap();
    assert_eq!(read_until_eof(&mut stream).await, b"a.sock");

    cancel_token.cancel();
}

#[tokio::test]
async fn test_dangling_symlink_at_socket_path_is_replaced() {
    let temp_dir = tempfile::tempdir().unwrap();
    let socket_path = temp_dir.path().join("server.socket");
    std::os::unix::fs::symlink(temp_dir.path().join("gone"), &socket_path).unwrap();
    assert!(!socket_path.exists());

    let registry = spawn_registry(two_client_table());
    let cancel_token = CancellationToken::new();
    let server = RegistrationServer::bind(socket_path.clone(), registry, cancel_token.clone())
        .expect("dangling symlink should be replaced");

    tokio::spawn(server.run());

    let mut stream = UnixStream::connect(&socket_path).await.unwrap();
    stream.write_all(&encode_request(ClientId::new(2))).await.unwrap();
    assert_eq!(read_until_eof(&mut stream).await, b"b.sock");

    cancel_token.cancel();
}

#[tokio::test]
async fn test_parent_directory_is_created() {
    let temp_dir = tempfile::tempdir().unwrap();
    let socket_path = temp_dir.path().join("nested").join("dir").join("server.socket");

    let registry = spawn_registry(two_client_table());
    let server = RegistrationServer::bind(socket_path.clone(), registry, CancellationToken::new())
        .expect("bind in nested dir");

    assert!(socket_path.exists());
    drop(server);
}

#[tokio::test]
async fn test_bind_failure_is_fatal_error() {
    let temp_dir = tempfile::tempdir().unwrap();
    // The socket's parent is a regular file, so neither mkdir nor bind can work
    let blocker = temp_dir.path().join("not-a-dir");
    std::fs::write(&blocker, b"").unwrap();
    let socket_path = blocker.join("server.socket");

    let registry = spawn_registry(two_client_table());
    let result = RegistrationServer::bind(socket_path, registry, CancellationToken::new());

    assert!(matches!(result, Err(ServerError::SocketSetup { .. })));
}

#[tokio::test]
async fn test_shutdown_removes_socket() {
    let server = TestServer::spawn().await;
    let socket_path = server.socket_path.clone();
    assert!(socket_path.exists());

    server.cancel_token.cancel();
    sleep(SHUTDOWN_GRACE_PERIOD).await;

    assert!(!socket_path.exists());
}

// ============================================================================
// Manager
// ============================================================================

#[tokio::test]
async fn test_manager_serves_configured_table() {
    let temp_dir = tempfile::tempdir().unwrap();
    let socket_path = temp_dir.path().join("rdvd.sock");

    let config = DaemonConfig {
        socket_path: socket_path.clone(),
        clients: two_client_table(),
        ..DaemonConfig::default()
    };
    let cancel_token = CancellationToken::new();
    let manager = RegistrationManager::new(config, cancel_token.clone());
    let running = tokio::spawn(manager.run());

    wait_for_socket(&socket_path).await;

    let reply = request_registration(&socket_path, ClientId::new(1)).await.unwrap();
    assert_eq!(reply.address(), Some("a.sock"));

    // Built-in table is replaced, so id 3 is unknown here
    let reply = request_registration(&socket_path, ClientId::new(3)).await.unwrap();
    assert!(reply.is_rejected());

    cancel_token.cancel();
    let result = timeout(EXCHANGE_TIMEOUT, running).await.unwrap().unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_manager_reports_bind_failure() {
    let temp_dir = tempfile::tempdir().unwrap();
    let blocker = temp_dir.path().join("file");
    std::fs::write(&blocker, b"").unwrap();

    let config = DaemonConfig {
        socket_path: blocker.join("rdvd.sock"),
        ..DaemonConfig::default()
    };

    let result = RegistrationManager::new(config, CancellationToken::new())
        .run()
        .await;
    assert!(matches!(result, Err(ServerError::SocketSetup { .. })));
}
