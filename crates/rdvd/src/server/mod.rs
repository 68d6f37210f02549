//! Unix socket server for registration requests.
//!
//! The server:
//! - Binds the well-known registration socket, replacing a stale one
//! - Accepts connections until cancelled
//! - Spawns a RegistrationSession task for each connection
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────┐
//! │ RegistrationServer │
//! │                    │
//! │   UnixListener     │
//! └─────────┬──────────┘
//!           │ accept()
//!           ▼
//! ┌────────────────────┐     ┌─────────────────┐
//! │RegistrationSession │────▶│  RegistryHandle │
//! │ (task per conn)    │     │                 │
//! └────────────────────┘     └─────────────────┘
//! ```
//!
//! # Panic-Free Guarantees
//!
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - Accept errors are logged and the loop keeps going
//! - Only socket setup failures are returned to the caller

mod session;

pub use session::{
    ConnectionError, RegistrationSession, SessionOutcome, SessionState, DEFAULT_READ_TIMEOUT,
};

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::net::{UnixListener, UnixStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::registry::RegistryHandle;

/// Default socket path
pub const DEFAULT_SOCKET_PATH: &str = "/tmp/rdvd.sock";

/// Registration server bound to its socket.
///
/// Holds no per-client state; it only dispatches connections.
pub struct RegistrationServer {
    /// Path to the Unix socket
    socket_path: PathBuf,

    listener: UnixListener,

    /// Handle to the client registry
    registry: RegistryHandle,

    /// Cancellation token for shutdown
    cancel_token: CancellationToken,

    /// Connection counter for numbering sessions
    connection_counter: AtomicU64,

    /// Read timeout handed to every session
    read_timeout: Duration,
}

impl RegistrationServer {
    /// Binds the registration socket.
    ///
    /// A leftover socket file from a previous run is removed first and the
    /// parent directory is created if needed. Must be called from within a
    /// tokio runtime.
    ///
    /// # Errors
    ///
    /// `ServerError::SocketSetup` if the socket cannot be prepared or bound.
    /// This is fatal: the daemon cannot serve without its endpoint.
    pub fn bind(
        socket_path: impl Into<PathBuf>,
        registry: RegistryHandle,
        cancel_token: CancellationToken,
    ) -> Result<Self, ServerError> {
        let socket_path = socket_path.into();
        let setup_error = |e: std::io::Error| ServerError::SocketSetup {
            path: socket_path.clone(),
            error: e.to_string(),
        };

        // Remove a stale socket file (or dangling symlink) if present
        match std::fs::remove_file(&socket_path) {
            Ok(()) => debug!(socket = %socket_path.display(), "Removed stale socket file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(setup_error(e)),
        }

        // Create parent directory if needed
        if let Some(parent) = socket_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(setup_error)?;
            }
        }

        let listener = UnixListener::bind(&socket_path).map_err(setup_error)?;

        info!(socket = %socket_path.display(), "Registration server listening");

        Ok(Self {
            socket_path,
            listener,
            registry,
            cancel_token,
            connection_counter: AtomicU64::new(0),
            read_timeout: DEFAULT_READ_TIMEOUT,
        })
    }

    /// Overrides how long sessions wait for a client id.
    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    /// Returns the socket path.
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Accepts connections until the cancellation token is triggered.
    ///
    /// Each connection is handed to its own task before the next accept,
    /// so a stalled client never holds up the others.
    pub async fn run(self) -> Result<(), ServerError> {
        loop {
            tokio::select! {
                _ = self.cancel_token.cancelled() => {
                    info!("Server shutdown requested");
                    break;
                }

                result = self.listener.accept() => {
                    match result {
                        Ok((stream, _addr)) => {
                            let conn_num = self.connection_counter.fetch_add(1, Ordering::Relaxed);
                            self.handle_connection(stream, conn_num);
                        }
                        Err(e) => {
                            error!(error = %e, "Failed to accept connection");
                            // Continue accepting other connections
                        }
                    }
                }
            }
        }

        self.cleanup();
        Ok(())
    }

    /// Spawns a registration session for an accepted connection.
    fn handle_connection(&self, stream: UnixStream, connection_number: u64) {
        debug!(session = connection_number, "Received connection");

        let session = RegistrationSession::new(stream, self.registry.clone(), connection_number)
            .with_read_timeout(self.read_timeout);

        tokio::spawn(async move {
            match session.run().await {
                SessionOutcome::Registered { client_id, .. } => {
                    debug!(session = connection_number, client_id = %client_id, "Session completed");
                }
                SessionOutcome::Rejected { client_id, reason } => {
                    info!(
                        session = connection_number,
                        client_id = %client_id,
                        reason = %reason,
                        "Registration rejected"
                    );
                }
                SessionOutcome::Failed { client_id, error } => {
                    warn!(
                        session = connection_number,
                        client_id = ?client_id,
                        error = %error,
                        "Registration session failed"
                    );
                }
            }
        });
    }

    /// Removes the socket file on shutdown.
    fn cleanup(&self) {
        match std::fs::remove_file(&self.socket_path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                socket = %self.socket_path.display(),
                error = %e,
                "Failed to remove socket file"
            ),
        }

        info!(
            connections = self.connection_counter.load(Ordering::Relaxed),
            "Server cleanup complete"
        );
    }
}

/// Errors that can occur in server operations.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to setup socket at {path}: {error}")]
    SocketSetup { path: PathBuf, error: String },
}
