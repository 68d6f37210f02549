//! Per-connection registration session.
//!
//! Each accepted connection gets its own `RegistrationSession` that:
//! - Reads the two-byte client id
//! - Claims the client's address from the registry
//! - Writes the address back and closes
//!
//! Rejections close the connection without writing anything, which is the
//! protocol's rejection signal.
//!
//! # Panic-Free Guarantees
//!
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - Every failure ends the session, never the process
//! - The stream is owned by the session and dropped on every exit path

use std::time::Duration;

use rdv_core::ClientId;
use rdv_protocol::{decode_request, REQUEST_LEN};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::registry::{RegistryError, RegistryHandle};

/// How long a client may take to send its id
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Write timeout for the address reply
const WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// Where a session is in the handshake.
///
/// ```text
/// Accepted → AwaitingId → Registering → Replying → Closed
///                 │            │           │
///                 └────────────┴───────────┴──────▶ Rejected
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Accepted,
    AwaitingId,
    Registering,
    Replying,
    Closed,
    Rejected,
}

/// How a session ended.
#[derive(Debug)]
pub enum SessionOutcome {
    /// The client received its address.
    Registered { client_id: ClientId, address: String },

    /// The registry refused the id; nothing was written.
    Rejected {
        client_id: ClientId,
        reason: RegistryError,
    },

    /// Transport failure. `client_id` is set if the id was read first.
    Failed {
        client_id: Option<ClientId>,
        error: ConnectionError,
    },
}

/// Registration handshake for a single connection.
pub struct RegistrationSession {
    /// Accepted connection, exclusively owned
    stream: UnixStream,

    /// Handle to the client registry
    registry: RegistryHandle,

    /// Sequence number assigned by the acceptor, diagnostics only
    session_number: u64,

    /// Id read from the client, once the read completes
    claimed_id: Option<ClientId>,

    state: SessionState,

    read_timeout: Duration,
}

impl RegistrationSession {
    /// Creates a session for a freshly accepted connection.
    pub fn new(stream: UnixStream, registry: RegistryHandle, session_number: u64) -> Self {
        Self {
            stream,
            registry,
            session_number,
            claimed_id: None,
            state: SessionState::Accepted,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }

    /// Overrides how long the session waits for the client id.
    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    /// Runs the handshake to completion.
    ///
    /// Consumes the session; the connection is closed when this returns.
    pub async fn run(mut self) -> SessionOutcome {
        self.transition(SessionState::AwaitingId);

        let client_id = match self.read_client_id().await {
            Ok(id) => id,
            Err(error) => {
                self.transition(SessionState::Rejected);
                return SessionOutcome::Failed {
                    client_id: None,
                    error,
                };
            }
        };
        self.claimed_id = Some(client_id);

        self.transition(SessionState::Registering);
        let address = match self.registry.try_register(client_id).await {
            Ok(address) => address,
            Err(reason) => {
                self.transition(SessionState::Rejected);
                return SessionOutcome::Rejected { client_id, reason };
            }
        };

        self.transition(SessionState::Replying);
        if let Err(error) = self.send_address(&address).await {
            // The registration stands; only the delivery failed
            warn!(
                session = self.session_number,
                client_id = %client_id,
                error = %error,
                "Registered client did not receive its address"
            );
            self.transition(SessionState::Rejected);
            return SessionOutcome::Failed {
                client_id: Some(client_id),
                error,
            };
        }

        self.transition(SessionState::Closed);
        info!(
            session = self.session_number,
            client_id = %client_id,
            address = %address,
            "Sent rendezvous address"
        );

        SessionOutcome::Registered { client_id, address }
    }

    fn transition(&mut self, next: SessionState) {
        debug!(
            session = self.session_number,
            client_id = ?self.claimed_id,
            from = ?self.state,
            to = ?next,
            "Session state change"
        );
        self.state = next;
    }

    /// Reads exactly one request from the client.
    async fn read_client_id(&mut self) -> Result<ClientId, ConnectionError> {
        let mut buf = [0u8; REQUEST_LEN];

        match timeout(self.read_timeout, self.stream.read_exact(&mut buf)).await {
            Ok(Ok(_)) => Ok(decode_request(buf)),
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                Err(ConnectionError::Eof)
            }
            Ok(Err(e)) => Err(ConnectionError::Io(e.to_string())),
            Err(_) => Err(ConnectionError::Timeout),
        }
    }

    /// Writes the address with no framing and shuts down the write side.
    async fn send_address(&mut self, address: &str) -> Result<(), ConnectionError> {
        let stream = &mut self.stream;

        match timeout(WRITE_TIMEOUT, async {
            stream.write_all(address.as_bytes()).await?;
            stream.flush().await?;
            stream.shutdown().await?;
            Ok::<(), std::io::Error>(())
        })
        .await
        {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(ConnectionError::Io(e.to_string())),
            Err(_) => Err(ConnectionError::WriteTimeout),
        }
    }
}

/// Errors that can occur on a registration connection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectionError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Connection closed before the full client id arrived")]
    Eof,

    #[error("Read timeout")]
    Timeout,

    #[error("Write timeout")]
    WriteTimeout,
}
