//! Client side of the registration handshake.

use std::path::Path;
use std::time::Duration;

use rdv_core::{ClientId, MAX_ADDRESS_LEN};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tokio::time::timeout;
use tracing::debug;

use crate::message::{encode_request, RegistrationReply, ReplyError};

/// How long to wait for the broker to answer and close.
const REPLY_TIMEOUT: Duration = Duration::from_secs(10);

/// One byte past the address limit, so an oversized reply is detected
/// instead of silently cut short.
const REPLY_READ_LIMIT: u64 = MAX_ADDRESS_LEN as u64 + 1;

/// Registers `id` with the broker listening at `socket_path`.
///
/// Returns [`RegistrationReply::Rejected`] when the broker closes the
/// connection without sending anything.
pub async fn request_registration(
    socket_path: impl AsRef<Path>,
    id: ClientId,
) -> Result<RegistrationReply, ClientError> {
    request_registration_with_timeout(socket_path, id, REPLY_TIMEOUT).await
}

/// Same as [`request_registration`] with an explicit reply timeout.
pub async fn request_registration_with_timeout(
    socket_path: impl AsRef<Path>,
    id: ClientId,
    reply_timeout: Duration,
) -> Result<RegistrationReply, ClientError> {
    let socket_path = socket_path.as_ref();

    let mut stream = UnixStream::connect(socket_path)
        .await
        .map_err(|e| ClientError::Connect {
            path: socket_path.display().to_string(),
            error: e.to_string(),
        })?;

    stream
        .write_all(&encode_request(id))
        .await
        .map_err(|e| ClientError::Io(e.to_string()))?;

    debug!(client_id = %id, socket = %socket_path.display(), "Sent registration request");

    let mut reply = Vec::new();
    let read = async {
        (&mut stream)
            .take(REPLY_READ_LIMIT)
            .read_to_end(&mut reply)
            .await
    };

    match timeout(reply_timeout, read).await {
        Ok(Ok(_)) => {}
        Ok(Err(e)) => return Err(ClientError::Io(e.to_string())),
        Err(_) => return Err(ClientError::Timeout),
    }

    Ok(RegistrationReply::from_bytes(reply)?)
}

/// Errors a registering client can run into.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Failed to connect to {path}: {error}")]
    Connect { path: String, error: String },

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Timed out waiting for the broker to reply")]
    Timeout,

    #[error(transparent)]
    Reply(#[from] ReplyError),
}
