//! Composition root for the registration daemon.
//!
//! The manager builds the registry from configuration, binds the server
//! and runs the accept loop until its cancellation token fires.

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::DaemonConfig;
use crate::registry::{spawn_registry, RegistryEvent};
use crate::server::{RegistrationServer, ServerError};

/// Owns the daemon's configuration and drives it.
pub struct RegistrationManager {
    config: DaemonConfig,
    cancel_token: CancellationToken,
}

impl RegistrationManager {
    pub fn new(config: DaemonConfig, cancel_token: CancellationToken) -> Self {
        Self {
            config,
            cancel_token,
        }
    }

    /// Runs the daemon.
    ///
    /// Returns `Ok` once cancelled. Fails only if the registration socket
    /// cannot be bound; nothing a client does can end this call.
    pub async fn run(self) -> Result<(), ServerError> {
        let known_clients = self.config.clients.len();
        let read_timeout = self.config.read_timeout();
        let registry = spawn_registry(self.config.clients);
        info!(known_clients, "Client registry started");

        spawn_progress_logger(registry.subscribe(), known_clients, self.cancel_token.clone());

        let server = RegistrationServer::bind(
            self.config.socket_path,
            registry,
            self.cancel_token,
        )?
        .with_read_timeout(read_timeout);

        server.run().await
    }
}

/// Logs registration progress and notes when every known client is in.
fn spawn_progress_logger(
    mut events: broadcast::Receiver<RegistryEvent>,
    known_clients: usize,
    cancel_token: CancellationToken,
) {
    tokio::spawn(async move {
        let mut registered = 0usize;

        loop {
            tokio::select! {
                _ = cancel_token.cancelled() => break,

                result = events.recv() => {
                    match result {
                        Ok(RegistryEvent::Registered { name, .. }) => {
                            registered += 1;
                            info!(client = %name, registered, known_clients, "Registration progress");
                            if registered == known_clients {
                                info!("All known clients registered");
                            }
                        }
                        Ok(RegistryEvent::Rejected { .. }) => {}
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            warn!(skipped = n, "Progress logger lagged, skipped events");
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            debug!("Registry event channel closed");
                            break;
                        }
                    }
                }
            }
        }
    });
}
