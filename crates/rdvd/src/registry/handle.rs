//! Client interface for interacting with the RegistryActor.
//!
//! The `RegistryHandle` provides a cheap-to-clone interface for sending commands
//! to the registry actor and subscribing to registry events.
//!
//! # Panic-Free Guarantees
//!
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - Channel errors are mapped to `RegistryError::ChannelClosed`

use rdv_core::{ClientId, ClientView};
use tokio::sync::{broadcast, mpsc, oneshot};

use super::commands::{RegistryCommand, RegistryError, RegistryEvent};

/// Handle for interacting with the registry actor.
///
/// This is a cheap-to-clone handle that can be shared across session tasks.
#[derive(Clone)]
pub struct RegistryHandle {
    /// Command sender to the actor
    sender: mpsc::Sender<RegistryCommand>,

    /// Event broadcaster for subscribing to updates
    event_sender: broadcast::Sender<RegistryEvent>,
}

impl RegistryHandle {
    /// Create a new registry handle.
    pub fn new(
        sender: mpsc::Sender<RegistryCommand>,
        event_sender: broadcast::Sender<RegistryEvent>,
    ) -> Self {
        Self {
            sender,
            event_sender,
        }
    }

    /// Looks up a known client without side effects.
    ///
    /// Returns `None` if the id is unknown or if communication with the
    /// actor fails.
    pub async fn lookup(&self, client_id: ClientId) -> Option<ClientView> {
        let (tx, rx) = oneshot::channel();

        self.sender
            .send(RegistryCommand::Lookup {
                client_id,
                respond_to: tx,
            })
            .await
            .ok()?;

        rx.await.ok()?
    }

    /// Registers a client and returns its rendezvous address.
    ///
    /// Among any number of concurrent callers for the same id, exactly one
    /// observes `Ok`.
    ///
    /// # Errors
    ///
    /// - `RegistryError::UnknownClient` if the id is not in the table
    /// - `RegistryError::AlreadyRegistered` if the client registered before
    /// - `RegistryError::ChannelClosed` if the actor has shut down
    pub async fn try_register(&self, client_id: ClientId) -> Result<String, RegistryError> {
        let (tx, rx) = oneshot::channel();

        self.sender
            .send(RegistryCommand::TryRegister {
                client_id,
                respond_to: tx,
            })
            .await
            .map_err(|_| RegistryError::ChannelClosed)?;

        rx.await.map_err(|_| RegistryError::ChannelClosed)?
    }

    /// Snapshot of all known clients, ordered by id.
    ///
    /// Returns an empty vector if communication with the actor fails.
    pub async fn list_clients(&self) -> Vec<ClientView> {
        let (tx, rx) = oneshot::channel();

        if self
            .sender
            .send(RegistryCommand::ListClients { respond_to: tx })
            .await
            .is_err()
        {
            return Vec::new();
        }

        rx.await.unwrap_or_default()
    }

    /// Subscribe to registry events.
    ///
    /// This is a synchronous operation - it doesn't communicate with the actor.
    pub fn subscribe(&self) -> broadcast::Receiver<RegistryEvent> {
        self.event_sender.subscribe()
    }
}
