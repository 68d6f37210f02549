//! Registry actor - owns all client state and processes commands.
//!
//! # Panic-Free Guarantees
//!
//! This module follows the panic-free policy:
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - All fallible operations use `?`, pattern matching, or `unwrap_or`
//! - Channel send failures are ignored, never panicked on

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rdv_core::{ClientId, ClientTable, ClientView, KnownClient};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use super::commands::{RegistryCommand, RegistryError, RegistryEvent};

/// A known client together with its registration state.
///
/// `registered_at` is the only mutable part and moves from `None` to
/// `Some` at most once.
#[derive(Debug)]
struct ClientEntry {
    client: KnownClient,
    registered_at: Option<DateTime<Utc>>,
}

impl ClientEntry {
    fn view(&self) -> ClientView {
        ClientView::new(&self.client, self.registered_at)
    }
}

/// The registry actor - owns all client state.
///
/// Receives commands via mpsc channel, processes them sequentially,
/// and publishes events to subscribers. The set of keys in `clients`
/// is fixed at construction; entries are never added or removed.
pub struct RegistryActor {
    /// Command receiver
    receiver: mpsc::Receiver<RegistryCommand>,

    /// Known clients keyed by id
    clients: HashMap<ClientId, ClientEntry>,

    /// Event publisher for diagnostics subscribers
    event_publisher: broadcast::Sender<RegistryEvent>,
}

impl RegistryActor {
    /// Creates a new registry actor with every client unregistered.
    pub fn new(
        table: ClientTable,
        receiver: mpsc::Receiver<RegistryCommand>,
        event_publisher: broadcast::Sender<RegistryEvent>,
    ) -> Self {
        let clients = table
            .into_iter()
            .map(|client| {
                (
                    client.id,
                    ClientEntry {
                        client,
                        registered_at: None,
                    },
                )
            })
            .collect();

        Self {
            receiver,
            clients,
            event_publisher,
        }
    }

    /// Runs the actor event loop.
    ///
    /// Processes commands until the channel closes (all senders dropped).
    pub async fn run(mut self) {
        info!(known_clients = self.clients.len(), "Registry actor starting");

        while let Some(cmd) = self.receiver.recv().await {
            self.handle_command(cmd);
        }

        info!(
            registered = self.registered_count(),
            "Registry actor stopped"
        );
    }

    /// Dispatches a command to the appropriate handler.
    fn handle_command(&mut self, cmd: RegistryCommand) {
        match cmd {
            RegistryCommand::Lookup {
                client_id,
                respond_to,
            } => {
                // Ignore send error - caller may have dropped the receiver
                let _ = respond_to.send(self.handle_lookup(client_id));
            }
            RegistryCommand::TryRegister {
                client_id,
                respond_to,
            } => {
                let result = self.handle_try_register(client_id);
                let _ = respond_to.send(result);
            }
            RegistryCommand::ListClients { respond_to } => {
                let _ = respond_to.send(self.handle_list_clients());
            }
        }
    }

    // ========================================================================
    // Command Handlers
    // ========================================================================

    fn handle_lookup(&self, client_id: ClientId) -> Option<ClientView> {
        self.clients.get(&client_id).map(ClientEntry::view)
    }

    /// Registers a client, returning its rendezvous address.
    ///
    /// Runs to completion inside a single command, which is what makes the
    /// check-and-set atomic with respect to other sessions.
    fn handle_try_register(&mut self, client_id: ClientId) -> Result<String, RegistryError> {
        let result = match self.clients.get_mut(&client_id) {
            None => {
                warn!(client_id = %client_id, "Registration attempt from unknown client");
                Err(RegistryError::UnknownClient(client_id))
            }
            Some(entry) if entry.registered_at.is_some() => {
                warn!(
                    client_id = %client_id,
                    name = %entry.client.name,
                    "Client is already registered"
                );
                Err(RegistryError::AlreadyRegistered(client_id))
            }
            Some(entry) => {
                entry.registered_at = Some(Utc::now());

                info!(
                    client_id = %client_id,
                    name = %entry.client.name,
                    address = %entry.client.address,
                    "Client registered"
                );

                // Publish event (ignore if no subscribers)
                let _ = self.event_publisher.send(RegistryEvent::Registered {
                    client_id,
                    name: entry.client.name.clone(),
                    address: entry.client.address.clone(),
                });

                Ok(entry.client.address.clone())
            }
        };

        if let Err(reason) = &result {
            let _ = self.event_publisher.send(RegistryEvent::Rejected {
                client_id,
                reason: reason.clone(),
            });
        }

        result
    }

    fn handle_list_clients(&self) -> Vec<ClientView> {
        let mut views: Vec<ClientView> = self.clients.values().map(ClientEntry::view).collect();
        views.sort_by_key(|v| v.id);
        debug!(count = views.len(), "Listing known clients");
        views
    }

    fn registered_count(&self) -> usize {
        self.clients
            .values()
            .filter(|e| e.registered_at.is_some())
            .count()
    }
}
