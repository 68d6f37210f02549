//! Registry actor commands, errors, and events.
//!
//! This module defines the message types for communicating with the `RegistryActor`:
//! - `RegistryCommand`: Commands sent to the actor
//! - `RegistryError`: Why a registration was refused
//! - `RegistryEvent`: Events published by the registry for subscribers

use rdv_core::{ClientId, ClientView};
use thiserror::Error;
use tokio::sync::oneshot;

// ============================================================================
// Registry Commands
// ============================================================================

/// Commands sent to the registry actor.
///
/// Each command carries a oneshot channel for the response.
#[derive(Debug)]
pub enum RegistryCommand {
    /// Read-only lookup of a known client.
    ///
    /// Responds with `None` if the id is not in the table.
    Lookup {
        client_id: ClientId,
        respond_to: oneshot::Sender<Option<ClientView>>,
    },

    /// Claim the rendezvous address of a client.
    ///
    /// Succeeds at most once per client for the lifetime of the actor.
    ///
    /// # Errors
    /// - `RegistryError::UnknownClient` if the id is not in the table
    /// - `RegistryError::AlreadyRegistered` if the client already registered
    TryRegister {
        client_id: ClientId,
        respond_to: oneshot::Sender<Result<String, RegistryError>>,
    },

    /// Snapshot of every known client, ordered by id.
    ListClients {
        respond_to: oneshot::Sender<Vec<ClientView>>,
    },
}

// ============================================================================
// Registry Errors
// ============================================================================

/// Errors that can occur during registry operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The id is not in the known-client table.
    #[error("unknown client id: {0}")]
    UnknownClient(ClientId),

    /// The client already claimed its address during this process lifetime.
    #[error("client already registered: {0}")]
    AlreadyRegistered(ClientId),

    /// The response channel was closed before receiving a response.
    ///
    /// This typically indicates the actor was shut down.
    #[error("response channel closed")]
    ChannelClosed,
}

// ============================================================================
// Registry Events
// ============================================================================

/// Events published by the registry to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryEvent {
    /// A client claimed its rendezvous address.
    Registered {
        client_id: ClientId,
        name: String,
        address: String,
    },

    /// A registration attempt was refused.
    Rejected {
        client_id: ClientId,
        reason: RegistryError,
    },
}
