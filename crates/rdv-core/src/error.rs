//! Domain-specific error types following panic-free policy.

use crate::ClientId;
use thiserror::Error;

/// Errors that can occur when building the known-client table.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Id 0 is reserved and can never be assigned to a client
    #[error("Invalid client id {client_id} for '{name}' (0 is reserved)")]
    InvalidClientId { client_id: ClientId, name: String },

    /// Two table entries share the same id
    #[error("Duplicate client id {client_id} ('{first}' and '{second}')")]
    DuplicateClientId {
        client_id: ClientId,
        first: String,
        second: String,
    },

    /// A client without a rendezvous address cannot be served
    #[error("Client {client_id} ('{name}') has an empty rendezvous address")]
    EmptyAddress { client_id: ClientId, name: String },

    /// Address longer than a client will accept in a reply
    #[error("Client {client_id} has a {len}-byte rendezvous address (max: {max})")]
    AddressTooLong {
        client_id: ClientId,
        len: usize,
        max: usize,
    },
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
