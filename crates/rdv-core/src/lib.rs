//! Rendezvous Core - Shared types for the registration broker
//!
//! This crate provides the domain types shared between the
//! daemon (rdvd), the wire protocol and the `rdv` client.
//!
//! All code follows the panic-free policy: no `.unwrap()`, `.expect()`,
//! `panic!()`, `unreachable!()`, `todo!()`, or direct indexing `[i]`.

pub mod client;
pub mod error;
pub mod view;

// Re-exports for convenience
pub use client::{ClientId, ClientTable, KnownClient, MAX_ADDRESS_LEN};
pub use error::{DomainError, DomainResult};
pub use view::ClientView;
