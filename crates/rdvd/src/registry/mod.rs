//! Client registry using Actor pattern.
//!
//! The registry is the single source of truth for the known clients and
//! their registration state. It receives commands via a tokio mpsc channel
//! and processes them one at a time, so the read-check-write of a
//! registration can never interleave with another.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌─────────────────┐     ┌──────────────────┐
//! │  Registration   │────▶│  RegistryActor  │────▶│ Broadcast Channel│
//! │    sessions     │     └─────────────────┘     └──────────────────┘
//! └─────────────────┘             │                        │
//!         │   RegistryCommand     │   RegistryEvent        │
//!         │   (mpsc channel)      │   (broadcast)          │
//!         ▼                       ▼                        ▼
//!    TryRegister/Lookup     HashMap<ClientId,        Diagnostics
//!                           ClientEntry>
//! ```
//!
//! # Panic-Free Guarantees
//!
//! All operations in this module follow the panic-free policy:
//! - No `.unwrap()` or `.expect()` in production code
//! - All fallible operations return `Result` or `Option`
//! - Channel operations handle closure gracefully

use rdv_core::ClientTable;
use tokio::sync::{broadcast, mpsc};

mod actor;
mod commands;
mod handle;

pub use actor::RegistryActor;
pub use commands::{RegistryCommand, RegistryError, RegistryEvent};
pub use handle::RegistryHandle;

/// Channel buffer sizes
const COMMAND_BUFFER: usize = 100;
const EVENT_BUFFER: usize = 100;

/// Spawn the registry actor over `table` and return a handle for interaction.
///
/// Every client in the table starts out unregistered.
///
/// # Example
///
/// ```no_run
/// use rdv_core::{ClientId, ClientTable};
/// use rdvd::registry::spawn_registry;
///
/// #[tokio::main]
/// async fn main() {
///     let handle = spawn_registry(ClientTable::default());
///
///     let address = handle.try_register(ClientId::new(1)).await;
/// }
/// ```
pub fn spawn_registry(table: ClientTable) -> RegistryHandle {
    let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_BUFFER);
    let (event_tx, _) = broadcast::channel(EVENT_BUFFER);

    let actor = RegistryActor::new(table, cmd_rx, event_tx.clone());
    tokio::spawn(actor.run());

    RegistryHandle::new(cmd_tx, event_tx)
}
