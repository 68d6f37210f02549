//! Read-only snapshots of registry entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ClientId, KnownClient};

/// Snapshot of one known client and its registration state.
///
/// Handed out by registry lookups; never aliases the registry's own state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientView {
    pub id: ClientId,
    pub name: String,
    pub address: String,

    /// When the client completed its handshake, if it has
    pub registered_at: Option<DateTime<Utc>>,
}

impl ClientView {
    /// Builds a view from a table entry and its registration timestamp.
    pub fn new(client: &KnownClient, registered_at: Option<DateTime<Utc>>) -> Self {
        Self {
            id: client.id,
            name: client.name.clone(),
            address: client.address.clone(),
            registered_at,
        }
    }

    #[must_use]
    pub fn is_registered(&self) -> bool {
        self.registered_at.is_some()
    }
}
