//! Known clients and the static table they are configured in.
//!
//! The table is built once at startup and never changes afterwards; only
//! the registry's per-client registration state mutates.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Longest rendezvous address a table may hold, in bytes.
///
/// Clients size their reply buffer from this, so a longer address could
/// never be delivered intact.
pub const MAX_ADDRESS_LEN: usize = 4096;

/// Identifier a client sends as its registration request.
///
/// Two bytes on the wire. `0` is reserved as [`ClientId::INVALID`] and is
/// rejected by [`ClientTable::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(u16);

impl ClientId {
    /// Reserved "unknown/unassigned" identifier.
    pub const INVALID: ClientId = ClientId(0);

    /// Creates a ClientId from its raw value.
    pub const fn new(raw: u16) -> Self {
        Self(raw)
    }

    /// Returns the raw identifier.
    pub const fn get(&self) -> u16 {
        self.0
    }

    /// Returns false for the reserved id 0.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.0 != 0
    }
}

impl From<u16> for ClientId {
    fn from(raw: u16) -> Self {
        Self(raw)
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One entry of the known-client table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownClient {
    /// Identifier the client registers with
    pub id: ClientId,

    /// Human-readable label, diagnostics only
    pub name: String,

    /// Where the client should connect for its workload traffic
    pub address: String,
}

impl KnownClient {
    /// Creates a new table entry.
    pub fn new(id: impl Into<ClientId>, name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            address: address.into(),
        }
    }
}

/// Validated, immutable list of known clients.
///
/// Deserializes from a plain list of [`KnownClient`] and runs the same
/// validation as [`ClientTable::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<KnownClient>", into = "Vec<KnownClient>")]
pub struct ClientTable {
    clients: Vec<KnownClient>,
}

impl ClientTable {
    /// Builds a table, rejecting reserved ids, duplicates, and empty or
    /// oversized addresses.
    pub fn new(clients: Vec<KnownClient>) -> DomainResult<Self> {
        let mut seen: HashMap<ClientId, &str> = HashMap::with_capacity(clients.len());

        for client in &clients {
            if !client.id.is_valid() {
                return Err(DomainError::InvalidClientId {
                    client_id: client.id,
                    name: client.name.clone(),
                });
            }
            if client.address.is_empty() {
                return Err(DomainError::EmptyAddress {
                    client_id: client.id,
                    name: client.name.clone(),
                });
            }
            if client.address.len() > MAX_ADDRESS_LEN {
                return Err(DomainError::AddressTooLong {
                    client_id: client.id,
                    len: client.address.len(),
                    max: MAX_ADDRESS_LEN,
                });
            }
            if let Some(first) = seen.insert(client.id, client.name.as_str()) {
                return Err(DomainError::DuplicateClientId {
                    client_id: client.id,
                    first: first.to_string(),
                    second: client.name.clone(),
                });
            }
        }

        Ok(Self { clients })
    }

    /// Looks up a client by id.
    pub fn get(&self, id: ClientId) -> Option<&KnownClient> {
        self.clients.iter().find(|c| c.id == id)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

impl Default for ClientTable {
    /// The built-in three-client table used when no configuration is given.
    fn default() -> Self {
        Self {
            clients: vec![
                KnownClient::new(1, "CLIENT_A", "client_a.socket"),
                KnownClient::new(2, "CLIENT_B", "client_b.socket"),
                KnownClient::new(3, "CLIENT_C", "client_c.socket"),
            ],
        }
    }
}

impl TryFrom<Vec<KnownClient>> for ClientTable {
    type Error = DomainError;

    fn try_from(clients: Vec<KnownClient>) -> Result<Self, Self::Error> {
        Self::new(clients)
    }
}

impl From<ClientTable> for Vec<KnownClient> {
    fn from(table: ClientTable) -> Self {
        table.clients
    }
}

impl IntoIterator for ClientTable {
    type Item = KnownClient;
    type IntoIter = std::vec::IntoIter<KnownClient>;

    fn into_iter(self) -> Self::IntoIter {
        self.clients.into_iter()
    }
}
