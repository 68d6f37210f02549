//! Registration request and reply encoding.
//!
//! The request is the raw two-byte client id. The reply carries no header:
//! the address bytes followed by end-of-stream mean success, and an empty
//! stream means the broker rejected the id. Clients must treat "closed with
//! no data" as a rejection, not as a transport failure.

use rdv_core::{ClientId, MAX_ADDRESS_LEN};
use thiserror::Error;

/// Size of a registration request on the wire.
pub const REQUEST_LEN: usize = 2;

/// Encodes a client id as a registration request.
///
/// Both ends live on the same host, so the id travels in native byte order.
pub fn encode_request(id: ClientId) -> [u8; REQUEST_LEN] {
    id.get().to_ne_bytes()
}

/// Decodes a registration request.
pub fn decode_request(bytes: [u8; REQUEST_LEN]) -> ClientId {
    ClientId::new(u16::from_ne_bytes(bytes))
}

/// Outcome of a registration as seen by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationReply {
    /// The broker assigned this rendezvous address
    Assigned(String),

    /// Connection closed with zero bytes
    Rejected,
}

impl RegistrationReply {
    /// Interprets everything the broker sent before closing the connection.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, ReplyError> {
        if bytes.is_empty() {
            return Ok(Self::Rejected);
        }
        if bytes.len() > MAX_ADDRESS_LEN {
            return Err(ReplyError::TooLong {
                max: MAX_ADDRESS_LEN,
            });
        }

        String::from_utf8(bytes)
            .map(Self::Assigned)
            .map_err(|e| ReplyError::InvalidAddress(e.to_string()))
    }

    /// Returns the assigned address, if any.
    pub fn address(&self) -> Option<&str> {
        match self {
            Self::Assigned(address) => Some(address),
            Self::Rejected => None,
        }
    }

    #[must_use]
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected)
    }
}

/// Errors interpreting a reply.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReplyError {
    #[error("Reply is not a valid UTF-8 address: {0}")]
    InvalidAddress(String),

    #[error("Reply exceeds the {max}-byte address limit")]
    TooLong { max: usize },
}
