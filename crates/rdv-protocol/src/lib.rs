//! Rendezvous Protocol - Wire format for registration
//!
//! This crate provides the request/reply encoding shared by the
//! daemon and its clients, plus an async helper that performs a
//! complete registration from the client side.
//!
//! # Wire Format
//!
//! ```text
//! client ──▶ daemon   [u16 client id, native byte order]   (2 bytes, no framing)
//! daemon ──▶ client   [address bytes] EOF                  (success)
//! daemon ──▶ client   EOF                                  (rejection)
//! ```

pub mod client;
pub mod message;

pub use client::{request_registration, request_registration_with_timeout, ClientError};
pub use message::{decode_request, encode_request, RegistrationReply, ReplyError, REQUEST_LEN};
