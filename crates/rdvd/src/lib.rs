//! Rendezvous Daemon - client registry and registration server
//!
//! This crate provides the broker that hands known clients their
//! rendezvous addresses:
//! - `registry` - Client registry actor tracking who has registered
//! - `server` - Unix socket server running one session per connection
//! - `manager` - Composition root wiring the two together
//! - `config` - Daemon configuration file
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                        rdvd daemon                        │
//! ├───────────────────────────────────────────────────────────┤
//! │                                                           │
//! │  ┌────────────────────┐     ┌─────────────────────────┐   │
//! │  │ RegistrationServer │────▶│     RegistryActor       │   │
//! │  │   (Unix Socket)    │     │  (client state owner)   │   │
//! │  └─────────┬──────────┘     └─────────────────────────┘   │
//! │            │ connections                                  │
//! │            ▼                                              │
//! │  ┌────────────────────┐                                   │
//! │  │RegistrationSession │  read id → register → reply       │
//! │  │  (per connection)  │                                   │
//! │  └────────────────────┘                                   │
//! │                                                           │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! # Panic-Free Guarantees
//!
//! All production code in this crate follows the panic-free policy:
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - All fallible operations return `Result` or `Option`
//! - Channel operations handle closure gracefully

pub mod config;
pub mod manager;
pub mod registry;
pub mod server;
