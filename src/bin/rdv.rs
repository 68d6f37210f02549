//! rdv - registration client for the rendezvous daemon
//!
//! ```bash
//! # Register as client 1 and print the assigned address
//! rdv register 1
//!
//! # Against a non-default socket
//! rdv register 2 --socket /run/rdvd.sock
//! ```
//!
//! Exits with status 1 if the daemon rejects the id.

use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use rdv_core::ClientId;
use rdv_protocol::{request_registration, RegistrationReply};
use rdvd::server::DEFAULT_SOCKET_PATH;

/// Rendezvous registration client
#[derive(Parser, Debug)]
#[command(name = "rdv", version, about)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Register a client id and print its rendezvous address
    Register {
        /// Client id to register (1-65535)
        #[arg(value_parser = clap::value_parser!(u16).range(1..))]
        id: u16,

        /// Registration socket of the daemon
        #[arg(short, long, default_value = DEFAULT_SOCKET_PATH)]
        socket: PathBuf,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("rdv_protocol=warn")),
        )
        .init();

    let args = Args::parse();

    match args.command {
        Command::Register { id, socket } => {
            let reply = request_registration(&socket, ClientId::new(id))
                .await
                .with_context(|| format!("Registration with {} failed", socket.display()))?;

            match reply {
                RegistrationReply::Assigned(address) => {
                    println!("{address}");
                    Ok(())
                }
                RegistrationReply::Rejected => {
                    eprintln!("Registration of client {id} was rejected");
                    process::exit(1);
                }
            }
        }
    }
}
