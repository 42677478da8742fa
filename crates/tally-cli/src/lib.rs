//! # tally-cli
//!
//! Command-line interface for token ledgers hosted on a local peer.
//!
//! Provides commands for:
//! - Deploying a ledger and issuing its supply
//! - Invoking operations (committed) and querying them (discarded)
//! - Listing deployed contracts
//! - Writing a default peer configuration
//!
//! Each run opens the peer from its state directory, executes one command
//! and leaves the updated snapshots behind.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::io::Write;

use tally_peer::{Peer, PeerConfig};

pub mod cli;
pub mod commands;
pub mod error;
pub mod output;

pub use cli::{CallArgs, Cli, Commands, DeployArgs, Format};
pub use error::CliError;
pub use output::OutputFormat;

use commands::{CallCommand, ContractsCommand, DeployCommand, InitConfigCommand};

/// Execute `cli` against a peer built from `config`.
///
/// Returns `false` when the contract answered with a failure status.
///
/// # Errors
///
/// Returns an error for failures outside the contract: bad configuration,
/// unreadable state or unwritable output.
pub fn run<W: Write>(cli: &Cli, config: PeerConfig, writer: &mut W) -> Result<bool, CliError> {
    let format = OutputFormat::new(cli.format);
    match &cli.command {
        Commands::InitConfig { output, force } => {
            InitConfigCommand::new(output.clone(), *force).execute(writer, &format, &config)?;
            Ok(true)
        }
        Commands::Deploy(args) => {
            DeployCommand::new(&Peer::open(config)?).execute(writer, &format, args)
        }
        Commands::Contracts => {
            ContractsCommand::new(&Peer::open(config)?).execute(writer, &format)?;
            Ok(true)
        }
        Commands::Invoke(args) => {
            CallCommand::invoke(&Peer::open(config)?).execute(writer, &format, args)
        }
        Commands::Query(args) => {
            CallCommand::query(&Peer::open(config)?).execute(writer, &format, args)
        }
    }
}
