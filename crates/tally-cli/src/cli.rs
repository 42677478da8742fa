//! Command-line argument parsing with clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use tally_peer::PeerConfig;

use crate::error::CliError;

/// tally - token ledgers on a local peer.
#[derive(Parser, Debug, Clone)]
#[command(name = "tally")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Peer configuration file (TOML).
    #[arg(short, long, env = "TALLY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory holding contract snapshots.
    #[arg(long, env = "TALLY_STATE_DIR")]
    pub state_dir: Option<PathBuf>,

    /// Channel contracts are deployed on.
    #[arg(long, env = "TALLY_CHANNEL")]
    pub channel: Option<String>,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = Format::Table)]
    pub format: Format,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Format {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON output for scripting.
    Json,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Deploy a new token ledger and issue its supply.
    Deploy(DeployArgs),

    /// List deployed contracts.
    Contracts,

    /// Run an operation and commit its effects.
    Invoke(CallArgs),

    /// Run an operation without committing anything.
    Query(CallArgs),

    /// Write a configuration file with default values.
    InitConfig {
        /// Destination; stdout if omitted.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

/// Arguments for `deploy`.
#[derive(Args, Debug, Clone)]
pub struct DeployArgs {
    /// Name the contract is deployed under.
    pub contract: String,
    /// Token name.
    pub token_name: String,
    /// Ticker symbol.
    pub symbol: String,
    /// Address receiving the whole supply.
    pub owner: String,
    /// Total supply.
    #[arg(allow_hyphen_values = true)]
    pub amount: String,
}

impl DeployArgs {
    /// Initialization parameters in contract order.
    #[must_use]
    pub fn init_params(&self) -> Vec<String> {
        vec![
            self.token_name.clone(),
            self.symbol.clone(),
            self.owner.clone(),
            self.amount.clone(),
        ]
    }
}

/// Arguments for `invoke` and `query`.
#[derive(Args, Debug, Clone)]
pub struct CallArgs {
    /// Target contract.
    pub contract: String,
    /// Operation name, e.g. `transfer`.
    pub function: String,
    /// Operation parameters.
    #[arg(allow_hyphen_values = true, trailing_var_arg = true)]
    pub params: Vec<String>,
}

impl Cli {
    /// Build the peer configuration: file first, then flag overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be loaded or the result is
    /// invalid.
    pub fn peer_config(&self) -> Result<PeerConfig, CliError> {
        let mut config = match &self.config {
            Some(path) => PeerConfig::from_file(path)?,
            None => PeerConfig::default(),
        };
        if let Some(dir) = &self.state_dir {
            config.state_dir.clone_from(dir);
        }
        if let Some(channel) = &self.channel {
            config.channel_id.clone_from(channel);
        }
        config.validate()?;
        Ok(config)
    }
}
