//! CLI error types.

use thiserror::Error;

use tally_peer::PeerError;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Peer-level failure.
    #[error(transparent)]
    Peer(#[from] PeerError),
    /// Output formatting error.
    #[error("format error: {0}")]
    Format(String),
    /// Invalid argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
