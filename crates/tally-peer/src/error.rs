//! Error types for the peer host.

use thiserror::Error;

use tally_ledger::LedgerError;

/// Errors raised by the peer outside of contract execution.
///
/// Failures *inside* an operation are reported as a
/// [`Response`](tally_ledger::Response) instead.
#[derive(Debug, Error)]
pub enum PeerError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// A contract with this name is already deployed.
    #[error("contract already deployed: {0}")]
    ContractExists(String),

    /// No contract with this name is deployed.
    #[error("contract not deployed: {0}")]
    ContractNotFound(String),

    /// A snapshot file is unreadable.
    #[error("snapshot error: {0}")]
    Snapshot(String),

    /// Ledger error outside an operation.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// JSON encoding error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for peer operations.
pub type Result<T> = std::result::Result<T, PeerError>;
