//! Error types for ledger operations.

use thiserror::Error;

/// Result type alias for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Errors that can occur while executing a ledger operation.
///
/// Every variant is recovered at the operation boundary and turned into a
/// failure [`Response`](crate::Response) carrying [`LedgerError::status`].
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Malformed or out-of-range input.
    #[error("{message}")]
    Validation {
        /// Description of the rejected input.
        message: String,
    },

    /// A record that must exist is absent.
    #[error("{what} does not exist in the ledger: {key}")]
    NotFound {
        /// Kind of record that was looked up.
        what: &'static str,
        /// Key that was looked up.
        key: String,
    },

    /// A record that must not exist already does.
    #[error("{what} already exists in the ledger: {key}")]
    AlreadyExists {
        /// Kind of record.
        what: &'static str,
        /// Key of the existing record.
        key: String,
    },

    /// Balance below the requested transfer amount.
    #[error("insufficient funds: {address} holds {have}, needs {need}")]
    InsufficientFunds {
        /// Address being debited.
        address: String,
        /// Current balance.
        have: u64,
        /// Requested amount.
        need: u64,
    },

    /// Allowance below the requested delegated transfer amount.
    #[error("insufficient allowance: {spender} may spend {have} of {owner}'s tokens, needs {need}")]
    InsufficientAllowance {
        /// Owner of the balance.
        owner: String,
        /// Spender acting on the owner's behalf.
        spender: String,
        /// Current allowance.
        have: u64,
        /// Requested amount.
        need: u64,
    },

    /// A credit would exceed the representable amount.
    #[error("amount overflow on {key}")]
    Overflow {
        /// Key whose value would overflow.
        key: String,
    },

    /// Cross-contract call failed or returned a failure status.
    #[error("failed to invoke {target}: status {status}, {message}")]
    RemoteInvocation {
        /// Target contract id.
        target: String,
        /// Status returned by the host.
        status: u16,
        /// Message returned by the host.
        message: String,
    },

    /// A key read by the operation changed before its writes were committed.
    #[error("read conflict on {key:?}: state changed since it was read, retry the operation")]
    Conflict {
        /// First stale key.
        key: String,
    },

    /// Underlying world state read or write failed.
    #[error("storage error: {message}")]
    Storage {
        /// Description of the storage failure.
        message: String,
    },

    /// Structured record could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

impl LedgerError {
    /// Create a validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a not-found error.
    #[must_use]
    pub fn not_found(what: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            what,
            key: key.into(),
        }
    }

    /// Create an already-exists error.
    #[must_use]
    pub fn already_exists(what: &'static str, key: impl Into<String>) -> Self {
        Self::AlreadyExists {
            what,
            key: key.into(),
        }
    }

    /// Create a storage error.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Create an error for the wrong number of operation parameters.
    #[must_use]
    pub fn arity(expected: usize, actual: usize) -> Self {
        Self::validation(format!(
            "the number of params must be {expected}, got {actual}"
        ))
    }

    /// Response status for this error. Always `>= 400`.
    #[must_use]
    pub const fn status(&self) -> u16 {
        match self {
            Self::Validation { .. } => 400,
            Self::NotFound { .. } => 404,
            Self::AlreadyExists { .. } | Self::Conflict { .. } => 409,
            Self::InsufficientFunds { .. } | Self::InsufficientAllowance { .. } => 422,
            Self::RemoteInvocation { .. } => 502,
            Self::Overflow { .. } | Self::Storage { .. } | Self::Codec(_) => 500,
        }
    }
}
