//! Operation results as seen by the host.

use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// Status of a successful operation.
pub const OK: u16 = 200;

/// Status of an unknown operation.
pub const NOT_FOUND: u16 = 404;

/// Statuses at or above this value are failures.
pub const ERROR_THRESHOLD: u16 = 400;

/// Result of an operation: status, human-readable message and payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    /// HTTP-style status code.
    pub status: u16,
    /// Message, empty on success unless the operation sets one.
    pub message: String,
    /// Operation output.
    pub payload: Vec<u8>,
}

impl Response {
    /// A successful response carrying `payload`.
    #[must_use]
    pub fn success(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            status: OK,
            message: String::new(),
            payload: payload.into(),
        }
    }

    /// A failed response with an explicit status.
    #[must_use]
    pub fn failure(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            payload: Vec::new(),
        }
    }

    /// The response for an operation name the contract does not know.
    #[must_use]
    pub fn not_found() -> Self {
        Self::failure(NOT_FOUND, "404 Not Found")
    }

    /// Whether the status denotes success.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status < ERROR_THRESHOLD
    }

    /// The payload as UTF-8 text, lossily.
    #[must_use]
    pub fn payload_str(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }
}

impl From<&LedgerError> for Response {
    fn from(err: &LedgerError) -> Self {
        Self::failure(err.status(), err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success() {
        let resp = Response::success("1000");
        assert!(resp.is_success());
        assert_eq!(resp.payload_str(), "1000");
    }

    #[test]
    fn test_not_found() {
        let resp = Response::not_found();
        assert_eq!(resp.status, 404);
        assert!(!resp.is_success());
    }

    #[test]
    fn test_from_error() {
        let err = LedgerError::not_found("balance", "bob");
        let resp = Response::from(&err);
        assert_eq!(resp.status, 404);
        assert!(resp.message.contains("bob"));
        assert!(resp.payload.is_empty());
    }
}
