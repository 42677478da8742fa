//! Token amount representation.
//!
//! Amounts are whole token units stored as `u64`. In the world state they
//! are always encoded as ASCII decimal bytes, both for balances and for
//! allowances; inside JSON records they serialize as plain integers.

use crate::error::{LedgerError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An amount of tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(u64);

impl Amount {
    /// Zero tokens.
    pub const ZERO: Self = Self(0);

    /// Largest representable amount.
    pub const MAX: Self = Self(u64::MAX);

    /// Create an amount from raw units.
    #[must_use]
    pub const fn new(units: u64) -> Self {
        Self(units)
    }

    /// Raw units.
    #[must_use]
    pub const fn units(&self) -> u64 {
        self.0
    }

    /// Check if the amount is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checked addition.
    #[must_use]
    pub const fn checked_add(&self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(units) => Some(Self(units)),
            None => None,
        }
    }

    /// Checked subtraction.
    #[must_use]
    pub const fn checked_sub(&self, other: Self) -> Option<Self> {
        match self.0.checked_sub(other.0) {
            Some(units) => Some(Self(units)),
            None => None,
        }
    }

    /// Parse a caller-supplied parameter that may be zero.
    ///
    /// # Errors
    ///
    /// Returns a validation error naming `field` if the value is not a
    /// non-negative integer.
    pub fn parse(value: &str, field: &str) -> Result<Self> {
        match parse_units(value) {
            Ok(units) => Ok(Self(units)),
            Err(Malformed::Negative) => Err(LedgerError::validation(format!(
                "{field} cannot be negative"
            ))),
            Err(Malformed::NotInteger) => Err(LedgerError::validation(format!(
                "{field} must be an integer"
            ))),
        }
    }

    /// Parse a caller-supplied parameter that must be strictly positive.
    ///
    /// # Errors
    ///
    /// Returns a validation error naming `field` if the value is not an
    /// integer or is not more than zero.
    pub fn parse_positive(value: &str, field: &str) -> Result<Self> {
        match parse_units(value) {
            Ok(0) | Err(Malformed::Negative) => Err(LedgerError::validation(format!(
                "{field} must be more than zero"
            ))),
            Ok(units) => Ok(Self(units)),
            Err(Malformed::NotInteger) => Err(LedgerError::validation(format!(
                "{field} must be an integer"
            ))),
        }
    }

    /// Decode an amount stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the bytes are not ASCII decimal.
    pub fn from_state(bytes: &[u8], key: &str) -> Result<Self> {
        std::str::from_utf8(bytes)
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Self)
            .ok_or_else(|| LedgerError::storage(format!("corrupt amount stored under {key:?}")))
    }

    /// Encode for storage.
    #[must_use]
    pub fn to_state(&self) -> Vec<u8> {
        self.0.to_string().into_bytes()
    }
}

enum Malformed {
    Negative,
    NotInteger,
}

fn parse_units(value: &str) -> std::result::Result<u64, Malformed> {
    if let Ok(units) = value.parse::<u64>() {
        return Ok(units);
    }
    match value.strip_prefix('-') {
        Some(digits) if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) => {
            Err(Malformed::Negative)
        }
        _ => Err(Malformed::NotInteger),
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Amount {
    fn from(units: u64) -> Self {
        Self(units)
    }
}
