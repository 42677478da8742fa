//! Storage key derivation.
//!
//! Token metadata and balances live under *simple* keys: the token name or
//! the address string itself. Allowances live under *composite* keys laid out
//! as `\0 namespace \0 owner \0 spender \0`. Simple keys may never contain
//! `\0`, so no simple key can collide with a composite one, and a composite
//! key splits back into exactly the components it was built from.

use std::fmt;

use crate::error::{LedgerError, Result};

/// Namespace of allowance entries.
pub const APPROVAL_NAMESPACE: &str = "approval";

const SEPARATOR: char = '\u{0}';
const MAX_UNICODE: char = char::MAX;

/// Validate a string used as a simple key or key component.
///
/// # Errors
///
/// Returns a validation error if `value` is empty or contains `U+0000`
/// or `U+10FFFF`.
pub fn validate_component(value: &str, field: &str) -> Result<()> {
    if value.is_empty() {
        return Err(LedgerError::validation(format!("{field} cannot be empty")));
    }
    if value.contains(SEPARATOR) || value.contains(MAX_UNICODE) {
        return Err(LedgerError::validation(format!(
            "{field} contains a reserved character"
        )));
    }
    Ok(())
}

/// Key of a token's metadata record.
#[must_use]
pub fn metadata_key(token_name: &str) -> String {
    token_name.to_string()
}

/// Key of an address's balance.
#[must_use]
pub fn balance_key(address: &str) -> String {
    address.to_string()
}

/// Key of the allowance `spender` holds over `owner`'s balance.
#[must_use]
pub fn allowance_key(owner: &str, spender: &str) -> String {
    CompositeKey::new(APPROVAL_NAMESPACE, [owner, spender]).encode()
}

/// Half-open key range `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRange {
    /// Inclusive lower bound.
    pub start: String,
    /// Exclusive upper bound.
    pub end: String,
}

impl KeyRange {
    /// Whether `key` falls inside the range.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        key >= self.start.as_str() && key < self.end.as_str()
    }
}

/// A namespace plus ordered components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeKey {
    namespace: String,
    components: Vec<String>,
}

impl CompositeKey {
    /// Build a composite key.
    pub fn new<I, S>(namespace: impl Into<String>, components: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            namespace: namespace.into(),
            components: components.into_iter().map(Into::into).collect(),
        }
    }

    /// The namespace.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The components, in order.
    #[must_use]
    pub fn components(&self) -> &[String] {
        &self.components
    }

    /// Encode to a storage key.
    #[must_use]
    pub fn encode(&self) -> String {
        let mut key = String::with_capacity(
            2 + self.namespace.len() + self.components.iter().map(|c| c.len() + 1).sum::<usize>(),
        );
        key.push(SEPARATOR);
        key.push_str(&self.namespace);
        key.push(SEPARATOR);
        for component in &self.components {
            key.push_str(component);
            key.push(SEPARATOR);
        }
        key
    }

    /// Range covering every key that extends this (possibly partial) key
    /// with further components.
    #[must_use]
    pub fn prefix_range(&self) -> KeyRange {
        let start = self.encode();
        let mut end = start.clone();
        end.push(MAX_UNICODE);
        KeyRange { start, end }
    }

    /// Split a storage key back into its namespace and components.
    ///
    /// # Errors
    ///
    /// Returns a storage error if `key` is not a composite key.
    pub fn split(key: &str) -> Result<Self> {
        let malformed = || LedgerError::storage(format!("malformed composite key {key:?}"));
        let body = key
            .strip_prefix(SEPARATOR)
            .and_then(|rest| rest.strip_suffix(SEPARATOR))
            .ok_or_else(malformed)?;
        let mut parts = body.split(SEPARATOR);
        let namespace = parts.next().filter(|ns| !ns.is_empty()).ok_or_else(malformed)?;
        Ok(Self::new(namespace, parts))
    }
}

impl fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.namespace)?;
        for component in &self.components {
            write!(f, "/{component}")?;
        }
        Ok(())
    }
}
