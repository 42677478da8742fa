//! Peer configuration.
//!
//! Loaded from TOML. Every field has a default, so an empty file is a
//! valid configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PeerError, Result};

/// Default channel every contract is deployed on.
pub const DEFAULT_CHANNEL: &str = "tally-channel";

/// Longest accepted channel identifier.
pub const MAX_CHANNEL_LEN: usize = 64;

/// Configuration for a [`Peer`](crate::Peer).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PeerConfig {
    /// Channel on which contracts are deployed and invoked.
    pub channel_id: String,
    /// Directory holding per-contract snapshots.
    pub state_dir: PathBuf,
    /// `tracing` filter used when `RUST_LOG` is unset.
    pub log_filter: String,
    /// Whether to write a snapshot after each committed operation.
    pub persist: bool,
}

impl Default for PeerConfig {
    fn default() -> Self {
        Self {
            channel_id: DEFAULT_CHANNEL.to_string(),
            state_dir: PathBuf::from("./tally-state"),
            log_filter: "info".to_string(),
            persist: true,
        }
    }
}

impl PeerConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            PeerError::Config(format!(
                "failed to read config file '{}': {e}",
                path.as_ref().display()
            ))
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid or fails validation.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| PeerError::Config(format!("invalid TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Render as TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| PeerError::Config(format!("cannot render TOML: {e}")))
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any value is out of range.
    pub fn validate(&self) -> Result<()> {
        if self.channel_id.is_empty() {
            return Err(PeerError::Config("channel_id cannot be empty".to_string()));
        }
        if self.channel_id.len() > MAX_CHANNEL_LEN {
            return Err(PeerError::Config(format!(
                "channel_id cannot exceed {MAX_CHANNEL_LEN} characters"
            )));
        }
        if !self
            .channel_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        {
            return Err(PeerError::Config(
                "channel_id must contain only alphanumeric characters, dots, hyphens, and underscores"
                    .to_string(),
            ));
        }
        if self.persist && self.state_dir.as_os_str().is_empty() {
            return Err(PeerError::Config(
                "state_dir cannot be empty when persist is enabled".to_string(),
            ));
        }
        if self.log_filter.trim().is_empty() {
            return Err(PeerError::Config("log_filter cannot be empty".to_string()));
        }
        Ok(())
    }
}
