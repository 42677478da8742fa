//! Output formatting for CLI commands.
//!
//! Supports table (human-readable) and JSON output formats.

use std::io::Write;

use serde::Serialize;

use tally_ledger::{Operation, Response};
use tally_peer::RecordedEvent;

use crate::cli::Format;
use crate::error::CliError;

/// Output formatter that handles both table and JSON output.
#[derive(Debug, Clone)]
pub struct OutputFormat {
    format: Format,
}

impl OutputFormat {
    /// Create a new output formatter.
    #[must_use]
    pub const fn new(format: Format) -> Self {
        Self { format }
    }

    /// Write a serializable value to the output.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write<W, T>(&self, writer: &mut W, value: &T) -> Result<(), CliError>
    where
        W: Write,
        T: Serialize + TableDisplay,
    {
        match self.format {
            Format::Json => {
                serde_json::to_writer_pretty(&mut *writer, value)
                    .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
                writeln!(writer)?;
            }
            Format::Table => value.write_table(writer)?,
        }
        Ok(())
    }

    /// Write a serializable value to a string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_string<T>(&self, value: &T) -> Result<String, CliError>
    where
        T: Serialize + TableDisplay,
    {
        let mut buf = Vec::new();
        self.write(&mut buf, value)?;
        String::from_utf8(buf).map_err(|e| CliError::Format(format!("UTF-8 error: {e}")))
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::new(Format::Table)
    }
}

/// Trait for types that can be displayed as a table.
pub trait TableDisplay {
    /// Write the value as a human-readable table.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError>;
}

/// A committed event, with its payload decoded where possible.
#[derive(Debug, Clone, Serialize)]
pub struct EventView {
    /// Position in the peer's log.
    pub sequence: u64,
    /// Emitting contract.
    pub contract: String,
    /// Event name.
    pub name: String,
    /// Payload as JSON, or as text if it is not JSON.
    pub payload: serde_json::Value,
}

impl From<&RecordedEvent> for EventView {
    fn from(event: &RecordedEvent) -> Self {
        let payload = event.payload_json().unwrap_or_else(|| {
            serde_json::Value::String(String::from_utf8_lossy(&event.payload).into_owned())
        });
        Self {
            sequence: event.sequence,
            contract: event.contract.clone(),
            name: event.name.clone(),
            payload,
        }
    }
}

/// Result of a deploy, invoke or query.
#[derive(Debug, Clone, Serialize)]
pub struct CallResult {
    /// Target contract.
    pub contract: String,
    /// Operation that ran.
    pub function: String,
    /// Response status.
    pub status: u16,
    /// Response message, empty on most successes.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub message: String,
    /// Payload as text.
    pub payload: String,
    /// Whether the effects were committed.
    pub committed: bool,
    /// Events the call committed.
    pub events: Vec<EventView>,
}

impl CallResult {
    /// Build from a contract response. Read-only operations are never
    /// reported as committed.
    #[must_use]
    pub fn new(
        contract: &str,
        function: &str,
        response: &Response,
        committed: bool,
        events: &[RecordedEvent],
    ) -> Self {
        Self {
            contract: contract.to_string(),
            function: function.to_string(),
            status: response.status,
            message: response.message.clone(),
            payload: response.payload_str(),
            committed: committed
                && response.is_success()
                && !function.parse::<Operation>().is_ok_and(|op| op.is_query()),
            events: events.iter().map(EventView::from).collect(),
        }
    }

    /// Whether the call succeeded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status < tally_ledger::response::ERROR_THRESHOLD
    }
}

impl TableDisplay for CallResult {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        let mark = if self.is_success() { "✓" } else { "✗" };
        writeln!(writer, "{mark} {}.{}  [{}]", self.contract, self.function, self.status)?;
        if !self.message.is_empty() {
            writeln!(writer, "  Message:  {}", self.message)?;
        }
        if !self.payload.is_empty() {
            writeln!(writer, "  Payload:  {}", self.payload)?;
        }
        if !self.events.is_empty() {
            writeln!(writer)?;
            writeln!(writer, "{:>4}  {:<12}  {:<16}  PAYLOAD", "SEQ", "CONTRACT", "EVENT")?;
            writeln!(writer, "{}", "─".repeat(72))?;
            for event in &self.events {
                writeln!(
                    writer,
                    "{:>4}  {:<12}  {:<16}  {}",
                    event.sequence,
                    truncate(&event.contract, 12),
                    event.name,
                    event.payload
                )?;
            }
        }
        Ok(())
    }
}

/// A deployed contract for listing.
#[derive(Debug, Clone, Serialize)]
pub struct ContractInfo {
    /// Contract name.
    pub name: String,
    /// Number of keys in its world state.
    pub keys: usize,
}

/// List of contracts for display.
#[derive(Debug, Clone, Serialize)]
pub struct ContractList {
    /// Channel the peer serves.
    pub channel: String,
    /// Deployed contracts.
    pub contracts: Vec<ContractInfo>,
}

impl TableDisplay for ContractList {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.contracts.is_empty() {
            writeln!(writer, "No contracts deployed on {}", self.channel)?;
            return Ok(());
        }

        writeln!(writer, "{:<32}  {:>6}", "CONTRACT", "KEYS")?;
        writeln!(writer, "{}", "─".repeat(40))?;
        for contract in &self.contracts {
            writeln!(writer, "{:<32}  {:>6}", truncate(&contract.name, 32), contract.keys)?;
        }
        writeln!(writer)?;
        writeln!(
            writer,
            "Total: {} contract(s) on {}",
            self.contracts.len(),
            self.channel
        )?;
        Ok(())
    }
}

/// Confirmation of a completed action.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    /// Message text.
    pub message: String,
}

impl Message {
    /// Create a success message.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl TableDisplay for Message {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "✓ {}", self.message)?;
        Ok(())
    }
}

/// Truncate a string to at most `max_len` characters.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len > 3 {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{head}...")
    } else {
        s.chars().take(max_len).collect()
    }
}
