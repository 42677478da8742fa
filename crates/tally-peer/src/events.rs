//! Event log shared by every contract on a peer.

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::info;

use tally_ledger::EventSink;

/// An event as recorded by the peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedEvent {
    /// Position in the log, starting at zero.
    pub sequence: u64,
    /// Contract that emitted the event.
    pub contract: String,
    /// Event name.
    pub name: String,
    /// Raw payload.
    pub payload: Vec<u8>,
}

impl RecordedEvent {
    /// The payload decoded as JSON, if it is JSON.
    #[must_use]
    pub fn payload_json(&self) -> Option<serde_json::Value> {
        serde_json::from_slice(&self.payload).ok()
    }
}

/// Append-only, in-order event log.
#[derive(Debug, Default)]
pub struct EventLog {
    events: RwLock<Vec<RecordedEvent>>,
}

impl EventLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An [`EventSink`] that tags events with `contract` and also copies
    /// them into `tap`.
    ///
    /// The tap gathers the events of one call while other calls record
    /// into the same log.
    #[must_use]
    pub fn sink<'a>(
        &'a self,
        contract: &'a str,
        tap: &'a Mutex<Vec<RecordedEvent>>,
    ) -> ContractEvents<'a> {
        ContractEvents {
            log: self,
            contract,
            tap,
        }
    }

    fn record(&self, contract: &str, name: &str, payload: &[u8]) -> RecordedEvent {
        let mut events = self.events.write();
        let event = RecordedEvent {
            sequence: events.len() as u64,
            contract: contract.to_string(),
            name: name.to_string(),
            payload: payload.to_vec(),
        };
        info!(sequence = event.sequence, contract = %contract, event = %name, "event emitted");
        events.push(event.clone());
        event
    }

    /// Every recorded event.
    #[must_use]
    pub fn all(&self) -> Vec<RecordedEvent> {
        self.events.read().clone()
    }

    /// Number of recorded events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Whether nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }
}

/// Sink for one contract's events.
pub struct ContractEvents<'a> {
    log: &'a EventLog,
    contract: &'a str,
    tap: &'a Mutex<Vec<RecordedEvent>>,
}

impl EventSink for ContractEvents<'_> {
    fn emit(&self, name: &str, payload: &[u8]) {
        let event = self.log.record(self.contract, name, payload);
        self.tap.lock().push(event);
    }
}
