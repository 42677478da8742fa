//! Per-operation transaction context.
//!
//! Every top-level operation runs against its own [`TxContext`]. Reads go
//! through the pending writes first and then to the committed world state;
//! writes and events are only buffered. When the operation succeeds the
//! buffered [`Effects`] are committed as one batch, when it fails they are
//! dropped, so a partially applied transfer is never observable.
//!
//! Every committed value the operation reads is remembered in a
//! [`ReadSet`]. The store refuses the batch if any of those values changed
//! in the meantime, which keeps concurrent operations on the same keys
//! serializable. Scans are not tracked.

use std::cell::RefCell;

use serde::Serialize;
use tracing::{debug, error, warn};

use crate::error::{LedgerError, Result};
use crate::store::{ChaincodeEvent, EventSink, LedgerStore, ReadSet, StateIter, WriteSet};

/// Buffered view of the world state for one operation.
pub struct TxContext<'s> {
    store: &'s dyn LedgerStore,
    reads: RefCell<ReadSet>,
    writes: WriteSet,
    events: Vec<ChaincodeEvent>,
}

impl<'s> TxContext<'s> {
    /// Start an operation over `store`.
    #[must_use]
    pub fn new(store: &'s dyn LedgerStore) -> Self {
        Self {
            store,
            reads: RefCell::new(ReadSet::new()),
            writes: WriteSet::new(),
            events: Vec::new(),
        }
    }

    /// Reads `key`, observing this operation's own pending writes.
    ///
    /// Repeated reads of a committed key return the first value seen.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the underlying read fails.
    pub fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        if let Some(pending) = self.writes.get(key) {
            return Ok(Some(pending.to_vec()));
        }
        if let Some(seen) = self.reads.borrow().get(key) {
            return Ok(seen.map(<[u8]>::to_vec));
        }
        let value = self.store.get(key)?;
        self.reads.borrow_mut().record(key, value.as_deref());
        Ok(value)
    }

    /// Buffers a write.
    pub fn put(&mut self, key: impl Into<String>, value: Vec<u8>) {
        self.writes.put(key, value);
    }

    /// Scans composite keys in committed state.
    ///
    /// Pending writes of this operation are not visible to scans.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the scan cannot start.
    pub fn scan_committed(&self, namespace: &str, partial: &[&str]) -> Result<StateIter<'s>> {
        self.store.scan_composite(namespace, partial)
    }

    /// Buffers an event with a JSON payload.
    ///
    /// # Errors
    ///
    /// Returns a codec error if the payload cannot be encoded.
    pub fn emit<T: Serialize>(&mut self, name: &str, payload: &T) -> Result<()> {
        let payload = serde_json::to_vec(payload)?;
        self.events.push(ChaincodeEvent {
            name: name.to_string(),
            payload,
        });
        Ok(())
    }

    /// Finish the operation, yielding what it would change.
    #[must_use]
    pub fn into_effects(self) -> Effects {
        Effects {
            reads: self.reads.into_inner(),
            writes: self.writes,
            events: self.events,
        }
    }
}

/// Writes and events produced by one successful operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Effects {
    /// Committed values the writes were computed from.
    pub reads: ReadSet,
    /// Pending writes.
    pub writes: WriteSet,
    /// Pending events, in emission order.
    pub events: Vec<ChaincodeEvent>,
}

impl Effects {
    /// Whether the operation changed nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty() && self.events.is_empty()
    }

    /// Applies the writes as one batch, then delivers the events.
    ///
    /// Events are only delivered once the batch is committed.
    ///
    /// # Errors
    ///
    /// Returns a conflict error if a value read by the operation changed
    /// before the commit, and a storage error if the batch cannot be
    /// committed. No event is delivered in either case.
    pub fn commit(self, store: &dyn LedgerStore, sink: &dyn EventSink) -> Result<()> {
        if !self.writes.is_empty() {
            store.apply(&self.reads, &self.writes).map_err(|err| {
                if matches!(err, LedgerError::Conflict { .. }) {
                    warn!(error = %err, reads = self.reads.len(), "write set is stale");
                } else {
                    error!(error = %err, writes = self.writes.len(), "write set rejected");
                }
                err
            })?;
        }
        for event in &self.events {
            sink.emit(&event.name, &event.payload);
        }
        debug!(
            writes = self.writes.len(),
            events = self.events.len(),
            "effects committed"
        );
        Ok(())
    }
}
