//! In-memory doubles for unit tests.

use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::context::TxContext;
use crate::error::{LedgerError, Result};
use crate::key::KeyRange;
use crate::response::Response;
use crate::store::{ContractInvoker, EventSink, KeyValue, LedgerStore, ReadSet, StateIter, WriteSet};

/// Committed state behind a mutex.
#[derive(Default)]
pub(crate) struct MemoryStore {
    entries: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStore {
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, Vec<u8>>>> {
        self.entries
            .lock()
            .map_err(|_| LedgerError::storage("memory store poisoned"))
    }

    /// Applies the writes of `ctx` and drops its events.
    pub(crate) fn commit(&self, ctx: TxContext<'_>) {
        let effects = ctx.into_effects();
        self.apply(&effects.reads, &effects.writes).unwrap();
    }

    /// Committed bytes under `key`.
    pub(crate) fn raw(&self, key: &str) -> Option<Vec<u8>> {
        self.lock().unwrap().get(key).cloned()
    }

    /// Writes straight into committed state.
    pub(crate) fn insert(&self, key: &str, value: Vec<u8>) {
        self.lock().unwrap().insert(key.to_string(), value);
    }
}

impl LedgerStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn put(&self, key: &str, value: Vec<u8>) -> Result<()> {
        self.lock()?.insert(key.to_string(), value);
        Ok(())
    }

    fn range(&self, range: &KeyRange) -> Result<StateIter<'_>> {
        let snapshot: Vec<KeyValue> = self
            .lock()?
            .range(range.start.clone()..range.end.clone())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Ok(Box::new(snapshot.into_iter().map(Ok)))
    }

    fn apply(&self, reads: &ReadSet, writes: &WriteSet) -> Result<()> {
        let mut entries = self.lock()?;
        for (key, seen) in reads.iter() {
            if entries.get(key).map(Vec::as_slice) != seen {
                return Err(LedgerError::Conflict { key: key.to_string() });
            }
        }
        for (key, value) in writes.iter() {
            entries.insert(key.to_string(), value.to_vec());
        }
        Ok(())
    }
}

/// Collects emitted events.
#[derive(Default)]
pub(crate) struct RecordingSink {
    events: Mutex<Vec<(String, Vec<u8>)>>,
}

impl RecordingSink {
    pub(crate) fn names(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, name: &str, payload: &[u8]) {
        self.events
            .lock()
            .unwrap()
            .push((name.to_string(), payload.to_vec()));
    }
}

/// An invoker with no other contracts deployed.
pub(crate) struct NoRemote;

impl ContractInvoker for NoRemote {
    fn invoke_contract(&self, target: &str, _args: &[Vec<u8>], _channel: &str) -> Response {
        Response::failure(404, format!("contract {target} is not deployed"))
    }
}
