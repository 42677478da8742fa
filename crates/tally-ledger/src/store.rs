//! Capabilities the hosting environment provides to the ledger.
//!
//! The ledger never owns its world state. It reads through a
//! [`LedgerStore`], hands its accumulated writes back as one [`WriteSet`]
//! together with the [`ReadSet`] they were computed from,
//! reports notifications through an [`EventSink`] and reaches other ledger
//! instances through a [`ContractInvoker`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};
use crate::key::{CompositeKey, KeyRange};
use crate::response::Response;

/// A key with its stored value.
pub type KeyValue = (String, Vec<u8>);

/// Iterator over a key range, in ascending key order.
pub type StateIter<'a> = Box<dyn Iterator<Item = Result<KeyValue>> + 'a>;

/// Key-value world state.
///
/// Implementors must make [`LedgerStore::apply`] atomic: either every write
/// of the batch becomes visible or none does, and a batch whose reads are
/// stale is rejected with [`LedgerError::Conflict`].
pub trait LedgerStore: Send + Sync {
    /// Reads the value under `key`. `None` if the key was never written.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the read fails.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Writes a single value.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the write fails.
    fn put(&self, key: &str, value: Vec<u8>) -> Result<()>;

    /// Iterates the committed entries whose keys fall in `range`.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the scan cannot start. Failures while
    /// iterating are reported per item.
    fn range(&self, range: &KeyRange) -> Result<StateIter<'_>>;

    /// Commits a batch of writes if every value in `reads` is still the
    /// committed one.
    ///
    /// The default implementation validates and writes one key at a time
    /// and is only atomic if the store serializes its callers.
    ///
    /// # Errors
    ///
    /// Returns a conflict error if a read is stale and a storage error if
    /// the batch cannot be committed.
    fn apply(&self, reads: &ReadSet, writes: &WriteSet) -> Result<()> {
        for (key, seen) in reads.iter() {
            if self.get(key)?.as_deref() != seen {
                return Err(LedgerError::Conflict { key: key.to_string() });
            }
        }
        for (key, value) in writes.iter() {
            self.put(key, value.to_vec())?;
        }
        Ok(())
    }

    /// Iterates every composite key under `namespace` whose leading
    /// components equal `partial`.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the scan cannot start.
    fn scan_composite(&self, namespace: &str, partial: &[&str]) -> Result<StateIter<'_>> {
        let range = CompositeKey::new(namespace, partial.iter().copied()).prefix_range();
        self.range(&range)
    }
}

/// Receiver of structured notifications.
///
/// Delivery is fire-and-forget: the ledger does not observe failures.
pub trait EventSink: Send + Sync {
    /// Emits one event.
    fn emit(&self, name: &str, payload: &[u8]);
}

/// Inter-contract invocation facility.
pub trait ContractInvoker: Send + Sync {
    /// Invokes `target` with `args` (the operation name first) on `channel`.
    ///
    /// A status `>= 400` means the target rejected the call.
    fn invoke_contract(&self, target: &str, args: &[Vec<u8>], channel: &str) -> Response;
}

/// Ordered set of pending writes, last write per key wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteSet {
    writes: BTreeMap<String, Vec<u8>>,
}

impl WriteSet {
    /// Create an empty write set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a write, replacing any earlier write to the same key.
    pub fn put(&mut self, key: impl Into<String>, value: Vec<u8>) {
        self.writes.insert(key.into(), value);
    }

    /// The pending value for `key`, if any.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&[u8]> {
        self.writes.get(key).map(Vec::as_slice)
    }

    /// Iterates pending writes in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.writes.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Number of distinct keys written.
    #[must_use]
    pub fn len(&self) -> usize {
        self.writes.len()
    }

    /// Whether nothing was written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }
}

/// Committed values an operation observed, first read per key.
///
/// `None` records that the key was absent. A store commits the matching
/// [`WriteSet`] only while every entry still holds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadSet {
    reads: BTreeMap<String, Option<Vec<u8>>>,
}

impl ReadSet {
    /// Create an empty read set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the committed value of `key` unless it was read before.
    pub fn record(&mut self, key: &str, value: Option<&[u8]>) {
        if !self.reads.contains_key(key) {
            self.reads.insert(key.to_string(), value.map(<[u8]>::to_vec));
        }
    }

    /// The value recorded for `key`: `None` if never read, `Some(None)` if
    /// it was read as absent.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Option<&[u8]>> {
        self.reads.get(key).map(Option::as_deref)
    }

    /// Iterates recorded reads in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&[u8]>)> {
        self.reads.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    /// Number of distinct keys read.
    #[must_use]
    pub fn len(&self) -> usize {
        self.reads.len()
    }

    /// Whether nothing was read.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reads.is_empty()
    }
}

/// An event recorded during an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChaincodeEvent {
    /// Event name.
    pub name: String,
    /// Encoded payload.
    pub payload: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::{allowance_key, APPROVAL_NAMESPACE};
    use std::sync::Mutex;

    /// A simple mock store for testing the provided methods.
    #[derive(Default)]
    struct MockStore {
        entries: Mutex<BTreeMap<String, Vec<u8>>>,
    }

    impl LedgerStore for MockStore {
        fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
            let entries = self
                .entries
                .lock()
                .map_err(|_| crate::LedgerError::storage("mutex poisoned"))?;
            Ok(entries.get(key).cloned())
        }

        fn put(&self, key: &str, value: Vec<u8>) -> Result<()> {
            self.entries
                .lock()
                .map_err(|_| crate::LedgerError::storage("mutex poisoned"))?
                .insert(key.to_string(), value);
            Ok(())
        }

        fn range(&self, range: &KeyRange) -> Result<StateIter<'_>> {
            let entries = self
                .entries
                .lock()
                .map_err(|_| crate::LedgerError::storage("mutex poisoned"))?;
            let items: Vec<_> = entries
                .range(range.start.clone()..range.end.clone())
                .map(|(k, v)| Ok((k.clone(), v.clone())))
                .collect();
            Ok(Box::new(items.into_iter()))
        }
    }

    #[test]
    fn test_write_set_last_write_wins() {
        let mut writes = WriteSet::new();
        writes.put("alice", b"1".to_vec());
        writes.put("alice", b"2".to_vec());
        assert_eq!(writes.len(), 1);
        assert_eq!(writes.get("alice"), Some(&b"2"[..]));
    }

    #[test]
    fn test_default_apply_writes_everything() {
        let store = MockStore::default();
        let mut writes = WriteSet::new();
        writes.put("alice", b"700".to_vec());
        writes.put("bob", b"300".to_vec());
        store.apply(&ReadSet::new(), &writes).unwrap();
        assert_eq!(store.get("alice").unwrap(), Some(b"700".to_vec()));
        assert_eq!(store.get("bob").unwrap(), Some(b"300".to_vec()));
    }

    #[test]
    fn test_read_set_keeps_first_read() {
        let mut reads = ReadSet::new();
        reads.record("alice", Some(b"10"));
        reads.record("alice", Some(b"7"));
        reads.record("bob", None);
        assert_eq!(reads.get("alice"), Some(Some(&b"10"[..])));
        assert_eq!(reads.get("bob"), Some(None));
        assert_eq!(reads.get("carol"), None);
        assert_eq!(reads.len(), 2);
    }

    #[test]
    fn test_default_apply_rejects_stale_reads() {
        let store = MockStore::default();
        store.put("alice", b"1000".to_vec()).unwrap();

        let mut reads = ReadSet::new();
        reads.record("alice", Some(b"1000"));
        reads.record("bob", None);
        let mut writes = WriteSet::new();
        writes.put("alice", b"990".to_vec());
        writes.put("bob", b"10".to_vec());

        // A competing commit lands between the read and the apply.
        store.put("alice", b"500".to_vec()).unwrap();

        let err = store.apply(&reads, &writes).unwrap_err();
        assert!(matches!(err, crate::LedgerError::Conflict { ref key } if key == "alice"));
        assert_eq!(store.get("alice").unwrap(), Some(b"500".to_vec()));
        assert_eq!(store.get("bob").unwrap(), None);
    }

    #[test]
    fn test_scan_composite_by_owner() {
        let store = MockStore::default();
        store.put(&allowance_key("alice", "carol"), b"100".to_vec()).unwrap();
        store.put(&allowance_key("alice", "dave"), b"40".to_vec()).unwrap();
        store.put(&allowance_key("bob", "carol"), b"5".to_vec()).unwrap();
        store.put("alice", b"660".to_vec()).unwrap();

        let keys: Vec<String> = store
            .scan_composite(APPROVAL_NAMESPACE, &["alice"])
            .unwrap()
            .map(|kv| kv.unwrap().0)
            .collect();
        assert_eq!(
            keys,
            vec![allowance_key("alice", "carol"), allowance_key("alice", "dave")]
        );
    }
}
