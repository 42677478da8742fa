//! In-memory world state for one deployed contract.

use std::collections::BTreeMap;

use parking_lot::RwLock;
use tracing::trace;

use tally_ledger::{KeyRange, KeyValue, LedgerError, LedgerStore, ReadSet, Result, StateIter, WriteSet};

/// Ordered key-value state guarded by a read-write lock.
///
/// Batches are validated and applied under a single write lock, so readers
/// never observe half of a [`WriteSet`] and two operations that read the
/// same key cannot both commit.
#[derive(Debug, Default)]
pub struct MemoryWorldState {
    entries: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryWorldState {
    /// Create an empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild state from previously saved entries.
    #[must_use]
    pub fn from_entries(entries: impl IntoIterator<Item = KeyValue>) -> Self {
        Self {
            entries: RwLock::new(entries.into_iter().collect()),
        }
    }

    /// Every committed entry, in key order.
    #[must_use]
    pub fn entries(&self) -> Vec<KeyValue> {
        self.entries
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Number of committed keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether nothing has been committed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl LedgerStore for MemoryWorldState {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn put(&self, key: &str, value: Vec<u8>) -> Result<()> {
        self.entries.write().insert(key.to_string(), value);
        Ok(())
    }

    fn range(&self, range: &KeyRange) -> Result<StateIter<'_>> {
        // Snapshot so the lock is not held while the caller iterates.
        let rows: Vec<KeyValue> = self
            .entries
            .read()
            .range(range.start.clone()..range.end.clone())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        trace!(start = ?range.start, end = ?range.end, rows = rows.len(), "range scan");
        Ok(Box::new(rows.into_iter().map(Ok)))
    }

    fn apply(&self, reads: &ReadSet, writes: &WriteSet) -> Result<()> {
        let mut entries = self.entries.write();
        if let Some((key, _)) = reads
            .iter()
            .find(|(key, seen)| entries.get(*key).map(Vec::as_slice) != *seen)
        {
            trace!(key = ?key, "stale read");
            return Err(LedgerError::Conflict { key: key.to_string() });
        }
        for (key, value) in writes.iter() {
            entries.insert(key.to_string(), value.to_vec());
        }
        trace!(writes = writes.len(), "write set applied");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_ledger::key::allowance_key;
    use tally_ledger::CompositeKey;

    #[test]
    fn test_get_put() {
        let state = MemoryWorldState::new();
        assert!(state.get("alice").unwrap().is_none());
        state.put("alice", b"10".to_vec()).unwrap();
        assert_eq!(state.get("alice").unwrap().unwrap(), b"10");
        assert_eq!(state.len(), 1);
    }

    #[test]
    fn test_apply_batch() {
        let state = MemoryWorldState::new();
        let mut writes = WriteSet::new();
        writes.put("alice", b"700".to_vec());
        writes.put("bob", b"300".to_vec());
        state.apply(&ReadSet::new(), &writes).unwrap();
        assert_eq!(
            state.entries(),
            vec![
                ("alice".to_string(), b"700".to_vec()),
                ("bob".to_string(), b"300".to_vec()),
            ]
        );
    }

    #[test]
    fn test_apply_rejects_stale_batch_whole() {
        let state = MemoryWorldState::new();
        state.put("alice", b"1000".to_vec()).unwrap();

        let mut reads = ReadSet::new();
        reads.record("alice", Some(b"1000"));
        let mut first = WriteSet::new();
        first.put("alice", b"990".to_vec());
        first.put("bob", b"10".to_vec());
        let mut second = WriteSet::new();
        second.put("alice", b"990".to_vec());
        second.put("carol", b"10".to_vec());

        state.apply(&reads, &first).unwrap();
        let err = state.apply(&reads, &second).unwrap_err();
        assert!(matches!(err, LedgerError::Conflict { ref key } if key == "alice"));
        assert_eq!(state.get("alice").unwrap().unwrap(), b"990");
        assert!(state.get("carol").unwrap().is_none());
    }

    #[test]
    fn test_composite_scan_excludes_simple_keys() {
        let state = MemoryWorldState::new();
        state.put("alice", b"1000".to_vec()).unwrap();
        state.put(&allowance_key("alice", "carol"), b"100".to_vec()).unwrap();
        state.put(&allowance_key("alicia", "carol"), b"5".to_vec()).unwrap();

        let rows: Vec<_> = state
            .scan_composite("approval", &["alice"])
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(rows.len(), 1);
        let key = CompositeKey::split(&rows[0].0).unwrap();
        assert_eq!(key.components(), ["alice", "carol"]);
    }

    #[test]
    fn test_from_entries_round_trip() {
        let state = MemoryWorldState::new();
        state.put("GLD", b"{}".to_vec()).unwrap();
        let rebuilt = MemoryWorldState::from_entries(state.entries());
        assert_eq!(rebuilt.entries(), state.entries());
    }
}
