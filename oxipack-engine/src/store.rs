//! Bounded store of finished archives.

use oxipack_core::error::{PackError, Result};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Summary of a finished request, returned to the submitter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressionResult {
    /// Opaque id to retrieve the archive with.
    pub archive_id: String,
    /// Suggested download name.
    pub filename: String,
    /// Archive size in bytes.
    pub byte_size: u64,
}

/// A finished archive waiting to be retrieved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredArchive {
    /// Suggested download name.
    pub filename: String,
    /// Archive bytes.
    pub bytes: Vec<u8>,
}

/// Finished archives keyed by id, oldest evicted first once full.
///
/// Each archive can be taken exactly once.
#[derive(Debug)]
pub struct ResultStore {
    capacity: usize,
    entries: Mutex<VecDeque<(String, StoredArchive)>>,
}

impl ResultStore {
    /// Create a store holding at most `capacity` archives (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Publish an archive. Returns the id of an evicted archive, if any.
    pub fn insert(&self, id: impl Into<String>, archive: StoredArchive) -> Option<String> {
        let id = id.into();
        let mut entries = self.lock();
        entries.retain(|(existing, _)| *existing != id);

        let evicted = if entries.len() >= self.capacity {
            entries.pop_front().map(|(old, _)| old)
        } else {
            None
        };
        if let Some(old) = &evicted {
            debug!(archive_id = %old, "evicted unretrieved archive");
        }

        entries.push_back((id, archive));
        evicted
    }

    /// Remove and return the archive for `id`.
    pub fn take(&self, id: &str) -> Result<StoredArchive> {
        let mut entries = self.lock();
        let index = entries
            .iter()
            .position(|(existing, _)| existing == id)
            .ok_or_else(|| PackError::not_found(id))?;
        entries
            .remove(index)
            .map(|(_, archive)| archive)
            .ok_or_else(|| PackError::not_found(id))
    }

    /// Whether `id` is waiting to be retrieved.
    pub fn contains(&self, id: &str) -> bool {
        self.lock().iter().any(|(existing, _)| existing == id)
    }

    /// Number of archives held.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Maximum number of archives held.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<(String, StoredArchive)>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxipack_core::ErrorKind;

    fn archive(name: &str) -> StoredArchive {
        StoredArchive {
            filename: name.to_string(),
            bytes: name.as_bytes().to_vec(),
        }
    }

    #[test]
    fn test_take_once() {
        let store = ResultStore::new(4);
        store.insert("a", archive("a.huf"));
        assert!(store.contains("a"));
        assert_eq!(store.take("a").unwrap().filename, "a.huf");
        assert_eq!(store.take("a").unwrap_err().kind(), ErrorKind::NotFound);
        assert!(store.is_empty());
    }

    #[test]
    fn test_evicts_oldest() {
        let store = ResultStore::new(2);
        assert_eq!(store.insert("a", archive("a")), None);
        assert_eq!(store.insert("b", archive("b")), None);
        assert_eq!(store.insert("c", archive("c")), Some("a".to_string()));
        assert_eq!(store.len(), 2);
        assert!(store.take("a").is_err());
        assert!(store.take("b").is_ok());
        assert!(store.take("c").is_ok());
    }

    #[test]
    fn test_unknown_id() {
        let store = ResultStore::new(1);
        assert_eq!(store.take("missing").unwrap_err().kind(), ErrorKind::NotFound);
    }
}
