//! Record storage for serialized anchor state.
//!
//! The store owns atomicity: `transact` hands the closure a scratch copy of
//! the record blob and commits it only when the closure succeeds.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::{AnchorError, Result};
use crate::types::Address;

/// Address of one anchor record.
pub type RecordId = Address;

/// A record as persisted: owning authority plus the state blob.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredRecord {
    pub authority: Address,
    pub data: Vec<u8>,
}

/// Creation and transactional read-modify-write over record blobs.
pub trait AnchorStore {
    /// Allocate a record. Fails with `RecordExists` if `id` is taken.
    fn create(&self, id: RecordId, authority: Address, data: Vec<u8>) -> Result<()>;

    /// Snapshot of a record.
    fn load(&self, id: &RecordId) -> Result<StoredRecord>;

    /// Run `f` against the record's blob; commit only on `Ok`.
    ///
    /// No other operation on the same record may interleave with `f`.
    fn transact<T, F>(&self, id: &RecordId, f: F) -> Result<T>
    where
        F: FnOnce(&Address, &mut Vec<u8>) -> Result<T>;
}

/// In-process store behind a single mutex.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<RecordId, StoredRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of allocated records.
    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records().is_empty()
    }

    // Writes happen only after a closure succeeds, so a poisoned map is
    // still consistent.
    fn records(&self) -> MutexGuard<'_, HashMap<RecordId, StoredRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl AnchorStore for MemoryStore {
    fn create(&self, id: RecordId, authority: Address, data: Vec<u8>) -> Result<()> {
        let mut records = self.records();
        if records.contains_key(&id) {
            return Err(AnchorError::RecordExists { id: id.to_string() });
        }
        records.insert(id, StoredRecord { authority, data });
        Ok(())
    }

    fn load(&self, id: &RecordId) -> Result<StoredRecord> {
        self.records()
            .get(id)
            .cloned()
            .ok_or_else(|| AnchorError::RecordNotFound { id: id.to_string() })
    }

    fn transact<T, F>(&self, id: &RecordId, f: F) -> Result<T>
    where
        F: FnOnce(&Address, &mut Vec<u8>) -> Result<T>,
    {
        let mut records = self.records();
        let record = records
            .get_mut(id)
            .ok_or_else(|| AnchorError::RecordNotFound { id: id.to_string() })?;

        let mut scratch = record.data.clone();
        let out = f(&record.authority, &mut scratch)?;
        record.data = scratch;
        Ok(out)
    }
}
