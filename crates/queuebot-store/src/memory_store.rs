//! In-memory document store.
//!
//! Clones share the same backing map, so a test can hand one clone to the
//! engine and inspect what was written through another.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use crate::document::{DocumentKey, DocumentStore};
use crate::error::StoreError;

/// Shared in-memory [`DocumentStore`].
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    docs: Arc<Mutex<BTreeMap<DocumentKey, String>>>,
    writes: Arc<Mutex<Vec<DocumentKey>>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys written so far, in write order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Poisoned`] if a writer panicked.
    pub fn writes(&self) -> Result<Vec<DocumentKey>, StoreError> {
        Ok(self
            .writes
            .lock()
            .map_err(|_poisoned| StoreError::Poisoned)?
            .clone())
    }

    /// Forget the write log without touching the documents.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Poisoned`] if a writer panicked.
    pub fn clear_writes(&self) -> Result<(), StoreError> {
        self.writes
            .lock()
            .map_err(|_poisoned| StoreError::Poisoned)?
            .clear();
        Ok(())
    }
}

impl DocumentStore for MemoryStore {
    fn get_raw(&self, key: DocumentKey) -> Result<Option<String>, StoreError> {
        let docs = self.docs.lock().map_err(|_poisoned| StoreError::Poisoned)?;
        Ok(docs.get(&key).cloned())
    }

    fn put_raw(&mut self, key: DocumentKey, json: &str) -> Result<(), StoreError> {
        self.docs
            .lock()
            .map_err(|_poisoned| StoreError::Poisoned)?
            .insert(key, json.to_owned());
        self.writes
            .lock()
            .map_err(|_poisoned| StoreError::Poisoned)?
            .push(key);
        Ok(())
    }
}
