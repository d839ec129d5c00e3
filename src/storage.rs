//! Key-value persistence for saved documents.
//!
//! A document is stored as text under a key, with a marker entry at
//! `<key>-exists` so hosts can cheaply tell whether a load is possible.
//! Overwriting a saved document requires confirmation.

#[cfg(test)]
#[path = "storage_test.rs"]
mod storage_test;

use std::collections::HashMap;

use crate::consts::STORAGE_EXISTS_SUFFIX;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("failed to write {key}: {message}")]
    Write { key: String, message: String },
    #[error("no document saved under {0}")]
    NotFound(String),
}

/// A string key-value store, such as the browser's local storage.
pub trait DocumentStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// In-process store.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    /// An existing document was kept because overwriting wasn't confirmed.
    Declined,
}

fn exists_key(key: &str) -> String {
    format!("{key}{STORAGE_EXISTS_SUFFIX}")
}

/// Whether a document has been saved under `key`.
///
/// # Errors
///
/// Propagates store failures.
pub fn has_document(store: &dyn DocumentStore, key: &str) -> Result<bool, StorageError> {
    Ok(store.get(&exists_key(key))?.is_some())
}

/// Save `text` under `key`. If a document is already saved there,
/// `confirm_overwrite` is asked first and a `false` answer leaves it alone.
///
/// # Errors
///
/// Propagates store failures.
pub fn save_document(
    store: &mut dyn DocumentStore,
    key: &str,
    text: &str,
    confirm_overwrite: impl FnOnce() -> bool,
) -> Result<SaveOutcome, StorageError> {
    if has_document(store, key)? && !confirm_overwrite() {
        tracing::info!(key, "save declined");
        return Ok(SaveOutcome::Declined);
    }
    store.set(key, text)?;
    store.set(&exists_key(key), "true")?;
    tracing::info!(key, bytes = text.len(), "document saved");
    Ok(SaveOutcome::Saved)
}

/// Read the document saved under `key`.
///
/// # Errors
///
/// Returns [`StorageError::NotFound`] when nothing is saved there.
pub fn load_document(store: &dyn DocumentStore, key: &str) -> Result<String, StorageError> {
    let text = store.get(key)?.ok_or_else(|| StorageError::NotFound(key.to_owned()))?;
    tracing::info!(key, bytes = text.len(), "document read");
    Ok(text)
}
