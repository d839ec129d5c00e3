use std::cell::Cell;

use super::*;

/// Store that rejects every write.
struct ReadOnlyStore;

impl DocumentStore for ReadOnlyStore {
    fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Ok(None)
    }

    fn set(&mut self, key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Write { key: key.into(), message: "quota exceeded".into() })
    }
}

#[test]
fn first_save_skips_confirmation() {
    let mut store = MemoryStore::new();
    let asked = Cell::new(false);

    let outcome = save_document(&mut store, "doc", "{}", || {
        asked.set(true);
        true
    })
    .unwrap();

    assert_eq!(outcome, SaveOutcome::Saved);
    assert!(!asked.get());
    assert_eq!(store.get("doc-exists").unwrap().as_deref(), Some("true"));
    assert!(has_document(&store, "doc").unwrap());
}

#[test]
fn overwrite_needs_confirmation() {
    let mut store = MemoryStore::new();
    save_document(&mut store, "doc", "first", || true).unwrap();

    assert_eq!(save_document(&mut store, "doc", "second", || false).unwrap(), SaveOutcome::Declined);
    assert_eq!(load_document(&store, "doc").unwrap(), "first");

    assert_eq!(save_document(&mut store, "doc", "third", || true).unwrap(), SaveOutcome::Saved);
    assert_eq!(load_document(&store, "doc").unwrap(), "third");
}

#[test]
fn load_without_save_is_not_found() {
    let store = MemoryStore::new();
    assert_eq!(load_document(&store, "doc"), Err(StorageError::NotFound("doc".into())));
    assert!(!has_document(&store, "doc").unwrap());
}

#[test]
fn write_failure_propagates() {
    let err = save_document(&mut ReadOnlyStore, "doc", "{}", || true).unwrap_err();
    assert!(matches!(err, StorageError::Write { key, .. } if key == "doc"));
}
