//! In-memory storage backend
//!
//! A `HashMap` behind one engine-wide `RwLock`: lookups share the read
//! lock, every mutation holds the write lock for its whole check-and-act
//! sequence.

use super::{MemoryDb, Storer};
use crate::error::KvError;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::hash_map::Entry;

/// Memory-backed storage
#[derive(Debug, Default)]
pub struct MemoryStorage {
    db: RwLock<MemoryDb>,
}

impl MemoryStorage {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with `db`
    pub fn with_memory_db(db: MemoryDb) -> Self {
        Self {
            db: RwLock::new(db),
        }
    }
}

fn not_found(key: &str) -> KvError {
    KvError::key_not_found().with_data(format!("'{key}' does not exist"))
}

impl Storer for MemoryStorage {
    fn get(&self, key: &str) -> Result<Value, KvError> {
        self.db.read().get(key).cloned().ok_or_else(|| not_found(key))
    }

    fn set(&self, key: String, value: Value) -> Result<Value, KvError> {
        let mut db = self.db.write();
        match db.entry(key) {
            Entry::Occupied(entry) => Err(KvError::key_exists()
                .with_data(format!("'{}' already exists", entry.key()))),
            Entry::Vacant(entry) => Ok(entry.insert(value).clone()),
        }
    }

    fn update(&self, key: &str, value: Value) -> Result<Value, KvError> {
        let mut db = self.db.write();
        match db.get_mut(key) {
            Some(slot) => {
                slot.clone_from(&value);
                Ok(value)
            }
            None => Err(not_found(key)),
        }
    }

    fn delete(&self, key: &str) -> Result<(), KvError> {
        self.db
            .write()
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| not_found(key))
    }

    fn list(&self) -> MemoryDb {
        self.db.read().clone()
    }

    fn len(&self) -> usize {
        self.db.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;
    use std::sync::Barrier;

    #[test]
    fn test_get_empty() {
        let storage = MemoryStorage::new();

        let err = storage.get("key").unwrap_err();
        assert!(err.is(ErrorKind::KeyNotFound));
        assert_eq!(err.data(), Some("'key' does not exist"));
    }

    #[test]
    fn test_get_seeded() {
        let storage =
            MemoryStorage::with_memory_db(MemoryDb::from([("key".to_string(), json!("value"))]));

        assert_eq!(storage.get("key").unwrap(), json!("value"));
        // stable until mutated
        assert_eq!(storage.get("key").unwrap(), json!("value"));
    }

    #[test]
    fn test_set_rejects_existing_key() {
        let storage = MemoryStorage::new();

        let value = storage
            .set("user:1".to_string(), json!({"name": "a"}))
            .unwrap();
        assert_eq!(value, json!({"name": "a"}));

        let err = storage
            .set("user:1".to_string(), json!({"name": "b"}))
            .unwrap_err();
        assert!(err.is(ErrorKind::KeyExists));
        assert_eq!(err.client_message(), "key exist, 'user:1' already exists");

        assert_eq!(storage.get("user:1").unwrap(), json!({"name": "a"}));
    }

    #[test]
    fn test_update() {
        let storage =
            MemoryStorage::with_memory_db(MemoryDb::from([("key".to_string(), json!("value"))]));

        let value = storage.update("key", json!("value2")).unwrap();
        assert_eq!(value, json!("value2"));
        assert_eq!(storage.get("key").unwrap(), json!("value2"));
    }

    #[test]
    fn test_update_and_delete_missing_do_not_mutate() {
        let storage = MemoryStorage::new();

        let err = storage.update("missing", json!("x")).unwrap_err();
        assert!(err.is(ErrorKind::KeyNotFound));

        let err = storage.delete("missing").unwrap_err();
        assert!(err.is(ErrorKind::KeyNotFound));

        assert!(storage.is_empty());
        assert!(storage.list().is_empty());
    }

    #[test]
    fn test_set_delete_get() {
        let storage = MemoryStorage::new();

        storage.set("k".to_string(), json!("v")).unwrap();
        storage.delete("k").unwrap();

        assert!(storage.get("k").unwrap_err().is(ErrorKind::KeyNotFound));
        assert!(storage.delete("k").unwrap_err().is(ErrorKind::KeyNotFound));
    }

    #[test]
    fn test_list_is_a_copy() {
        let storage =
            MemoryStorage::with_memory_db(MemoryDb::from([("key".to_string(), json!("value"))]));

        let mut snapshot = storage.list();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.get("key"), Some(&json!("value")));

        snapshot.insert("other".to_string(), json!(1));
        snapshot.remove("key");

        assert_eq!(storage.len(), 1);
        assert_eq!(storage.get("key").unwrap(), json!("value"));
        assert!(storage.get("other").is_err());
    }

    #[test]
    fn test_concurrent_set_single_winner() {
        const WRITERS: usize = 32;
        let storage = MemoryStorage::new();
        let barrier = Barrier::new(WRITERS);

        let results: Vec<(usize, Result<Value, KvError>)> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..WRITERS)
                .map(|i| {
                    let storage = &storage;
                    let barrier = &barrier;
                    s.spawn(move || {
                        barrier.wait();
                        (i, storage.set("contended".to_string(), json!(i)))
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let winners: Vec<usize> = results
            .iter()
            .filter(|(_, r)| r.is_ok())
            .map(|(i, _)| *i)
            .collect();
        assert_eq!(winners.len(), 1);

        let losers = results
            .iter()
            .filter(|(_, r)| matches!(r, Err(e) if e.is(ErrorKind::KeyExists)))
            .count();
        assert_eq!(losers, WRITERS - 1);

        assert_eq!(storage.len(), 1);
        assert_eq!(storage.get("contended").unwrap(), json!(winners[0]));
    }

    #[test]
    fn test_concurrent_delete_single_winner() {
        const DELETERS: usize = 16;
        let storage =
            MemoryStorage::with_memory_db(MemoryDb::from([("key".to_string(), json!(true))]));
        let barrier = Barrier::new(DELETERS);

        let deleted = std::thread::scope(|s| {
            let handles: Vec<_> = (0..DELETERS)
                .map(|_| {
                    s.spawn(|| {
                        barrier.wait();
                        storage.delete("key")
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap())
                .filter(Result::is_ok)
                .count()
        });

        assert_eq!(deleted, 1);
        assert!(storage.is_empty());
    }

    #[test]
    fn test_update_racing_delete_never_revives_key() {
        const ROUNDS: usize = 500;
        let storage = MemoryStorage::new();

        for round in 0..ROUNDS {
            storage.set("k".to_string(), json!(round)).unwrap();
            let barrier = Barrier::new(2);

            let (updated, deleted) = std::thread::scope(|s| {
                let updater = s.spawn(|| {
                    barrier.wait();
                    storage.update("k", json!("updated"))
                });
                let deleter = s.spawn(|| {
                    barrier.wait();
                    storage.delete("k")
                });
                (updater.join().unwrap(), deleter.join().unwrap())
            });

            assert!(deleted.is_ok(), "round {round}: delete of a present key failed");
            match updated {
                Ok(value) => assert_eq!(value, json!("updated")),
                Err(e) => assert!(e.is(ErrorKind::KeyNotFound), "round {round}: {e}"),
            }
            assert!(storage.get("k").unwrap_err().is(ErrorKind::KeyNotFound));
            assert!(storage.is_empty());
        }
    }
}
