//! Storage layer for kvstore

mod memory;

pub use memory::MemoryStorage;

use crate::error::KvError;
use serde_json::Value;
use std::collections::HashMap;

/// Snapshot of the whole store, keyed by entry key
pub type MemoryDb = HashMap<String, Value>;

/// Single-key storage operations.
///
/// `set`, `update` and `delete` must perform their existence check and the
/// mutation as one atomic step.
pub trait Storer: Send + Sync {
    /// Look up a key
    fn get(&self, key: &str) -> Result<Value, KvError>;

    /// Insert a key that does not exist yet
    fn set(&self, key: String, value: Value) -> Result<Value, KvError>;

    /// Replace the value of an existing key
    fn update(&self, key: &str, value: Value) -> Result<Value, KvError>;

    /// Remove an existing key
    fn delete(&self, key: &str) -> Result<(), KvError>;

    /// Copy of every entry currently stored
    fn list(&self) -> MemoryDb;

    /// Number of entries
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
