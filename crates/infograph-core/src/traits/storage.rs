//! Durable key-value storage trait.

use crate::Result;

/// One write in a storage batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageOp {
    Put { key: String, value: String },
    Remove { key: String },
}

impl StorageOp {
    pub fn put(key: impl Into<String>, value: impl Into<String>) -> Self {
        StorageOp::Put {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn remove(key: impl Into<String>) -> Self {
        StorageOp::Remove { key: key.into() }
    }

    pub fn key(&self) -> &str {
        match self {
            StorageOp::Put { key, .. } | StorageOp::Remove { key } => key,
        }
    }
}

/// Synchronous string key-value storage that survives process restarts.
///
/// Implementations must apply a [`commit`](KeyValueStore::commit) batch
/// atomically: a later `get` observes either none or all of its operations.
pub trait KeyValueStore: Send + Sync {
    /// Read a value.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Apply a batch of writes atomically.
    fn commit(&self, batch: &[StorageOp]) -> Result<()>;
}
