use crate::error::KVError;

/// One key of a [`KVStore::compare_and_swap`] batch.
///
/// `expected = None` means "the key must not exist"; `new = None` means
/// "delete the key".
#[derive(Debug, Clone, Copy)]
pub struct CasOp<'a> {
    pub key: &'a str,
    pub expected: Option<&'a [u8]>,
    pub new: Option<&'a [u8]>,
}

impl<'a> CasOp<'a> {
    /// Create `key`, failing the batch if it already exists.
    pub fn insert(key: &'a str, value: &'a [u8]) -> Self {
        Self { key, expected: None, new: Some(value) }
    }

    /// Overwrite `key` only if it still holds `expected`.
    pub fn replace(key: &'a str, expected: &'a [u8], value: &'a [u8]) -> Self {
        Self { key, expected: Some(expected), new: Some(value) }
    }

    /// Delete `key` only if it still holds `expected`.
    pub fn remove(key: &'a str, expected: &'a [u8]) -> Self {
        Self { key, expected: Some(expected), new: None }
    }
}

/// KVStore provides a key-value storage interface.
///
/// Keys follow a namespaced convention: `social:blog:{id}`, `social:user:{id}`, etc.
/// Every write is conditional and goes through `compare_and_swap`.
pub trait KVStore: Send + Sync {
    /// Get the value for a key. Returns None if the key does not exist.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KVError>;

    /// Scan all keys matching a prefix. Returns sorted (key, value) pairs.
    fn scan(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, KVError>;

    /// Apply every op in one atomic transaction iff each key currently holds
    /// its `expected` value. Returns `Ok(false)` without writing anything if
    /// any key does not match.
    fn compare_and_swap(&self, ops: &[CasOp<'_>]) -> Result<bool, KVError>;
}
