//! Storage port - persistent key-value abstraction

use crate::domain::result::Result;

/// Durable string key-value storage
///
/// This is the only persistence the core needs: the state document and
/// stored CSV uploads are each one value under one key. Implementations
/// (adapters) provide the actual medium.
pub trait KeyValueStorage: Send + Sync {
    /// Read the value stored under `key`
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete `key`. Deleting a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;

    /// All stored keys starting with `prefix`, sorted
    fn keys(&self, prefix: &str) -> Result<Vec<String>>;
}
