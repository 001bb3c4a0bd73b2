use crate::error::KVError;

/// Byte-oriented key-value storage.
///
/// Keys are namespaced strings such as `portfolio:account:7`. Every
/// method is one transaction; `batch_set`, `write_if_absent` and
/// `increment` are atomic.
pub trait KVStore: Send + Sync {
    /// Get the value for a key. Returns None if the key does not exist.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KVError>;

    /// Set a key-value pair, overwriting any previous value.
    fn set(&self, key: &str, value: &[u8]) -> Result<(), KVError>;

    /// Write several pairs in a single transaction.
    fn batch_set(&self, entries: &[(&str, &[u8])]) -> Result<(), KVError>;

    /// Conditional write in a single transaction.
    ///
    /// If any key in `guards` exists, nothing is written and the result is
    /// false. Otherwise `deletes` are removed, `sets` are written, and the
    /// result is true.
    fn write_if_absent(
        &self,
        guards: &[&str],
        sets: &[(&str, &[u8])],
        deletes: &[&str],
    ) -> Result<bool, KVError>;

    /// All pairs whose key starts with `prefix`, sorted by key.
    fn scan(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, KVError>;

    /// Atomically add one to the big-endian u64 counter at `key` and
    /// return the new value. A missing counter starts at zero, so the
    /// first call returns 1.
    fn increment(&self, key: &str) -> Result<u64, KVError>;
}
