//! Port abstraction for the key-value store backing every collection.
//!
//! Values are opaque strings (JSON documents in practice). Every write
//! assigns the key a new, strictly increasing version stamp so callers can
//! run optimistic read-modify-write cycles with
//! [`KeyValueStore::compare_and_swap`].

use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Errors raised by key-value store adapters.
    pub enum KeyValueStoreError {
        /// The backing medium could not be read or written.
        Backend { message: String } => "key-value store backend failed: {message}",
        /// The stored version differs from the one the caller expected.
        VersionMismatch { key: String } => "version mismatch for key {key}",
    }
}

/// A stored value together with its version stamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    pub value: String,
    pub version: u64,
}

/// String blob storage with per-key version stamps.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Fetch the value stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<StoredBlob>, KeyValueStoreError>;

    /// Unconditionally store `value`, returning the new version.
    async fn set(&self, key: &str, value: String) -> Result<u64, KeyValueStoreError>;

    /// Unconditionally remove `key`. Removing a missing key succeeds.
    async fn delete(&self, key: &str) -> Result<(), KeyValueStoreError>;

    /// Write `value` only if the current version equals `expected`.
    ///
    /// `expected = None` requires the key to be absent. `value = None`
    /// deletes the key. Returns the new version, or `None` after a delete.
    /// Fails with [`KeyValueStoreError::VersionMismatch`] when the check
    /// does not hold.
    async fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<u64>,
        value: Option<String>,
    ) -> Result<Option<u64>, KeyValueStoreError>;
}
