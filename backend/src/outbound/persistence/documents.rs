//! Versioned JSON documents on top of a [`KeyValueStore`].

use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;

use crate::domain::ports::{KeyValueStore, KeyValueStoreError, RepositoryError, Versioned};

/// Translate store failures into repository errors.
pub(super) fn map_store_error(error: KeyValueStoreError) -> RepositoryError {
    match error {
        KeyValueStoreError::Backend { message } => RepositoryError::connection(message),
        KeyValueStoreError::VersionMismatch { key } => RepositoryError::version_conflict(key),
    }
}

/// Read and decode the document stored under `key`.
pub(super) async fn load<T>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<Versioned<T>>, RepositoryError>
where
    T: DeserializeOwned,
{
    let Some(blob) = store.get(key).await.map_err(map_store_error)? else {
        return Ok(None);
    };
    let value = serde_json::from_str(&blob.value).map_err(|error| {
        debug!(%key, %error, "stored document failed to decode");
        RepositoryError::serialization(format!("{key}: {error}"))
    })?;
    Ok(Some(Versioned::new(value, Some(blob.version))))
}

/// Encode `value` and store it under `key` if the stored version still
/// matches `expected_version`.
pub(super) async fn save<T>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
    expected_version: Option<u64>,
) -> Result<(), RepositoryError>
where
    T: Serialize + ?Sized,
{
    let encoded = serde_json::to_string(value)
        .map_err(|error| RepositoryError::serialization(format!("{key}: {error}")))?;
    store
        .compare_and_swap(key, expected_version, Some(encoded))
        .await
        .map_err(map_store_error)?;
    Ok(())
}
