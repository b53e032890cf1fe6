//! Optimistic read-modify-write support shared by the domain services.
//!
//! Services load a versioned document, apply a mutation in memory and save
//! it against the version they read. A concurrent writer turns the save into
//! [`RepositoryError::VersionConflict`]; the cycle is then repeated from a
//! fresh load, up to [`MAX_WRITE_ATTEMPTS`] times.

use crate::domain::Error;
use crate::domain::ports::RepositoryError;

/// Attempts made before a contended write surfaces as a conflict.
pub const MAX_WRITE_ATTEMPTS: usize = 3;

/// Map a repository failure to the domain error surfaced to adapters.
pub(crate) fn map_repository_error(collection: &str, error: RepositoryError) -> Error {
    match error {
        RepositoryError::Connection { message } => {
            Error::service_unavailable(format!("{collection} storage unavailable: {message}"))
        }
        RepositoryError::Serialization { message } => {
            Error::internal(format!("{collection} document is malformed: {message}"))
        }
        RepositoryError::VersionConflict { .. } => exhausted(collection),
    }
}

/// Decide whether a failed save should be retried.
///
/// Returns `Ok(())` when the caller should reload and try again.
pub(crate) fn retry_after(collection: &str, attempt: usize, error: RepositoryError) -> Result<(), Error> {
    match error {
        RepositoryError::VersionConflict { key } if attempt < MAX_WRITE_ATTEMPTS => {
            tracing::debug!(collection, key = %key, attempt, "concurrent write detected, retrying");
            Ok(())
        }
        other => Err(map_repository_error(collection, other)),
    }
}

/// Error returned once every attempt lost the race.
pub(crate) fn exhausted(collection: &str) -> Error {
    tracing::warn!(collection, attempts = MAX_WRITE_ATTEMPTS, "giving up on contended write");
    Error::conflict(format!(
        "{collection} was modified concurrently, please retry"
    ))
}
