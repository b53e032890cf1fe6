//! Shared types for collection repositories.

use super::define_port_error;

define_port_error! {
    /// Errors raised by collection repository adapters.
    pub enum RepositoryError {
        /// Storage could not be reached.
        Connection { message: String } => "repository connection failed: {message}",
        /// A stored document could not be encoded or decoded.
        Serialization { message: String } => "repository document is malformed: {message}",
        /// Another writer updated the document since it was read.
        VersionConflict { key: String } => "document {key} was modified concurrently",
    }
}

/// A loaded document and the version it was read at.
///
/// `version` is `None` when nothing was stored yet; saving with that
/// expectation only succeeds if the document is still absent.
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<T> {
    pub value: T,
    pub version: Option<u64>,
}

impl<T> Versioned<T> {
    pub fn new(value: T, version: Option<u64>) -> Self {
        Self { value, version }
    }

    /// A document that has never been stored.
    pub fn absent(value: T) -> Self {
        Self::new(value, None)
    }
}
