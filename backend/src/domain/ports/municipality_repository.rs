//! Port abstraction for the municipality collection.
use async_trait::async_trait;

use crate::domain::Municipality;

use super::{RepositoryError, Versioned};

/// Storage of the whole municipality registry as one versioned document.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MunicipalityRepository: Send + Sync {
    /// Load every municipality; an empty registry when nothing is stored.
    async fn load_municipalities(&self) -> Result<Versioned<Vec<Municipality>>, RepositoryError>;

    /// Replace the registry if it is still at `expected_version`.
    async fn save_municipalities(
        &self,
        municipalities: &[Municipality],
        expected_version: Option<u64>,
    ) -> Result<(), RepositoryError>;
}
