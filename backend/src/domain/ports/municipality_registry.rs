//! Driving port for the municipality registry.

use async_trait::async_trait;

use crate::domain::{
    Error, Municipality, MunicipalityId, MunicipalityPatch, NewMunicipality, UserId,
};

/// Domain use-case port for municipalities.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MunicipalityRegistry: Send + Sync {
    /// Every municipality.
    async fn list_all(&self) -> Result<Vec<Municipality>, Error>;

    /// Municipalities assigned to `owner`.
    async fn list_by_owner(&self, owner: &UserId) -> Result<Vec<Municipality>, Error>;

    /// Municipality with the given id.
    async fn find(&self, id: &MunicipalityId) -> Result<Option<Municipality>, Error>;

    /// Register a municipality. Conflicts on a duplicate code.
    async fn create(&self, input: NewMunicipality) -> Result<Municipality, Error>;

    /// Apply a partial update.
    async fn update(
        &self,
        id: &MunicipalityId,
        patch: MunicipalityPatch,
    ) -> Result<Municipality, Error>;

    /// Remove a municipality together with its ledger.
    async fn delete(&self, id: &MunicipalityId) -> Result<(), Error>;
}
