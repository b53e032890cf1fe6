//! Driving port for moving ledgers in and out of flat row form.

use async_trait::async_trait;

use crate::domain::interchange::{ImportReport, LedgerExport, LedgerRow};
use crate::domain::{Error, MunicipalityId};

/// Domain use-case port for spreadsheet-style import and export.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LedgerInterchange: Send + Sync {
    /// Flatten the ledger: revenues first, declaration order, years ascending.
    async fn to_rows(&self, municipality_id: &MunicipalityId) -> Result<Vec<LedgerRow>, Error>;

    /// Upsert every valid row; invalid rows are skipped and reported.
    async fn from_rows(
        &self,
        municipality_id: &MunicipalityId,
        rows: Vec<LedgerRow>,
    ) -> Result<ImportReport, Error>;

    /// Full document of a municipality for downstream analytics.
    async fn export_json(&self, municipality_id: &MunicipalityId) -> Result<LedgerExport, Error>;
}
