//! Port abstraction for per-municipality budget ledgers.
use async_trait::async_trait;

use crate::domain::MunicipalityId;
use crate::domain::budget::BudgetLedger;

use super::{RepositoryError, Versioned};

/// One versioned ledger document per municipality.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    /// Load the ledger of `municipality_id`, if one was ever saved.
    async fn load_ledger(
        &self,
        municipality_id: &MunicipalityId,
    ) -> Result<Option<Versioned<BudgetLedger>>, RepositoryError>;

    /// Store `ledger` if its document is still at `expected_version`.
    async fn save_ledger(
        &self,
        ledger: &BudgetLedger,
        expected_version: Option<u64>,
    ) -> Result<(), RepositoryError>;

    /// Remove the ledger of `municipality_id`; missing ledgers are ignored.
    async fn delete_ledger(&self, municipality_id: &MunicipalityId) -> Result<(), RepositoryError>;
}
