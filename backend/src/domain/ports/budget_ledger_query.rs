//! Driving port for reading budget ledgers.

use async_trait::async_trait;

use crate::domain::budget::{BalanceReport, BudgetLedger, BudgetYear};
use crate::domain::{Error, MunicipalityId};

/// Domain use-case port for ledger reads.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BudgetLedgerQuery: Send + Sync {
    /// Ledger of a municipality; blank when nothing was recorded yet.
    async fn ledger(&self, municipality_id: &MunicipalityId) -> Result<BudgetLedger, Error>;

    /// Compare voted revenues and expenses for `year`.
    async fn validate_balance(
        &self,
        municipality_id: &MunicipalityId,
        year: BudgetYear,
    ) -> Result<BalanceReport, Error>;
}
