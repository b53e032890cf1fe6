//! Per-municipality ledger documents stored under `budget:<id>`.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::MunicipalityId;
use crate::domain::budget::BudgetLedger;
use crate::domain::ports::{KeyValueStore, LedgerRepository, RepositoryError, Versioned};

use super::documents::{load, map_store_error, save};

/// Store key of the ledger belonging to `municipality_id`.
pub fn ledger_key(municipality_id: &MunicipalityId) -> String {
    format!("budget:{municipality_id}")
}

/// [`LedgerRepository`] keeping one document per municipality.
#[derive(Clone)]
pub struct KvLedgerRepository {
    store: Arc<dyn KeyValueStore>,
}

impl KvLedgerRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl LedgerRepository for KvLedgerRepository {
    async fn load_ledger(
        &self,
        municipality_id: &MunicipalityId,
    ) -> Result<Option<Versioned<BudgetLedger>>, RepositoryError> {
        load(self.store.as_ref(), &ledger_key(municipality_id)).await
    }

    async fn save_ledger(
        &self,
        ledger: &BudgetLedger,
        expected_version: Option<u64>,
    ) -> Result<(), RepositoryError> {
        let key = ledger_key(ledger.municipality_id());
        save(self.store.as_ref(), &key, ledger, expected_version).await
    }

    async fn delete_ledger(&self, municipality_id: &MunicipalityId) -> Result<(), RepositoryError> {
        self.store
            .delete(&ledger_key(municipality_id))
            .await
            .map_err(map_store_error)
    }
}
