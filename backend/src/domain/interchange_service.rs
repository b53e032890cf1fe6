//! Import and export of ledgers in flat row form, implementing
//! [`LedgerInterchange`].

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;

use crate::domain::budget::{BudgetKind, Rubric, YearEntry};
use crate::domain::interchange::{ImportReport, LedgerExport, LedgerRow, SkippedRow};
use crate::domain::ledger_service::{load_ledger, mutate_ledger};
use crate::domain::ports::{LedgerInterchange, LedgerRepository, MunicipalityRepository};
use crate::domain::versioned_write::map_repository_error;
use crate::domain::{Error, MunicipalityId};

/// Row mapper over the ledger and municipality repositories.
#[derive(Clone)]
pub struct InterchangeService<L, M> {
    ledgers: Arc<L>,
    municipalities: Arc<M>,
    clock: Arc<dyn Clock>,
}

impl<L, M> InterchangeService<L, M> {
    pub fn new(ledgers: Arc<L>, municipalities: Arc<M>, clock: Arc<dyn Clock>) -> Self {
        Self {
            ledgers,
            municipalities,
            clock,
        }
    }
}

/// Split rows into applicable entries and skipped lines (1-based positions).
fn partition(rows: &[LedgerRow]) -> (Vec<(Rubric, YearEntry)>, Vec<SkippedRow>) {
    let mut valid = Vec::with_capacity(rows.len());
    let mut skipped = Vec::new();
    for (index, row) in rows.iter().enumerate() {
        match row.validate() {
            Ok(pair) => valid.push(pair),
            Err(err) => skipped.push(SkippedRow {
                line: index + 1,
                sheet: None,
                reason: err.to_string(),
            }),
        }
    }
    (valid, skipped)
}

#[async_trait]
impl<L, M> LedgerInterchange for InterchangeService<L, M>
where
    L: LedgerRepository,
    M: MunicipalityRepository,
{
    async fn to_rows(&self, municipality_id: &MunicipalityId) -> Result<Vec<LedgerRow>, Error> {
        let ledger = load_ledger(self.ledgers.as_ref(), municipality_id)
            .await?
            .value;
        Ok(ledger
            .rows()
            .map(|(rubric, entry)| LedgerRow::from_entry(rubric, entry))
            .collect())
    }

    async fn from_rows(
        &self,
        municipality_id: &MunicipalityId,
        rows: Vec<LedgerRow>,
    ) -> Result<ImportReport, Error> {
        let (valid, skipped) = partition(&rows);
        for row in &skipped {
            tracing::warn!(
                municipality_id = %municipality_id,
                line = row.line,
                reason = %row.reason,
                "skipping invalid ledger row"
            );
        }
        if !valid.is_empty() {
            mutate_ledger(
                self.ledgers.as_ref(),
                municipality_id,
                self.clock.utc(),
                |ledger| {
                    for (rubric, entry) in &valid {
                        ledger.upsert_entry(*rubric, *entry);
                    }
                    Ok(())
                },
            )
            .await?;
        }
        tracing::info!(
            municipality_id = %municipality_id,
            imported = valid.len(),
            skipped = skipped.len(),
            "ledger rows imported"
        );
        Ok(ImportReport {
            imported: valid.len(),
            skipped,
        })
    }

    async fn export_json(&self, municipality_id: &MunicipalityId) -> Result<LedgerExport, Error> {
        let municipality = self
            .municipalities
            .load_municipalities()
            .await
            .map_err(|err| map_repository_error("municipalities", err))?
            .value
            .into_iter()
            .find(|municipality| &municipality.id == municipality_id)
            .ok_or_else(|| {
                Error::not_found(format!("municipality {municipality_id} not found"))
            })?;
        let ledger = load_ledger(self.ledgers.as_ref(), municipality_id)
            .await?
            .value;
        Ok(LedgerExport {
            municipality,
            revenues: ledger.sheet(BudgetKind::Revenue),
            expenses: ledger.sheet(BudgetKind::Expense),
            future_events: ledger.future_events().to_vec(),
        })
    }
}
