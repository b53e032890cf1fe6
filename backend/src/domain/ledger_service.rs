//! Budget ledger service implementing [`BudgetLedgerQuery`] and
//! [`BudgetLedgerCommand`].
//!
//! Each municipality owns one versioned ledger document. A municipality
//! without a stored ledger reads as a blank one; the document is created on
//! the first write.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde_json::json;

use crate::domain::budget::{
    BalanceReport, BudgetLedger, BudgetYear, EventId, FutureEvent, FutureEventDraft,
    FutureEventPatch, LedgerMutationError, Rubric, YearEntry,
};
use crate::domain::ports::{BudgetLedgerCommand, BudgetLedgerQuery, LedgerRepository, Versioned};
use crate::domain::versioned_write::{
    MAX_WRITE_ATTEMPTS, exhausted, map_repository_error, retry_after,
};
use crate::domain::{Error, MunicipalityId};

const COLLECTION: &str = "budget ledgers";

/// Ledger reads and writes backed by a [`LedgerRepository`].
#[derive(Clone)]
pub struct LedgerService<L> {
    ledgers: Arc<L>,
    clock: Arc<dyn Clock>,
}

impl<L> LedgerService<L> {
    pub fn new(ledgers: Arc<L>, clock: Arc<dyn Clock>) -> Self {
        Self { ledgers, clock }
    }
}

/// Map a structural ledger failure to a domain error.
pub(crate) fn map_mutation_error(error: LedgerMutationError) -> Error {
    match error {
        LedgerMutationError::YearExists { rubric, year } => Error::conflict(format!(
            "year {year} already exists for rubric {rubric}"
        ))
        .with_details(json!({ "rubric": rubric.code(), "year": year.get() })),
        LedgerMutationError::EventNotFound { id } => {
            Error::not_found(format!("future event {id} not found"))
        }
        LedgerMutationError::Invalid(err) => Error::invalid_request(err.to_string()),
    }
}

/// Load the ledger of `municipality_id`, or a blank unversioned one.
pub(crate) async fn load_ledger<L>(
    ledgers: &L,
    municipality_id: &MunicipalityId,
) -> Result<Versioned<BudgetLedger>, Error>
where
    L: LedgerRepository + ?Sized,
{
    let stored = ledgers
        .load_ledger(municipality_id)
        .await
        .map_err(|err| map_repository_error(COLLECTION, err))?;
    Ok(stored.unwrap_or_else(|| Versioned::absent(BudgetLedger::blank(municipality_id.clone()))))
}

/// Apply `apply` to the latest ledger and save it stamped with `now`.
pub(crate) async fn mutate_ledger<L, T, F>(
    ledgers: &L,
    municipality_id: &MunicipalityId,
    now: DateTime<Utc>,
    mut apply: F,
) -> Result<T, Error>
where
    L: LedgerRepository + ?Sized,
    F: FnMut(&mut BudgetLedger) -> Result<T, LedgerMutationError> + Send,
    T: Send,
{
    for attempt in 1..=MAX_WRITE_ATTEMPTS {
        let Versioned { mut value, version } = load_ledger(ledgers, municipality_id).await?;
        let outcome = apply(&mut value).map_err(map_mutation_error)?;
        value.touch(now);
        match ledgers.save_ledger(&value, version).await {
            Ok(()) => return Ok(outcome),
            Err(err) => retry_after(COLLECTION, attempt, err)?,
        }
    }
    Err(exhausted(COLLECTION))
}

impl<L> LedgerService<L>
where
    L: LedgerRepository,
{
    async fn mutate<T, F>(&self, municipality_id: &MunicipalityId, apply: F) -> Result<T, Error>
    where
        F: FnMut(&mut BudgetLedger) -> Result<T, LedgerMutationError> + Send,
        T: Send,
    {
        mutate_ledger(
            self.ledgers.as_ref(),
            municipality_id,
            self.clock.utc(),
            apply,
        )
        .await
    }
}

#[async_trait]
impl<L> BudgetLedgerQuery for LedgerService<L>
where
    L: LedgerRepository,
{
    async fn ledger(&self, municipality_id: &MunicipalityId) -> Result<BudgetLedger, Error> {
        Ok(load_ledger(self.ledgers.as_ref(), municipality_id)
            .await?
            .value)
    }

    async fn validate_balance(
        &self,
        municipality_id: &MunicipalityId,
        year: BudgetYear,
    ) -> Result<BalanceReport, Error> {
        let report = self.ledger(municipality_id).await?.balance(year);
        tracing::debug!(
            municipality_id = %municipality_id,
            year = year.get(),
            balanced = report.balanced,
            "balance checked"
        );
        Ok(report)
    }
}

#[async_trait]
impl<L> BudgetLedgerCommand for LedgerService<L>
where
    L: LedgerRepository,
{
    async fn upsert_entry(
        &self,
        municipality_id: &MunicipalityId,
        rubric: Rubric,
        entry: YearEntry,
    ) -> Result<YearEntry, Error> {
        self.mutate(municipality_id, |ledger| {
            ledger.upsert_entry(rubric, entry);
            Ok(entry)
        })
        .await
    }

    async fn add_year(
        &self,
        municipality_id: &MunicipalityId,
        rubric: Rubric,
        year: BudgetYear,
    ) -> Result<YearEntry, Error> {
        let entry = self
            .mutate(municipality_id, |ledger| {
                ledger.add_year(rubric, year)?;
                Ok(ledger.entry(rubric, year).copied())
            })
            .await?;
        entry.ok_or_else(|| Error::internal("added year is missing from the ledger"))
    }

    async fn add_future_event(
        &self,
        municipality_id: &MunicipalityId,
        draft: FutureEventDraft,
    ) -> Result<FutureEvent, Error> {
        let event = draft.into_event(self.clock.utc());
        self.mutate(municipality_id, |ledger| {
            ledger.add_event(event.clone());
            Ok(())
        })
        .await?;
        tracing::info!(
            municipality_id = %municipality_id,
            event_id = %event.id,
            "future event recorded"
        );
        Ok(event)
    }

    async fn update_future_event(
        &self,
        municipality_id: &MunicipalityId,
        event_id: &EventId,
        patch: FutureEventPatch,
    ) -> Result<FutureEvent, Error> {
        let now = self.clock.utc();
        self.mutate(municipality_id, |ledger| {
            ledger.update_event(event_id, patch.clone(), now)
        })
        .await
    }

    async fn delete_future_event(
        &self,
        municipality_id: &MunicipalityId,
        event_id: &EventId,
    ) -> Result<(), Error> {
        self.mutate(municipality_id, |ledger| ledger.delete_event(event_id))
            .await
    }

    async fn delete_ledger(&self, municipality_id: &MunicipalityId) -> Result<(), Error> {
        self.ledgers
            .delete_ledger(municipality_id)
            .await
            .map_err(|err| map_repository_error(COLLECTION, err))?;
        tracing::info!(municipality_id = %municipality_id, "ledger deleted");
        Ok(())
    }
}

#[cfg(test)]
#[path = "ledger_service_tests.rs"]
mod tests;
