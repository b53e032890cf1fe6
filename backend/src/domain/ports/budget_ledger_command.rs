//! Driving port for budget ledger mutations.

use async_trait::async_trait;

use crate::domain::budget::{
    BudgetYear, EventId, FutureEvent, FutureEventDraft, FutureEventPatch, Rubric, YearEntry,
};
use crate::domain::{Error, MunicipalityId};

/// Domain use-case port for ledger writes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BudgetLedgerCommand: Send + Sync {
    /// Insert or overwrite the figures of one rubric for one year.
    async fn upsert_entry(
        &self,
        municipality_id: &MunicipalityId,
        rubric: Rubric,
        entry: YearEntry,
    ) -> Result<YearEntry, Error>;

    /// Add an empty year to a rubric. Conflicts when the year exists.
    async fn add_year(
        &self,
        municipality_id: &MunicipalityId,
        rubric: Rubric,
        year: BudgetYear,
    ) -> Result<YearEntry, Error>;

    /// Record a future event.
    async fn add_future_event(
        &self,
        municipality_id: &MunicipalityId,
        draft: FutureEventDraft,
    ) -> Result<FutureEvent, Error>;

    /// Update a future event.
    async fn update_future_event(
        &self,
        municipality_id: &MunicipalityId,
        event_id: &EventId,
        patch: FutureEventPatch,
    ) -> Result<FutureEvent, Error>;

    /// Remove a future event.
    async fn delete_future_event(
        &self,
        municipality_id: &MunicipalityId,
        event_id: &EventId,
    ) -> Result<(), Error>;

    /// Drop the whole ledger of a municipality.
    async fn delete_ledger(&self, municipality_id: &MunicipalityId) -> Result<(), Error>;
}
