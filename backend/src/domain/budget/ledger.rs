//! Per-municipality ledger of yearly voted and actual amounts.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use super::balance::BalanceReport;
use super::event::{EventId, FutureEvent, FutureEventPatch};
use super::{BudgetKind, BudgetValidationError, Rubric};
use crate::domain::MunicipalityId;

/// First fiscal year accepted by the ledger.
pub const FIRST_BUDGET_YEAR: i32 = 2018;
/// Last fiscal year accepted by the ledger.
pub const LAST_BUDGET_YEAR: i32 = 2100;

/// Fiscal year within [`FIRST_BUDGET_YEAR`]..=[`LAST_BUDGET_YEAR`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "i64", into = "i32")]
pub struct BudgetYear(i32);

impl BudgetYear {
    /// Validate a raw year.
    pub fn new(year: i64) -> Result<Self, BudgetValidationError> {
        i32::try_from(year)
            .ok()
            .filter(|value| (FIRST_BUDGET_YEAR..=LAST_BUDGET_YEAR).contains(value))
            .map(Self)
            .ok_or(BudgetValidationError::YearOutOfRange {
                year,
                min: FIRST_BUDGET_YEAR,
                max: LAST_BUDGET_YEAR,
            })
    }

    pub fn get(self) -> i32 {
        self.0
    }
}

impl fmt::Display for BudgetYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<BudgetYear> for i32 {
    fn from(value: BudgetYear) -> Self {
        value.0
    }
}

impl TryFrom<i64> for BudgetYear {
    type Error = BudgetValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Non-negative, finite amount in dinars.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "f64", into = "f64")]
pub struct Amount(f64);

impl Amount {
    /// Zero dinars.
    pub const ZERO: Self = Self(0.0);

    /// Validate a raw amount.
    pub fn new(value: f64) -> Result<Self, BudgetValidationError> {
        if !value.is_finite() {
            return Err(BudgetValidationError::NonFiniteAmount);
        }
        if value < 0.0 {
            return Err(BudgetValidationError::NegativeAmount);
        }
        Ok(Self(value))
    }

    pub fn get(self) -> f64 {
        self.0
    }
}

impl From<Amount> for f64 {
    fn from(value: Amount) -> Self {
        value.0
    }
}

impl TryFrom<f64> for Amount {
    type Error = BudgetValidationError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Figures recorded for one rubric in one year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct YearEntry {
    pub year: BudgetYear,
    pub voted: Amount,
    pub actual: Amount,
}

/// One rubric with its name and yearly entries, as presented to clients.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RubricView {
    #[schema(value_type = String, example = "R1")]
    pub code: &'static str,
    #[schema(value_type = String, example = "Recettes fiscales")]
    pub name: &'static str,
    pub entries: Vec<YearEntry>,
}

/// Structural conflicts raised by ledger mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerMutationError {
    #[error("year {year} already exists for rubric {rubric}")]
    YearExists { rubric: Rubric, year: BudgetYear },
    #[error("future event {id} not found")]
    EventNotFound { id: EventId },
    #[error(transparent)]
    Invalid(#[from] BudgetValidationError),
}

/// Budget document of a single municipality.
///
/// ## Invariants
/// - Entries of a rubric are sorted by ascending year, at most one per year.
/// - Future events are sorted by ascending year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetLedger {
    municipality_id: MunicipalityId,
    #[serde(default)]
    entries: BTreeMap<Rubric, Vec<YearEntry>>,
    #[serde(default)]
    future_events: Vec<FutureEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_updated: Option<DateTime<Utc>>,
}

impl BudgetLedger {
    /// Ledger with no figures and no events.
    pub fn blank(municipality_id: MunicipalityId) -> Self {
        Self {
            municipality_id,
            entries: BTreeMap::new(),
            future_events: Vec::new(),
            last_updated: None,
        }
    }

    pub fn municipality_id(&self) -> &MunicipalityId {
        &self.municipality_id
    }

    /// Entries of `rubric`, ascending by year.
    pub fn entries(&self, rubric: Rubric) -> &[YearEntry] {
        self.entries.get(&rubric).map_or(&[], Vec::as_slice)
    }

    /// Entry of `rubric` for `year`, if recorded.
    pub fn entry(&self, rubric: Rubric, year: BudgetYear) -> Option<&YearEntry> {
        self.entries(rubric).iter().find(|entry| entry.year == year)
    }

    pub fn future_events(&self) -> &[FutureEvent] {
        &self.future_events
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    /// Stamp the ledger as modified at `now`.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_updated = Some(now);
    }

    /// Insert or overwrite the entry for `entry.year`.
    pub fn upsert_entry(&mut self, rubric: Rubric, entry: YearEntry) {
        let entries = self.entries.entry(rubric).or_default();
        match entries.binary_search_by_key(&entry.year, |existing| existing.year) {
            Ok(index) => entries[index] = entry,
            Err(index) => entries.insert(index, entry),
        }
    }

    /// Insert an empty entry for `year`.
    ///
    /// # Examples
    /// ```
    /// use budget_portal::domain::MunicipalityId;
    /// use budget_portal::domain::budget::{BudgetLedger, BudgetYear, Rubric};
    ///
    /// let mut ledger = BudgetLedger::blank(MunicipalityId::random());
    /// let rubric: Rubric = "R1".parse().unwrap();
    /// let year = BudgetYear::new(2024).unwrap();
    /// ledger.add_year(rubric, year).unwrap();
    /// assert!(ledger.add_year(rubric, year).is_err());
    /// ```
    pub fn add_year(&mut self, rubric: Rubric, year: BudgetYear) -> Result<(), LedgerMutationError> {
        if self.entry(rubric, year).is_some() {
            return Err(LedgerMutationError::YearExists { rubric, year });
        }
        self.upsert_entry(
            rubric,
            YearEntry {
                year,
                voted: Amount::ZERO,
                actual: Amount::ZERO,
            },
        );
        Ok(())
    }

    /// Sum of voted amounts of one budget side for `year`.
    pub fn voted_total(&self, kind: BudgetKind, year: BudgetYear) -> f64 {
        Rubric::of_kind(kind)
            .filter_map(|rubric| self.entry(rubric, year))
            .map(|entry| entry.voted.get())
            .fold(0.0, |total, voted| total + voted)
    }

    /// Compare voted revenues and expenses for `year`.
    pub fn balance(&self, year: BudgetYear) -> BalanceReport {
        BalanceReport::compute(
            year,
            self.voted_total(BudgetKind::Revenue, year),
            self.voted_total(BudgetKind::Expense, year),
        )
    }

    /// Every rubric of one budget side, declaration order, including empty ones.
    pub fn sheet(&self, kind: BudgetKind) -> Vec<RubricView> {
        Rubric::of_kind(kind)
            .map(|rubric| RubricView {
                code: rubric.code(),
                name: rubric.name(),
                entries: self.entries(rubric).to_vec(),
            })
            .collect()
    }

    /// Every recorded entry: revenues first, declaration order, years ascending.
    pub fn rows(&self) -> impl Iterator<Item = (Rubric, &YearEntry)> {
        Rubric::all().flat_map(move |rubric| {
            self.entries(rubric).iter().map(move |entry| (rubric, entry))
        })
    }

    /// Append an event and keep the list sorted by year.
    pub fn add_event(&mut self, event: FutureEvent) {
        self.future_events.push(event);
        self.sort_events();
    }

    /// Apply `patch` to the event `id`, returning the updated event.
    pub fn update_event(
        &mut self,
        id: &EventId,
        patch: FutureEventPatch,
        now: DateTime<Utc>,
    ) -> Result<FutureEvent, LedgerMutationError> {
        let event = self
            .future_events
            .iter_mut()
            .find(|event| &event.id == id)
            .ok_or_else(|| LedgerMutationError::EventNotFound { id: id.clone() })?;
        patch.check_against(event)?;
        patch.apply(event, now);
        let updated = event.clone();
        self.sort_events();
        Ok(updated)
    }

    /// Remove the event `id`.
    pub fn delete_event(&mut self, id: &EventId) -> Result<(), LedgerMutationError> {
        let before = self.future_events.len();
        self.future_events.retain(|event| &event.id != id);
        if self.future_events.len() == before {
            return Err(LedgerMutationError::EventNotFound { id: id.clone() });
        }
        Ok(())
    }

    fn sort_events(&mut self) {
        self.future_events.sort_by_key(|event| event.year);
    }
}
