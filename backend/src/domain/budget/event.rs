//! Future events (regressors) attached to a ledger.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{BudgetKind, BudgetValidationError, BudgetYear, Rubric};

/// Identifier of a future event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EventId(Uuid);

impl EventId {
    pub fn new(raw: impl AsRef<str>) -> Result<Self, BudgetValidationError> {
        Uuid::parse_str(raw.as_ref())
            .map(Self)
            .map_err(|_| BudgetValidationError::InvalidEventId)
    }

    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<EventId> for String {
    fn from(value: EventId) -> Self {
        value.0.to_string()
    }
}

impl TryFrom<String> for EventId {
    type Error = BudgetValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Anticipated change affecting a rubric in a future year.
///
/// The `type` is always the kind implied by `rubric`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FutureEvent {
    #[schema(value_type = String)]
    pub id: EventId,
    #[schema(value_type = i32, example = 2027)]
    pub year: BudgetYear,
    #[schema(example = "Construction d'un marché municipal")]
    pub description: String,
    /// Estimated impact in dinars; negative values reduce the rubric.
    pub estimated_impact: f64,
    #[schema(value_type = String, example = "D5")]
    pub rubric: Rubric,
    #[serde(rename = "type")]
    kind: BudgetKind,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FutureEvent {
    /// Budget side of the event.
    pub fn kind(&self) -> BudgetKind {
        self.kind
    }
}

fn description(raw: &str) -> Result<String, BudgetValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(BudgetValidationError::EmptyDescription);
    }
    Ok(trimmed.to_owned())
}

fn impact(raw: f64) -> Result<f64, BudgetValidationError> {
    if raw.is_finite() {
        Ok(raw)
    } else {
        Err(BudgetValidationError::NonFiniteAmount)
    }
}

/// Validated input for a new future event.
#[derive(Debug, Clone, PartialEq)]
pub struct FutureEventDraft {
    year: BudgetYear,
    description: String,
    estimated_impact: f64,
    rubric: Rubric,
}

impl FutureEventDraft {
    /// Validate raw event fields.
    ///
    /// `declared` is the type sent by the caller, if any; it must match the
    /// rubric.
    pub fn try_new(
        year: i64,
        raw_description: &str,
        estimated_impact: f64,
        rubric: Rubric,
        declared: Option<BudgetKind>,
    ) -> Result<Self, BudgetValidationError> {
        if let Some(kind) = declared {
            rubric.ensure_kind(kind)?;
        }
        Ok(Self {
            year: BudgetYear::new(year)?,
            description: description(raw_description)?,
            estimated_impact: impact(estimated_impact)?,
            rubric,
        })
    }

    /// Materialise the event with a fresh identifier.
    pub fn into_event(self, now: DateTime<Utc>) -> FutureEvent {
        FutureEvent {
            id: EventId::random(),
            year: self.year,
            description: self.description,
            estimated_impact: self.estimated_impact,
            kind: self.rubric.kind(),
            rubric: self.rubric,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update of a future event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FutureEventPatch {
    year: Option<BudgetYear>,
    description: Option<String>,
    estimated_impact: Option<f64>,
    rubric: Option<Rubric>,
    declared: Option<BudgetKind>,
}

impl FutureEventPatch {
    /// Validate the supplied fields.
    pub fn try_new(
        year: Option<i64>,
        raw_description: Option<&str>,
        estimated_impact: Option<f64>,
        rubric: Option<Rubric>,
        declared: Option<BudgetKind>,
    ) -> Result<Self, BudgetValidationError> {
        if let (Some(rubric), Some(kind)) = (rubric, declared) {
            rubric.ensure_kind(kind)?;
        }
        Ok(Self {
            year: year.map(BudgetYear::new).transpose()?,
            description: raw_description.map(description).transpose()?,
            estimated_impact: estimated_impact.map(impact).transpose()?,
            rubric,
            declared,
        })
    }

    /// Check a declared type against the rubric the event ends up with.
    pub fn check_against(&self, event: &FutureEvent) -> Result<(), BudgetValidationError> {
        match self.declared {
            Some(kind) => self.rubric.unwrap_or(event.rubric).ensure_kind(kind),
            None => Ok(()),
        }
    }

    /// Apply the patch in place; `id` and `created_at` are preserved.
    pub fn apply(self, event: &mut FutureEvent, now: DateTime<Utc>) {
        if let Some(year) = self.year {
            event.year = year;
        }
        if let Some(description) = self.description {
            event.description = description;
        }
        if let Some(estimated_impact) = self.estimated_impact {
            event.estimated_impact = estimated_impact;
        }
        if let Some(rubric) = self.rubric {
            event.rubric = rubric;
            event.kind = rubric.kind();
        }
        event.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::budget::{ExpensePart, RevenueCategory};
    use rstest::rstest;

    const R6: Rubric = Rubric::Revenue(RevenueCategory::R6);
    const D5: Rubric = Rubric::Expense(ExpensePart::D5);

    #[rstest]
    fn type_is_derived_from_rubric() {
        let event = FutureEventDraft::try_new(2027, "Nouveau marché", -2500.0, D5, None)
            .expect("valid draft")
            .into_event(Utc::now());
        assert_eq!(event.kind(), BudgetKind::Expense);
        let value = serde_json::to_value(&event).expect("serialise");
        assert_eq!(value["type"], "depense");
        assert_eq!(value["rubric"], "D5");
        assert_eq!(value["estimatedImpact"], -2500.0);
    }

    #[rstest]
    #[case(2027, "Subvention", 10.0, R6, Some(BudgetKind::Expense))]
    #[case(2017, "Subvention", 10.0, R6, None)]
    #[case(2027, "   ", 10.0, R6, None)]
    #[case(2027, "Subvention", f64::NAN, R6, None)]
    fn draft_rejects_invalid_input(
        #[case] year: i64,
        #[case] text: &str,
        #[case] value: f64,
        #[case] rubric: Rubric,
        #[case] declared: Option<BudgetKind>,
    ) {
        assert!(FutureEventDraft::try_new(year, text, value, rubric, declared).is_err());
    }

    #[rstest]
    fn patch_preserves_identity_and_rederives_type() {
        let created = DateTime::<Utc>::UNIX_EPOCH;
        let mut event = FutureEventDraft::try_new(2027, "Subvention", 10.0, R6, None)
            .expect("valid draft")
            .into_event(created);
        let id = event.id.clone();
        let later = created + chrono::Duration::seconds(5);

        let patch = FutureEventPatch::try_new(Some(2029), None, None, Some(D5), None)
            .expect("valid patch");
        patch.check_against(&event).expect("no declared type");
        patch.apply(&mut event, later);

        assert_eq!(event.id, id);
        assert_eq!(event.created_at, created);
        assert_eq!(event.updated_at, later);
        assert_eq!(event.year.get(), 2029);
        assert_eq!(event.kind(), BudgetKind::Expense);
    }

    #[rstest]
    fn patch_declared_type_is_checked_against_stored_rubric() {
        let event = FutureEventDraft::try_new(2027, "Subvention", 10.0, R6, None)
            .expect("valid draft")
            .into_event(Utc::now());
        let patch = FutureEventPatch::try_new(None, None, None, None, Some(BudgetKind::Expense))
            .expect("shape is valid");
        assert!(matches!(
            patch.check_against(&event),
            Err(BudgetValidationError::KindMismatch { .. })
        ));
    }
}
