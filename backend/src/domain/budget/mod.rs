//! Municipal budget ledger: rubric nomenclature, yearly figures, future
//! events and the balance rule.

mod balance;
mod event;
mod ledger;
mod rubric;

use thiserror::Error;

pub use balance::{BALANCE_TOLERANCE, BalanceReport};
pub use event::{EventId, FutureEvent, FutureEventDraft, FutureEventPatch};
pub use ledger::{
    Amount, BudgetLedger, BudgetYear, FIRST_BUDGET_YEAR, LAST_BUDGET_YEAR, LedgerMutationError,
    RubricView, YearEntry,
};
pub use rubric::{BudgetKind, ExpensePart, RevenueCategory, Rubric};

/// Validation failures for budget input values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BudgetValidationError {
    #[error("unknown rubric {code}")]
    UnknownRubric { code: String },
    #[error("type must be recette or depense, got {value}")]
    UnknownKind { value: String },
    #[error("rubric {rubric} does not belong to type {declared}")]
    KindMismatch { rubric: String, declared: String },
    #[error("year {year} is outside {min}..={max}")]
    YearOutOfRange { year: i64, min: i32, max: i32 },
    #[error("amounts must be finite numbers")]
    NonFiniteAmount,
    #[error("amounts must not be negative")]
    NegativeAmount,
    #[error("event description must not be empty")]
    EmptyDescription,
    #[error("event id must be a valid UUID")]
    InvalidEventId,
}
