//! Flat row form of a ledger used for spreadsheet import and export.
//!
//! A row carries one `(rubric, year)` pair with its voted and actual
//! amounts. Field names match the column headers of the delimited-text
//! files; workbooks use one sheet per budget side.

mod batch;
mod csv_codec;
mod xlsx_codec;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::Municipality;
use super::budget::{
    Amount, BudgetKind, BudgetValidationError, BudgetYear, FutureEvent, Rubric, RubricView,
    YearEntry,
};

pub use self::batch::{ImportBatch, RowOrigin};
pub use self::csv_codec::{CSV_HEADER, CsvError, decode_csv, encode_csv, template_csv};
pub use self::xlsx_codec::{
    EVENTS_SHEET, EXPENSES_SHEET, REVENUES_SHEET, SpreadsheetError, decode_xlsx, encode_xlsx,
};

/// One `(rubric, year)` line of an interchange file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LedgerRow {
    #[schema(example = 2024)]
    pub annee: i64,
    #[schema(example = "R1")]
    pub rubrique: String,
    #[serde(rename = "type")]
    #[schema(example = "recette")]
    pub kind: String,
    #[serde(rename = "budgetVote", default)]
    pub budget_vote: Option<f64>,
    #[serde(default)]
    pub reel: Option<f64>,
}

impl LedgerRow {
    /// Row describing a stored entry.
    pub fn from_entry(rubric: Rubric, entry: &YearEntry) -> Self {
        Self {
            annee: i64::from(entry.year.get()),
            rubrique: rubric.code().to_owned(),
            kind: rubric.kind().as_str().to_owned(),
            budget_vote: Some(entry.voted.get()),
            reel: Some(entry.actual.get()),
        }
    }

    /// Row with explicit amounts for `rubric` in `year`.
    pub fn from_parts(year: i64, rubric: Rubric, voted: f64, actual: f64) -> Self {
        Self {
            annee: year,
            rubrique: rubric.code().to_owned(),
            kind: rubric.kind().as_str().to_owned(),
            budget_vote: Some(voted),
            reel: Some(actual),
        }
    }

    /// Validate the row into a rubric and entry. Missing amounts count as zero.
    ///
    /// # Examples
    /// ```
    /// use budget_portal::domain::interchange::LedgerRow;
    ///
    /// let row = LedgerRow {
    ///     annee: 2024,
    ///     rubrique: "D1".into(),
    ///     kind: "recette".into(),
    ///     budget_vote: Some(1.0),
    ///     reel: None,
    /// };
    /// assert!(row.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(Rubric, YearEntry), BudgetValidationError> {
        let rubric: Rubric = self.rubrique.parse()?;
        let declared: BudgetKind = self.kind.parse()?;
        rubric.ensure_kind(declared)?;
        let entry = YearEntry {
            year: BudgetYear::new(self.annee)?,
            voted: Amount::new(self.budget_vote.unwrap_or(0.0))?,
            actual: Amount::new(self.reel.unwrap_or(0.0))?,
        };
        Ok((rubric, entry))
    }
}

/// A row that was not applied, with its 1-based line and the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct SkippedRow {
    pub line: usize,
    /// Worksheet holding the row, for spreadsheet imports.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sheet: Option<String>,
    pub reason: String,
}

/// Outcome of a best-effort import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: Vec<SkippedRow>,
}

/// Full budget document of a municipality.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LedgerExport {
    pub municipality: Municipality,
    pub revenues: Vec<RubricView>,
    pub expenses: Vec<RubricView>,
    pub future_events: Vec<FutureEvent>,
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    fn row(annee: i64, rubrique: &str, kind: &str, vote: Option<f64>, reel: Option<f64>) -> LedgerRow {
        LedgerRow {
            annee,
            rubrique: rubrique.to_owned(),
            kind: kind.to_owned(),
            budget_vote: vote,
            reel,
        }
    }

    #[rstest]
    #[case(row(2024, "R13", "recette", Some(1.0), Some(1.0)))]
    #[case(row(2024, "R1", "depense", Some(1.0), Some(1.0)))]
    #[case(row(2024, "R1", "autre", Some(1.0), Some(1.0)))]
    #[case(row(2017, "R1", "recette", Some(1.0), Some(1.0)))]
    #[case(row(2024, "R1", "recette", Some(-1.0), Some(1.0)))]
    #[case(row(2024, "D1", "depense", Some(1.0), Some(f64::NAN)))]
    fn invalid_rows_are_rejected(#[case] input: LedgerRow) {
        assert!(input.validate().is_err());
    }

    #[rstest]
    fn missing_amounts_count_as_zero() {
        let (rubric, entry) = row(2024, "d2", "DEPENSE", None, None)
            .validate()
            .expect("valid row");
        assert_eq!(rubric.code(), "D2");
        assert_eq!(entry.voted, Amount::ZERO);
        assert_eq!(entry.actual, Amount::ZERO);
    }

    #[rstest]
    fn rows_serialise_with_interchange_headers() {
        let value = serde_json::to_value(row(2024, "R1", "recette", Some(5.0), None))
            .expect("serialise");
        assert_eq!(value["annee"], 2024);
        assert_eq!(value["type"], "recette");
        assert_eq!(value["budgetVote"], 5.0);
        assert!(value["reel"].is_null());
    }
}
