//! Workbook codec for ledgers.
//!
//! Exports carry a `Recettes` and a `Dépenses` sheet with the columns
//! `Rubrique, Code, Année, Budget voté (DT), Réel (DT)`, plus an
//! `Événements futurs` sheet when the ledger has events. Imports read the
//! two budget sheets; the sheet fixes the row type and the rubric name
//! column is ignored. Interchange header names (`annee`, `rubrique`,
//! `budgetVote`, `reel`) are accepted as well.

use std::io::Cursor;

use calamine::{Data, Range, Reader, Xlsx, open_workbook_from_rs};
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use thiserror::Error;

use super::{ImportBatch, LedgerExport, LedgerRow, RowOrigin};
use crate::domain::budget::{BudgetKind, RubricView};

/// Sheet holding revenue rubrics.
pub const REVENUES_SHEET: &str = "Recettes";
/// Sheet holding expense rubrics.
pub const EXPENSES_SHEET: &str = "Dépenses";
/// Sheet listing future events, written only when there are some.
pub const EVENTS_SHEET: &str = "Événements futurs";

const LEDGER_HEADER: [&str; 5] = ["Rubrique", "Code", "Année", "Budget voté (DT)", "Réel (DT)"];
const EVENTS_HEADER: [&str; 5] = ["Année", "Description", "Impact estimé (DT)", "Rubrique", "Type"];

const YEAR_COLUMNS: [&str; 2] = ["Année", "annee"];
const CODE_COLUMNS: [&str; 3] = ["Code", "code", "rubrique"];
const VOTED_COLUMNS: [&str; 2] = ["Budget voté (DT)", "budgetVote"];
const ACTUAL_COLUMNS: [&str; 2] = ["Réel (DT)", "reel"];

/// Failures that make a whole workbook unusable.
#[derive(Debug, Error)]
pub enum SpreadsheetError {
    /// The upload is not a readable workbook.
    #[error("unreadable workbook: {message}")]
    Workbook { message: String },
    /// Neither budget sheet is present.
    #[error("workbook has no {REVENUES_SHEET} or {EXPENSES_SHEET} sheet")]
    MissingSheets,
    /// A budget sheet lacks required columns.
    #[error("sheet {sheet} is missing required columns: {}", missing.join(", "))]
    MissingColumns { sheet: String, missing: Vec<String> },
    /// The workbook could not be written.
    #[error("failed to write workbook: {message}")]
    Write { message: String },
}

impl From<rust_xlsxwriter::XlsxError> for SpreadsheetError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        Self::Write {
            message: err.to_string(),
        }
    }
}

fn write_header(
    sheet: &mut Worksheet,
    header: &[&str],
    bold: &Format,
) -> Result<(), SpreadsheetError> {
    for (col, title) in (0_u16..).zip(header) {
        sheet.write_string_with_format(0, col, *title, bold)?;
    }
    Ok(())
}

fn write_ledger_sheet(
    workbook: &mut Workbook,
    name: &str,
    views: &[RubricView],
    bold: &Format,
) -> Result<(), SpreadsheetError> {
    let sheet = workbook.add_worksheet();
    sheet.set_name(name)?;
    write_header(sheet, &LEDGER_HEADER, bold)?;
    let entries = views
        .iter()
        .flat_map(|view| view.entries.iter().map(move |entry| (view, entry)));
    for (row, (view, entry)) in (1_u32..).zip(entries) {
        sheet.write_string(row, 0, view.name)?;
        sheet.write_string(row, 1, view.code)?;
        sheet.write_number(row, 2, f64::from(entry.year.get()))?;
        sheet.write_number(row, 3, entry.voted.get())?;
        sheet.write_number(row, 4, entry.actual.get())?;
    }
    Ok(())
}

/// Write the budget document as an `.xlsx` workbook.
pub fn encode_xlsx(export: &LedgerExport) -> Result<Vec<u8>, SpreadsheetError> {
    let bold = Format::new().set_bold();
    let mut workbook = Workbook::new();
    write_ledger_sheet(&mut workbook, REVENUES_SHEET, &export.revenues, &bold)?;
    write_ledger_sheet(&mut workbook, EXPENSES_SHEET, &export.expenses, &bold)?;

    if !export.future_events.is_empty() {
        let sheet = workbook.add_worksheet();
        sheet.set_name(EVENTS_SHEET)?;
        write_header(sheet, &EVENTS_HEADER, &bold)?;
        for (row, event) in (1_u32..).zip(&export.future_events) {
            sheet.write_number(row, 0, f64::from(event.year.get()))?;
            sheet.write_string(row, 1, &event.description)?;
            sheet.write_number(row, 2, event.estimated_impact)?;
            sheet.write_string(row, 3, event.rubric.code())?;
            sheet.write_string(row, 4, event.kind().as_str())?;
        }
    }

    Ok(workbook.save_to_buffer()?)
}

fn column(header: &[Data], aliases: &[&str]) -> Option<usize> {
    header.iter().position(|cell| match cell {
        Data::String(title) => aliases.contains(&title.trim()),
        _ => false,
    })
}

fn year_cell(cell: Option<&Data>) -> Option<i64> {
    match cell? {
        Data::Int(value) => Some(*value),
        Data::Float(value) if value.fract() == 0.0 && value.abs() < 1e9 => Some(*value as i64),
        Data::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn code_cell(cell: Option<&Data>) -> Option<String> {
    match cell? {
        Data::String(text) if !text.trim().is_empty() => Some(text.trim().to_owned()),
        _ => None,
    }
}

fn amount_cell(cell: Option<&Data>) -> Result<Option<f64>, String> {
    match cell {
        None | Some(Data::Empty) => Ok(None),
        Some(Data::Float(value)) => Ok(Some(*value)),
        Some(Data::Int(value)) => Ok(Some(*value as f64)),
        Some(Data::String(text)) if text.trim().is_empty() => Ok(None),
        Some(Data::String(text)) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| format!("unreadable amount {text:?}")),
        Some(other) => Err(format!("unreadable amount {other}")),
    }
}

fn is_blank(cells: &[Data]) -> bool {
    cells.iter().all(|cell| match cell {
        Data::Empty => true,
        Data::String(text) => text.trim().is_empty(),
        _ => false,
    })
}

/// Column positions found in a budget sheet header.
struct Columns {
    year: usize,
    code: usize,
    voted: Option<usize>,
    actual: Option<usize>,
}

impl Columns {
    fn decode(&self, cells: &[Data], kind: BudgetKind) -> Result<LedgerRow, String> {
        let optional = |col: Option<usize>| col.and_then(|index| cells.get(index));
        Ok(LedgerRow {
            annee: year_cell(cells.get(self.year)).ok_or("unreadable year")?,
            rubrique: code_cell(cells.get(self.code)).ok_or("missing rubric code")?,
            kind: kind.as_str().to_owned(),
            budget_vote: amount_cell(optional(self.voted))?,
            reel: amount_cell(optional(self.actual))?,
        })
    }
}

fn read_ledger_sheet(
    batch: &mut ImportBatch,
    sheet: &str,
    range: &Range<Data>,
    kind: BudgetKind,
) -> Result<(), SpreadsheetError> {
    let first_row = range
        .start()
        .and_then(|(row, _)| usize::try_from(row).ok())
        .unwrap_or(0);
    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Ok(());
    };
    let year_col = column(header, &YEAR_COLUMNS);
    let code_col = column(header, &CODE_COLUMNS);
    let (Some(year_col), Some(code_col)) = (year_col, code_col) else {
        let missing = [(year_col, YEAR_COLUMNS[0]), (code_col, CODE_COLUMNS[0])]
            .into_iter()
            .filter(|(found, _)| found.is_none())
            .map(|(_, name)| name.to_owned())
            .collect();
        return Err(SpreadsheetError::MissingColumns {
            sheet: sheet.to_owned(),
            missing,
        });
    };
    let columns = Columns {
        year: year_col,
        code: code_col,
        voted: column(header, &VOTED_COLUMNS),
        actual: column(header, &ACTUAL_COLUMNS),
    };

    // Worksheet rows are 1-based and the header occupies the first one.
    for (offset, cells) in rows.enumerate() {
        if is_blank(cells) {
            continue;
        }
        let origin = RowOrigin::sheet_row(sheet, first_row + offset + 2);
        match columns.decode(cells, kind) {
            Ok(row) => batch.push(row, origin),
            Err(reason) => {
                tracing::warn!(sheet, line = origin.line, %reason, "skipping undecodable sheet row");
                batch.reject(origin, reason);
            }
        }
    }
    Ok(())
}

/// Read the budget sheets of an `.xlsx` workbook.
///
/// Fails when the workbook cannot be opened, has neither budget sheet, or a
/// budget sheet lacks the year or code column. Bad rows end up in
/// [`ImportBatch::rejected`].
pub fn decode_xlsx(bytes: &[u8]) -> Result<ImportBatch, SpreadsheetError> {
    let unreadable = |err: calamine::XlsxError| SpreadsheetError::Workbook {
        message: err.to_string(),
    };
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes)).map_err(unreadable)?;
    let names = workbook.sheet_names();
    let mut batch = ImportBatch::default();
    let mut found = false;
    for (sheet, kind) in [
        (REVENUES_SHEET, BudgetKind::Revenue),
        (EXPENSES_SHEET, BudgetKind::Expense),
    ] {
        if !names.iter().any(|name| name == sheet) {
            continue;
        }
        found = true;
        let range = workbook.worksheet_range(sheet).map_err(unreadable)?;
        read_ledger_sheet(&mut batch, sheet, &range, kind)?;
    }
    if found {
        Ok(batch)
    } else {
        Err(SpreadsheetError::MissingSheets)
    }
}
