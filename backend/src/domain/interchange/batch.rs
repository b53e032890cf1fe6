//! Decoded import rows together with where each one came from.

use super::{ImportReport, LedgerRow, SkippedRow};

/// Position of a row in the uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowOrigin {
    /// Worksheet name; `None` for delimited text.
    pub sheet: Option<String>,
    /// 1-based physical line or worksheet row.
    pub line: usize,
}

impl RowOrigin {
    pub fn line(line: usize) -> Self {
        Self { sheet: None, line }
    }

    pub fn sheet_row(sheet: &str, line: usize) -> Self {
        Self {
            sheet: Some(sheet.to_owned()),
            line,
        }
    }

    fn skipped(self, reason: String) -> SkippedRow {
        SkippedRow {
            line: self.line,
            sheet: self.sheet,
            reason,
        }
    }
}

/// Rows read from an import file, remembering where each came from.
#[derive(Debug, Default)]
pub struct ImportBatch {
    rows: Vec<LedgerRow>,
    origins: Vec<RowOrigin>,
    rejected: Vec<SkippedRow>,
}

impl ImportBatch {
    pub(super) fn push(&mut self, row: LedgerRow, origin: RowOrigin) {
        self.rows.push(row);
        self.origins.push(origin);
    }

    pub(super) fn reject(&mut self, origin: RowOrigin, reason: String) {
        self.rejected.push(origin.skipped(reason));
    }

    /// Decoded rows in file order.
    pub fn rows(&self) -> &[LedgerRow] {
        &self.rows
    }

    /// Records that could not be decoded.
    pub fn rejected(&self) -> &[SkippedRow] {
        &self.rejected
    }

    /// Hand the decoded rows to the importer.
    pub fn take_rows(&mut self) -> Vec<LedgerRow> {
        std::mem::take(&mut self.rows)
    }

    /// Translate a report over the decoded rows into file positions and
    /// merge in the records rejected while decoding.
    pub fn finish(self, report: ImportReport) -> ImportReport {
        let ImportReport { imported, skipped } = report;
        let origins = self.origins;
        let mut skipped: Vec<SkippedRow> = skipped
            .into_iter()
            .map(|row| {
                match row
                    .line
                    .checked_sub(1)
                    .and_then(|index| origins.get(index).cloned())
                {
                    Some(origin) => origin.skipped(row.reason),
                    None => row,
                }
            })
            .chain(self.rejected)
            .collect();
        skipped.sort_by(|a, b| (&a.sheet, a.line).cmp(&(&b.sheet, b.line)));
        ImportReport { imported, skipped }
    }
}
