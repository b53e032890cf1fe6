//! Delimited-text codec for ledger rows.
//!
//! Files carry the header `annee,rubrique,type,budgetVote,reel`. Exports use
//! commas; imports also accept semicolon or tab separated files, picking the
//! separator from the header line. Decoding is lenient: records that cannot
//! be read are reported by line and the rest of the file is still returned.

use thiserror::Error;

use super::{ImportBatch, LedgerRow, RowOrigin};

/// Column headers, in output order.
pub const CSV_HEADER: [&str; 5] = ["annee", "rubrique", "type", "budgetVote", "reel"];

const REQUIRED_COLUMNS: [&str; 3] = ["annee", "rubrique", "type"];

const DELIMITERS: [u8; 3] = [b',', b';', b'\t'];

const TEMPLATE: &str = "annee,rubrique,type,budgetVote,reel\n\
2024,R1,recette,100000,95000\n\
2024,D1,depense,80000,78000\n";

/// Failures that make a whole file unusable.
#[derive(Debug, Error)]
pub enum CsvError {
    /// The header line is missing required columns.
    #[error("missing required columns: {}", missing.join(", "))]
    MissingColumns { missing: Vec<String> },
    /// The header line could not be read.
    #[error("unreadable header: {0}")]
    Header(#[source] ::csv::Error),
    /// Rows could not be written.
    #[error("failed to write rows: {message}")]
    Write { message: String },
}

/// Import template with one revenue and one expense example row.
///
/// # Examples
/// ```
/// use budget_portal::domain::interchange::template_csv;
///
/// let template = template_csv();
/// assert!(template.starts_with("annee,rubrique,type,budgetVote,reel\n"));
/// assert_eq!(template.lines().count(), 3);
/// ```
pub fn template_csv() -> String {
    TEMPLATE.to_owned()
}

/// Write rows under the interchange header. An empty slice yields the header only.
pub fn encode_csv(rows: &[LedgerRow]) -> Result<String, CsvError> {
    let write_error = |err: ::csv::Error| CsvError::Write {
        message: err.to_string(),
    };
    let mut writer = ::csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(CSV_HEADER).map_err(write_error)?;
    for row in rows {
        writer.serialize(row).map_err(write_error)?;
    }
    let bytes = writer.into_inner().map_err(|err| CsvError::Write {
        message: err.to_string(),
    })?;
    String::from_utf8(bytes).map_err(|err| CsvError::Write {
        message: err.to_string(),
    })
}

/// Separator appearing most often in the header line; commas win ties.
fn sniff_delimiter(input: &str) -> u8 {
    let header = input.lines().next().unwrap_or_default();
    let mut best = (b',', 0);
    for delimiter in DELIMITERS {
        let count = header.bytes().filter(|byte| *byte == delimiter).count();
        if count > best.1 {
            best = (delimiter, count);
        }
    }
    best.0
}

fn line_of(position: Option<&::csv::Position>) -> usize {
    position
        .and_then(|pos| usize::try_from(pos.line()).ok())
        .unwrap_or(0)
}

/// Read every record of `input`.
///
/// Fails only when the header is unusable; bad records end up in
/// [`ImportBatch::rejected`].
pub fn decode_csv(input: &str) -> Result<ImportBatch, CsvError> {
    let mut reader = ::csv::ReaderBuilder::new()
        .delimiter(sniff_delimiter(input))
        .trim(::csv::Trim::All)
        .from_reader(input.as_bytes());
    let headers = reader.headers().map_err(CsvError::Header)?.clone();
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|column| !headers.iter().any(|header| header == **column))
        .map(|column| (*column).to_owned())
        .collect();
    if !missing.is_empty() {
        return Err(CsvError::MissingColumns { missing });
    }

    let mut batch = ImportBatch::default();
    for result in reader.records() {
        let decoded = result.and_then(|record| {
            let line = line_of(record.position());
            record
                .deserialize::<LedgerRow>(Some(&headers))
                .map(|row| (line, row))
        });
        match decoded {
            Ok((line, row)) => batch.push(row, RowOrigin::line(line)),
            Err(err) => {
                let line = line_of(err.position());
                tracing::warn!(line, error = %err, "skipping undecodable import record");
                batch.reject(RowOrigin::line(line), err.to_string());
            }
        }
    }
    Ok(batch)
}
