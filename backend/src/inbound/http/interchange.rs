//! Spreadsheet and JSON import/export of budget ledgers.
//!
//! ```text
//! GET  /api/v1/municipalities/{id}/budget/export.csv
//! GET  /api/v1/municipalities/{id}/budget/export.json
//! GET  /api/v1/municipalities/{id}/budget/export.xlsx
//! POST /api/v1/municipalities/{id}/budget/import      text/csv body
//! POST /api/v1/municipalities/{id}/budget/import.xlsx workbook body
//! GET  /api/v1/budget/template.csv
//! ```

use actix_web::http::header::{
    CacheControl, CacheDirective, ContentDisposition, DispositionParam, DispositionType,
};
use actix_web::{HttpResponse, get, post, web};
use serde_json::json;
use tracing::info;

use crate::domain::interchange::{
    CsvError, ImportBatch, ImportReport, LedgerExport, SpreadsheetError, decode_csv, decode_xlsx,
    encode_csv, encode_xlsx, template_csv,
};
use crate::domain::{Error, Municipality};
use crate::inbound::http::ApiResult;
use crate::inbound::http::municipalities::authorize_municipality;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";
const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

fn map_csv_error(err: CsvError) -> Error {
    match err {
        CsvError::MissingColumns { ref missing } => {
            let details = json!({ "missing": missing });
            Error::invalid_request(err.to_string()).with_details(details)
        }
        CsvError::Header(_) => Error::invalid_request(err.to_string()),
        CsvError::Write { message } => Error::internal(message),
    }
}

fn map_spreadsheet_error(err: SpreadsheetError) -> Error {
    match err {
        SpreadsheetError::MissingColumns {
            ref sheet,
            ref missing,
        } => {
            let details = json!({ "sheet": sheet, "missing": missing });
            Error::invalid_request(err.to_string()).with_details(details)
        }
        SpreadsheetError::Workbook { .. } | SpreadsheetError::MissingSheets => {
            Error::invalid_request(err.to_string())
        }
        SpreadsheetError::Write { message } => Error::internal(message),
    }
}

fn attachment(filename: String) -> ContentDisposition {
    ContentDisposition {
        disposition: DispositionType::Attachment,
        parameters: vec![DispositionParam::Filename(filename)],
    }
}

async fn authorized(
    state: &HttpState,
    session: &SessionContext,
    raw_id: &str,
) -> Result<Municipality, Error> {
    let user = session.require_user()?;
    authorize_municipality(state, &user, raw_id).await
}

/// Ledger figures as CSV.
#[utoipa::path(
    get,
    path = "/api/v1/municipalities/{id}/budget/export.csv",
    params(("id" = String, Path, description = "Municipality id")),
    responses(
        (status = 200, description = "CSV with header annee,rubrique,type,budgetVote,reel",
            content_type = "text/csv", body = String),
        (status = 403, description = "Assigned to another employee", body = Error),
        (status = 404, description = "Unknown municipality", body = Error)
    ),
    tags = ["interchange"],
    operation_id = "exportBudgetCsv"
)]
#[get("/municipalities/{id}/budget/export.csv")]
pub async fn export_csv(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let municipality = authorized(&state, &session, &path).await?;
    let rows = state.interchange.to_rows(&municipality.id).await?;
    let body = encode_csv(&rows).map_err(map_csv_error)?;
    Ok(HttpResponse::Ok()
        .content_type(CSV_CONTENT_TYPE)
        .insert_header(attachment(format!("budget-{}.csv", municipality.code)))
        .body(body))
}

/// Municipality, ledger and future events as one JSON document.
#[utoipa::path(
    get,
    path = "/api/v1/municipalities/{id}/budget/export.json",
    params(("id" = String, Path, description = "Municipality id")),
    responses(
        (status = 200, description = "Budget document", body = LedgerExport),
        (status = 403, description = "Assigned to another employee", body = Error),
        (status = 404, description = "Unknown municipality", body = Error)
    ),
    tags = ["interchange"],
    operation_id = "exportBudgetJson"
)]
#[get("/municipalities/{id}/budget/export.json")]
pub async fn export_json(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let municipality = authorized(&state, &session, &path).await?;
    let export = state.interchange.export_json(&municipality.id).await?;
    Ok(HttpResponse::Ok()
        .insert_header(attachment(format!("budget-{}.json", municipality.code)))
        .json(export))
}

/// Apply a CSV file to the ledger. Valid rows are stored; the others are
/// reported with their line number.
#[utoipa::path(
    post,
    path = "/api/v1/municipalities/{id}/budget/import",
    params(("id" = String, Path, description = "Municipality id")),
    request_body(content = String, content_type = "text/csv"),
    responses(
        (status = 200, description = "Import report", body = ImportReport),
        (status = 400, description = "Missing columns or unreadable header", body = Error),
        (status = 403, description = "Assigned to another employee", body = Error)
    ),
    tags = ["interchange"],
    operation_id = "importBudgetCsv"
)]
#[post("/municipalities/{id}/budget/import")]
pub async fn import_csv(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    body: String,
) -> ApiResult<web::Json<ImportReport>> {
    let municipality = authorized(&state, &session, &path).await?;
    let batch = decode_csv(&body).map_err(map_csv_error)?;
    apply_batch(&state, &municipality, batch, "csv").await
}

async fn apply_batch(
    state: &HttpState,
    municipality: &Municipality,
    mut batch: ImportBatch,
    format: &'static str,
) -> ApiResult<web::Json<ImportReport>> {
    let report = state
        .interchange
        .from_rows(&municipality.id, batch.take_rows())
        .await?;
    let report = batch.finish(report);
    info!(
        municipality_id = %municipality.id,
        format,
        imported = report.imported,
        skipped = report.skipped.len(),
        "ledger import applied"
    );
    Ok(web::Json(report))
}

/// Ledger and future events as an `.xlsx` workbook.
#[utoipa::path(
    get,
    path = "/api/v1/municipalities/{id}/budget/export.xlsx",
    params(("id" = String, Path, description = "Municipality id")),
    responses(
        (status = 200, description = "Workbook with Recettes, Dépenses and Événements futurs sheets",
            content_type = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            body = Vec<u8>),
        (status = 403, description = "Assigned to another employee", body = Error),
        (status = 404, description = "Unknown municipality", body = Error)
    ),
    tags = ["interchange"],
    operation_id = "exportBudgetXlsx"
)]
#[get("/municipalities/{id}/budget/export.xlsx")]
pub async fn export_xlsx(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let municipality = authorized(&state, &session, &path).await?;
    let export = state.interchange.export_json(&municipality.id).await?;
    let body = encode_xlsx(&export).map_err(map_spreadsheet_error)?;
    Ok(HttpResponse::Ok()
        .content_type(XLSX_CONTENT_TYPE)
        .insert_header(attachment(format!("budget-{}.xlsx", municipality.code)))
        .body(body))
}

/// Apply the Recettes and Dépenses sheets of a workbook to the ledger.
#[utoipa::path(
    post,
    path = "/api/v1/municipalities/{id}/budget/import.xlsx",
    params(("id" = String, Path, description = "Municipality id")),
    request_body(
        content = Vec<u8>,
        content_type = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    ),
    responses(
        (status = 200, description = "Import report", body = ImportReport),
        (status = 400, description = "Unreadable workbook, no budget sheet or missing columns", body = Error),
        (status = 403, description = "Assigned to another employee", body = Error)
    ),
    tags = ["interchange"],
    operation_id = "importBudgetXlsx"
)]
#[post("/municipalities/{id}/budget/import.xlsx")]
pub async fn import_xlsx(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    body: web::Bytes,
) -> ApiResult<web::Json<ImportReport>> {
    let municipality = authorized(&state, &session, &path).await?;
    let batch = decode_xlsx(&body).map_err(map_spreadsheet_error)?;
    apply_batch(&state, &municipality, batch, "xlsx").await
}

/// Empty import file with two example rows.
#[utoipa::path(
    get,
    path = "/api/v1/budget/template.csv",
    responses(
        (status = 200, description = "Import template", content_type = "text/csv", body = String)
    ),
    tags = ["interchange"],
    operation_id = "budgetTemplateCsv"
)]
#[get("/budget/template.csv")]
pub async fn template(session: SessionContext) -> ApiResult<HttpResponse> {
    session.require_user()?;
    Ok(HttpResponse::Ok()
        .content_type(CSV_CONTENT_TYPE)
        .insert_header(CacheControl(vec![CacheDirective::Private, CacheDirective::MaxAge(3600)]))
        .insert_header(attachment("budget-template.csv".to_owned()))
        .body(template_csv()))
}

#[cfg(test)]
#[path = "interchange_tests.rs"]
mod tests;
