//! Budget ledger handlers. Every route requires an administrator or the
//! employee owning the municipality.
//!
//! ```text
//! GET    /api/v1/municipalities/{id}/budget
//! PUT    /api/v1/municipalities/{id}/budget/entries        {"rubric","year","voted","actual"}
//! POST   /api/v1/municipalities/{id}/budget/years          {"rubric","year"}
//! GET    /api/v1/municipalities/{id}/budget/balance?year=2024
//! POST   /api/v1/municipalities/{id}/budget/events
//! PATCH  /api/v1/municipalities/{id}/budget/events/{eventId}
//! DELETE /api/v1/municipalities/{id}/budget/events/{eventId}
//! ```

use actix_web::{HttpResponse, delete, get, patch, post, put, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::{IntoParams, ToSchema};

use crate::domain::budget::{
    Amount, BalanceReport, BudgetKind, BudgetLedger, BudgetYear, FutureEvent, FutureEventDraft,
    FutureEventPatch, Rubric, RubricView, YearEntry,
};
use crate::domain::{Error, Municipality};
use crate::inbound::http::ApiResult;
use crate::inbound::http::municipalities::authorize_municipality;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{map_amount_error, map_budget_error, parse_event_id};

/// A municipality's budget as shown on the dashboard.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LedgerView {
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    pub municipality_id: String,
    /// All twelve revenue categories, in nomenclature order.
    pub revenues: Vec<RubricView>,
    /// All eleven expense parts, in nomenclature order.
    pub expenses: Vec<RubricView>,
    pub future_events: Vec<FutureEvent>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl From<BudgetLedger> for LedgerView {
    fn from(ledger: BudgetLedger) -> Self {
        Self {
            municipality_id: ledger.municipality_id().to_string(),
            revenues: ledger.sheet(BudgetKind::Revenue),
            expenses: ledger.sheet(BudgetKind::Expense),
            future_events: ledger.future_events().to_vec(),
            last_updated: ledger.last_updated(),
        }
    }
}

/// Request body for `PUT .../budget/entries`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EntryRequest {
    #[schema(example = "R1")]
    pub rubric: String,
    #[schema(example = 2024)]
    pub year: i64,
    #[schema(example = 1_250_000.0)]
    pub voted: f64,
    #[schema(example = 1_100_000.0)]
    pub actual: f64,
}

/// Request body for `POST .../budget/years`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddYearRequest {
    #[schema(example = "D1")]
    pub rubric: String,
    #[schema(example = 2027)]
    pub year: i64,
}

/// Query string of `GET .../budget/balance`.
#[derive(Debug, Deserialize, IntoParams)]
pub struct BalanceQuery {
    /// Budget year to check.
    pub year: i64,
}

/// Request body for `POST .../budget/events`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    #[schema(example = 2027)]
    pub year: i64,
    #[schema(example = "Construction d'un marché municipal")]
    pub description: String,
    #[schema(example = -450_000.0)]
    pub estimated_impact: f64,
    #[schema(example = "D5")]
    pub rubric: String,
    /// `recette` or `depense`; must agree with the rubric when given.
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// Request body for `PATCH .../budget/events/{eventId}`.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventRequest {
    pub year: Option<i64>,
    pub description: Option<String>,
    pub estimated_impact: Option<f64>,
    pub rubric: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

fn parse_rubric(raw: &str) -> Result<Rubric, Error> {
    raw.parse().map_err(map_budget_error)
}

fn parse_kind(raw: Option<&str>) -> Result<Option<BudgetKind>, Error> {
    raw.map(str::parse::<BudgetKind>)
        .transpose()
        .map_err(map_budget_error)
}

fn parse_year(raw: i64) -> Result<BudgetYear, Error> {
    BudgetYear::new(raw).map_err(map_budget_error)
}

impl EntryRequest {
    fn into_entry(self) -> Result<(Rubric, YearEntry), Error> {
        let amount =
            |raw: f64, field: &str| Amount::new(raw).map_err(|err| map_amount_error(field, err));
        Ok((
            parse_rubric(&self.rubric)?,
            YearEntry {
                year: parse_year(self.year)?,
                voted: amount(self.voted, "voted")?,
                actual: amount(self.actual, "actual")?,
            },
        ))
    }
}

impl TryFrom<CreateEventRequest> for FutureEventDraft {
    type Error = Error;

    fn try_from(value: CreateEventRequest) -> Result<Self, Self::Error> {
        let rubric = parse_rubric(&value.rubric)?;
        let declared = parse_kind(value.kind.as_deref())?;
        FutureEventDraft::try_new(
            value.year,
            &value.description,
            value.estimated_impact,
            rubric,
            declared,
        )
        .map_err(map_budget_error)
    }
}

impl TryFrom<UpdateEventRequest> for FutureEventPatch {
    type Error = Error;

    fn try_from(value: UpdateEventRequest) -> Result<Self, Self::Error> {
        let rubric = value.rubric.as_deref().map(parse_rubric).transpose()?;
        let declared = parse_kind(value.kind.as_deref())?;
        FutureEventPatch::try_new(
            value.year,
            value.description.as_deref(),
            value.estimated_impact,
            rubric,
            declared,
        )
        .map_err(map_budget_error)
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

/// Full ledger of a municipality.
#[utoipa::path(
    get,
    path = "/api/v1/municipalities/{id}/budget",
    params(("id" = String, Path, description = "Municipality id")),
    responses(
        (status = 200, description = "Ledger", body = LedgerView),
        (status = 403, description = "Assigned to another employee", body = Error),
        (status = 404, description = "Unknown municipality", body = Error)
    ),
    tags = ["budget"],
    operation_id = "getBudget"
)]
#[get("/municipalities/{id}/budget")]
pub async fn get_budget(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<LedgerView>> {
    let municipality = authorized(&state, &session, &path).await?;
    let ledger = state.ledger.ledger(&municipality.id).await?;
    Ok(web::Json(LedgerView::from(ledger)))
}

/// Create or replace the figures of one rubric for one year.
#[utoipa::path(
    put,
    path = "/api/v1/municipalities/{id}/budget/entries",
    params(("id" = String, Path, description = "Municipality id")),
    request_body = EntryRequest,
    responses(
        (status = 200, description = "Entry stored", body = YearEntry),
        (status = 400, description = "Invalid request", body = Error),
        (status = 403, description = "Assigned to another employee", body = Error),
        (status = 409, description = "Concurrent update", body = Error)
    ),
    tags = ["budget"],
    operation_id = "upsertBudgetEntry"
)]
#[put("/municipalities/{id}/budget/entries")]
pub async fn upsert_entry(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<EntryRequest>,
) -> ApiResult<web::Json<YearEntry>> {
    let municipality = authorized(&state, &session, &path).await?;
    let (rubric, entry) = payload.into_inner().into_entry()?;
    let stored = state
        .ledger_commands
        .upsert_entry(&municipality.id, rubric, entry)
        .await?;
    Ok(web::Json(stored))
}

/// Open a new year, with zero figures, on one rubric.
#[utoipa::path(
    post,
    path = "/api/v1/municipalities/{id}/budget/years",
    params(("id" = String, Path, description = "Municipality id")),
    request_body = AddYearRequest,
    responses(
        (status = 201, description = "Year opened", body = YearEntry),
        (status = 400, description = "Invalid request", body = Error),
        (status = 409, description = "Year already present", body = Error)
    ),
    tags = ["budget"],
    operation_id = "addBudgetYear"
)]
#[post("/municipalities/{id}/budget/years")]
pub async fn add_year(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<AddYearRequest>,
) -> ApiResult<HttpResponse> {
    let municipality = authorized(&state, &session, &path).await?;
    let AddYearRequest { rubric, year } = payload.into_inner();
    let entry = state
        .ledger_commands
        .add_year(&municipality.id, parse_rubric(&rubric)?, parse_year(year)?)
        .await?;
    Ok(HttpResponse::Created().json(entry))
}

/// Check that voted revenues cover voted expenses for a year.
#[utoipa::path(
    get,
    path = "/api/v1/municipalities/{id}/budget/balance",
    params(("id" = String, Path, description = "Municipality id"), BalanceQuery),
    responses(
        (status = 200, description = "Balance report", body = BalanceReport),
        (status = 400, description = "Year out of range", body = Error)
    ),
    tags = ["budget"],
    operation_id = "checkBudgetBalance"
)]
#[get("/municipalities/{id}/budget/balance")]
pub async fn check_balance(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    query: web::Query<BalanceQuery>,
) -> ApiResult<web::Json<BalanceReport>> {
    let municipality = authorized(&state, &session, &path).await?;
    let year = parse_year(query.year)?;
    let report = state.ledger.validate_balance(&municipality.id, year).await?;
    Ok(web::Json(report))
}

/// Record a planned event.
#[utoipa::path(
    post,
    path = "/api/v1/municipalities/{id}/budget/events",
    params(("id" = String, Path, description = "Municipality id")),
    request_body = CreateEventRequest,
    responses(
        (status = 201, description = "Event recorded", body = FutureEvent),
        (status = 400, description = "Invalid request", body = Error)
    ),
    tags = ["budget"],
    operation_id = "createFutureEvent"
)]
#[post("/municipalities/{id}/budget/events")]
pub async fn create_event(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<CreateEventRequest>,
) -> ApiResult<HttpResponse> {
    let municipality = authorized(&state, &session, &path).await?;
    let draft = FutureEventDraft::try_from(payload.into_inner())?;
    let event = state
        .ledger_commands
        .add_future_event(&municipality.id, draft)
        .await?;
    info!(municipality_id = %municipality.id, event_id = %event.id, "future event recorded");
    Ok(HttpResponse::Created().json(event))
}

/// Change a planned event.
#[utoipa::path(
    patch,
    path = "/api/v1/municipalities/{id}/budget/events/{event_id}",
    params(
        ("id" = String, Path, description = "Municipality id"),
        ("event_id" = String, Path, description = "Event id")
    ),
    request_body = UpdateEventRequest,
    responses(
        (status = 200, description = "Event updated", body = FutureEvent),
        (status = 400, description = "Invalid request", body = Error),
        (status = 404, description = "Unknown event", body = Error)
    ),
    tags = ["budget"],
    operation_id = "updateFutureEvent"
)]
#[patch("/municipalities/{id}/budget/events/{event_id}")]
pub async fn update_event(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<(String, String)>,
    payload: web::Json<UpdateEventRequest>,
) -> ApiResult<web::Json<FutureEvent>> {
    let (raw_id, raw_event_id) = path.into_inner();
    let municipality = authorized(&state, &session, &raw_id).await?;
    let event_id = parse_event_id(&raw_event_id)?;
    let patch = FutureEventPatch::try_from(payload.into_inner())?;
    let event = state
        .ledger_commands
        .update_future_event(&municipality.id, &event_id, patch)
        .await?;
    Ok(web::Json(event))
}

/// Drop a planned event.
#[utoipa::path(
    delete,
    path = "/api/v1/municipalities/{id}/budget/events/{event_id}",
    params(
        ("id" = String, Path, description = "Municipality id"),
        ("event_id" = String, Path, description = "Event id")
    ),
    responses(
        (status = 204, description = "Event removed"),
        (status = 404, description = "Unknown event", body = Error)
    ),
    tags = ["budget"],
    operation_id = "deleteFutureEvent"
)]
#[delete("/municipalities/{id}/budget/events/{event_id}")]
pub async fn delete_event(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<(String, String)>,
) -> ApiResult<HttpResponse> {
    let (raw_id, raw_event_id) = path.into_inner();
    let municipality = authorized(&state, &session, &raw_id).await?;
    let event_id = parse_event_id(&raw_event_id)?;
    state
        .ledger_commands
        .delete_future_event(&municipality.id, &event_id)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
#[path = "budget_tests.rs"]
mod tests;
