//! OpenAPI document for the portal.
//!
//! Swagger UI serves it in debug builds and `openapi-dump` prints it for
//! client generation.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::budget::{BalanceReport, BudgetKind, FutureEvent, RubricView, YearEntry};
use crate::domain::interchange::{ImportReport, LedgerExport, LedgerRow, SkippedRow};
use crate::domain::{DeliveryStatus, Error, ErrorCode, Municipality, Role, UserSession};
use crate::inbound::http::budget::{
    AddYearRequest, CreateEventRequest, EntryRequest, LedgerView, UpdateEventRequest,
};
use crate::inbound::http::login::{CodeStatus, LoginChallenge, LoginRequest, VerifyRequest};
use crate::inbound::http::municipalities::{
    CreateMunicipalityRequest, UpdateMunicipalityRequest,
};
use crate::inbound::http::users::{CreateUserRequest, UpdateUserRequest, UserView};

/// Register the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);
        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Encrypted session cookie set by POST /api/v1/login/verify.",
            ))),
        );
    }
}

/// OpenAPI document for the portal REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Municipal budget portal API",
        description = "Two-step login, user and municipality administration, \
            budget ledgers with balance checks, and CSV/JSON interchange."
    ),
    servers((url = "/", description = "Relative to the deployment base URL")),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::login::login,
        crate::inbound::http::login::verify_login,
        crate::inbound::http::login::code_status,
        crate::inbound::http::login::logout,
        crate::inbound::http::login::current_session,
        crate::inbound::http::users::list_users,
        crate::inbound::http::users::create_user,
        crate::inbound::http::users::get_user,
        crate::inbound::http::users::update_user,
        crate::inbound::http::users::delete_user,
        crate::inbound::http::users::toggle_user_active,
        crate::inbound::http::municipalities::list_municipalities,
        crate::inbound::http::municipalities::create_municipality,
        crate::inbound::http::municipalities::get_municipality,
        crate::inbound::http::municipalities::update_municipality,
        crate::inbound::http::municipalities::delete_municipality,
        crate::inbound::http::budget::get_budget,
        crate::inbound::http::budget::upsert_entry,
        crate::inbound::http::budget::add_year,
        crate::inbound::http::budget::check_balance,
        crate::inbound::http::budget::create_event,
        crate::inbound::http::budget::update_event,
        crate::inbound::http::budget::delete_event,
        crate::inbound::http::interchange::export_csv,
        crate::inbound::http::interchange::export_json,
        crate::inbound::http::interchange::export_xlsx,
        crate::inbound::http::interchange::import_csv,
        crate::inbound::http::interchange::import_xlsx,
        crate::inbound::http::interchange::template,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        Role,
        UserSession,
        UserView,
        CreateUserRequest,
        UpdateUserRequest,
        LoginRequest,
        LoginChallenge,
        VerifyRequest,
        CodeStatus,
        DeliveryStatus,
        Municipality,
        CreateMunicipalityRequest,
        UpdateMunicipalityRequest,
        LedgerView,
        RubricView,
        YearEntry,
        EntryRequest,
        AddYearRequest,
        BalanceReport,
        BudgetKind,
        FutureEvent,
        CreateEventRequest,
        UpdateEventRequest,
        LedgerRow,
        SkippedRow,
        ImportReport,
        LedgerExport,
    )),
    tags(
        (name = "auth", description = "Password and one-time code login"),
        (name = "users", description = "Account administration"),
        (name = "municipalities", description = "Municipality registry"),
        (name = "budget", description = "Budget ledgers, balance and future events"),
        (name = "interchange", description = "CSV, workbook and JSON import/export"),
        (name = "health", description = "Orchestration probes")
    )
)]
pub struct ApiDoc;
