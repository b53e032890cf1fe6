//! Two-step login handlers.
//!
//! ```text
//! POST /api/v1/login          {"email":"admin@mairie.tn","password":"..."}
//! POST /api/v1/login/verify   {"code":"042917"}
//! GET  /api/v1/login/code
//! POST /api/v1/logout
//! GET  /api/v1/session
//! ```
//!
//! The password step records a pending login in the cookie and triggers a
//! verification code; only the code step establishes the session.

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::domain::{
    DeliveryStatus, Error, LoginCredentials, LoginValidationError, UserSession,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::{PendingLogin, SessionContext};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::map_login_error;

/// Login request body for `POST /api/v1/login`.
#[derive(Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[schema(example = "admin@mairie.tn")]
    pub email: String,
    pub password: String,
}

/// Response to an accepted password step.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginChallenge {
    /// Seconds until the verification code expires.
    #[schema(example = 600)]
    pub expires_in_seconds: u64,
    pub delivery: DeliveryStatus,
}

/// Verification request body for `POST /api/v1/login/verify`.
#[derive(Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    #[schema(example = "042917")]
    pub code: String,
}

/// Remaining validity of the pending code.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CodeStatus {
    #[schema(example = 475)]
    pub remaining_seconds: u64,
}

/// Check credentials and send a verification code.
#[utoipa::path(
    post,
    path = "/api/v1/login",
    request_body = LoginRequest,
    responses(
        (status = 202, description = "Code issued", body = LoginChallenge),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Invalid credentials", body = Error),
        (status = 503, description = "Storage unavailable", body = Error)
    ),
    tags = ["auth"],
    operation_id = "login",
    security([])
)]
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<LoginRequest>,
) -> ApiResult<HttpResponse> {
    let LoginRequest { email, password } = payload.into_inner();
    let credentials =
        LoginCredentials::try_from_parts(&email, &password).map_err(map_login_error)?;
    let Some(account) = state.users.authenticate(&credentials).await? else {
        return Err(Error::unauthorized("invalid credentials"));
    };
    let issued = state.codes.issue(&account.email).await?;
    session.begin_login(&PendingLogin {
        user_id: account.id.clone(),
        email: account.email.to_string(),
        started_at: state.clock.utc(),
    })?;
    info!(user_id = %account.id, "password accepted; awaiting verification code");
    Ok(HttpResponse::Accepted().json(LoginChallenge {
        expires_in_seconds: issued.expires_in_seconds,
        delivery: issued.delivery,
    }))
}

/// Check the verification code and open the session.
#[utoipa::path(
    post,
    path = "/api/v1/login/verify",
    request_body = VerifyRequest,
    responses(
        (status = 200, description = "Session opened", body = UserSession,
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "No login pending", body = Error),
        (status = 401, description = "Code rejected", body = Error)
    ),
    tags = ["auth"],
    operation_id = "verifyLogin",
    security([])
)]
#[post("/login/verify")]
pub async fn verify_login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<VerifyRequest>,
) -> ApiResult<web::Json<UserSession>> {
    let pending = session.require_pending_login()?;
    let candidate = payload.into_inner().code;
    let candidate = candidate.trim();
    if candidate.is_empty() {
        return Err(map_login_error(LoginValidationError::EmptyCode));
    }

    let outcome = state.codes.verify(&pending.email, candidate).await?;
    if !outcome.is_verified() {
        warn!(user_id = %pending.user_id, ?outcome, "verification code rejected");
        return Err(Error::unauthorized(outcome.message()));
    }

    let account = state
        .users
        .find(&pending.user_id)
        .await?
        .filter(|account| account.active)
        .ok_or_else(|| {
            session.purge();
            Error::unauthorized("account is no longer active")
        })?;
    let user = UserSession::for_account(&account, state.clock.utc());
    session.complete_login(&user)?;
    info!(user_id = %user.id, role = %user.role, "session opened");
    Ok(web::Json(user))
}

/// Seconds left on the pending verification code.
#[utoipa::path(
    get,
    path = "/api/v1/login/code",
    responses(
        (status = 200, description = "Remaining validity", body = CodeStatus),
        (status = 400, description = "No login pending", body = Error)
    ),
    tags = ["auth"],
    operation_id = "pendingCodeStatus",
    security([])
)]
#[get("/login/code")]
pub async fn code_status(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<CodeStatus>> {
    let pending = session.require_pending_login()?;
    let remaining_seconds = state.codes.remaining_seconds(&pending.email).await?;
    Ok(web::Json(CodeStatus { remaining_seconds }))
}

/// Close the session.
#[utoipa::path(
    post,
    path = "/api/v1/logout",
    responses((status = 204, description = "Session closed")),
    tags = ["auth"],
    operation_id = "logout"
)]
#[post("/logout")]
pub async fn logout(session: SessionContext) -> HttpResponse {
    session.purge();
    HttpResponse::NoContent().finish()
}

/// The authenticated session.
#[utoipa::path(
    get,
    path = "/api/v1/session",
    responses(
        (status = 200, description = "Current session", body = UserSession),
        (status = 401, description = "Not logged in", body = Error)
    ),
    tags = ["auth"],
    operation_id = "currentSession"
)]
#[get("/session")]
pub async fn current_session(session: SessionContext) -> ApiResult<web::Json<UserSession>> {
    session.require_user().map(web::Json)
}

#[cfg(test)]
#[path = "login_tests.rs"]
mod tests;
