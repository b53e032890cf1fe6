//! Municipality registry handlers.
//!
//! ```text
//! GET    /api/v1/municipalities          admin: all, employee: owned
//! POST   /api/v1/municipalities          admin
//! GET    /api/v1/municipalities/{id}     admin or owner
//! PATCH  /api/v1/municipalities/{id}     admin; null clears subRegion/owner
//! DELETE /api/v1/municipalities/{id}     admin; removes the ledger too
//! ```

use actix_web::{HttpResponse, delete, get, patch, post, web};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::info;
use utoipa::ToSchema;

use crate::domain::{
    Error, Municipality, MunicipalityId, MunicipalityPatch, NewMunicipality, UserId, UserSession,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    ErrorCode, field_error, map_municipality_error, parse_municipality_id,
};

/// Request body for `POST /api/v1/municipalities`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateMunicipalityRequest {
    #[schema(example = "Sfax")]
    pub name: String,
    #[schema(example = "3000")]
    pub code: String,
    #[schema(example = "Sfax")]
    pub region: String,
    pub sub_region: Option<String>,
    /// Employee assigned to the municipality.
    pub owner: Option<String>,
}

/// Request body for `PATCH /api/v1/municipalities/{id}`.
///
/// `subRegion` and `owner` distinguish an omitted field (unchanged) from an
/// explicit `null` (cleared).
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMunicipalityRequest {
    pub name: Option<String>,
    pub code: Option<String>,
    pub region: Option<String>,
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>)]
    pub sub_region: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>)]
    pub owner: Option<Option<String>>,
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn parse_owner(raw: Option<String>) -> Result<Option<UserId>, Error> {
    raw.map(|value| {
        UserId::new(&value)
            .map_err(|err| field_error("owner", ErrorCode::InvalidUuid, err.to_string()))
    })
    .transpose()
}

impl TryFrom<CreateMunicipalityRequest> for NewMunicipality {
    type Error = Error;

    fn try_from(value: CreateMunicipalityRequest) -> Result<Self, Self::Error> {
        let owner = parse_owner(value.owner)?;
        NewMunicipality::try_new(
            &value.name,
            &value.code,
            &value.region,
            value.sub_region,
            owner,
        )
        .map_err(map_municipality_error)
    }
}

impl TryFrom<UpdateMunicipalityRequest> for MunicipalityPatch {
    type Error = Error;

    fn try_from(value: UpdateMunicipalityRequest) -> Result<Self, Self::Error> {
        let owner = value.owner.map(parse_owner).transpose()?;
        MunicipalityPatch::try_new(
            value.name.as_deref(),
            value.code.as_deref(),
            value.region.as_deref(),
            value.sub_region,
            owner,
        )
        .map_err(map_municipality_error)
    }
}

/// Resolve a municipality the caller may work on.
///
/// Administrators reach every municipality; employees only those they own.
pub(crate) async fn authorize_municipality(
    state: &HttpState,
    user: &UserSession,
    raw_id: &str,
) -> Result<Municipality, Error> {
    let id = parse_municipality_id(raw_id)?;
    let municipality = state
        .municipalities
        .find(&id)
        .await?
        .ok_or_else(|| Error::not_found(format!("municipality {id} not found")))?;
    if user.is_admin() || municipality.owner.as_ref() == Some(&user.id) {
        Ok(municipality)
    } else {
        Err(Error::forbidden("municipality is assigned to another employee"))
    }
}

/// List the municipalities visible to the caller.
#[utoipa::path(
    get,
    path = "/api/v1/municipalities",
    responses(
        (status = 200, description = "Municipalities", body = [Municipality]),
        (status = 401, description = "Not logged in", body = Error)
    ),
    tags = ["municipalities"],
    operation_id = "listMunicipalities"
)]
#[get("/municipalities")]
pub async fn list_municipalities(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<Municipality>>> {
    let user = session.require_user()?;
    let municipalities = if user.is_admin() {
        state.municipalities.list_all().await?
    } else {
        state.municipalities.list_by_owner(&user.id).await?
    };
    Ok(web::Json(municipalities))
}

/// Register a municipality.
#[utoipa::path(
    post,
    path = "/api/v1/municipalities",
    request_body = CreateMunicipalityRequest,
    responses(
        (status = 201, description = "Municipality registered", body = Municipality),
        (status = 400, description = "Invalid request", body = Error),
        (status = 403, description = "Administrators only", body = Error),
        (status = 409, description = "Code already used", body = Error)
    ),
    tags = ["municipalities"],
    operation_id = "createMunicipality"
)]
#[post("/municipalities")]
pub async fn create_municipality(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CreateMunicipalityRequest>,
) -> ApiResult<HttpResponse> {
    let admin = session.require_admin()?;
    let input = NewMunicipality::try_from(payload.into_inner())?;
    let created = state.municipalities.create(input).await?;
    info!(admin = %admin.id, municipality_id = %created.id, "municipality registered");
    Ok(HttpResponse::Created().json(created))
}

/// Fetch one municipality.
#[utoipa::path(
    get,
    path = "/api/v1/municipalities/{id}",
    params(("id" = String, Path, description = "Municipality id")),
    responses(
        (status = 200, description = "Municipality", body = Municipality),
        (status = 403, description = "Assigned to another employee", body = Error),
        (status = 404, description = "Unknown municipality", body = Error)
    ),
    tags = ["municipalities"],
    operation_id = "getMunicipality"
)]
#[get("/municipalities/{id}")]
pub async fn get_municipality(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<Municipality>> {
    let user = session.require_user()?;
    authorize_municipality(&state, &user, &path)
        .await
        .map(web::Json)
}

/// Change a municipality.
#[utoipa::path(
    patch,
    path = "/api/v1/municipalities/{id}",
    params(("id" = String, Path, description = "Municipality id")),
    request_body = UpdateMunicipalityRequest,
    responses(
        (status = 200, description = "Municipality updated", body = Municipality),
        (status = 400, description = "Invalid request", body = Error),
        (status = 404, description = "Unknown municipality", body = Error),
        (status = 409, description = "Code already used", body = Error)
    ),
    tags = ["municipalities"],
    operation_id = "updateMunicipality"
)]
#[patch("/municipalities/{id}")]
pub async fn update_municipality(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<UpdateMunicipalityRequest>,
) -> ApiResult<web::Json<Municipality>> {
    session.require_admin()?;
    let id: MunicipalityId = parse_municipality_id(&path)?;
    let patch = MunicipalityPatch::try_from(payload.into_inner())?;
    let updated = state.municipalities.update(&id, patch).await?;
    Ok(web::Json(updated))
}

/// Remove a municipality and its budget.
#[utoipa::path(
    delete,
    path = "/api/v1/municipalities/{id}",
    params(("id" = String, Path, description = "Municipality id")),
    responses(
        (status = 204, description = "Municipality removed"),
        (status = 404, description = "Unknown municipality", body = Error)
    ),
    tags = ["municipalities"],
    operation_id = "deleteMunicipality"
)]
#[delete("/municipalities/{id}")]
pub async fn delete_municipality(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let admin = session.require_admin()?;
    let id = parse_municipality_id(&path)?;
    state.municipalities.delete(&id).await?;
    info!(admin = %admin.id, municipality_id = %id, "municipality removed");
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
#[path = "municipalities_tests.rs"]
mod tests;
