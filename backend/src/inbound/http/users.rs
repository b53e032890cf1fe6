//! User administration handlers. Every route requires an administrator.
//!
//! ```text
//! GET    /api/v1/users
//! POST   /api/v1/users                    {"email","password","role","displayName"}
//! GET    /api/v1/users/{id}
//! PATCH  /api/v1/users/{id}               any subset of the create fields, plus "active"
//! DELETE /api/v1/users/{id}
//! POST   /api/v1/users/{id}/toggle-active
//! ```

use actix_web::{HttpResponse, delete, get, patch, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use crate::domain::{
    DisplayName, EmailAddress, Error, NewUser, Password, Role, UserAccount, UserPatch,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{map_password_error, map_user_error, parse_user_id};

/// Account as exposed to administrators. The password hash never leaves
/// the server.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    pub id: String,
    #[schema(example = "receveur.tunis@municipalite.tn")]
    pub email: String,
    pub role: Role,
    #[schema(example = "Receveur Tunis")]
    pub display_name: String,
    pub created_at: DateTime<Utc>,
    pub active: bool,
}

impl From<UserAccount> for UserView {
    fn from(account: UserAccount) -> Self {
        Self {
            id: account.id.to_string(),
            email: account.email.to_string(),
            role: account.role,
            display_name: account.display_name.to_string(),
            created_at: account.created_at,
            active: account.active,
        }
    }
}

/// Request body for `POST /api/v1/users`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    /// `admin` or `employee`; `user` is accepted as `employee`.
    #[schema(example = "employee")]
    pub role: String,
    pub display_name: String,
}

impl TryFrom<CreateUserRequest> for NewUser {
    type Error = Error;

    fn try_from(value: CreateUserRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            email: EmailAddress::new(value.email).map_err(map_user_error)?,
            password: Password::new(value.password).map_err(map_password_error)?,
            role: Role::parse(&value.role).map_err(map_user_error)?,
            display_name: DisplayName::new(value.display_name).map_err(map_user_error)?,
        })
    }
}

/// Request body for `PATCH /api/v1/users/{id}`.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
    pub display_name: Option<String>,
    pub active: Option<bool>,
}

impl TryFrom<UpdateUserRequest> for UserPatch {
    type Error = Error;

    fn try_from(value: UpdateUserRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            email: value
                .email
                .map(EmailAddress::new)
                .transpose()
                .map_err(map_user_error)?,
            password: value
                .password
                .map(Password::new)
                .transpose()
                .map_err(map_password_error)?,
            role: value
                .role
                .as_deref()
                .map(Role::parse)
                .transpose()
                .map_err(map_user_error)?,
            display_name: value
                .display_name
                .map(DisplayName::new)
                .transpose()
                .map_err(map_user_error)?,
            active: value.active,
        })
    }
}

/// List every account.
#[utoipa::path(
    get,
    path = "/api/v1/users",
    responses(
        (status = 200, description = "Accounts", body = [UserView]),
        (status = 401, description = "Not logged in", body = Error),
        (status = 403, description = "Administrators only", body = Error)
    ),
    tags = ["users"],
    operation_id = "listUsers"
)]
#[get("/users")]
pub async fn list_users(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<UserView>>> {
    session.require_admin()?;
    let users = state.users.list().await?;
    Ok(web::Json(users.into_iter().map(UserView::from).collect()))
}

/// Create an account.
#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "Account created", body = UserView),
        (status = 400, description = "Invalid request", body = Error),
        (status = 403, description = "Administrators only", body = Error),
        (status = 409, description = "Email already registered", body = Error)
    ),
    tags = ["users"],
    operation_id = "createUser"
)]
#[post("/users")]
pub async fn create_user(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CreateUserRequest>,
) -> ApiResult<HttpResponse> {
    let admin = session.require_admin()?;
    let new_user = NewUser::try_from(payload.into_inner())?;
    let created = state.users.create(new_user).await?;
    info!(admin = %admin.id, user_id = %created.id, "account created");
    Ok(HttpResponse::Created().json(UserView::from(created)))
}

/// Fetch one account.
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    params(("id" = String, Path, description = "Account id")),
    responses(
        (status = 200, description = "Account", body = UserView),
        (status = 404, description = "Unknown account", body = Error)
    ),
    tags = ["users"],
    operation_id = "getUser"
)]
#[get("/users/{id}")]
pub async fn get_user(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<UserView>> {
    session.require_admin()?;
    let id = parse_user_id(&path)?;
    state
        .users
        .find(&id)
        .await?
        .map(|account| web::Json(UserView::from(account)))
        .ok_or_else(|| Error::not_found(format!("user {id} not found")))
}

/// Change an account.
#[utoipa::path(
    patch,
    path = "/api/v1/users/{id}",
    params(("id" = String, Path, description = "Account id")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Account updated", body = UserView),
        (status = 400, description = "Invalid request", body = Error),
        (status = 404, description = "Unknown account", body = Error),
        (status = 409, description = "Email taken or last active administrator", body = Error)
    ),
    tags = ["users"],
    operation_id = "updateUser"
)]
#[patch("/users/{id}")]
pub async fn update_user(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<UpdateUserRequest>,
) -> ApiResult<web::Json<UserView>> {
    session.require_admin()?;
    let id = parse_user_id(&path)?;
    let patch = UserPatch::try_from(payload.into_inner())?;
    let updated = state.users.update(&id, patch).await?;
    Ok(web::Json(UserView::from(updated)))
}

/// Remove an account.
#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    params(("id" = String, Path, description = "Account id")),
    responses(
        (status = 204, description = "Account removed"),
        (status = 404, description = "Unknown account", body = Error),
        (status = 409, description = "Last active administrator", body = Error)
    ),
    tags = ["users"],
    operation_id = "deleteUser"
)]
#[delete("/users/{id}")]
pub async fn delete_user(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let admin = session.require_admin()?;
    let id = parse_user_id(&path)?;
    state.users.delete(&id).await?;
    info!(admin = %admin.id, user_id = %id, "account removed");
    Ok(HttpResponse::NoContent().finish())
}

/// Flip the active flag of an account.
#[utoipa::path(
    post,
    path = "/api/v1/users/{id}/toggle-active",
    params(("id" = String, Path, description = "Account id")),
    responses(
        (status = 200, description = "Account updated", body = UserView),
        (status = 404, description = "Unknown account", body = Error),
        (status = 409, description = "Last active administrator", body = Error)
    ),
    tags = ["users"],
    operation_id = "toggleUserActive"
)]
#[post("/users/{id}/toggle-active")]
pub async fn toggle_user_active(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<UserView>> {
    session.require_admin()?;
    let id = parse_user_id(&path)?;
    let updated = state.users.toggle_active(&id).await?;
    Ok(web::Json(UserView::from(updated)))
}

#[cfg(test)]
mod tests;
