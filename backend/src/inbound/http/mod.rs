//! HTTP inbound adapter exposing the portal's REST endpoints.

pub mod budget;
pub mod error;
pub mod health;
pub mod interchange;
pub mod login;
pub mod municipalities;
pub mod session;
pub mod session_config;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod users;
pub mod validation;

pub use error::ApiResult;

use actix_web::web;

/// Register every `/api/v1` handler on the given scope.
///
/// The caller owns the scope and its session middleware so the server and
/// the handler tests share one route table.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(login::login)
        .service(login::verify_login)
        .service(login::code_status)
        .service(login::logout)
        .service(login::current_session)
        .service(users::list_users)
        .service(users::create_user)
        .service(users::get_user)
        .service(users::update_user)
        .service(users::delete_user)
        .service(users::toggle_user_active)
        .service(municipalities::list_municipalities)
        .service(municipalities::create_municipality)
        .service(municipalities::get_municipality)
        .service(municipalities::update_municipality)
        .service(municipalities::delete_municipality)
        .service(budget::get_budget)
        .service(budget::upsert_entry)
        .service(budget::add_year)
        .service(budget::check_balance)
        .service(budget::create_event)
        .service(budget::update_event)
        .service(budget::delete_event)
        .service(interchange::export_csv)
        .service(interchange::export_json)
        .service(interchange::export_xlsx)
        .service(interchange::import_csv)
        .service(interchange::import_xlsx)
        .service(interchange::template);
}
