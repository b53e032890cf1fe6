//! Tests for the user administration handlers.

use actix_web::cookie::Cookie;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::test;
use rstest::rstest;
use serde_json::{Value, json};

use crate::inbound::http::test_utils::{login_as, portal_app};
use crate::test_support::{
    ADMIN_EMAIL, ADMIN_PASSWORD, EMPLOYEE_EMAIL, EMPLOYEE_PASSWORD, PortalHarness,
};

async fn call<S>(app: &S, req: test::TestRequest, cookie: &Cookie<'static>) -> ServiceResponse
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    test::call_service(app, req.cookie(cookie.clone()).to_request()).await
}

#[rstest]
#[actix_web::test]
async fn listing_hides_password_hashes() {
    let harness = PortalHarness::start().await;
    let app = test::init_service(portal_app(&harness)).await;
    let admin = login_as(&app, &harness, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let res = call(&app, test::TestRequest::get().uri("/api/v1/users"), &admin).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = test::read_body_json(res).await;
    let users = body.as_array().expect("array");
    assert_eq!(users.len(), 2);
    assert!(users.iter().all(|user| user.get("passwordHash").is_none()));
}

#[rstest]
#[actix_web::test]
async fn employees_cannot_manage_users() {
    let harness = PortalHarness::start().await;
    let app = test::init_service(portal_app(&harness)).await;
    let employee = login_as(&app, &harness, EMPLOYEE_EMAIL, EMPLOYEE_PASSWORD).await;

    let res = call(&app, test::TestRequest::get().uri("/api/v1/users"), &employee).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[rstest]
#[actix_web::test]
async fn anonymous_requests_need_login() {
    let harness = PortalHarness::start().await;
    let app = test::init_service(portal_app(&harness)).await;

    let res = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/v1/users").to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[rstest]
#[actix_web::test]
async fn created_user_can_log_in() {
    let harness = PortalHarness::start().await;
    let app = test::init_service(portal_app(&harness)).await;
    let admin = login_as(&app, &harness, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let res = call(
        &app,
        test::TestRequest::post().uri("/api/v1/users").set_json(json!({
            "email": "Sfax@Mairie.tn",
            "password": "sfax-password",
            "role": "user",
            "displayName": "Receveur Sfax"
        })),
        &admin,
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["role"], "employee");
    assert_eq!(body["active"], true);

    login_as(&app, &harness, "sfax@mairie.tn", "sfax-password").await;
}

#[rstest]
#[case(json!({"email": "x@mairie.tn", "password": "short", "role": "employee", "displayName": "X"}), "password")]
#[case(json!({"email": "no-at-sign", "password": "long-enough", "role": "employee", "displayName": "X"}), "email")]
#[case(json!({"email": "x@mairie.tn", "password": "long-enough", "role": "mayor", "displayName": "X"}), "role")]
#[actix_web::test]
async fn invalid_payloads_name_the_field(#[case] payload: Value, #[case] field: &str) {
    let harness = PortalHarness::start().await;
    let app = test::init_service(portal_app(&harness)).await;
    let admin = login_as(&app, &harness, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let res = call(
        &app,
        test::TestRequest::post().uri("/api/v1/users").set_json(payload),
        &admin,
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["details"]["field"], field);
}

#[rstest]
#[actix_web::test]
async fn duplicate_email_conflicts() {
    let harness = PortalHarness::start().await;
    let app = test::init_service(portal_app(&harness)).await;
    let admin = login_as(&app, &harness, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let res = call(
        &app,
        test::TestRequest::post().uri("/api/v1/users").set_json(json!({
            "email": EMPLOYEE_EMAIL.to_uppercase(),
            "password": "another-password",
            "role": "employee",
            "displayName": "Copy"
        })),
        &admin,
    )
    .await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[rstest]
#[actix_web::test]
async fn last_admin_cannot_be_deactivated() {
    let harness = PortalHarness::start().await;
    let app = test::init_service(portal_app(&harness)).await;
    let admin = login_as(&app, &harness, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let uri = format!("/api/v1/users/{}/toggle-active", harness.admin.id);
    let res = call(&app, test::TestRequest::post().uri(&uri), &admin).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[rstest]
#[actix_web::test]
async fn toggle_and_patch_update_the_account() {
    let harness = PortalHarness::start().await;
    let app = test::init_service(portal_app(&harness)).await;
    let admin = login_as(&app, &harness, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let uri = format!("/api/v1/users/{}", harness.employee.id);

    let res = call(
        &app,
        test::TestRequest::post().uri(&format!("{uri}/toggle-active")),
        &admin,
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["active"], false);

    let res = call(
        &app,
        test::TestRequest::patch()
            .uri(&uri)
            .set_json(json!({ "displayName": "Receveur principal" })),
        &admin,
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["displayName"], "Receveur principal");
    assert_eq!(body["active"], false);
}

#[rstest]
#[actix_web::test]
async fn deleted_user_is_gone() {
    let harness = PortalHarness::start().await;
    let app = test::init_service(portal_app(&harness)).await;
    let admin = login_as(&app, &harness, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let uri = format!("/api/v1/users/{}", harness.employee.id);

    let res = call(&app, test::TestRequest::delete().uri(&uri), &admin).await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    let res = call(&app, test::TestRequest::get().uri(&uri), &admin).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[rstest]
#[actix_web::test]
async fn malformed_id_is_bad_request() {
    let harness = PortalHarness::start().await;
    let app = test::init_service(portal_app(&harness)).await;
    let admin = login_as(&app, &harness, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let res = call(
        &app,
        test::TestRequest::get().uri("/api/v1/users/not-a-uuid"),
        &admin,
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}
