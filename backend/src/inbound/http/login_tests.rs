//! Tests for the two-step login handlers.

use actix_web::http::StatusCode;
use actix_web::test;
use rstest::rstest;
use serde_json::{Value, json};

use crate::inbound::http::test_utils::{login_as, portal_app, session_cookie};
use crate::test_support::{
    ADMIN_EMAIL, ADMIN_PASSWORD, EMPLOYEE_EMAIL, EMPLOYEE_PASSWORD, PortalHarness,
};

fn login_request(email: &str, password: &str) -> actix_http::Request {
    test::TestRequest::post()
        .uri("/api/v1/login")
        .set_json(json!({ "email": email, "password": password }))
        .to_request()
}

#[rstest]
#[actix_web::test]
async fn password_step_issues_code_without_opening_session() {
    let harness = PortalHarness::start().await;
    let app = test::init_service(portal_app(&harness)).await;

    let res = test::call_service(&app, login_request(EMPLOYEE_EMAIL, EMPLOYEE_PASSWORD)).await;
    assert_eq!(res.status(), StatusCode::ACCEPTED);
    let cookie = session_cookie(&res).expect("pending cookie");
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["expiresInSeconds"], 600);
    assert_eq!(body["delivery"]["status"], "delivered");
    assert!(body.get("code").is_none());
    assert_eq!(harness.notifier.sent(), 1);

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/session")
            .cookie(cookie)
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[rstest]
#[case(EMPLOYEE_EMAIL, "wrong-password")]
#[case("nobody@mairie.tn", EMPLOYEE_PASSWORD)]
#[actix_web::test]
async fn bad_credentials_are_rejected(#[case] email: &str, #[case] password: &str) {
    let harness = PortalHarness::start().await;
    let app = test::init_service(portal_app(&harness)).await;

    let res = test::call_service(&app, login_request(email, password)).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["message"], "invalid credentials");
    assert_eq!(harness.notifier.sent(), 0);
}

#[rstest]
#[actix_web::test]
async fn blank_email_names_the_field() {
    let harness = PortalHarness::start().await;
    let app = test::init_service(portal_app(&harness)).await;

    let res = test::call_service(&app, login_request("  ", EMPLOYEE_PASSWORD)).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["details"]["field"], "email");
}

#[rstest]
#[actix_web::test]
async fn full_login_opens_session() {
    let harness = PortalHarness::start().await;
    let app = test::init_service(portal_app(&harness)).await;

    let cookie = login_as(&app, &harness, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/session")
            .cookie(cookie)
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["email"], ADMIN_EMAIL);
    assert_eq!(body["role"], "admin");
    assert_eq!(body["name"], "Admin");
}

#[rstest]
#[actix_web::test]
async fn verify_without_pending_login_is_bad_request() {
    let harness = PortalHarness::start().await;
    let app = test::init_service(portal_app(&harness)).await;

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/login/verify")
            .set_json(json!({ "code": "123456" }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[rstest]
#[actix_web::test]
async fn wrong_code_reports_remaining_attempts() {
    let harness = PortalHarness::start().await;
    let app = test::init_service(portal_app(&harness)).await;

    let res = test::call_service(&app, login_request(EMPLOYEE_EMAIL, EMPLOYEE_PASSWORD)).await;
    let cookie = session_cookie(&res).expect("pending cookie");
    let code = harness
        .notifier
        .last_code_for(EMPLOYEE_EMAIL)
        .expect("code sent");
    let wrong = if code == "000000" { "111111" } else { "000000" };

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/login/verify")
            .cookie(cookie)
            .set_json(json!({ "code": wrong }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["message"], "Code incorrect. 2 tentative(s) restante(s).");
}

#[rstest]
#[actix_web::test]
async fn expired_code_is_rejected() {
    let harness = PortalHarness::start().await;
    let app = test::init_service(portal_app(&harness)).await;

    let res = test::call_service(&app, login_request(EMPLOYEE_EMAIL, EMPLOYEE_PASSWORD)).await;
    let cookie = session_cookie(&res).expect("pending cookie");
    let code = harness
        .notifier
        .last_code_for(EMPLOYEE_EMAIL)
        .expect("code sent");
    harness.clock.advance_seconds(601);

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/login/verify")
            .cookie(cookie)
            .set_json(json!({ "code": code }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(
        body["message"],
        "Le code a expiré. Veuillez demander un nouveau code."
    );
}

#[rstest]
#[actix_web::test]
async fn code_status_counts_down() {
    let harness = PortalHarness::start().await;
    let app = test::init_service(portal_app(&harness)).await;

    let res = test::call_service(&app, login_request(EMPLOYEE_EMAIL, EMPLOYEE_PASSWORD)).await;
    let cookie = session_cookie(&res).expect("pending cookie");
    harness.clock.advance_seconds(125);

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/login/code")
            .cookie(cookie)
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["remainingSeconds"], 475);
}

#[rstest]
#[actix_web::test]
async fn deactivated_account_cannot_finish_login() {
    let harness = PortalHarness::start().await;
    let app = test::init_service(portal_app(&harness)).await;

    let res = test::call_service(&app, login_request(EMPLOYEE_EMAIL, EMPLOYEE_PASSWORD)).await;
    let cookie = session_cookie(&res).expect("pending cookie");
    let code = harness
        .notifier
        .last_code_for(EMPLOYEE_EMAIL)
        .expect("code sent");
    harness
        .state
        .users
        .toggle_active(&harness.employee.id)
        .await
        .expect("deactivate employee");

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/login/verify")
            .cookie(cookie)
            .set_json(json!({ "code": code }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[rstest]
#[actix_web::test]
async fn logout_clears_session() {
    let harness = PortalHarness::start().await;
    let app = test::init_service(portal_app(&harness)).await;
    let cookie = login_as(&app, &harness, EMPLOYEE_EMAIL, EMPLOYEE_PASSWORD).await;

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/logout")
            .cookie(cookie)
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    let cleared = session_cookie(&res).expect("removal cookie");

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/session")
            .cookie(cleared)
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}
