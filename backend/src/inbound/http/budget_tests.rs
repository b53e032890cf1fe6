//! Tests for the budget ledger handlers.

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

async fn put_entry<S>(
    app: &S,
    cookie: &Cookie<'static>,
    base: &str,
    rubric: &str,
    voted: f64,
) -> ServiceResponse
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    call(
        app,
        test::TestRequest::put()
            .uri(&format!("{base}/entries"))
            .set_json(json!({ "rubric": rubric, "year": 2024, "voted": voted, "actual": 0.0 })),
        cookie,
    )
    .await
}

#[rstest]
#[actix_web::test]
async fn blank_ledger_lists_the_whole_nomenclature() {
    let harness = PortalHarness::start().await;
    let municipality = harness
        .register_municipality("Sfax", "3000", Some(&harness.employee.id))
        .await;
    let app = test::init_service(portal_app(&harness)).await;
    let employee = login_as(&app, &harness, EMPLOYEE_EMAIL, EMPLOYEE_PASSWORD).await;

    let uri = format!("/api/v1/municipalities/{}/budget", municipality.id);
    let res = call(&app, test::TestRequest::get().uri(&uri), &employee).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["municipalityId"], municipality.id.to_string());
    assert_eq!(body["revenues"].as_array().map(Vec::len), Some(12));
    assert_eq!(body["expenses"].as_array().map(Vec::len), Some(11));
    assert_eq!(body["revenues"][0]["code"], "R1");
    assert_eq!(body["expenses"][10]["code"], "D11");
    assert!(body["lastUpdated"].is_null());
}

#[rstest]
#[actix_web::test]
async fn balance_follows_voted_totals() {
    let harness = PortalHarness::start().await;
    let municipality = harness
        .register_municipality("Sousse", "4000", Some(&harness.employee.id))
        .await;
    let app = test::init_service(portal_app(&harness)).await;
    let employee = login_as(&app, &harness, EMPLOYEE_EMAIL, EMPLOYEE_PASSWORD).await;
    let base = format!("/api/v1/municipalities/{}/budget", municipality.id);

    let res = put_entry(&app, &employee, &base, "R1", 1_000.0).await;
    assert_eq!(res.status(), StatusCode::OK);
    let res = put_entry(&app, &employee, &base, "D1", 1_000.0).await;
    assert_eq!(res.status(), StatusCode::OK);

    let balance_uri = format!("{base}/balance?year=2024");
    let res = call(&app, test::TestRequest::get().uri(&balance_uri), &employee).await;
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["balanced"], true);
    assert_eq!(body["message"], "Équilibre respecté");

    put_entry(&app, &employee, &base, "D1", 1_500.0).await;
    let res = call(&app, test::TestRequest::get().uri(&balance_uri), &employee).await;
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["balanced"], false);
    assert_eq!(body["totalExpense"], 1_500.0);
    assert_eq!(
        body["message"],
        "Équilibre non respecté pour 2024: Recettes = 1000.00 DT, Dépenses = 1500.00 DT"
    );
}

#[rstest]
#[case(json!({ "rubric": "R1", "year": 2024, "voted": -5.0, "actual": 0.0 }), "voted")]
#[case(json!({ "rubric": "R13", "year": 2024, "voted": 5.0, "actual": 0.0 }), "rubric")]
#[case(json!({ "rubric": "R1", "year": 2017, "voted": 5.0, "actual": 0.0 }), "year")]
#[actix_web::test]
async fn invalid_entries_name_the_field(#[case] payload: Value, #[case] field: &str) {
    let harness = PortalHarness::start().await;
    let municipality = harness.register_municipality("Gabès", "6000", None).await;
    let app = test::init_service(portal_app(&harness)).await;
    let admin = login_as(&app, &harness, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let uri = format!("/api/v1/municipalities/{}/budget/entries", municipality.id);
    let res = call(
        &app,
        test::TestRequest::put().uri(&uri).set_json(payload),
        &admin,
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["details"]["field"], field);
}

#[rstest]
#[actix_web::test]
async fn opening_a_year_twice_conflicts() {
    let harness = PortalHarness::start().await;
    let municipality = harness.register_municipality("Bizerte", "7000", None).await;
    let app = test::init_service(portal_app(&harness)).await;
    let admin = login_as(&app, &harness, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let uri = format!("/api/v1/municipalities/{}/budget/years", municipality.id);

    let res = call(
        &app,
        test::TestRequest::post()
            .uri(&uri)
            .set_json(json!({ "rubric": "D2", "year": 2027 })),
        &admin,
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body, json!({ "year": 2027, "voted": 0.0, "actual": 0.0 }));

    let res = call(
        &app,
        test::TestRequest::post()
            .uri(&uri)
            .set_json(json!({ "rubric": "D2", "year": 2027 })),
        &admin,
    )
    .await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[rstest]
#[actix_web::test]
async fn employees_cannot_touch_other_ledgers() {
    let harness = PortalHarness::start().await;
    let municipality = harness.register_municipality("Nabeul", "8000", None).await;
    let app = test::init_service(portal_app(&harness)).await;
    let employee = login_as(&app, &harness, EMPLOYEE_EMAIL, EMPLOYEE_PASSWORD).await;
    let base = format!("/api/v1/municipalities/{}/budget", municipality.id);

    let res = call(&app, test::TestRequest::get().uri(&base), &employee).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let res = put_entry(&app, &employee, &base, "R1", 10.0).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[rstest]
#[actix_web::test]
async fn future_event_lifecycle() {
    let harness = PortalHarness::start().await;
    let municipality = harness
        .register_municipality("Monastir", "5000", Some(&harness.employee.id))
        .await;
    let app = test::init_service(portal_app(&harness)).await;
    let employee = login_as(&app, &harness, EMPLOYEE_EMAIL, EMPLOYEE_PASSWORD).await;
    let events = format!("/api/v1/municipalities/{}/budget/events", municipality.id);

    let res = call(
        &app,
        test::TestRequest::post().uri(&events).set_json(json!({
            "year": 2027,
            "description": "Nouveau marché",
            "estimatedImpact": -450000.0,
            "rubric": "D5",
            "type": "recette"
        })),
        &employee,
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["details"]["code"], "mismatch");

    let res = call(
        &app,
        test::TestRequest::post().uri(&events).set_json(json!({
            "year": 2027,
            "description": "Nouveau marché",
            "estimatedImpact": -450000.0,
            "rubric": "D5"
        })),
        &employee,
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: Value = test::read_body_json(res).await;
    assert_eq!(created["type"], "depense");
    let event_uri = format!("{events}/{}", created["id"].as_str().expect("event id"));

    let res = call(
        &app,
        test::TestRequest::patch()
            .uri(&event_uri)
            .set_json(json!({ "description": "Marché couvert" })),
        &employee,
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let updated: Value = test::read_body_json(res).await;
    assert_eq!(updated["id"], created["id"]);
    assert_eq!(updated["description"], "Marché couvert");
    assert_eq!(updated["rubric"], "D5");

    let res = call(&app, test::TestRequest::delete().uri(&event_uri), &employee).await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    let res = call(&app, test::TestRequest::delete().uri(&event_uri), &employee).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}
