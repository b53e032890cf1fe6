//! Test helpers for inbound HTTP components.

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{Service, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::{App, test, web};
use serde_json::json;

use crate::Trace;
use crate::inbound::http::configure_api;
use crate::test_support::PortalHarness;

/// Build a session middleware configured for tests.
///
/// - Generates a fresh signing/encryption key per invocation.
/// - Sets the cookie name to `session` and disables the `Secure` flag for
///   local HTTP tests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// The full `/api/v1` surface over the harness state.
pub fn portal_app(
    harness: &PortalHarness,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    > + use<>,
> {
    App::new()
        .app_data(web::Data::new(harness.state.clone()))
        .wrap(Trace)
        .service(
            web::scope("/api/v1")
                .wrap(test_session_middleware())
                .configure(configure_api),
        )
}

pub fn session_cookie(res: &ServiceResponse) -> Option<Cookie<'static>> {
    res.response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .map(Cookie::into_owned)
}

/// Run the password and code steps and return the authenticated cookie.
pub async fn login_as<S>(
    app: &S,
    harness: &PortalHarness,
    email: &str,
    password: &str,
) -> Cookie<'static>
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let res = test::call_service(
        app,
        test::TestRequest::post()
            .uri("/api/v1/login")
            .set_json(json!({ "email": email, "password": password }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::ACCEPTED, "password step");
    let pending = session_cookie(&res).expect("pending cookie");

    let code = harness.notifier.last_code_for(email).expect("code sent");
    let res = test::call_service(
        app,
        test::TestRequest::post()
            .uri("/api/v1/login/verify")
            .cookie(pending)
            .set_json(json!({ "code": code }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK, "code step");
    session_cookie(&res).expect("session cookie")
}
