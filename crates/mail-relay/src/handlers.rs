//! HTTP surface of the relay.
//!
//! ```text
//! POST /api/send-mfa-code {"email":"agent@mairie.tn","code":"042917","expiryMinutes":10}
//! GET  /api/health
//! ```

use std::sync::Arc;

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::message::verification_email;
use crate::provider::MailProvider;

const SERVICE_NAME: &str = "mail-relay";
const DEFAULT_EXPIRY_MINUTES: u32 = 10;

/// Shared state for the relay handlers.
#[derive(Clone)]
pub struct RelayState {
    provider: Option<Arc<dyn MailProvider>>,
    from_email: String,
}

impl RelayState {
    /// State for a relay delivering through `provider`; `None` answers 503.
    #[must_use]
    pub fn new(provider: Option<Arc<dyn MailProvider>>, from_email: impl Into<String>) -> Self {
        Self {
            provider,
            from_email: from_email.into(),
        }
    }

    /// Whether a provider is configured.
    #[must_use]
    pub fn provider_configured(&self) -> bool {
        self.provider.is_some()
    }
}

/// Body of `POST /api/send-mfa-code`.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendCodeRequest {
    /// Recipient address.
    #[serde(default)]
    pub email: Option<String>,
    /// Verification code to deliver.
    #[serde(default)]
    pub code: Option<String>,
    /// Validity shown in the message.
    #[serde(default)]
    pub expiry_minutes: Option<u32>,
}

/// Acknowledgement returned by `POST /api/send-mfa-code`.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SendCodeResponse {
    /// Whether the provider accepted the message.
    pub success: bool,
    /// Human-readable outcome.
    pub message: String,
    /// Provider message id on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_id: Option<String>,
    /// Provider error on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SendCodeResponse {
    fn failure(message: &str, error: Option<String>) -> Self {
        Self {
            success: false,
            message: message.to_owned(),
            email_id: None,
            error,
        }
    }
}

/// Body of `GET /api/health`.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Always `ok` while the process serves requests.
    pub status: String,
    /// Service name.
    pub service: String,
    /// Whether a provider key is configured.
    pub provider_configured: bool,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

/// Deliver one verification code.
#[post("/api/send-mfa-code")]
pub async fn send_mfa_code(
    state: web::Data<RelayState>,
    payload: web::Json<SendCodeRequest>,
) -> HttpResponse {
    let request = payload.into_inner();
    let (Some(email), Some(code)) = (
        non_blank(request.email.as_deref()),
        non_blank(request.code.as_deref()),
    ) else {
        return HttpResponse::BadRequest()
            .json(SendCodeResponse::failure("Email et code sont requis", None));
    };
    let Some(provider) = state.provider.as_ref() else {
        warn!("send requested but no mail provider is configured");
        return HttpResponse::ServiceUnavailable().json(SendCodeResponse::failure(
            "Service email non configuré",
            None,
        ));
    };

    let expiry = request.expiry_minutes.unwrap_or(DEFAULT_EXPIRY_MINUTES);
    let message = verification_email(&state.from_email, email, code, expiry);
    match provider.send(&message).await {
        Ok(email_id) => {
            info!(email_id = %email_id, "verification code handed to provider");
            HttpResponse::Ok().json(SendCodeResponse {
                success: true,
                message: "Code MFA envoyé avec succès".to_owned(),
                email_id: Some(email_id),
                error: None,
            })
        }
        Err(err) => {
            error!(error = %err, "mail provider failed");
            HttpResponse::InternalServerError().json(SendCodeResponse::failure(
                "Erreur lors de l'envoi de l'email",
                Some(err.to_string()),
            ))
        }
    }
}

/// Report liveness and whether a provider is configured.
#[get("/api/health")]
pub async fn health(state: web::Data<RelayState>) -> web::Json<HealthResponse> {
    web::Json(HealthResponse {
        status: "ok".to_owned(),
        service: SERVICE_NAME.to_owned(),
        provider_configured: state.provider_configured(),
    })
}
