//! Reqwest-backed [`VerificationNotifier`] posting codes to the mail relay.
//!
//! This adapter owns transport details only: request serialisation, timeout
//! and HTTP error mapping, and decoding the relay's acknowledgement.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};

use crate::domain::ports::{DeliveryId, NotifierError, VerificationMessage, VerificationNotifier};

const SEND_PATH: &str = "api/send-mfa-code";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendCodeRequest<'a> {
    email: &'a str,
    code: &'a str,
    expiry_minutes: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendCodeResponse {
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    email_id: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Notifier delivering codes through the companion mail relay.
#[derive(Debug, Clone)]
pub struct MailRelayNotifier {
    client: Client,
    endpoint: Url,
}

impl MailRelayNotifier {
    /// Build a notifier for the relay reachable at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`NotifierError::Transport`] when `base_url` cannot be joined
    /// with the relay path or the HTTP client cannot be constructed.
    pub fn new(base_url: &Url, timeout: Duration) -> Result<Self, NotifierError> {
        let endpoint = endpoint_for(base_url)?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| NotifierError::transport(error.to_string()))?;
        Ok(Self { client, endpoint })
    }

    /// Full URL the codes are posted to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

fn endpoint_for(base_url: &Url) -> Result<Url, NotifierError> {
    let mut base = base_url.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(SEND_PATH)
        .map_err(|error| NotifierError::transport(format!("invalid relay URL: {error}")))
}

#[async_trait]
impl VerificationNotifier for MailRelayNotifier {
    async fn send(&self, message: &VerificationMessage) -> Result<DeliveryId, NotifierError> {
        let payload = SendCodeRequest {
            email: &message.to,
            code: message.code.as_str(),
            expiry_minutes: message.expiry_minutes,
        };
        let response = self
            .client
            .post(self.endpoint.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        parse_acknowledgement(body.as_ref())
    }
}

fn parse_acknowledgement(body: &[u8]) -> Result<DeliveryId, NotifierError> {
    let decoded: SendCodeResponse = serde_json::from_slice(body).map_err(|error| {
        NotifierError::decode(format!("invalid relay JSON payload: {error}"))
    })?;
    if !decoded.success {
        let reason = decoded
            .error
            .or(decoded.message)
            .unwrap_or_else(|| "relay reported failure".to_owned());
        return Err(NotifierError::rejected(StatusCode::OK.as_u16(), reason));
    }
    decoded
        .email_id
        .map(DeliveryId)
        .ok_or_else(|| NotifierError::decode("relay response is missing emailId"))
}

fn map_transport_error(error: reqwest::Error) -> NotifierError {
    if error.is_timeout() {
        NotifierError::transport(format!("relay timed out: {error}"))
    } else {
        NotifierError::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> NotifierError {
    let preview = body_preview(body);
    match status {
        StatusCode::SERVICE_UNAVAILABLE => NotifierError::not_configured(),
        _ => NotifierError::rejected(status.as_u16(), preview),
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for non-network relay mapping helpers.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("http://relay:3001", "http://relay:3001/api/send-mfa-code")]
    #[case("http://relay:3001/", "http://relay:3001/api/send-mfa-code")]
    #[case("https://mail.example/relay", "https://mail.example/relay/api/send-mfa-code")]
    fn endpoint_keeps_base_path(#[case] base: &str, #[case] expected: &str) {
        let base = Url::parse(base).expect("valid url");
        assert_eq!(endpoint_for(&base).expect("join").as_str(), expected);
    }

    #[test]
    fn request_uses_relay_field_names() {
        let payload = SendCodeRequest {
            email: "agent@mairie.tn",
            code: "123456",
            expiry_minutes: 10,
        };
        let value = serde_json::to_value(payload).expect("serialise");
        assert_eq!(
            value,
            serde_json::json!({"email": "agent@mairie.tn", "code": "123456", "expiryMinutes": 10})
        );
    }

    #[test]
    fn acknowledgement_yields_delivery_id() {
        let body = br#"{"success":true,"message":"sent","emailId":"re_42"}"#;
        let id = parse_acknowledgement(body).expect("accepted");
        assert_eq!(id, DeliveryId("re_42".to_owned()));
    }

    #[rstest]
    #[case(br#"{"success":false,"error":"quota"}"#.as_slice())]
    #[case(br#"{"success":true}"#.as_slice())]
    #[case(b"<html>".as_slice())]
    fn unusable_acknowledgements_fail(#[case] body: &[u8]) {
        assert!(parse_acknowledgement(body).is_err());
    }

    #[rstest]
    #[case(StatusCode::SERVICE_UNAVAILABLE, NotifierError::NotConfigured)]
    #[case(
        StatusCode::BAD_REQUEST,
        NotifierError::rejected(400_u16, "{\"error\": \"Missing required fields\"}")
    )]
    #[case(
        StatusCode::INTERNAL_SERVER_ERROR,
        NotifierError::rejected(
            500_u16,
            "{\"error\": \"Missing required fields\"}"
        )
    )]
    fn statuses_map_to_notifier_errors(#[case] status: StatusCode, #[case] expected: NotifierError) {
        let error = map_status_error(status, b"{\"error\":   \"Missing required fields\"}");
        assert_eq!(error, expected);
    }

    #[test]
    fn long_bodies_are_truncated() {
        let body = "x".repeat(400);
        let preview = body_preview(body.as_bytes());
        assert!(preview.ends_with("..."));
        assert_eq!(preview.chars().count(), 163);
    }
}
