//! Transactional mail provider port and its Resend adapter.

#![cfg_attr(test, allow(missing_docs, reason = "mockall doubles carry no docs"))]

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;

use crate::message::OutgoingEmail;

/// Failures reported by a mail provider.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// The provider could not be reached.
    #[error("mail provider unreachable: {message}")]
    Transport {
        /// Transport failure description.
        message: String,
    },
    /// The provider answered with an error status.
    #[error("mail provider rejected the message ({status}): {message}")]
    Rejected {
        /// HTTP status returned by the provider.
        status: u16,
        /// Provider-supplied reason.
        message: String,
    },
    /// The provider answered 2xx with an unreadable body.
    #[error("mail provider response unreadable: {message}")]
    Decode {
        /// Decoding failure description.
        message: String,
    },
}

/// Sends rendered emails and returns the provider's message id.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MailProvider: Send + Sync {
    /// Hand `email` to the provider.
    async fn send(&self, email: &OutgoingEmail) -> Result<String, ProviderError>;
}

#[derive(Debug, Deserialize)]
struct ResendAccepted {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ResendFailure {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

/// [`MailProvider`] backed by the Resend HTTP API.
#[derive(Debug, Clone)]
pub struct ResendProvider {
    client: Client,
    endpoint: Url,
    api_key: String,
}

impl ResendProvider {
    /// Build a provider posting to `{base_url}/emails`.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Transport`] when the base URL is invalid.
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, ProviderError> {
        let base = Url::parse(base_url).map_err(|err| ProviderError::Transport {
            message: format!("invalid Resend base url {base_url}: {err}"),
        })?;
        let endpoint = base.join("emails").map_err(|err| ProviderError::Transport {
            message: err.to_string(),
        })?;
        Ok(Self {
            client: Client::new(),
            endpoint,
            api_key: api_key.to_owned(),
        })
    }

    /// URL emails are posted to.
    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl MailProvider for ResendProvider {
    async fn send(&self, email: &OutgoingEmail) -> Result<String, ProviderError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(email)
            .send()
            .await
            .map_err(|err| ProviderError::Transport {
                message: err.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let failure = response.json::<ResendFailure>().await.ok();
            let message = failure
                .and_then(|body| body.message.or(body.name))
                .unwrap_or_else(|| status.to_string());
            return Err(ProviderError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<ResendAccepted>()
            .await
            .map(|accepted| accepted.id)
            .map_err(|err| ProviderError::Decode {
                message: err.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    #![expect(clippy::expect_used, reason = "tests fail loudly on bad fixtures")]

    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("https://api.resend.com", "https://api.resend.com/emails")]
    #[case("http://localhost:9000/", "http://localhost:9000/emails")]
    fn endpoint_appends_emails(#[case] base: &str, #[case] expected: &str) {
        let provider = ResendProvider::new(base, "re_test").expect("valid base");
        assert_eq!(provider.endpoint().as_str(), expected);
    }

    #[rstest]
    fn invalid_base_is_a_transport_error() {
        let err = ResendProvider::new("not a url", "re_test").expect_err("invalid base");
        assert!(matches!(err, ProviderError::Transport { .. }));
    }
}
