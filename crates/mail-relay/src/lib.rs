//! Mail relay forwarding one-time verification codes to a transactional
//! mail provider.
//!
//! The portal posts `{email, code, expiryMinutes}` to
//! `POST /api/send-mfa-code`; the relay renders the French verification
//! email and hands it to Resend. Without a provider key every send answers
//! `503` so the portal can report the delivery failure and carry on.

pub mod config;
pub mod handlers;
pub mod message;
pub mod provider;

use std::sync::Arc;

use actix_web::web;
use tracing::warn;

pub use config::RelaySettings;
pub use handlers::RelayState;
pub use message::{OutgoingEmail, verification_email};
pub use provider::{MailProvider, ProviderError, ResendProvider};

/// Register the relay routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(handlers::send_mfa_code).service(handlers::health);
}

/// Build handler state from settings.
///
/// # Errors
///
/// Returns [`ProviderError::Transport`] when the Resend base URL is invalid.
pub fn build_state(settings: &RelaySettings) -> Result<RelayState, ProviderError> {
    let provider: Option<Arc<dyn MailProvider>> = match settings.api_key() {
        Some(key) => Some(Arc::new(ResendProvider::new(
            settings.resend_base_url(),
            key,
        )?)),
        None => {
            warn!("MAIL_RELAY_RESEND_API_KEY is not configured; sends will answer 503");
            None
        }
    };
    Ok(RelayState::new(provider, settings.from_email()))
}
