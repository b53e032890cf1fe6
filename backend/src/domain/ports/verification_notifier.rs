//! Port for delivering verification codes out of band.
//!
//! Delivery is best effort: callers log failures and carry on, since the
//! code stays valid and can be re-issued.

use std::fmt;

use async_trait::async_trait;
use zeroize::Zeroizing;

use super::define_port_error;

define_port_error! {
    /// Errors raised by notifier adapters.
    pub enum NotifierError {
        /// No relay is configured for this deployment.
        NotConfigured => "verification notifier is not configured",
        /// The relay could not be reached.
        Transport { message: String } => "notifier transport failed: {message}",
        /// The relay answered with a failure status.
        Rejected { status: u16, message: String } =>
            "notifier rejected the message with status {status}: {message}",
        /// The relay answered with an unreadable payload.
        Decode { message: String } => "notifier response could not be decoded: {message}",
    }
}

/// Message carrying a verification code to its recipient.
#[derive(Clone, PartialEq, Eq)]
pub struct VerificationMessage {
    pub to: String,
    pub code: Zeroizing<String>,
    pub expiry_minutes: u32,
}

impl fmt::Debug for VerificationMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerificationMessage")
            .field("to", &self.to)
            .field("code", &"<redacted>")
            .field("expiry_minutes", &self.expiry_minutes)
            .finish()
    }
}

/// Identifier returned by the relay for an accepted message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryId(pub String);

/// Delivery channel for verification codes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VerificationNotifier: Send + Sync {
    /// Hand `message` to the delivery channel.
    async fn send(&self, message: &VerificationMessage) -> Result<DeliveryId, NotifierError>;
}

/// Notifier used when no relay is configured; every send fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredNotifier;

#[async_trait]
impl VerificationNotifier for UnconfiguredNotifier {
    async fn send(&self, _message: &VerificationMessage) -> Result<DeliveryId, NotifierError> {
        Err(NotifierError::not_configured())
    }
}
