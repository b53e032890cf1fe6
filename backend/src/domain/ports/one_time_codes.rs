//! Driving port for the verification-code lifecycle.

use async_trait::async_trait;

use crate::domain::{EmailAddress, Error, IssuedCode, VerificationOutcome};

/// Domain use-case port for one-time codes.
///
/// Email arguments are compared case-insensitively.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OneTimeCodes: Send + Sync {
    /// Issue a fresh code for `email` and attempt delivery.
    async fn issue(&self, email: &EmailAddress) -> Result<IssuedCode, Error>;

    /// Check `candidate` against the outstanding code for `email`.
    async fn verify(&self, email: &str, candidate: &str) -> Result<VerificationOutcome, Error>;

    /// Seconds before the outstanding code expires, zero if there is none.
    async fn remaining_seconds(&self, email: &str) -> Result<u64, Error>;

    /// Whether an unexpired code is outstanding.
    async fn has_valid_code(&self, email: &str) -> Result<bool, Error>;
}
