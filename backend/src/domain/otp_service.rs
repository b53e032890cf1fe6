//! Verification-code service implementing the [`OneTimeCodes`] driving port.
//!
//! Codes are stored in one versioned table keyed by lower-cased email.
//! Delivery goes through a [`VerificationNotifier`] bounded by a timeout;
//! delivery failures never invalidate the stored code. The code value is
//! never logged nor returned to callers.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mockable::Clock;
use zeroize::Zeroizing;

use crate::domain::ports::{
    OneTimeCodes, OtpRepository, OtpTable, VerificationMessage, VerificationNotifier, Versioned,
};
use crate::domain::versioned_write::{
    MAX_WRITE_ATTEMPTS, exhausted, map_repository_error, retry_after,
};
use crate::domain::{
    CodeGenerator, DeliveryStatus, EmailAddress, Error, IssuedCode, OTP_MAX_ATTEMPTS,
    OTP_TTL_MINUTES, OtpRecord, VerificationOutcome,
};

const COLLECTION: &str = "verification codes";

/// Default bound on a single delivery attempt.
pub const DEFAULT_DELIVERY_TIMEOUT: Duration = Duration::from_secs(5);

/// One-time code service.
#[derive(Clone)]
pub struct OtpService<R> {
    codes: Arc<R>,
    notifier: Arc<dyn VerificationNotifier>,
    generator: Arc<dyn CodeGenerator>,
    clock: Arc<dyn Clock>,
    delivery_timeout: Duration,
}

impl<R> OtpService<R> {
    /// Create a service with the [`DEFAULT_DELIVERY_TIMEOUT`].
    pub fn new(
        codes: Arc<R>,
        notifier: Arc<dyn VerificationNotifier>,
        generator: Arc<dyn CodeGenerator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            codes,
            notifier,
            generator,
            clock,
            delivery_timeout: DEFAULT_DELIVERY_TIMEOUT,
        }
    }

    /// Override the delivery timeout.
    pub fn with_delivery_timeout(mut self, delivery_timeout: Duration) -> Self {
        self.delivery_timeout = delivery_timeout;
        self
    }
}

fn normalise(email: &str) -> String {
    email.trim().to_lowercase()
}

impl<R> OtpService<R>
where
    R: OtpRepository,
{
    async fn load(&self) -> Result<Versioned<OtpTable>, Error> {
        self.codes
            .load_codes()
            .await
            .map_err(|err| map_repository_error(COLLECTION, err))
    }

    /// Run `apply` against the latest table; unchanged tables are not saved.
    async fn mutate<T, F>(&self, mut apply: F) -> Result<T, Error>
    where
        F: FnMut(&mut OtpTable) -> T + Send,
        T: Send,
    {
        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let Versioned { mut value, version } = self.load().await?;
            let before = value.clone();
            let outcome = apply(&mut value);
            if value == before {
                return Ok(outcome);
            }
            match self.codes.save_codes(&value, version).await {
                Ok(()) => return Ok(outcome),
                Err(err) => retry_after(COLLECTION, attempt, err)?,
            }
        }
        Err(exhausted(COLLECTION))
    }

    async fn deliver(&self, email: &EmailAddress, code: &str) -> DeliveryStatus {
        let message = VerificationMessage {
            to: email.to_string(),
            code: Zeroizing::new(code.to_owned()),
            expiry_minutes: u32::try_from(OTP_TTL_MINUTES).unwrap_or(u32::MAX),
        };
        match tokio::time::timeout(self.delivery_timeout, self.notifier.send(&message)).await {
            Ok(Ok(delivery_id)) => {
                tracing::info!(delivery_id = %delivery_id.0, "verification code delivered");
                DeliveryStatus::Delivered {
                    delivery_id: delivery_id.0,
                }
            }
            Ok(Err(error)) => {
                tracing::warn!(%error, "verification code delivery failed");
                DeliveryStatus::Failed
            }
            Err(_) => {
                tracing::warn!(
                    timeout_ms = u64::try_from(self.delivery_timeout.as_millis()).unwrap_or(u64::MAX),
                    "verification code delivery timed out"
                );
                DeliveryStatus::Failed
            }
        }
    }
}

/// Decide the outcome of one verification attempt and update the table.
fn check(
    table: &mut OtpTable,
    key: &str,
    candidate: &str,
    now: chrono::DateTime<chrono::Utc>,
) -> VerificationOutcome {
    table.retain(|email, record| email == key || !record.is_expired(now));

    let Some(record) = table.get_mut(key) else {
        return VerificationOutcome::NoCode;
    };
    if record.is_expired(now) {
        table.remove(key);
        return VerificationOutcome::Expired;
    }
    if record.attempts >= OTP_MAX_ATTEMPTS {
        table.remove(key);
        return VerificationOutcome::TooManyAttempts;
    }
    if record.code != candidate {
        record.attempts += 1;
        if record.attempts >= OTP_MAX_ATTEMPTS {
            table.remove(key);
            return VerificationOutcome::TooManyAttempts;
        }
        return VerificationOutcome::Mismatch {
            remaining: OTP_MAX_ATTEMPTS - record.attempts,
        };
    }
    table.remove(key);
    VerificationOutcome::Verified
}

#[async_trait]
impl<R> OneTimeCodes for OtpService<R>
where
    R: OtpRepository,
{
    async fn issue(&self, email: &EmailAddress) -> Result<IssuedCode, Error> {
        let key = email.normalised();
        let now = self.clock.utc();
        let record = OtpRecord::issue(self.generator.generate(), now);
        self.mutate(|table| {
            table.retain(|other, existing| other == &key || !existing.is_expired(now));
            table.insert(key.clone(), record.clone());
        })
        .await?;

        let delivery = self.deliver(email, &record.code).await;
        Ok(IssuedCode {
            expires_at: record.expires_at,
            expires_in_seconds: record.remaining_seconds(now),
            delivery,
        })
    }

    async fn verify(&self, email: &str, candidate: &str) -> Result<VerificationOutcome, Error> {
        let key = normalise(email);
        let now = self.clock.utc();
        let outcome = self
            .mutate(|table| check(table, &key, candidate, now))
            .await?;
        tracing::info!(outcome = ?outcome, "verification attempt checked");
        Ok(outcome)
    }

    async fn remaining_seconds(&self, email: &str) -> Result<u64, Error> {
        let key = normalise(email);
        let now = self.clock.utc();
        Ok(self
            .load()
            .await?
            .value
            .get(&key)
            .map_or(0, |record| record.remaining_seconds(now)))
    }

    async fn has_valid_code(&self, email: &str) -> Result<bool, Error> {
        Ok(self.remaining_seconds(email).await? > 0)
    }
}

#[cfg(test)]
#[path = "otp_service_tests.rs"]
mod tests;
