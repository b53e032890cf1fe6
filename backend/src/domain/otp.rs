//! One-time verification codes used as the second login factor.
//!
//! A record is keyed by the lower-cased email address. At most one record
//! exists per address; issuing a new code replaces the previous one.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Number of digits in a verification code.
pub const OTP_CODE_LENGTH: usize = 6;
/// Validity window of a freshly issued code, in minutes.
pub const OTP_TTL_MINUTES: i64 = 10;
/// Failed attempts after which a code is discarded.
pub const OTP_MAX_ATTEMPTS: u32 = 3;

/// Validity window of a freshly issued code.
pub fn otp_ttl() -> Duration {
    Duration::minutes(OTP_TTL_MINUTES)
}

/// Source of verification codes.
pub trait CodeGenerator: Send + Sync {
    /// Produce a code of [`OTP_CODE_LENGTH`] decimal digits.
    fn generate(&self) -> String;
}

/// Uniformly random codes, leading zeros preserved.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomCodeGenerator;

impl CodeGenerator for RandomCodeGenerator {
    fn generate(&self) -> String {
        let value: u32 = rand::thread_rng().gen_range(0..1_000_000);
        format!("{value:0width$}", width = OTP_CODE_LENGTH)
    }
}

/// Persisted state of an outstanding code.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpRecord {
    pub code: String,
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub attempts: u32,
}

impl OtpRecord {
    /// Fresh record expiring [`OTP_TTL_MINUTES`] after `now`.
    pub fn issue(code: String, now: DateTime<Utc>) -> Self {
        Self {
            code,
            expires_at: now + otp_ttl(),
            attempts: 0,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Whole seconds left before expiry, zero once expired.
    pub fn remaining_seconds(&self, now: DateTime<Utc>) -> u64 {
        u64::try_from((self.expires_at - now).num_seconds()).unwrap_or(0)
    }
}

impl fmt::Debug for OtpRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OtpRecord")
            .field("code", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .field("attempts", &self.attempts)
            .finish()
    }
}

/// Outcome of handing a code to the notifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum DeliveryStatus {
    /// The relay accepted the message.
    #[serde(rename_all = "camelCase")]
    Delivered { delivery_id: String },
    /// Delivery failed or timed out; the code remains valid.
    Failed,
}

/// Result of issuing a code. The code itself is never part of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IssuedCode {
    pub expires_at: DateTime<Utc>,
    pub expires_in_seconds: u64,
    pub delivery: DeliveryStatus,
}

/// Result of checking a candidate code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationOutcome {
    Verified,
    NoCode,
    Expired,
    TooManyAttempts,
    Mismatch { remaining: u32 },
}

impl VerificationOutcome {
    pub fn is_verified(self) -> bool {
        matches!(self, Self::Verified)
    }

    /// User-facing explanation of a failed check.
    ///
    /// # Examples
    /// ```
    /// use budget_portal::domain::VerificationOutcome;
    ///
    /// let outcome = VerificationOutcome::Mismatch { remaining: 2 };
    /// assert_eq!(outcome.message(), "Code incorrect. 2 tentative(s) restante(s).");
    /// ```
    pub fn message(self) -> String {
        match self {
            Self::Verified => "Code vérifié.".to_owned(),
            Self::NoCode => "Aucun code trouvé. Veuillez demander un nouveau code.".to_owned(),
            Self::Expired => "Le code a expiré. Veuillez demander un nouveau code.".to_owned(),
            Self::TooManyAttempts => {
                "Trop de tentatives. Veuillez demander un nouveau code.".to_owned()
            }
            Self::Mismatch { remaining } => {
                format!("Code incorrect. {remaining} tentative(s) restante(s).")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn random_codes_have_six_digits() {
        let generator = RandomCodeGenerator;
        for _ in 0..200 {
            let code = generator.generate();
            assert_eq!(code.len(), OTP_CODE_LENGTH);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[rstest]
    #[case(0, 600)]
    #[case(599, 1)]
    #[case(600, 0)]
    #[case(7200, 0)]
    fn remaining_seconds_counts_down(#[case] elapsed: i64, #[case] expected: u64) {
        let issued_at = DateTime::<Utc>::UNIX_EPOCH;
        let record = OtpRecord::issue("012345".to_owned(), issued_at);
        let now = issued_at + Duration::seconds(elapsed);
        assert_eq!(record.remaining_seconds(now), expected);
        assert_eq!(record.is_expired(now), expected == 0);
    }

    #[rstest]
    fn debug_output_hides_code() {
        let record = OtpRecord::issue("987654".to_owned(), Utc::now());
        assert!(!format!("{record:?}").contains("987654"));
    }

    #[rstest]
    fn delivery_status_is_tagged() {
        let delivered = DeliveryStatus::Delivered {
            delivery_id: "re_123".to_owned(),
        };
        let value = serde_json::to_value(&delivered).expect("serialise");
        assert_eq!(value["status"], "delivered");
        assert_eq!(value["deliveryId"], "re_123");
        let failed = serde_json::to_value(DeliveryStatus::Failed).expect("serialise");
        assert_eq!(failed["status"], "failed");
    }
}
