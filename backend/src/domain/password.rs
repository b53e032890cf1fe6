//! Password secrets and their Argon2id hashes.
//!
//! Plaintext passwords only live inside [`Password`], which zeroises its
//! buffer on drop. Stored credentials are PHC strings produced with a random
//! salt and verified in constant time by the `argon2` crate.

use std::fmt;
use std::sync::OnceLock;

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{
    PasswordHash as PhcString, PasswordHasher, PasswordVerifier, SaltString,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zeroize::Zeroizing;

/// Minimum accepted password length, in characters.
pub const PASSWORD_MIN_LENGTH: usize = 8;

/// Validation and hashing failures for credentials.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordError {
    /// Password shorter than [`PASSWORD_MIN_LENGTH`].
    #[error("password must be at least {min} characters")]
    TooShort { min: usize },
    /// The hashing backend rejected the input or parameters.
    #[error("password hashing failed: {message}")]
    Hashing { message: String },
}

/// Plaintext password supplied by a caller.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(Zeroizing<String>);

impl Password {
    /// Validate a new password against the length policy.
    pub fn new(raw: impl Into<String>) -> Result<Self, PasswordError> {
        let raw = Zeroizing::new(raw.into());
        if raw.chars().count() < PASSWORD_MIN_LENGTH {
            return Err(PasswordError::TooShort {
                min: PASSWORD_MIN_LENGTH,
            });
        }
        Ok(Self(raw))
    }

    /// Borrow the plaintext.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(<redacted>)")
    }
}

/// Argon2id PHC string stored in place of the plaintext password.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Hash `password` with a freshly generated salt.
    ///
    /// # Examples
    /// ```
    /// use budget_portal::domain::{Password, PasswordHash};
    ///
    /// let password = Password::new("correct horse").expect("valid password");
    /// let hash = PasswordHash::derive(&password).expect("hashing succeeds");
    /// assert!(hash.verify("correct horse"));
    /// assert!(!hash.verify("wrong horse"));
    /// ```
    pub fn derive(password: &Password) -> Result<Self, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.expose().as_bytes(), &salt)
            .map(|hash| Self(hash.to_string()))
            .map_err(|err| PasswordError::Hashing {
                message: err.to_string(),
            })
    }

    /// Verify a candidate plaintext against this hash.
    ///
    /// Malformed stored hashes never verify.
    pub fn verify(&self, candidate: &str) -> bool {
        match PhcString::new(&self.0) {
            Ok(parsed) => Argon2::default()
                .verify_password(candidate.as_bytes(), &parsed)
                .is_ok(),
            Err(error) => {
                tracing::error!(%error, "stored password hash is malformed");
                false
            }
        }
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash(<redacted>)")
    }
}

static DECOY_HASH: OnceLock<Option<PasswordHash>> = OnceLock::new();

/// Spend the same verification effort as a real check when no account
/// matched, so unknown emails are not distinguishable by response time.
pub fn verify_against_decoy(candidate: &str) {
    let decoy = DECOY_HASH.get_or_init(|| {
        Password::new("decoy-password-never-matches")
            .ok()
            .and_then(|password| PasswordHash::derive(&password).ok())
    });
    if let Some(hash) = decoy {
        let _ = hash.verify(candidate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("")]
    #[case("short")]
    #[case("1234567")]
    fn rejects_short_passwords(#[case] raw: &str) {
        let err = Password::new(raw).expect_err("short passwords must fail");
        assert_eq!(err, PasswordError::TooShort { min: 8 });
    }

    #[test]
    fn hashes_are_salted() {
        let password = Password::new("admin1234").expect("valid password");
        let first = PasswordHash::derive(&password).expect("hash");
        let second = PasswordHash::derive(&password).expect("hash");
        assert_ne!(first, second, "each hash uses a fresh salt");
        assert!(first.verify("admin1234"));
        assert!(second.verify("admin1234"));
    }

    #[test]
    fn malformed_hash_never_verifies() {
        let hash: PasswordHash =
            serde_json::from_str("\"not-a-phc-string\"").expect("deserialise");
        assert!(!hash.verify("anything"));
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let password = Password::new("admin1234").expect("valid password");
        assert_eq!(format!("{password:?}"), "Password(<redacted>)");
        let hash = PasswordHash::derive(&password).expect("hash");
        assert!(!format!("{hash:?}").contains("argon2"));
    }
}
