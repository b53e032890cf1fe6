//! Authentication primitives: login credentials and the authenticated session.
//!
//! Keep inbound payload parsing outside the domain by exposing constructors
//! that validate string inputs before a handler talks to a port or service.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use zeroize::Zeroizing;

use super::user::{Role, UserAccount, UserId};

/// Domain error returned when login payload values are invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginValidationError {
    /// Email was missing or blank once trimmed.
    EmptyEmail,
    /// Password was blank.
    EmptyPassword,
    /// Verification code was blank once trimmed.
    EmptyCode,
}

impl fmt::Display for LoginValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyEmail => write!(f, "email must not be empty"),
            Self::EmptyPassword => write!(f, "password must not be empty"),
            Self::EmptyCode => write!(f, "verification code must not be empty"),
        }
    }
}

impl std::error::Error for LoginValidationError {}

/// Validated login credentials used by the user directory.
///
/// ## Invariants
/// - `email` is trimmed and must not be empty after trimming.
/// - `password` is required to be non-empty but retains caller-provided
///   whitespace to avoid surprising credential comparisons.
///
/// # Examples
/// ```
/// use budget_portal::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts(" admin@mairie.tn ", "admin1234").unwrap();
/// assert_eq!(creds.email(), "admin@mairie.tn");
/// assert_eq!(creds.password(), "admin1234");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: String,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw email/password inputs.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, LoginValidationError> {
        let normalized = email.trim();
        if normalized.is_empty() {
            return Err(LoginValidationError::EmptyEmail);
        }

        if password.is_empty() {
            return Err(LoginValidationError::EmptyPassword);
        }

        Ok(Self {
            email: normalized.to_owned(),
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Email string suitable for directory lookups.
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Password string provided by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Authenticated dashboard session.
///
/// Created once the second factor has been verified and stored in the
/// encrypted session cookie. Dropping it from the cookie logs the user out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserSession {
    #[schema(value_type = String, example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    pub id: UserId,
    #[schema(example = "admin@mairie.tn")]
    pub email: String,
    pub role: Role,
    #[schema(example = "Administrateur")]
    pub name: String,
    pub login_time: DateTime<Utc>,
}

impl UserSession {
    /// Project an account into a session started at `login_time`.
    pub fn for_account(account: &UserAccount, login_time: DateTime<Utc>) -> Self {
        Self {
            id: account.id.clone(),
            email: account.email.to_string(),
            role: account.role,
            name: account.display_name.to_string(),
            login_time,
        }
    }

    /// Whether the session belongs to an administrator.
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", "pw", LoginValidationError::EmptyEmail)]
    #[case("   ", "pw", LoginValidationError::EmptyEmail)]
    #[case("user@mairie.tn", "", LoginValidationError::EmptyPassword)]
    fn invalid_credentials(
        #[case] email: &str,
        #[case] password: &str,
        #[case] expected: LoginValidationError,
    ) {
        let err = LoginCredentials::try_from_parts(email, password)
            .expect_err("invalid inputs must fail");
        assert_eq!(err, expected);
    }

    #[rstest]
    #[case("  admin@mairie.tn  ", "secret")]
    #[case("alice@mairie.tn", " correct horse battery staple ")]
    fn valid_credentials_trim_email_only(#[case] email: &str, #[case] password: &str) {
        let creds = LoginCredentials::try_from_parts(email, password)
            .expect("valid inputs should succeed");
        assert_eq!(creds.email(), email.trim());
        assert_eq!(creds.password(), password);
    }

    #[rstest]
    fn session_serialises_login_time_in_camel_case() {
        let session = UserSession {
            id: UserId::random(),
            email: "admin@mairie.tn".to_owned(),
            role: Role::Admin,
            name: "Administrateur".to_owned(),
            login_time: DateTime::<Utc>::UNIX_EPOCH,
        };
        let value = serde_json::to_value(&session).expect("serialise");
        assert_eq!(value["loginTime"], "1970-01-01T00:00:00Z");
        assert_eq!(value["role"], "admin");
        assert!(session.is_admin());
    }
}
