//! Domain primitives, aggregates and services.
//!
//! Purpose: Define strongly typed domain entities used by the API and
//! persistence layers, and the services implementing the driving ports.
//! Keep types immutable where possible and document invariants and
//! serialisation contracts (serde) in each type's Rustdoc.
//!
//! Public surface:
//! - Error (alias to `error::Error`) - API error response payload.
//! - ErrorCode (alias to `error::ErrorCode`) - stable error identifier.
//! - UserAccount, Municipality - directory and registry records.
//! - budget - rubric nomenclature, ledgers and the balance rule.
//! - interchange - flat row form used by CSV and JSON import/export.
//! - Services - `UserDirectoryService`, `OtpService`,
//!   `MunicipalityService`, `LedgerService`, `InterchangeService`.

pub mod auth;
pub mod budget;
pub mod demo_data;
pub mod error;
pub mod interchange;
pub mod interchange_service;
pub mod ledger_service;
pub mod municipality;
pub mod municipality_service;
pub mod otp;
pub mod otp_service;
pub mod password;
pub mod ports;
pub mod trace_id;
pub mod user;
pub mod user_directory_service;
mod versioned_write;

pub use self::auth::{LoginCredentials, LoginValidationError, UserSession};
pub use self::demo_data::{DEFAULT_DEMO_SEED, DemoDataSeeder, DemoSeedSummary};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::interchange_service::InterchangeService;
pub use self::ledger_service::LedgerService;
pub use self::municipality::{
    Municipality, MunicipalityId, MunicipalityPatch, MunicipalityValidationError, NewMunicipality,
};
pub use self::municipality_service::MunicipalityService;
pub use self::otp::{
    CodeGenerator, DeliveryStatus, IssuedCode, OTP_CODE_LENGTH, OTP_MAX_ATTEMPTS,
    OTP_TTL_MINUTES, OtpRecord, RandomCodeGenerator, VerificationOutcome, otp_ttl,
};
pub use self::otp_service::{DEFAULT_DELIVERY_TIMEOUT, OtpService};
pub use self::password::{PASSWORD_MIN_LENGTH, Password, PasswordError, PasswordHash};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{
    DISPLAY_NAME_MAX, DisplayName, EmailAddress, NewUser, Role, UserAccount, UserId, UserPatch,
    UserValidationError,
};
pub use self::user_directory_service::UserDirectoryService;
pub use self::versioned_write::MAX_WRITE_ATTEMPTS;

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use budget_portal::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
