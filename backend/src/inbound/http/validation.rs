//! Shared validation helpers for inbound HTTP adapters.
//!
//! Every rejected field surfaces as `400 invalid_request` with
//! `details: {field, code}` so clients can highlight the offending input.

use serde_json::json;

use crate::domain::budget::{BudgetValidationError, EventId};
use crate::domain::{
    Error, LoginValidationError, MunicipalityId, MunicipalityValidationError, PasswordError,
    UserId, UserValidationError,
};

/// Stable identifiers for request validation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    Empty,
    InvalidFormat,
    InvalidUuid,
    TooLong,
    TooShort,
    OutOfRange,
    Unknown,
    Mismatch,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::InvalidFormat => "invalid_format",
            Self::InvalidUuid => "invalid_uuid",
            Self::TooLong => "too_long",
            Self::TooShort => "too_short",
            Self::OutOfRange => "out_of_range",
            Self::Unknown => "unknown_value",
            Self::Mismatch => "mismatch",
        }
    }
}

/// `400` error naming the offending field.
pub(crate) fn field_error(field: &str, code: ErrorCode, message: impl Into<String>) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field,
        "code": code.as_str(),
    }))
}

pub(crate) fn map_login_error(err: LoginValidationError) -> Error {
    let field = match err {
        LoginValidationError::EmptyEmail => "email",
        LoginValidationError::EmptyPassword => "password",
        LoginValidationError::EmptyCode => "code",
    };
    field_error(field, ErrorCode::Empty, err.to_string())
}

pub(crate) fn map_user_error(err: UserValidationError) -> Error {
    let (field, code) = match &err {
        UserValidationError::EmptyId => ("id", ErrorCode::Empty),
        UserValidationError::InvalidId => ("id", ErrorCode::InvalidUuid),
        UserValidationError::EmptyEmail => ("email", ErrorCode::Empty),
        UserValidationError::InvalidEmail => ("email", ErrorCode::InvalidFormat),
        UserValidationError::EmptyDisplayName => ("displayName", ErrorCode::Empty),
        UserValidationError::DisplayNameTooLong { .. } => ("displayName", ErrorCode::TooLong),
        UserValidationError::UnknownRole { .. } => ("role", ErrorCode::Unknown),
    };
    field_error(field, code, err.to_string())
}

pub(crate) fn map_password_error(err: PasswordError) -> Error {
    match err {
        PasswordError::TooShort { .. } => {
            field_error("password", ErrorCode::TooShort, err.to_string())
        }
        PasswordError::Hashing { message } => Error::internal(message),
    }
}

pub(crate) fn map_municipality_error(err: MunicipalityValidationError) -> Error {
    let field = match err {
        MunicipalityValidationError::InvalidId => {
            return field_error("id", ErrorCode::InvalidUuid, err.to_string());
        }
        MunicipalityValidationError::EmptyName => "name",
        MunicipalityValidationError::EmptyCode => "code",
        MunicipalityValidationError::EmptyRegion => "region",
    };
    field_error(field, ErrorCode::Empty, err.to_string())
}

pub(crate) fn map_budget_error(err: BudgetValidationError) -> Error {
    let (field, code) = match &err {
        BudgetValidationError::UnknownRubric { .. } => ("rubric", ErrorCode::Unknown),
        BudgetValidationError::UnknownKind { .. } => ("type", ErrorCode::Unknown),
        BudgetValidationError::KindMismatch { .. } => ("type", ErrorCode::Mismatch),
        BudgetValidationError::YearOutOfRange { .. } => ("year", ErrorCode::OutOfRange),
        BudgetValidationError::NonFiniteAmount => ("amount", ErrorCode::InvalidFormat),
        BudgetValidationError::NegativeAmount => ("amount", ErrorCode::OutOfRange),
        BudgetValidationError::EmptyDescription => ("description", ErrorCode::Empty),
        BudgetValidationError::InvalidEventId => ("eventId", ErrorCode::InvalidUuid),
    };
    field_error(field, code, err.to_string())
}

/// Amount failure attributed to the named figure (`voted`, `actual`).
pub(crate) fn map_amount_error(field: &str, err: BudgetValidationError) -> Error {
    let code = match err {
        BudgetValidationError::NegativeAmount => ErrorCode::OutOfRange,
        _ => ErrorCode::InvalidFormat,
    };
    field_error(field, code, err.to_string())
}

pub(crate) fn parse_user_id(raw: &str) -> Result<UserId, Error> {
    UserId::new(raw).map_err(map_user_error)
}

pub(crate) fn parse_municipality_id(raw: &str) -> Result<MunicipalityId, Error> {
    MunicipalityId::new(raw).map_err(map_municipality_error)
}

pub(crate) fn parse_event_id(raw: &str) -> Result<EventId, Error> {
    EventId::new(raw).map_err(map_budget_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn details(error: &Error) -> (String, String) {
        let details = error.details().expect("details present");
        (
            details["field"].as_str().expect("field").to_owned(),
            details["code"].as_str().expect("code").to_owned(),
        )
    }

    #[rstest]
    #[case(BudgetValidationError::NegativeAmount, "amount", "out_of_range")]
    #[case(
        BudgetValidationError::KindMismatch { rubric: "R1".into(), declared: "depense".into() },
        "type",
        "mismatch"
    )]
    #[case(
        BudgetValidationError::YearOutOfRange { year: 2017, min: 2018, max: 2100 },
        "year",
        "out_of_range"
    )]
    fn budget_errors_name_their_field(
        #[case] err: BudgetValidationError,
        #[case] field: &str,
        #[case] code: &str,
    ) {
        let mapped = map_budget_error(err);
        assert_eq!(mapped.code(), crate::domain::ErrorCode::InvalidRequest);
        assert_eq!(details(&mapped), (field.to_owned(), code.to_owned()));
    }

    #[rstest]
    fn malformed_ids_are_rejected() {
        let err = parse_municipality_id("not-a-uuid").expect_err("invalid id");
        assert_eq!(details(&err), ("id".to_owned(), "invalid_uuid".to_owned()));
    }

    #[rstest]
    fn hashing_failures_are_internal() {
        let err = map_password_error(PasswordError::Hashing {
            message: "params".into(),
        });
        assert_eq!(err.code(), crate::domain::ErrorCode::InternalError);
    }
}
