//! Shared validation helpers for inbound HTTP adapters.
//!
//! Request bodies arrive as loose strings; these helpers turn them into
//! domain types and report failures as `400` errors whose `details` name the
//! offending field.

use std::str::FromStr;

use serde_json::json;
use uuid::Uuid;

use crate::domain::{Email, Error, Pincode, UserId};

/// Machine-readable validation failure codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    MissingField,
    InvalidUuid,
    InvalidEmail,
    InvalidValue,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            Self::MissingField => "missing_field",
            Self::InvalidUuid => "invalid_uuid",
            Self::InvalidEmail => "invalid_email",
            Self::InvalidValue => "invalid_value",
        }
    }
}

/// HTTP field name as it appears in the JSON body or query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }
}

fn field_error(field: FieldName, message: impl Into<String>, code: ErrorCode) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field.0,
        "code": code.as_str(),
    }))
}

pub(crate) fn missing_field_error(field: FieldName, message: &str) -> Error {
    field_error(field, message, ErrorCode::MissingField)
}

/// Trimmed, non-empty value or a `missing_field` error carrying `message`.
pub(crate) fn required(
    value: Option<String>,
    field: FieldName,
    message: &str,
) -> Result<String, Error> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| missing_field_error(field, message))
}

pub(crate) fn parse_email(raw: &str, field: FieldName) -> Result<Email, Error> {
    Email::new(raw).map_err(|err| field_error(field, err.to_string(), ErrorCode::InvalidEmail))
}

pub(crate) fn parse_user_id(raw: &str, field: FieldName) -> Result<UserId, Error> {
    UserId::new(raw).map_err(|_| {
        field_error(
            field,
            format!("{} must be a valid UUID", field.0),
            ErrorCode::InvalidUuid,
        )
    })
}

pub(crate) fn parse_uuid(raw: &str, field: FieldName) -> Result<Uuid, Error> {
    Uuid::parse_str(raw).map_err(|_| {
        field_error(
            field,
            format!("{} must be a valid UUID", field.0),
            ErrorCode::InvalidUuid,
        )
    })
}

pub(crate) fn parse_pincode(raw: &str, field: FieldName) -> Result<Pincode, Error> {
    Pincode::new(raw).map_err(|err| field_error(field, err.to_string(), ErrorCode::InvalidValue))
}

/// Parse one of the labelled enums (roles, statuses, kinds).
pub(crate) fn parse_label<T>(raw: &str, field: FieldName) -> Result<T, Error>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|err| field_error(field, err.to_string(), ErrorCode::InvalidValue))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ErrorCode as DomainCode, Role};
    use rstest::rstest;

    const EMAIL: FieldName = FieldName::new("email");

    fn details(error: &Error) -> (&str, &str) {
        let details = error.details().expect("details");
        (
            details["field"].as_str().expect("field"),
            details["code"].as_str().expect("code"),
        )
    }

    #[rstest]
    #[case(None)]
    #[case(Some("   "))]
    fn required_rejects_blank(#[case] value: Option<&str>) {
        let err = required(value.map(str::to_owned), EMAIL, "Email is required")
            .expect_err("blank");
        assert_eq!(err.code(), DomainCode::InvalidRequest);
        assert_eq!(err.message(), "Email is required");
        assert_eq!(details(&err), ("email", "missing_field"));
    }

    #[test]
    fn required_trims() {
        let value = required(Some("  a@x.com ".to_owned()), EMAIL, "x").expect("present");
        assert_eq!(value, "a@x.com");
    }

    #[test]
    fn bad_email_names_the_field() {
        let err = parse_email("no-at-sign", EMAIL).expect_err("malformed");
        assert_eq!(details(&err), ("email", "invalid_email"));
    }

    #[test]
    fn bad_uuid_names_the_field() {
        let err = parse_user_id("42", FieldName::new("userId")).expect_err("not a uuid");
        assert_eq!(err.message(), "userId must be a valid UUID");
        assert_eq!(details(&err), ("userId", "invalid_uuid"));
    }

    #[rstest]
    #[case("broker", Some(Role::Broker))]
    #[case(" admin ", Some(Role::Admin))]
    #[case("landlord", None)]
    fn labels_parse_or_explain(#[case] raw: &str, #[case] expected: Option<Role>) {
        let parsed = parse_label::<Role>(raw, FieldName::new("role"));
        match expected {
            Some(role) => assert_eq!(parsed.expect("known"), role),
            None => assert_eq!(
                details(&parsed.expect_err("unknown")),
                ("role", "invalid_value")
            ),
        }
    }
}
