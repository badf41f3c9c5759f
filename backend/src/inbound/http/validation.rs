//! Shared validation helpers for inbound HTTP adapters.
//!
//! Every client-input failure becomes `invalid_request` with a `details`
//! object naming the offending JSON field and a stable machine code.

use std::fmt::Display;

use actix_web::web;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::json;
use uuid::Uuid;

use crate::domain::{Error, UserId, UserValidationError};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    MissingField,
    InvalidUuid,
    InvalidTimestamp,
    InvalidDate,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::MissingField => "missing_field",
            ErrorCode::InvalidUuid => "invalid_uuid",
            ErrorCode::InvalidTimestamp => "invalid_timestamp",
            ErrorCode::InvalidDate => "invalid_date",
        }
    }
}

/// Newtype wrapper for HTTP field names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub(crate) fn as_str(&self) -> &'static str {
        self.0
    }
}

/// `invalid_request` carrying `{ field, code }` details.
pub(crate) fn field_error(field: &str, code: &str, message: impl Display) -> Error {
    Error::invalid_request(message.to_string()).with_details(json!({
        "field": field,
        "code": code,
    }))
}

fn field_value_error(field: FieldName, code: ErrorCode, message: String, value: &str) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field.as_str(),
        "value": value,
        "code": code.as_str(),
    }))
}

pub(crate) fn missing_field_error(field: FieldName) -> Error {
    let name = field.as_str();
    field_error(
        name,
        ErrorCode::MissingField.as_str(),
        format!("missing required field: {name}"),
    )
}

/// Unwrap an optional body field or report it missing.
pub(crate) fn require<T>(value: Option<T>, field: FieldName) -> Result<T, Error> {
    value.ok_or_else(|| missing_field_error(field))
}

pub(crate) fn invalid_uuid_error(field: FieldName, value: &str) -> Error {
    let name = field.as_str();
    field_value_error(
        field,
        ErrorCode::InvalidUuid,
        format!("{name} must be a valid UUID"),
        value,
    )
}

pub(crate) fn parse_uuid(value: &str, field: FieldName) -> Result<Uuid, Error> {
    Uuid::parse_str(value).map_err(|_| invalid_uuid_error(field, value))
}

pub(crate) fn parse_user_id(value: &str, field: FieldName) -> Result<UserId, Error> {
    UserId::new(value).map_err(|_| invalid_uuid_error(field, value))
}

pub(crate) fn parse_rfc3339_timestamp(
    value: &str,
    field: FieldName,
) -> Result<DateTime<Utc>, Error> {
    DateTime::parse_from_rfc3339(value)
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .map_err(|_| {
            field_value_error(
                field,
                ErrorCode::InvalidTimestamp,
                format!("{} must be an RFC 3339 timestamp", field.as_str()),
                value,
            )
        })
}

pub(crate) fn parse_optional_rfc3339_timestamp(
    value: Option<&str>,
    field: FieldName,
) -> Result<Option<DateTime<Utc>>, Error> {
    value
        .map(|raw| parse_rfc3339_timestamp(raw, field))
        .transpose()
}

/// Parse a `YYYY-MM-DD` calendar date.
pub(crate) fn parse_date(value: &str, field: FieldName) -> Result<NaiveDate, Error> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        field_value_error(
            field,
            ErrorCode::InvalidDate,
            format!("{} must be a YYYY-MM-DD date", field.as_str()),
            value,
        )
    })
}

fn user_error_code(err: &UserValidationError) -> &'static str {
    match err {
        UserValidationError::EmptyId | UserValidationError::InvalidId => "invalid_uuid",
        UserValidationError::EmptyEmail => "empty_email",
        UserValidationError::EmailTooLong { .. } | UserValidationError::FullNameTooLong { .. } => {
            "too_long"
        }
        UserValidationError::InvalidEmail => "invalid_email",
        UserValidationError::EmptyFullName => "empty_full_name",
        UserValidationError::FullNameTooShort { .. } => "too_short",
        UserValidationError::FullNameInvalidCharacters => "invalid_characters",
        UserValidationError::InvalidPhone => "invalid_phone",
        UserValidationError::InvalidRole => "invalid_role",
        UserValidationError::InvalidProvider => "invalid_provider",
        UserValidationError::InvalidAvatarUrl => "invalid_url",
    }
}

/// Map a user field validation failure onto the HTTP error shape.
pub(crate) fn user_validation_error(err: UserValidationError) -> Error {
    field_error(err.field(), user_error_code(&err), &err)
}

fn extractor_error(code: &str, message: impl Display) -> actix_web::Error {
    Error::invalid_request(message.to_string())
        .with_details(json!({ "code": code }))
        .into()
}

/// JSON body decoding failures as `invalid_request` bodies.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| extractor_error("invalid_json", err))
}

/// Query string decoding failures as `invalid_request` bodies.
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| extractor_error("invalid_query", err))
}

/// Path segment decoding failures as `invalid_request` bodies.
pub fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err, _req| extractor_error("invalid_path", err))
}
