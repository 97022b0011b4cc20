//! Request validation utilities for consistent validation across handlers
//!
//! Request bodies implement [`RequestValidation`] and are extracted with
//! [`ValidJson`], which rejects malformed JSON as a bad request and failed
//! checks as a validation error carrying every offending field:
//!
//! ```json
//! { "success": false, "message": "Validation failed",
//!   "errors": { "email": ["Please enter a valid email"] } }
//! ```
//!
//! The `validate_*!` macros append to a [`FieldErrors`] collector so one
//! response reports all problems at once.

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::ApiError;

pub const VALIDATION_FAILED: &str = "Validation failed";

/// Matches axum's default body limit for `Json`
const OPTIONAL_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Trait for validating request payloads
pub trait RequestValidation {
    /// Returns a validation error listing every failed field
    fn validate(&self) -> Result<(), ApiError>;
}

/// Per-field validation messages, in the order they were found
#[derive(Debug, Default)]
pub struct FieldErrors {
    errors: HashMap<String, Vec<String>>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `message` against `field` unless `ok`
    pub fn check(&mut self, field: &str, ok: bool, message: &str) {
        if !ok {
            self.errors
                .entry(field.to_string())
                .or_default()
                .push(message.to_string());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_result(self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::validation_with_fields(VALIDATION_FAILED, self.errors))
        }
    }
}

pub fn is_valid_email(value: &str) -> bool {
    let Some((local, domain)) = value.trim().split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && domain.contains('.')
        && !value.chars().any(char::is_whitespace)
}

/// Exactly ten ASCII digits
pub fn is_valid_phone(value: &str) -> bool {
    value.len() == 10 && value.bytes().all(|b| b.is_ascii_digit())
}

/// Record an error for `$field` when `$predicate` is false
///
/// ```rust,ignore
/// validate_field!(errors, "experience", self.experience <= 50, "Experience must be between 0 and 50 years");
/// ```
#[macro_export]
macro_rules! validate_field {
    ($errors:expr, $field:expr, $predicate:expr, $message:expr) => {
        $errors.check($field, $predicate, $message)
    };
}

/// Non-blank string
#[macro_export]
macro_rules! validate_required {
    ($errors:expr, $field:expr, $value:expr, $message:expr) => {
        $crate::validate_field!($errors, $field, !$value.trim().is_empty(), $message)
    };
}

/// Character count between `$min` and `$max`
#[macro_export]
macro_rules! validate_length {
    ($errors:expr, $field:expr, $value:expr, $min:expr, $max:expr, $message:expr) => {{
        let len = $value.chars().count();
        $crate::validate_field!($errors, $field, len >= $min && len <= $max, $message)
    }};
}

/// At most `$max` characters
#[macro_export]
macro_rules! validate_max_length {
    ($errors:expr, $field:expr, $value:expr, $max:expr, $message:expr) => {
        $crate::validate_field!($errors, $field, $value.chars().count() <= $max, $message)
    };
}

#[macro_export]
macro_rules! validate_email {
    ($errors:expr, $field:expr, $value:expr, $message:expr) => {
        $crate::validate_field!($errors, $field, $crate::validation::is_valid_email(&$value), $message)
    };
}

#[macro_export]
macro_rules! validate_phone {
    ($errors:expr, $field:expr, $value:expr, $message:expr) => {
        $crate::validate_field!($errors, $field, $crate::validation::is_valid_phone(&$value), $message)
    };
}

/// Inclusive numeric range
#[macro_export]
macro_rules! validate_range {
    ($errors:expr, $field:expr, $value:expr, $min:expr, $max:expr, $message:expr) => {
        $crate::validate_field!($errors, $field, ($min..=$max).contains(&$value), $message)
    };
}

/// JSON body that has passed [`RequestValidation`]
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + RequestValidation,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
        value.validate()?;
        Ok(Self(value))
    }
}

/// Like [`ValidJson`], but an empty body yields `None`.
///
/// A body that is present must still parse and validate; axum's
/// `Option<Json<T>>` would swallow those rejections.
pub struct OptionalValidJson<T>(pub Option<T>);

#[async_trait]
impl<S, T> FromRequest<S> for OptionalValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + RequestValidation,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let (parts, body) = req.into_parts();
        let bytes = to_bytes(body, OPTIONAL_BODY_LIMIT)
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to read request body: {e}")))?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self(None));
        }

        let req = Request::from_parts(parts, Body::from(bytes));
        let ValidJson(value) = ValidJson::<T>::from_request(req, state).await?;
        Ok(Self(Some(value)))
    }
}

/// Query string with parse failures reported in the API error envelope
pub struct ApiQuery<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// `:id` path segment parsed as a UUID
pub struct IdPath(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for IdPath
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<Uuid>::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::bad_request("Invalid id"))?;
        Ok(Self(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestRequest {
        name: String,
        email: String,
        phone: String,
        experience: i64,
    }

    impl RequestValidation for TestRequest {
        fn validate(&self) -> Result<(), ApiError> {
            let mut errors = FieldErrors::new();
            validate_required!(errors, "name", self.name, "Name is required");
            validate_length!(errors, "name", self.name, 2, 100, "Name must be between 2 and 100 characters");
            validate_email!(errors, "email", self.email, "Please enter a valid email");
            validate_phone!(errors, "phone", self.phone, "Please enter a valid 10-digit phone number");
            validate_range!(errors, "experience", self.experience, 0, 50, "Experience must be between 0 and 50 years");
            errors.into_result()
        }
    }

    fn valid() -> TestRequest {
        TestRequest {
            name: "Asha Rao".to_string(),
            email: "asha@example.com".to_string(),
            phone: "9876543210".to_string(),
            experience: 12,
        }
    }

    #[test]
    fn test_validation_success() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn test_all_failures_are_collected() {
        let request = TestRequest {
            name: " ".to_string(),
            email: "asha@".to_string(),
            phone: "12345".to_string(),
            experience: 51,
        };
        match request.validate() {
            Err(ApiError::Validation {
                message,
                field_errors: Some(fields),
            }) => {
                assert_eq!(message, VALIDATION_FAILED);
                assert_eq!(fields.len(), 4);
                assert_eq!(fields["name"].len(), 2);
                assert_eq!(fields["experience"], vec!["Experience must be between 0 and 50 years"]);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_email_and_phone_shapes() {
        assert!(is_valid_email("a.b@clinic.co.in"));
        assert!(!is_valid_email("no-at-sign.com"));
        assert!(!is_valid_email("user@localhost"));
        assert!(!is_valid_email("us er@example.com"));
        assert!(is_valid_phone("0123456789"));
        assert!(!is_valid_phone("+911234567890"));
        assert!(!is_valid_phone("12345abcde"));
    }

    #[derive(Debug, serde::Deserialize)]
    struct NoteRequest {
        note: String,
    }

    impl RequestValidation for NoteRequest {
        fn validate(&self) -> Result<(), ApiError> {
            let mut errors = FieldErrors::new();
            validate_max_length!(errors, "note", self.note, 5, "Note is too long");
            errors.into_result()
        }
    }

    async fn optional_note(body: &'static str) -> Result<Option<NoteRequest>, ApiError> {
        let req = Request::builder()
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap();
        OptionalValidJson::<NoteRequest>::from_request(req, &())
            .await
            .map(|OptionalValidJson(value)| value)
    }

    #[tokio::test]
    async fn test_optional_body_empty_is_none() {
        assert!(optional_note("").await.unwrap().is_none());
        assert!(optional_note("  \n").await.unwrap().is_none());
        assert_eq!(optional_note(r#"{"note":"hi"}"#).await.unwrap().unwrap().note, "hi");
    }

    #[tokio::test]
    async fn test_optional_body_still_rejects_bad_input() {
        assert!(matches!(
            optional_note(r#"{"note":"#).await,
            Err(ApiError::BadRequest { .. })
        ));
        assert!(matches!(
            optional_note(r#"{"note":"far too long"}"#).await,
            Err(ApiError::Validation { .. })
        ));
    }
}
