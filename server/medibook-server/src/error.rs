use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use database_layer::DatabaseError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{error, warn};
use uuid::Uuid;
use workflow_engine::WorkflowError;

use crate::auth::{PasswordError, TokenError};
use crate::types::PaginationInfo;

/// Message returned for every internal failure; the cause only goes to the log
pub const INTERNAL_ERROR_MESSAGE: &str = "Server error. Please try again later.";

/// Error body returned by every failing endpoint
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorResponse {
    /// Always `false`
    pub success: bool,
    /// Human-readable error message
    pub message: String,
    /// Error type/code
    pub error_type: String,
    /// Unique error ID, also present in the log line
    pub error_id: String,
    /// Field-specific validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<HashMap<String, Vec<String>>>,
}

/// Success envelope: `{ success, message?, <payload fields>, pagination? }`
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PaginationInfo>,
}

/// Payload for responses that only carry a message
#[derive(Debug, Serialize)]
pub struct NoPayload {}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data,
            pagination: None,
        }
    }

    pub fn with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data,
            pagination: None,
        }
    }

    pub fn paginated(data: T, pagination: PaginationInfo) -> Self {
        Self {
            success: true,
            message: None,
            data,
            pagination: Some(pagination),
        }
    }
}

impl ApiResponse<NoPayload> {
    pub fn message(message: impl Into<String>) -> Self {
        Self::with_message(message, NoPayload {})
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

pub type ApiResult<T> = Result<ApiResponse<T>, ApiError>;

/// Main API error enum
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{message}")]
    Validation {
        message: String,
        field_errors: Option<HashMap<String, Vec<String>>>,
    },

    #[error("{message}")]
    Authentication { message: String },

    #[error("{message}")]
    Authorization { message: String },

    #[error("{message}")]
    NotFound { message: String },

    #[error("{message}")]
    Conflict { message: String },

    #[error("{message}")]
    BadRequest { message: String },

    #[error("Internal server error: {message}")]
    Internal { message: String },
}

impl ApiError {
    /// Create a validation error with field-specific errors
    pub fn validation_with_fields(
        message: impl Into<String>,
        field_errors: HashMap<String, Vec<String>>,
    ) -> Self {
        Self::Validation {
            message: message.into(),
            field_errors: Some(field_errors),
        }
    }

    /// Create a simple validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field_errors: None,
        }
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    pub fn authorization(message: impl Into<String>) -> Self {
        Self::Authorization {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } | ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Authentication { .. } => StatusCode::UNAUTHORIZED,
            ApiError::Authorization { .. } => StatusCode::FORBIDDEN,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error type string
    pub fn error_type(&self) -> &'static str {
        match self {
            ApiError::Validation { .. } => "validation_error",
            ApiError::Authentication { .. } => "authentication_error",
            ApiError::Authorization { .. } => "authorization_error",
            ApiError::NotFound { .. } => "not_found",
            ApiError::Conflict { .. } => "conflict",
            ApiError::BadRequest { .. } => "bad_request",
            ApiError::Internal { .. } => "internal_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error_id = Uuid::new_v4().to_string();
        let status_code = self.status_code();

        if status_code.is_server_error() {
            error!(
                error_id = %error_id,
                error_type = %self.error_type(),
                status_code = %status_code.as_u16(),
                error = %self,
                "API error occurred"
            );
        } else {
            warn!(
                error_id = %error_id,
                error_type = %self.error_type(),
                status_code = %status_code.as_u16(),
                error = %self,
                "Request rejected"
            );
        }

        let error_type = self.error_type().to_string();
        let (message, errors) = match self {
            ApiError::Validation {
                message,
                field_errors,
            } => (message, field_errors),
            ApiError::Internal { .. } => (INTERNAL_ERROR_MESSAGE.to_string(), None),
            other => (other.to_string(), None),
        };

        let body = ApiErrorResponse {
            success: false,
            message,
            error_type,
            error_id,
            errors,
        };

        (status_code, Json(body)).into_response()
    }
}

impl From<WorkflowError> for ApiError {
    fn from(err: WorkflowError) -> Self {
        let message = err.to_string();
        match err {
            WorkflowError::DoctorNotFound | WorkflowError::AppointmentNotFound => {
                ApiError::not_found(message)
            }
            WorkflowError::DoctorUnavailable
            | WorkflowError::NotInFuture
            | WorkflowError::InvalidSlotTime(_)
            | WorkflowError::InvalidStatus(_) => ApiError::validation(message),
            WorkflowError::SlotTaken | WorkflowError::NotCancellable => ApiError::conflict(message),
            WorkflowError::NotOwner { .. } => ApiError::authorization(message),
            WorkflowError::Store(db) => db.into(),
        }
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::SlotTaken => WorkflowError::SlotTaken.into(),
            DatabaseError::UniqueViolation { constraint } => {
                warn!(constraint = %constraint, "Unique constraint hit after pre-check");
                ApiError::conflict("A record with these details already exists")
            }
            other => ApiError::internal(other.to_string()),
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Rejected(_) => ApiError::authentication("Invalid token."),
            TokenError::Signing(e) => ApiError::internal(format!("Token signing failed: {e}")),
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::internal(err.to_string())
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::internal(format!("{err:#}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use database_layer::AppointmentStatus;

    #[test]
    fn test_workflow_errors_map_to_statuses() {
        let cases = [
            (WorkflowError::DoctorNotFound, StatusCode::NOT_FOUND),
            (WorkflowError::DoctorUnavailable, StatusCode::BAD_REQUEST),
            (WorkflowError::NotInFuture, StatusCode::BAD_REQUEST),
            (WorkflowError::SlotTaken, StatusCode::CONFLICT),
            (WorkflowError::NotCancellable, StatusCode::CONFLICT),
            (WorkflowError::NotOwner { action: "update" }, StatusCode::FORBIDDEN),
            (
                WorkflowError::InvalidStatus(AppointmentStatus::Pending),
                StatusCode::BAD_REQUEST,
            ),
            (WorkflowError::Store(DatabaseError::SlotTaken), StatusCode::CONFLICT),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status_code(), status);
        }
    }

    #[test]
    fn test_slot_taken_keeps_booking_message() {
        let err = ApiError::from(DatabaseError::SlotTaken);
        assert_eq!(
            err.to_string(),
            "This time slot is already booked. Please choose another time."
        );
    }

    #[test]
    fn test_internal_errors_hide_cause() {
        let response = ApiError::internal("connection reset by peer").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_success_envelope_flattens_payload() {
        #[derive(Serialize)]
        struct Body {
            doctor: &'static str,
        }
        let json = serde_json::to_value(ApiResponse::with_message("Done", Body { doctor: "x" })).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "Done");
        assert_eq!(json["doctor"], "x");
        assert!(json.get("pagination").is_none());

        let json = serde_json::to_value(ApiResponse::message("Only text")).unwrap();
        assert_eq!(json, serde_json::json!({"success": true, "message": "Only text"}));
    }
}
