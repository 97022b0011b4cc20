//! HTTP handlers, one module per route group

pub mod admin;
pub mod appointments;
pub mod auth;
pub mod doctors;
pub mod health;
pub mod users;

use chrono::{DateTime, NaiveDate, Utc};
use database_layer::{AppointmentStatus, ConflictProbe, Identity, PageRequest, Role};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{ApiError, ApiResponse, NoPayload};
use crate::server::MediBookServer;
use crate::types::PaginationParams;
use crate::validation::{FieldErrors, RequestValidation};
use crate::{validate_field, validate_required};

pub const CONTACT_TAKEN: &str = "Email or phone already exists";

/// `YYYY-MM-DD`, or the date part of an RFC 3339 timestamp
pub(crate) fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|at| at.date_naive()))
}

/// Optional `?status=` filter; blank means no filter
pub(crate) fn status_filter(value: Option<&str>) -> Result<Option<AppointmentStatus>, ApiError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| ApiError::validation(format!("Invalid status filter '{raw}'"))),
    }
}

/// Optional `?date=` filter; blank means no filter
pub(crate) fn date_filter(value: Option<&str>) -> Result<Option<NaiveDate>, ApiError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(raw) => parse_date(raw)
            .map(Some)
            .ok_or_else(|| ApiError::validation(format!("Invalid date filter '{raw}'"))),
    }
}

/// Current calendar date at the clinic
pub(crate) fn clinic_today(server: &MediBookServer) -> NaiveDate {
    Utc::now().with_timezone(&server.config.offset()).date_naive()
}

pub(crate) fn page_request(server: &MediBookServer, page: Option<u32>, limit: Option<u32>) -> PageRequest {
    let booking = &server.config.booking;
    PaginationParams { page, limit }.to_request(booking.default_page_size, booking.max_page_size)
}

/// Fail with `message` unless `email`/`phone` are free among `role`, ignoring `owner`
pub(crate) async fn ensure_contact_free(
    server: &MediBookServer,
    role: Role,
    owner: Uuid,
    email: Option<&str>,
    phone: Option<&str>,
    message: &'static str,
) -> Result<(), ApiError> {
    if email.is_none() && phone.is_none() {
        return Ok(());
    }
    let probe = ConflictProbe {
        email,
        phone,
        registration_number: None,
        exclude_id: Some(owner),
    };
    match server.store.find_conflicting_identity(role, &probe).await? {
        Some(_) => Err(ApiError::conflict(message)),
        None => Ok(()),
    }
}

/// Persist `identity`, reporting a vanished record as `missing`
pub(crate) async fn save_identity(
    server: &MediBookServer,
    identity: &Identity,
    missing: &'static str,
) -> Result<Identity, ApiError> {
    server
        .store
        .save_identity(identity)
        .await
        .map_err(self::auth::duplicate_as(CONTACT_TAKEN))?
        .ok_or_else(|| ApiError::not_found(missing))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PasswordChangeRequest {
    pub current_password: String,
    pub new_password: String,
}

impl RequestValidation for PasswordChangeRequest {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        validate_required!(errors, "currentPassword", self.current_password, "Current password is required");
        validate_field!(
            errors,
            "newPassword",
            self.new_password.chars().count() >= auth::MIN_PASSWORD_LEN,
            "New password must be at least 6 characters long"
        );
        errors.into_result()
    }
}

/// Verify the current password and store a hash of the new one
pub(crate) async fn change_password(
    server: &MediBookServer,
    mut identity: Identity,
    request: PasswordChangeRequest,
) -> Result<ApiResponse<NoPayload>, ApiError> {
    if !server
        .passwords
        .verify(&request.current_password, &identity.password_hash)
        .await?
    {
        return Err(ApiError::validation("Current password is incorrect"));
    }

    identity.password_hash = server.passwords.hash(&request.new_password).await?;
    identity.updated_at = Utc::now();
    save_identity(server, &identity, "User not found").await?;

    tracing::info!(identity_id = %identity.id, role = %identity.role(), "Password updated");
    Ok(ApiResponse::message("Password updated successfully"))
}
