//! Patient self-service under `/api/users`

use axum::extract::State;
use chrono::{NaiveDate, Utc};
use database_layer::{Address, AppointmentQuery, AppointmentStatus, Identity, Role};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ApiError, ApiResponse, ApiResult, NoPayload};
use crate::handlers::auth::normalize_email;
use crate::handlers::{
    change_password, clinic_today, ensure_contact_free, save_identity, PasswordChangeRequest,
    CONTACT_TAKEN,
};
use crate::middleware::PatientAuth;
use crate::server::MediBookServer;
use crate::validation::{FieldErrors, RequestValidation, ValidJson};
use crate::{validate_email, validate_field, validate_length, validate_phone, validate_required};

pub const USER_NOT_FOUND: &str = "User not found";

const GENDERS: [&str; 3] = ["male", "female", "other"];

#[derive(Debug, Serialize)]
pub struct UserBody {
    pub user: Identity,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdateUserProfileRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub address: Option<Address>,
    pub medical_history: Option<Vec<String>>,
}

impl RequestValidation for UpdateUserProfileRequest {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        if let Some(name) = &self.name {
            validate_length!(errors, "name", name.trim(), 1, 100, "Name must be between 1 and 100 characters");
        }
        if let Some(phone) = &self.phone {
            validate_phone!(errors, "phone", phone, "Please enter a valid 10-digit phone number");
        }
        if let Some(email) = &self.email {
            validate_email!(errors, "email", email, "Please enter a valid email");
        }
        if let Some(gender) = &self.gender {
            validate_field!(
                errors,
                "gender",
                GENDERS.contains(&gender.to_lowercase().as_str()),
                "Gender must be male, female or other"
            );
        }
        errors.into_result()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AvatarRequest {
    pub avatar: String,
}

impl RequestValidation for AvatarRequest {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        validate_required!(errors, "avatar", self.avatar, "Avatar URL is required");
        errors.into_result()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientStats {
    pub total_appointments: i64,
    pub upcoming_appointments: i64,
    pub completed_appointments: i64,
    pub cancelled_appointments: i64,
}

#[derive(Debug, Serialize)]
pub struct StatsBody {
    pub stats: PatientStats,
}

pub async fn get_profile(PatientAuth(auth): PatientAuth) -> ApiResult<UserBody> {
    Ok(ApiResponse::ok(UserBody { user: auth.identity }))
}

pub async fn update_profile(
    State(server): State<MediBookServer>,
    PatientAuth(auth): PatientAuth,
    ValidJson(request): ValidJson<UpdateUserProfileRequest>,
) -> ApiResult<UserBody> {
    let email = request.email.as_deref().map(normalize_email);
    let phone = request.phone.as_deref().map(str::trim);
    ensure_contact_free(&server, Role::Patient, auth.id(), email.as_deref(), phone, CONTACT_TAKEN).await?;

    let mut identity = auth.identity;
    if let Some(name) = request.name {
        identity.name = name.trim().to_string();
    }
    if let Some(email) = email {
        identity.email = email;
    }
    if let Some(phone) = phone {
        identity.phone = Some(phone.to_string());
    }
    if let Some(profile) = identity.patient_mut() {
        if request.date_of_birth.is_some() {
            profile.date_of_birth = request.date_of_birth;
        }
        if let Some(gender) = request.gender {
            profile.gender = Some(gender.to_lowercase());
        }
        if request.address.is_some() {
            profile.address = request.address;
        }
        if let Some(history) = request.medical_history {
            profile.medical_history = history;
        }
    }
    identity.updated_at = Utc::now();

    let user = save_identity(&server, &identity, USER_NOT_FOUND).await?;
    debug!(patient_id = %user.id, "Patient profile updated");

    Ok(ApiResponse::with_message("Profile updated successfully", UserBody { user }))
}

pub async fn update_password(
    State(server): State<MediBookServer>,
    PatientAuth(auth): PatientAuth,
    ValidJson(request): ValidJson<PasswordChangeRequest>,
) -> ApiResult<NoPayload> {
    change_password(&server, auth.identity, request).await
}

pub async fn update_avatar(
    State(server): State<MediBookServer>,
    PatientAuth(auth): PatientAuth,
    ValidJson(request): ValidJson<AvatarRequest>,
) -> ApiResult<UserBody> {
    let mut identity = auth.identity;
    identity.avatar = Some(request.avatar.trim().to_string());
    identity.updated_at = Utc::now();

    let user = save_identity(&server, &identity, USER_NOT_FOUND).await?;
    Ok(ApiResponse::with_message("Avatar updated successfully", UserBody { user }))
}

/// Appointment counts for the caller; upcoming means pending or approved from today on
pub async fn stats(
    State(server): State<MediBookServer>,
    PatientAuth(auth): PatientAuth,
) -> ApiResult<StatsBody> {
    let id = auth.id();
    let counts = server
        .store
        .status_counts(&AppointmentQuery::for_patient(id))
        .await?;

    let upcoming = AppointmentQuery::for_patient(id)
        .with_status(AppointmentStatus::Pending)
        .with_status(AppointmentStatus::Approved)
        .starting(clinic_today(&server));
    let upcoming_appointments = server.store.count_appointments(&upcoming).await?;

    Ok(ApiResponse::ok(StatsBody {
        stats: PatientStats {
            total_appointments: counts.total,
            upcoming_appointments,
            completed_appointments: counts.get(AppointmentStatus::Completed),
            cancelled_appointments: counts.get(AppointmentStatus::Cancelled),
        },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_update_validation() {
        let request = UpdateUserProfileRequest {
            phone: Some("12345".to_string()),
            gender: Some("Female".to_string()),
            ..Default::default()
        };
        let Err(ApiError::Validation { field_errors: Some(fields), .. }) = request.validate() else {
            panic!("expected validation failure");
        };
        assert!(fields.contains_key("phone"));
        assert!(!fields.contains_key("gender"));
    }

    #[test]
    fn test_avatar_is_required() {
        assert!(AvatarRequest::default().validate().is_err());
        let request = AvatarRequest {
            avatar: "https://cdn.clinic.org/a.png".to_string(),
        };
        assert!(request.validate().is_ok());
    }
}
