//! Public doctor directory and doctor self-service under `/api/doctors`

use axum::extract::State;
use chrono::Utc;
use database_layer::{
    AppointmentQuery, AppointmentStatus, AvailabilityWindow, Identity, IdentityQuery, IdentitySort,
    Role,
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use workflow_engine::parse_slot_time;

use crate::error::{ApiError, ApiResponse, ApiResult, NoPayload};
use crate::handlers::auth::{normalize_email, DoctorBody};
use crate::handlers::{
    change_password, clinic_today, ensure_contact_free, page_request, save_identity,
    PasswordChangeRequest, CONTACT_TAKEN,
};
use crate::middleware::{DoctorAuth, OptionalAuth};
use crate::server::MediBookServer;
use crate::types::{IdentityWithStats, PaginationInfo};
use crate::validation::{ApiQuery, FieldErrors, IdPath, RequestValidation, ValidJson};
use crate::{validate_email, validate_field, validate_max_length, validate_phone};

pub const DOCTOR_NOT_FOUND: &str = "Doctor not found";

const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DoctorDirectoryParams {
    pub specialization: Option<String>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct DoctorsBody {
    pub doctors: Vec<Identity>,
}

#[derive(Debug, Serialize)]
pub struct DoctorDetailBody {
    pub doctor: IdentityWithStats,
}

#[derive(Debug, Serialize)]
pub struct SpecializationsBody {
    pub specializations: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityBody {
    pub availability: Vec<AvailabilityWindow>,
    pub doctor_name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorDashboardStats {
    pub today_appointments: i64,
    pub total_appointments: i64,
    pub completed_appointments: i64,
}

#[derive(Debug, Serialize)]
pub struct DoctorProfileBody {
    pub doctor: Identity,
    pub stats: DoctorDashboardStats,
}

/// Every field is optional; absent fields are left as they are
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdateDoctorProfileRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub consultation_fee: Option<f64>,
    pub availability: Option<Vec<AvailabilityWindow>>,
}

fn window_is_valid(window: &AvailabilityWindow) -> bool {
    let (Ok(start), Ok(end)) = (parse_slot_time(&window.start_time), parse_slot_time(&window.end_time)) else {
        return false;
    };
    WEEKDAYS.contains(&window.day.as_str()) && start < end
}

impl RequestValidation for UpdateDoctorProfileRequest {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        if let Some(name) = &self.name {
            validate_field!(errors, "name", !name.trim().is_empty(), "Name cannot be empty");
        }
        if let Some(phone) = &self.phone {
            validate_phone!(errors, "phone", phone, "Please enter a valid 10-digit phone number");
        }
        if let Some(email) = &self.email {
            validate_email!(errors, "email", email, "Please enter a valid email");
        }
        if let Some(bio) = &self.bio {
            validate_max_length!(errors, "bio", bio, 1000, "Bio cannot exceed 1000 characters");
        }
        if let Some(fee) = self.consultation_fee {
            validate_field!(
                errors,
                "consultationFee",
                fee.is_finite() && fee >= 0.0,
                "Consultation fee must be positive"
            );
        }
        if let Some(windows) = &self.availability {
            for (i, window) in windows.iter().enumerate() {
                errors.check(
                    &format!("availability[{i}]"),
                    window_is_valid(window),
                    "Availability needs a weekday and a start time before the end time",
                );
            }
        }
        errors.into_result()
    }
}

async fn load_doctor(server: &MediBookServer, id: uuid::Uuid) -> Result<Identity, ApiError> {
    server
        .store
        .find_identity(id)
        .await?
        .filter(|identity| identity.role() == Role::Doctor)
        .ok_or_else(|| ApiError::not_found(DOCTOR_NOT_FOUND))
}

/// Approved, active doctors, best rated first
pub async fn list_doctors(
    State(server): State<MediBookServer>,
    OptionalAuth(viewer): OptionalAuth,
    ApiQuery(params): ApiQuery<DoctorDirectoryParams>,
) -> ApiResult<DoctorsBody> {
    let mut query = IdentityQuery::new(Role::Doctor).active(true).approved(true);
    query.specialization = params.specialization.filter(|s| !s.trim().is_empty());
    query.search = params.search.filter(|s| !s.trim().is_empty());
    query.sort = IdentitySort::TopRated;

    let page = page_request(&server, params.page, params.limit);
    let result = server.store.list_identities(&query, page).await?;

    debug!(
        viewer = ?viewer.as_ref().map(|auth| auth.id()),
        results = result.items.len(),
        "Doctor directory listed"
    );

    Ok(ApiResponse::paginated(
        DoctorsBody { doctors: result.items },
        PaginationInfo::new(page, result.total),
    ))
}

pub async fn specializations(State(server): State<MediBookServer>) -> ApiResult<SpecializationsBody> {
    let specializations = server.store.distinct_specializations().await?;
    Ok(ApiResponse::ok(SpecializationsBody { specializations }))
}

pub async fn availability(
    State(server): State<MediBookServer>,
    IdPath(id): IdPath,
) -> ApiResult<AvailabilityBody> {
    let doctor = load_doctor(&server, id).await?;
    let availability = doctor
        .doctor()
        .map(|profile| profile.availability.clone())
        .unwrap_or_default();

    Ok(ApiResponse::ok(AvailabilityBody {
        availability,
        doctor_name: doctor.name,
    }))
}

pub async fn get_doctor(
    State(server): State<MediBookServer>,
    IdPath(id): IdPath,
) -> ApiResult<DoctorDetailBody> {
    let identity = load_doctor(&server, id).await?;
    let appointment_stats = server
        .store
        .status_counts(&AppointmentQuery::for_doctor(id))
        .await?;

    Ok(ApiResponse::ok(DoctorDetailBody {
        doctor: IdentityWithStats {
            identity,
            appointment_stats,
        },
    }))
}

pub async fn get_profile(
    State(server): State<MediBookServer>,
    DoctorAuth(auth): DoctorAuth,
) -> ApiResult<DoctorProfileBody> {
    let id = auth.id();
    let today = server
        .store
        .count_appointments(&AppointmentQuery::for_doctor(id).on(clinic_today(&server)))
        .await?;
    let counts = server
        .store
        .status_counts(&AppointmentQuery::for_doctor(id))
        .await?;

    Ok(ApiResponse::ok(DoctorProfileBody {
        doctor: auth.identity,
        stats: DoctorDashboardStats {
            today_appointments: today,
            total_appointments: counts.total,
            completed_appointments: counts.get(AppointmentStatus::Completed),
        },
    }))
}

pub async fn update_profile(
    State(server): State<MediBookServer>,
    DoctorAuth(auth): DoctorAuth,
    ValidJson(request): ValidJson<UpdateDoctorProfileRequest>,
) -> ApiResult<DoctorBody> {
    let email = request.email.as_deref().map(normalize_email);
    let phone = request.phone.as_deref().map(str::trim);
    ensure_contact_free(&server, Role::Doctor, auth.id(), email.as_deref(), phone, CONTACT_TAKEN).await?;

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
    if let Some(profile) = identity.doctor_mut() {
        if let Some(bio) = request.bio {
            profile.bio = Some(bio);
        }
        if let Some(fee) = request.consultation_fee {
            profile.consultation_fee = fee;
        }
        if let Some(availability) = request.availability {
            profile.availability = availability;
        }
    }
    identity.updated_at = Utc::now();

    let doctor = save_identity(&server, &identity, DOCTOR_NOT_FOUND).await?;
    debug!(doctor_id = %doctor.id, "Doctor profile updated");

    Ok(ApiResponse::with_message(
        "Profile updated successfully",
        DoctorBody { doctor },
    ))
}

pub async fn update_password(
    State(server): State<MediBookServer>,
    DoctorAuth(auth): DoctorAuth,
    ValidJson(request): ValidJson<PasswordChangeRequest>,
) -> ApiResult<NoPayload> {
    change_password(&server, auth.identity, request).await
}
