//! Booking, listing and status endpoints under `/api/appointments`

use axum::{extract::State, http::StatusCode};
use chrono::Utc;
use database_layer::{
    AppointmentQuery, AppointmentStatus, ConsultationType, Department, Medicine, PaymentMethod,
    Prescription, SortDirection,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;
use uuid::Uuid;
use workflow_engine::{parse_slot_time, BookingRequest};

use crate::error::{ApiError, ApiResponse, ApiResult};
use crate::handlers::{date_filter, page_request, parse_date, status_filter};
use crate::middleware::{AuthContext, DoctorAuth, PatientAuth};
use crate::server::MediBookServer;
use crate::types::{appointment_view, appointment_views, AppointmentView, PaginationInfo};
use crate::validation::{
    ApiQuery, FieldErrors, IdPath, OptionalValidJson, RequestValidation, ValidJson,
};
use crate::{validate_field, validate_max_length};

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BookAppointmentRequest {
    pub doctor_id: String,
    pub department: String,
    pub appointment_date: String,
    pub appointment_time: String,
    pub consultation_type: Option<String>,
    pub symptoms: Option<String>,
    pub notes: Option<String>,
    pub payment_method: Option<String>,
}

/// Parse an optional enum field, falling back to its default when absent
fn parse_or_default<T: FromStr + Default>(value: Option<&str>) -> Option<T> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Some(T::default()),
        Some(raw) => raw.parse().ok(),
    }
}

impl RequestValidation for BookAppointmentRequest {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        validate_field!(
            errors,
            "doctorId",
            Uuid::parse_str(self.doctor_id.trim()).is_ok(),
            "Valid doctor ID is required"
        );
        if self.department.trim().is_empty() {
            errors.check("department", false, "Department is required");
        } else {
            validate_field!(
                errors,
                "department",
                self.department.trim().parse::<Department>().is_ok(),
                "Valid department is required"
            );
        }
        validate_field!(
            errors,
            "appointmentDate",
            parse_date(&self.appointment_date).is_some(),
            "Valid appointment date is required"
        );
        if self.appointment_time.trim().is_empty() {
            errors.check("appointmentTime", false, "Appointment time is required");
        } else {
            validate_field!(
                errors,
                "appointmentTime",
                parse_slot_time(&self.appointment_time).is_ok(),
                "Appointment time must be in HH:MM format"
            );
        }
        validate_field!(
            errors,
            "consultationType",
            parse_or_default::<ConsultationType>(self.consultation_type.as_deref()).is_some(),
            "Valid consultation type is required"
        );
        validate_field!(
            errors,
            "paymentMethod",
            parse_or_default::<PaymentMethod>(self.payment_method.as_deref()).is_some(),
            "Valid payment method is required"
        );
        if let Some(symptoms) = &self.symptoms {
            validate_max_length!(errors, "symptoms", symptoms, 500, "Symptoms cannot exceed 500 characters");
        }
        if let Some(notes) = &self.notes {
            validate_max_length!(errors, "notes", notes, 1000, "Notes cannot exceed 1000 characters");
        }
        errors.into_result()
    }
}

impl BookAppointmentRequest {
    fn into_booking(self) -> Result<BookingRequest, ApiError> {
        let invalid = |field: &str| ApiError::validation(format!("Invalid {field}"));
        Ok(BookingRequest {
            doctor_id: Uuid::parse_str(self.doctor_id.trim()).map_err(|_| invalid("doctorId"))?,
            department: self.department.trim().parse().map_err(|_| invalid("department"))?,
            appointment_date: parse_date(&self.appointment_date).ok_or_else(|| invalid("appointmentDate"))?,
            appointment_time: self.appointment_time.trim().to_string(),
            consultation_type: parse_or_default(self.consultation_type.as_deref())
                .ok_or_else(|| invalid("consultationType"))?,
            symptoms: self.symptoms.filter(|s| !s.trim().is_empty()),
            notes: self.notes.filter(|s| !s.trim().is_empty()),
            payment_method: parse_or_default(self.payment_method.as_deref())
                .ok_or_else(|| invalid("paymentMethod"))?,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StatusUpdateRequest {
    pub status: String,
    pub cancellation_reason: Option<String>,
}

impl StatusUpdateRequest {
    fn target(&self) -> Option<AppointmentStatus> {
        self.status
            .trim()
            .parse::<AppointmentStatus>()
            .ok()
            .filter(|status| workflow_engine::status::doctor_may_set(*status))
    }
}

impl RequestValidation for StatusUpdateRequest {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        validate_field!(errors, "status", self.target().is_some(), "Valid status is required");
        if let Some(reason) = &self.cancellation_reason {
            validate_max_length!(
                errors,
                "cancellationReason",
                reason,
                300,
                "Cancellation reason cannot exceed 300 characters"
            );
        }
        errors.into_result()
    }
}

/// Medicines stay untyped until validated so a non-list gets a field error
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PrescriptionRequest {
    pub medicines: Value,
    pub advice: Option<String>,
    pub follow_up_date: Option<String>,
}

impl RequestValidation for PrescriptionRequest {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        match self.medicines.as_array() {
            None => errors.check("medicines", false, "Medicines must be an array"),
            Some(entries) => {
                for (i, entry) in entries.iter().enumerate() {
                    let filled = |key: &str| {
                        entry
                            .get(key)
                            .and_then(Value::as_str)
                            .is_some_and(|v| !v.trim().is_empty())
                    };
                    errors.check(&format!("medicines[{i}].name"), filled("name"), "Medicine name is required");
                    errors.check(&format!("medicines[{i}].dosage"), filled("dosage"), "Dosage is required");
                    errors.check(&format!("medicines[{i}].duration"), filled("duration"), "Duration is required");
                }
            }
        }
        if let Some(date) = self.follow_up_date.as_deref().filter(|d| !d.trim().is_empty()) {
            validate_field!(errors, "followUpDate", parse_date(date).is_some(), "Valid follow-up date is required");
        }
        errors.into_result()
    }
}

impl PrescriptionRequest {
    fn into_prescription(self) -> Result<Prescription, ApiError> {
        let medicines: Vec<Medicine> = serde_json::from_value(self.medicines)
            .map_err(|e| ApiError::validation(format!("Invalid medicines: {e}")))?;
        Ok(Prescription {
            medicines,
            advice: self.advice.filter(|a| !a.trim().is_empty()),
            follow_up_date: self.follow_up_date.as_deref().and_then(parse_date),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CancelRequest {
    pub reason: Option<String>,
}

impl RequestValidation for CancelRequest {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        if let Some(reason) = &self.reason {
            validate_max_length!(errors, "reason", reason, 300, "Cancellation reason cannot exceed 300 characters");
        }
        errors.into_result()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AppointmentListParams {
    pub status: Option<String>,
    pub date: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct AppointmentBody {
    pub appointment: AppointmentView,
}

#[derive(Debug, Serialize)]
pub struct AppointmentsBody {
    pub appointments: Vec<AppointmentView>,
}

async fn respond_with(server: &MediBookServer, appointment: database_layer::Appointment) -> Result<AppointmentBody, ApiError> {
    Ok(AppointmentBody {
        appointment: appointment_view(server.store.as_ref(), appointment).await?,
    })
}

async fn list(
    server: &MediBookServer,
    query: AppointmentQuery,
    params: &AppointmentListParams,
) -> ApiResult<AppointmentsBody> {
    let page = page_request(server, params.page, params.limit);
    let result = server.store.list_appointments(&query, page).await?;
    let appointments = appointment_views(server.store.as_ref(), result.items).await?;
    Ok(ApiResponse::paginated(
        AppointmentsBody { appointments },
        PaginationInfo::new(page, result.total),
    ))
}

pub async fn book_appointment(
    State(server): State<MediBookServer>,
    PatientAuth(auth): PatientAuth,
    ValidJson(request): ValidJson<BookAppointmentRequest>,
) -> Result<(StatusCode, ApiResponse<AppointmentBody>), ApiError> {
    let appointment = server
        .booking
        .book(auth.id(), request.into_booking()?, Utc::now())
        .await?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message(
            "Appointment booked successfully",
            respond_with(&server, appointment).await?,
        ),
    ))
}

/// The caller's appointments, latest first
pub async fn user_appointments(
    State(server): State<MediBookServer>,
    PatientAuth(auth): PatientAuth,
    ApiQuery(params): ApiQuery<AppointmentListParams>,
) -> ApiResult<AppointmentsBody> {
    let mut query = AppointmentQuery::for_patient(auth.id()).sorted(SortDirection::Descending);
    if let Some(status) = status_filter(params.status.as_deref())? {
        query = query.with_status(status);
    }
    list(&server, query, &params).await
}

/// The doctor's schedule, earliest first
pub async fn doctor_appointments(
    State(server): State<MediBookServer>,
    DoctorAuth(auth): DoctorAuth,
    ApiQuery(params): ApiQuery<AppointmentListParams>,
) -> ApiResult<AppointmentsBody> {
    let mut query = AppointmentQuery::for_doctor(auth.id()).sorted(SortDirection::Ascending);
    if let Some(status) = status_filter(params.status.as_deref())? {
        query = query.with_status(status);
    }
    if let Some(date) = date_filter(params.date.as_deref())? {
        query = query.on(date);
    }
    list(&server, query, &params).await
}

pub async fn get_appointment(
    State(server): State<MediBookServer>,
    auth: AuthContext,
    IdPath(id): IdPath,
) -> ApiResult<AppointmentBody> {
    let appointment = server.status.view(auth.id(), auth.role(), id).await?;
    Ok(ApiResponse::ok(respond_with(&server, appointment).await?))
}

pub async fn update_status(
    State(server): State<MediBookServer>,
    DoctorAuth(auth): DoctorAuth,
    IdPath(id): IdPath,
    ValidJson(request): ValidJson<StatusUpdateRequest>,
) -> ApiResult<AppointmentBody> {
    let target = request
        .target()
        .ok_or_else(|| ApiError::validation("Valid status is required"))?;
    let reason = request.cancellation_reason.filter(|r| !r.trim().is_empty());

    let appointment = server.status.doctor_update(auth.id(), id, target, reason).await?;

    Ok(ApiResponse::with_message(
        format!("Appointment {target} successfully"),
        respond_with(&server, appointment).await?,
    ))
}

pub async fn add_prescription(
    State(server): State<MediBookServer>,
    DoctorAuth(auth): DoctorAuth,
    IdPath(id): IdPath,
    ValidJson(request): ValidJson<PrescriptionRequest>,
) -> ApiResult<AppointmentBody> {
    let appointment = server
        .status
        .attach_prescription(auth.id(), id, request.into_prescription()?)
        .await?;

    Ok(ApiResponse::with_message(
        "Prescription added successfully",
        respond_with(&server, appointment).await?,
    ))
}

/// Body is optional; without a reason the default one is recorded
pub async fn cancel_appointment(
    State(server): State<MediBookServer>,
    PatientAuth(auth): PatientAuth,
    IdPath(id): IdPath,
    OptionalValidJson(body): OptionalValidJson<CancelRequest>,
) -> ApiResult<AppointmentBody> {
    let reason = body.and_then(|request| request.reason);
    let appointment = server.status.patient_cancel(auth.id(), id, reason).await?;

    Ok(ApiResponse::with_message(
        "Appointment cancelled successfully",
        respond_with(&server, appointment).await?,
    ))
}
