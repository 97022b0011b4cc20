//! Administration endpoints under `/api/admin`
//!
//! Every handler takes [`AdminAuth`], so the whole route group is closed to
//! patients and doctors. Account deletion cascades to the appointments that
//! reference the account.

use axum::extract::State;
use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, TimeZone, Utc};
use database_layer::{
    AppointmentQuery, Identity, IdentityQuery, Role, SortDirection, StatusCounts,
};
use logger_redacted::redacted_info;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::field::display;
use uuid::Uuid;

use crate::error::{ApiError, ApiResponse, ApiResult, NoPayload};
use crate::handlers::appointments::{AppointmentBody, AppointmentsBody};
use crate::handlers::auth::DoctorBody;
use crate::handlers::doctors::{DoctorsBody, DOCTOR_NOT_FOUND};
use crate::handlers::users::{UserBody, USER_NOT_FOUND};
use crate::handlers::{clinic_today, date_filter, page_request, save_identity, status_filter};
use crate::middleware::AdminAuth;
use crate::server::MediBookServer;
use crate::types::{appointment_view, appointment_views, IdentityWithStats, PaginationInfo};
use crate::validation::{ApiQuery, FieldErrors, IdPath, RequestValidation, ValidJson};
use crate::validate_field;

// =============================================================================
// STATS
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total: i64,
    pub new_this_month: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorStats {
    pub total: i64,
    pub pending: i64,
    pub new_this_month: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentStats {
    pub total: i64,
    pub today: i64,
    pub by_status: StatusCounts,
}

#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub users: UserStats,
    pub doctors: DoctorStats,
    pub appointments: AppointmentStats,
}

#[derive(Debug, Serialize)]
pub struct StatsBody {
    pub stats: DashboardStats,
}

/// Midnight on the first day of `today`'s month at the clinic, as an instant
fn month_start(server: &MediBookServer, today: NaiveDate) -> DateTime<Utc> {
    let first = today.with_day(1).unwrap_or(today).and_time(NaiveTime::MIN);
    server
        .config
        .offset()
        .from_local_datetime(&first)
        .single()
        .map_or_else(|| Utc.from_utc_datetime(&first), |at| at.with_timezone(&Utc))
}

pub async fn stats(
    State(server): State<MediBookServer>,
    AdminAuth(_admin): AdminAuth,
) -> ApiResult<StatsBody> {
    let store = server.store.as_ref();
    let today = clinic_today(&server);
    let since = month_start(&server, today);

    let patient_query = IdentityQuery::new(Role::Patient);
    let doctor_query = IdentityQuery::new(Role::Doctor);

    let users = UserStats {
        total: store.count_identities(&patient_query.clone().active(true)).await?,
        new_this_month: store.count_identities(&patient_query.created_since(since)).await?,
    };
    let doctors = DoctorStats {
        total: store
            .count_identities(&doctor_query.clone().approved(true).active(true))
            .await?,
        pending: store.count_identities(&doctor_query.clone().approved(false)).await?,
        new_this_month: store.count_identities(&doctor_query.created_since(since)).await?,
    };

    let by_status = store.status_counts(&AppointmentQuery::default()).await?;
    let appointments = AppointmentStats {
        total: by_status.total,
        today: store
            .count_appointments(&AppointmentQuery::default().on(today))
            .await?,
        by_status,
    };

    Ok(ApiResponse::ok(StatsBody {
        stats: DashboardStats {
            users,
            doctors,
            appointments,
        },
    }))
}

// =============================================================================
// ACCOUNTS
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AccountListParams {
    pub status: Option<String>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct UsersBody {
    pub users: Vec<Identity>,
}

#[derive(Debug, Serialize)]
pub struct UserDetailBody {
    pub user: IdentityWithStats,
}

#[derive(Debug, Serialize)]
pub struct DoctorDetailBody {
    pub doctor: IdentityWithStats,
}

/// Activation toggle; kept untyped so a non-boolean gets a field error
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StatusToggleRequest {
    pub is_active: Value,
}

impl RequestValidation for StatusToggleRequest {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        validate_field!(errors, "isActive", self.is_active.is_boolean(), "Status must be boolean");
        errors.into_result()
    }
}

impl StatusToggleRequest {
    fn is_active(&self) -> Result<bool, ApiError> {
        self.is_active
            .as_bool()
            .ok_or_else(|| ApiError::validation("Status must be boolean"))
    }
}

/// Apply the `?status=` filter understood by the account lists
fn account_status(query: IdentityQuery, status: Option<&str>) -> Result<IdentityQuery, ApiError> {
    let is_doctor = query.role == Role::Doctor;
    match status.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(query),
        Some("active") => Ok(query.active(true)),
        Some("inactive") => Ok(query.active(false)),
        Some("approved") if is_doctor => Ok(query.approved(true)),
        Some("pending") if is_doctor => Ok(query.approved(false)),
        Some(other) => Err(ApiError::validation(format!("Invalid status filter '{other}'"))),
    }
}

fn identity_missing(role: Role) -> &'static str {
    match role {
        Role::Doctor => DOCTOR_NOT_FOUND,
        Role::Patient | Role::Admin => USER_NOT_FOUND,
    }
}

async fn load_account(server: &MediBookServer, role: Role, id: Uuid) -> Result<Identity, ApiError> {
    server
        .store
        .find_identity(id)
        .await?
        .filter(|identity| identity.role() == role)
        .ok_or_else(|| ApiError::not_found(identity_missing(role)))
}

async fn with_stats(server: &MediBookServer, identity: Identity) -> Result<IdentityWithStats, ApiError> {
    let query = match identity.role() {
        Role::Doctor => AppointmentQuery::for_doctor(identity.id),
        Role::Patient | Role::Admin => AppointmentQuery::for_patient(identity.id),
    };
    let appointment_stats = server.store.status_counts(&query).await?;
    Ok(IdentityWithStats {
        identity,
        appointment_stats,
    })
}

async fn set_active(
    server: &MediBookServer,
    role: Role,
    id: Uuid,
    request: &StatusToggleRequest,
) -> Result<Identity, ApiError> {
    let is_active = request.is_active()?;
    let mut identity = load_account(server, role, id).await?;
    identity.is_active = is_active;
    identity.updated_at = Utc::now();

    let saved = save_identity(server, &identity, identity_missing(role)).await?;
    redacted_info!(
        server.redactor,
        identity_id = display(saved.id),
        role = display(role),
        is_active = is_active,
        "Account {} status changed",
        saved.email
    );
    Ok(saved)
}

async fn delete_account(server: &MediBookServer, role: Role, id: Uuid) -> Result<(), ApiError> {
    let identity = load_account(server, role, id).await?;
    if !server.store.delete_identity(id).await? {
        return Err(ApiError::not_found(identity_missing(role)));
    }
    redacted_info!(
        server.redactor,
        identity_id = display(id),
        role = display(role),
        "Account {} deleted with its appointments",
        identity.email
    );
    Ok(())
}

fn activation_message(subject: &str, is_active: bool) -> String {
    if is_active {
        format!("{subject} activated successfully")
    } else {
        format!("{subject} deactivated successfully")
    }
}

pub async fn list_users(
    State(server): State<MediBookServer>,
    AdminAuth(_admin): AdminAuth,
    ApiQuery(params): ApiQuery<AccountListParams>,
) -> ApiResult<UsersBody> {
    let mut query = account_status(IdentityQuery::new(Role::Patient), params.status.as_deref())?;
    query.search = params.search.filter(|s| !s.trim().is_empty());

    let page = page_request(&server, params.page, params.limit);
    let result = server.store.list_identities(&query, page).await?;
    Ok(ApiResponse::paginated(
        UsersBody { users: result.items },
        PaginationInfo::new(page, result.total),
    ))
}

pub async fn get_user(
    State(server): State<MediBookServer>,
    AdminAuth(_admin): AdminAuth,
    IdPath(id): IdPath,
) -> ApiResult<UserDetailBody> {
    let identity = load_account(&server, Role::Patient, id).await?;
    Ok(ApiResponse::ok(UserDetailBody {
        user: with_stats(&server, identity).await?,
    }))
}

pub async fn update_user_status(
    State(server): State<MediBookServer>,
    AdminAuth(_admin): AdminAuth,
    IdPath(id): IdPath,
    ValidJson(request): ValidJson<StatusToggleRequest>,
) -> ApiResult<UserBody> {
    let user = set_active(&server, Role::Patient, id, &request).await?;
    Ok(ApiResponse::with_message(
        activation_message("User", user.is_active),
        UserBody { user },
    ))
}

pub async fn delete_user(
    State(server): State<MediBookServer>,
    AdminAuth(_admin): AdminAuth,
    IdPath(id): IdPath,
) -> ApiResult<NoPayload> {
    delete_account(&server, Role::Patient, id).await?;
    Ok(ApiResponse::message("User deleted successfully"))
}

pub async fn list_doctors(
    State(server): State<MediBookServer>,
    AdminAuth(_admin): AdminAuth,
    ApiQuery(params): ApiQuery<AccountListParams>,
) -> ApiResult<DoctorsBody> {
    let mut query = account_status(IdentityQuery::new(Role::Doctor), params.status.as_deref())?;
    query.search = params.search.filter(|s| !s.trim().is_empty());

    let page = page_request(&server, params.page, params.limit);
    let result = server.store.list_identities(&query, page).await?;
    Ok(ApiResponse::paginated(
        DoctorsBody { doctors: result.items },
        PaginationInfo::new(page, result.total),
    ))
}

pub async fn get_doctor(
    State(server): State<MediBookServer>,
    AdminAuth(_admin): AdminAuth,
    IdPath(id): IdPath,
) -> ApiResult<DoctorDetailBody> {
    let identity = load_account(&server, Role::Doctor, id).await?;
    Ok(ApiResponse::ok(DoctorDetailBody {
        doctor: with_stats(&server, identity).await?,
    }))
}

pub async fn approve_doctor(
    State(server): State<MediBookServer>,
    AdminAuth(admin): AdminAuth,
    IdPath(id): IdPath,
) -> ApiResult<DoctorBody> {
    let mut identity = load_account(&server, Role::Doctor, id).await?;
    if let Some(profile) = identity.doctor_mut() {
        profile.is_approved = true;
    }
    identity.updated_at = Utc::now();

    let doctor = save_identity(&server, &identity, DOCTOR_NOT_FOUND).await?;
    redacted_info!(
        server.redactor,
        doctor_id = display(doctor.id),
        admin_id = display(admin.id()),
        "Doctor {} approved",
        doctor.email
    );

    Ok(ApiResponse::with_message(
        "Doctor approved successfully",
        DoctorBody { doctor },
    ))
}

pub async fn update_doctor_status(
    State(server): State<MediBookServer>,
    AdminAuth(_admin): AdminAuth,
    IdPath(id): IdPath,
    ValidJson(request): ValidJson<StatusToggleRequest>,
) -> ApiResult<DoctorBody> {
    let doctor = set_active(&server, Role::Doctor, id, &request).await?;
    Ok(ApiResponse::with_message(
        activation_message("Doctor", doctor.is_active),
        DoctorBody { doctor },
    ))
}

pub async fn delete_doctor(
    State(server): State<MediBookServer>,
    AdminAuth(_admin): AdminAuth,
    IdPath(id): IdPath,
) -> ApiResult<NoPayload> {
    delete_account(&server, Role::Doctor, id).await?;
    Ok(ApiResponse::message("Doctor deleted successfully"))
}

// =============================================================================
// APPOINTMENTS
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AdminAppointmentParams {
    pub status: Option<String>,
    pub date: Option<String>,
    pub doctor_id: Option<String>,
    pub patient_id: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

fn id_filter(value: Option<&str>, field: &str) -> Result<Option<Uuid>, ApiError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(raw) => Uuid::parse_str(raw)
            .map(Some)
            .map_err(|_| ApiError::validation(format!("Invalid {field} filter '{raw}'"))),
    }
}

/// All appointments, newest first
pub async fn list_appointments(
    State(server): State<MediBookServer>,
    AdminAuth(_admin): AdminAuth,
    ApiQuery(params): ApiQuery<AdminAppointmentParams>,
) -> ApiResult<AppointmentsBody> {
    let mut query = AppointmentQuery::default().sorted(SortDirection::Descending);
    query.doctor_id = id_filter(params.doctor_id.as_deref(), "doctorId")?;
    query.patient_id = id_filter(params.patient_id.as_deref(), "patientId")?;
    if let Some(status) = status_filter(params.status.as_deref())? {
        query = query.with_status(status);
    }
    if let Some(date) = date_filter(params.date.as_deref())? {
        query = query.on(date);
    }

    let page = page_request(&server, params.page, params.limit);
    let result = server.store.list_appointments(&query, page).await?;
    let appointments = appointment_views(server.store.as_ref(), result.items).await?;
    Ok(ApiResponse::paginated(
        AppointmentsBody { appointments },
        PaginationInfo::new(page, result.total),
    ))
}

pub async fn get_appointment(
    State(server): State<MediBookServer>,
    AdminAuth(_admin): AdminAuth,
    IdPath(id): IdPath,
) -> ApiResult<AppointmentBody> {
    let appointment = server
        .store
        .find_appointment(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Appointment not found"))?;
    Ok(ApiResponse::ok(AppointmentBody {
        appointment: appointment_view(server.store.as_ref(), appointment).await?,
    }))
}
