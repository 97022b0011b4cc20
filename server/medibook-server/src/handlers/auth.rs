//! Registration, login and current-identity endpoints

use axum::{extract::State, http::StatusCode};
use chrono::{NaiveDate, Utc};
use database_layer::{
    Address, ConflictProbe, DatabaseError, DoctorProfile, Identity, NewIdentity, PatientProfile,
    Profile, Role,
};
use logger_redacted::{redacted_info, redacted_warn};
use serde::{Deserialize, Serialize};
use tracing::field::display;

use crate::error::{ApiError, ApiResponse, ApiResult};
use crate::middleware::AuthContext;
use crate::server::MediBookServer;
use crate::validation::{FieldErrors, RequestValidation, ValidJson};
use crate::{validate_email, validate_field, validate_phone, validate_range, validate_required};

pub const USER_EXISTS: &str = "User with this email or phone already exists";
pub const DOCTOR_EXISTS: &str = "Doctor with this email, phone, or registration number already exists";
pub const INVALID_CREDENTIALS: &str = "Invalid email or password";
pub const PENDING_APPROVAL: &str = "Your account is pending approval. Please wait for admin approval.";
pub const DEACTIVATED: &str = "Your account has been deactivated. Please contact support.";

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RegisterUserRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub address: Option<Address>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RegisterDoctorRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub specialization: String,
    pub qualification: Vec<String>,
    pub experience: Option<i64>,
    pub registration_number: String,
    pub consultation_fee: Option<f64>,
    pub bio: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Checks shared by both registration forms
fn validate_contact(errors: &mut FieldErrors, name: &str, email: &str, phone: &str, password: &str) {
    validate_required!(errors, "name", name, "Name is required");
    validate_email!(errors, "email", email, "Please enter a valid email");
    validate_phone!(errors, "phone", phone, "Please enter a valid 10-digit phone number");
    validate_field!(
        errors,
        "password",
        password.chars().count() >= MIN_PASSWORD_LEN,
        "Password must be at least 6 characters long"
    );
}

impl RequestValidation for RegisterUserRequest {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        validate_contact(&mut errors, &self.name, &self.email, &self.phone, &self.password);
        errors.into_result()
    }
}

impl RequestValidation for RegisterDoctorRequest {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        validate_contact(&mut errors, &self.name, &self.email, &self.phone, &self.password);
        validate_required!(errors, "specialization", self.specialization, "Specialization is required");
        validate_field!(
            errors,
            "qualification",
            self.qualification.iter().any(|q| !q.trim().is_empty()),
            "At least one qualification is required"
        );
        validate_field!(
            errors,
            "experience",
            self.experience.is_some_and(|years| (0..=50).contains(&years)),
            "Experience must be between 0 and 50 years"
        );
        validate_required!(
            errors,
            "registrationNumber",
            self.registration_number,
            "Medical registration number is required"
        );
        if let Some(fee) = self.consultation_fee {
            validate_range!(errors, "consultationFee", fee, 0.0, f64::MAX, "Consultation fee must be positive");
        }
        errors.into_result()
    }
}

impl RequestValidation for LoginRequest {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        validate_email!(errors, "email", self.email, "Please enter a valid email");
        validate_field!(errors, "password", !self.password.is_empty(), "Password is required");
        errors.into_result()
    }
}

/// Token plus the identity, keyed by role
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum SessionBody {
    User { token: String, user: Identity },
    Doctor { token: String, doctor: Identity },
    Admin { token: String, admin: Identity },
}

impl SessionBody {
    fn new(token: String, identity: Identity) -> Self {
        match identity.role() {
            Role::Patient => SessionBody::User { token, user: identity },
            Role::Doctor => SessionBody::Doctor { token, doctor: identity },
            Role::Admin => SessionBody::Admin { token, admin: identity },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DoctorBody {
    pub doctor: Identity,
}

#[derive(Debug, Serialize)]
pub struct MeBody {
    pub user: Identity,
    pub role: Role,
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Map a unique-key violation that slipped past the pre-check to `message`
pub fn duplicate_as(message: &'static str) -> impl FnOnce(DatabaseError) -> ApiError {
    move |err| {
        if matches!(err, DatabaseError::UniqueViolation { .. }) {
            ApiError::conflict(message)
        } else {
            err.into()
        }
    }
}

pub async fn register_user(
    State(server): State<MediBookServer>,
    ValidJson(request): ValidJson<RegisterUserRequest>,
) -> Result<(StatusCode, ApiResponse<SessionBody>), ApiError> {
    let email = normalize_email(&request.email);
    let phone = request.phone.trim().to_string();

    let probe = ConflictProbe {
        email: Some(&email),
        phone: Some(&phone),
        ..ConflictProbe::default()
    };
    if server.store.find_conflicting_identity(Role::Patient, &probe).await?.is_some() {
        redacted_warn!(server.redactor, "Patient registration rejected, {} already registered", email);
        return Err(ApiError::conflict(USER_EXISTS));
    }

    let password_hash = server.passwords.hash(&request.password).await?;
    let user = server
        .store
        .insert_identity(NewIdentity {
            name: request.name.trim().to_string(),
            email,
            phone: Some(phone),
            password_hash,
            profile: Profile::Patient(PatientProfile {
                date_of_birth: request.date_of_birth,
                gender: request.gender,
                address: request.address,
                medical_history: Vec::new(),
            }),
        })
        .await
        .map_err(duplicate_as(USER_EXISTS))?;

    let token = server.tokens.issue(user.id, Role::Patient)?;
    redacted_info!(server.redactor, user_id = display(user.id), "Patient registered: {}", user.email);

    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message("User registered successfully", SessionBody::new(token, user)),
    ))
}

/// Doctors start unapproved and get no token until an admin approves them
pub async fn register_doctor(
    State(server): State<MediBookServer>,
    ValidJson(request): ValidJson<RegisterDoctorRequest>,
) -> Result<(StatusCode, ApiResponse<DoctorBody>), ApiError> {
    let email = normalize_email(&request.email);
    let phone = request.phone.trim().to_string();
    let registration_number = request.registration_number.trim().to_string();

    let probe = ConflictProbe {
        email: Some(&email),
        phone: Some(&phone),
        registration_number: Some(&registration_number),
        exclude_id: None,
    };
    if server.store.find_conflicting_identity(Role::Doctor, &probe).await?.is_some() {
        redacted_warn!(server.redactor, "Doctor registration rejected, {} already registered", email);
        return Err(ApiError::conflict(DOCTOR_EXISTS));
    }

    let password_hash = server.passwords.hash(&request.password).await?;
    let doctor = server
        .store
        .insert_identity(NewIdentity {
            name: request.name.trim().to_string(),
            email,
            phone: Some(phone),
            password_hash,
            profile: Profile::Doctor(DoctorProfile {
                specialization: request.specialization.trim().to_string(),
                qualification: request
                    .qualification
                    .into_iter()
                    .map(|q| q.trim().to_string())
                    .filter(|q| !q.is_empty())
                    .collect(),
                experience: request
                    .experience
                    .and_then(|years| i32::try_from(years).ok())
                    .unwrap_or_default(),
                registration_number,
                is_approved: false,
                consultation_fee: request.consultation_fee.unwrap_or_default(),
                bio: request.bio,
                availability: Vec::new(),
                rating: 0.0,
                total_reviews: 0,
            }),
        })
        .await
        .map_err(duplicate_as(DOCTOR_EXISTS))?;

    redacted_info!(server.redactor, doctor_id = display(doctor.id), "Doctor registered: {}", doctor.email);

    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message(
            "Doctor registered successfully. Please wait for admin approval.",
            DoctorBody { doctor },
        ),
    ))
}

async fn login(server: &MediBookServer, role: Role, request: LoginRequest) -> ApiResult<SessionBody> {
    let email = normalize_email(&request.email);

    let Some(identity) = server.store.find_identity_by_email(role, &email).await? else {
        redacted_warn!(server.redactor, role = role.as_str(), "Login failed, unknown account {}", email);
        return Err(ApiError::authentication(INVALID_CREDENTIALS));
    };

    if !server.passwords.verify(&request.password, &identity.password_hash).await? {
        redacted_warn!(server.redactor, role = role.as_str(), "Login failed, wrong password for {}", email);
        return Err(ApiError::authentication(INVALID_CREDENTIALS));
    }

    if identity.doctor().is_some_and(|d| !d.is_approved) {
        return Err(ApiError::authentication(PENDING_APPROVAL));
    }
    if !identity.is_active {
        return Err(ApiError::authentication(DEACTIVATED));
    }

    let identity = server
        .store
        .touch_last_login(identity.id, Utc::now())
        .await?
        .unwrap_or(identity);

    let token = server.tokens.issue(identity.id, role)?;
    redacted_info!(server.redactor, role = role.as_str(), "Login succeeded for {}", identity.email);

    Ok(ApiResponse::with_message("Login successful", SessionBody::new(token, identity)))
}

pub async fn login_user(
    State(server): State<MediBookServer>,
    ValidJson(request): ValidJson<LoginRequest>,
) -> ApiResult<SessionBody> {
    login(&server, Role::Patient, request).await
}

pub async fn login_doctor(
    State(server): State<MediBookServer>,
    ValidJson(request): ValidJson<LoginRequest>,
) -> ApiResult<SessionBody> {
    login(&server, Role::Doctor, request).await
}

pub async fn login_admin(
    State(server): State<MediBookServer>,
    ValidJson(request): ValidJson<LoginRequest>,
) -> ApiResult<SessionBody> {
    login(&server, Role::Admin, request).await
}

pub async fn me(auth: AuthContext) -> ApiResult<MeBody> {
    let role = auth.role();
    Ok(ApiResponse::ok(MeBody {
        user: auth.identity,
        role,
    }))
}
