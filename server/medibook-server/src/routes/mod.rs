pub mod paths;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::{
    handlers::{admin, appointments, auth, doctors, health, users},
    server::MediBookServer,
};

/// Create health check routes
pub fn health_routes() -> Router<MediBookServer> {
    Router::new().route(paths::health::HEALTH, get(health::health_check))
}

/// Create registration and login routes
pub fn auth_routes() -> Router<MediBookServer> {
    Router::new()
        .route(paths::auth::REGISTER_USER, post(auth::register_user))
        .route(paths::auth::REGISTER_DOCTOR, post(auth::register_doctor))
        .route(paths::auth::LOGIN_USER, post(auth::login_user))
        .route(paths::auth::LOGIN_DOCTOR, post(auth::login_doctor))
        .route(paths::auth::LOGIN_ADMIN, post(auth::login_admin))
        .route(paths::auth::ME, get(auth::me))
}

/// Create appointment routes
pub fn appointment_routes() -> Router<MediBookServer> {
    Router::new()
        .route(paths::appointments::ROOT, post(appointments::book_appointment))
        .route(paths::appointments::USER, get(appointments::user_appointments))
        .route(paths::appointments::DOCTOR, get(appointments::doctor_appointments))
        .route(
            paths::appointments::BY_ID,
            get(appointments::get_appointment).delete(appointments::cancel_appointment),
        )
        .route(paths::appointments::STATUS, put(appointments::update_status))
        .route(paths::appointments::PRESCRIPTION, put(appointments::add_prescription))
}

/// Create doctor directory and doctor self-service routes
pub fn doctor_routes() -> Router<MediBookServer> {
    Router::new()
        .route(paths::doctors::ROOT, get(doctors::list_doctors))
        .route(paths::doctors::SPECIALIZATIONS, get(doctors::specializations))
        .route(paths::doctors::AVAILABILITY, get(doctors::availability))
        .route(
            paths::doctors::PROFILE,
            get(doctors::get_profile).put(doctors::update_profile),
        )
        .route(paths::doctors::PASSWORD, put(doctors::update_password))
        .route(paths::doctors::BY_ID, get(doctors::get_doctor))
}

/// Create patient self-service routes
pub fn user_routes() -> Router<MediBookServer> {
    Router::new()
        .route(
            paths::users::PROFILE,
            get(users::get_profile).put(users::update_profile),
        )
        .route(paths::users::PASSWORD, put(users::update_password))
        .route(paths::users::AVATAR, post(users::update_avatar))
        .route(paths::users::STATS, get(users::stats))
}

/// Create administration routes
pub fn admin_routes() -> Router<MediBookServer> {
    Router::new()
        .route(paths::admin::STATS, get(admin::stats))
        // Patients
        .route(paths::admin::USERS, get(admin::list_users))
        .route(paths::admin::USER_BY_ID, get(admin::get_user).delete(admin::delete_user))
        .route(paths::admin::USER_STATUS, put(admin::update_user_status))
        // Doctors
        .route(paths::admin::DOCTORS, get(admin::list_doctors))
        .route(paths::admin::DOCTOR_BY_ID, get(admin::get_doctor).delete(admin::delete_doctor))
        .route(paths::admin::DOCTOR_APPROVE, put(admin::approve_doctor))
        .route(paths::admin::DOCTOR_STATUS, put(admin::update_doctor_status))
        // Appointments
        .route(paths::admin::APPOINTMENTS, get(admin::list_appointments))
        .route(paths::admin::APPOINTMENT_BY_ID, get(admin::get_appointment))
}

/// Create all routes
pub fn create_routes() -> Router<MediBookServer> {
    Router::new()
        .merge(health_routes())
        .nest(paths::auth::PREFIX, auth_routes())
        .nest(paths::appointments::PREFIX, appointment_routes())
        .nest(paths::doctors::PREFIX, doctor_routes())
        .nest(paths::users::PREFIX, user_routes())
        .nest(paths::admin::PREFIX, admin_routes())
}
