//! End-to-end API tests against the in-memory store
//!
//! Each test builds a fresh router and drives it with `oneshot`, so no
//! database or network listener is involved.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use database_layer::MemoryClinicStore;
use serde_json::{json, Value};
use tower::ServiceExt;

use medibook_server::{create_app, MediBookServer, ServerConfig};

const ADMIN_EMAIL: &str = "admin@medibook.test";
const ADMIN_PASSWORD: &str = "admin-secret";
const PASSWORD: &str = "secret123";

struct TestApp {
    app: Router,
}

impl TestApp {
    async fn new() -> Self {
        let mut config = ServerConfig::default();
        config.auth.password_memory_kib = 1024;
        config.auth.admin_email = Some(ADMIN_EMAIL.to_string());
        config.auth.admin_password = Some(ADMIN_PASSWORD.to_string());

        let server = MediBookServer::with_store(config, Arc::new(MemoryClinicStore::new()))
            .expect("Failed to create test server");
        server.bootstrap_admin().await.expect("Failed to seed administrator");

        Self {
            app: create_app(server),
        }
    }

    async fn send(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        self.send_raw(method, uri, token, body.map(|body| body.to_string())).await
    }

    /// Send a body verbatim, for payloads that are not valid JSON
    async fn send_raw(&self, method: Method, uri: &str, token: Option<&str>, body: Option<String>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::GET, uri, token, None).await
    }

    async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, token, Some(body)).await
    }

    async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, token, Some(body)).await
    }

    async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, token, None).await
    }

    /// Register a patient and return (token, id)
    async fn patient(&self, email: &str, phone: &str) -> (String, String) {
        let (status, body) = self
            .post(
                "/api/auth/register/user",
                None,
                json!({ "name": "Asha Rao", "email": email, "phone": phone, "password": PASSWORD }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        (
            body["token"].as_str().unwrap().to_string(),
            body["user"]["id"].as_str().unwrap().to_string(),
        )
    }

    /// Register a doctor (unapproved) and return the id
    async fn register_doctor(&self, email: &str, phone: &str, registration: &str, fee: f64) -> String {
        let (status, body) = self
            .post(
                "/api/auth/register/doctor",
                None,
                json!({
                    "name": "Dr. Meera Iyer",
                    "email": email,
                    "phone": phone,
                    "password": PASSWORD,
                    "specialization": "Cardiology",
                    "qualification": ["MBBS", "MD"],
                    "experience": 12,
                    "registrationNumber": registration,
                    "consultationFee": fee
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        assert!(body.get("token").is_none());
        body["doctor"]["id"].as_str().unwrap().to_string()
    }

    async fn admin_token(&self) -> String {
        let (status, body) = self
            .post(
                "/api/auth/login/admin",
                None,
                json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["token"].as_str().unwrap().to_string()
    }

    async fn approve(&self, doctor_id: &str) {
        let admin = self.admin_token().await;
        let (status, body) = self
            .put(&format!("/api/admin/doctors/{doctor_id}/approve"), Some(&admin), json!({}))
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
    }

    async fn doctor_token(&self, email: &str) -> String {
        let (status, body) = self
            .post("/api/auth/login/doctor", None, json!({ "email": email, "password": PASSWORD }))
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["token"].as_str().unwrap().to_string()
    }

    /// Register and approve a doctor, returning (token, id)
    async fn approved_doctor(&self, email: &str, phone: &str, registration: &str, fee: f64) -> (String, String) {
        let id = self.register_doctor(email, phone, registration, fee).await;
        self.approve(&id).await;
        (self.doctor_token(email).await, id)
    }

    async fn book(&self, token: &str, doctor_id: &str, time: &str) -> (StatusCode, Value) {
        self.post(
            "/api/appointments",
            Some(token),
            json!({
                "doctorId": doctor_id,
                "department": "Cardiology",
                "appointmentDate": tomorrow(),
                "appointmentTime": time,
                "consultationType": "in-person",
                "symptoms": "Chest pain on exertion"
            }),
        )
        .await
    }
}

fn tomorrow() -> String {
    (Utc::now().date_naive() + Duration::days(1)).to_string()
}

fn yesterday() -> String {
    (Utc::now().date_naive() - Duration::days(1)).to_string()
}

#[tokio::test]
async fn test_health_reports_memory_store() {
    let app = TestApp::new().await;
    let (status, body) = app.get("/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "OK");
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn test_unknown_route_uses_error_envelope() {
    let app = TestApp::new().await;
    let (status, body) = app.get("/api/nowhere", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Route not found");
    assert!(body["errorId"].is_string());
}

#[tokio::test]
async fn test_booking_scenario_and_double_booking() {
    let app = TestApp::new().await;
    let (doctor_token, doctor_id) = app
        .approved_doctor("meera@clinic.test", "9000000001", "MCI-1001", 500.0)
        .await;
    let (patient_token, patient_id) = app.patient("asha@example.test", "9800000001").await;

    let (status, body) = app.book(&patient_token, &doctor_id, "10:00").await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["message"], "Appointment booked successfully");
    let appointment = &body["appointment"];
    assert_eq!(appointment["status"], "pending");
    assert_eq!(appointment["fee"].as_f64(), Some(500.0));
    assert_eq!(appointment["patientId"], patient_id.as_str());
    assert_eq!(appointment["doctor"]["name"], "Dr. Meera Iyer");

    let (status, body) = app.book(&patient_token, &doctor_id, "10:00").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        body["message"],
        "This time slot is already booked. Please choose another time."
    );

    let (status, body) = app.get("/api/appointments/doctor", Some(&doctor_token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["appointments"].as_array().unwrap().len(), 1);
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["pagination"]["pages"], 1);
}

#[tokio::test]
async fn test_cancelled_slot_can_be_booked_again() {
    let app = TestApp::new().await;
    let (_, doctor_id) = app
        .approved_doctor("meera@clinic.test", "9000000001", "MCI-1001", 500.0)
        .await;
    let (patient_token, _) = app.patient("asha@example.test", "9800000001").await;

    let (_, body) = app.book(&patient_token, &doctor_id, "11:30").await;
    let id = body["appointment"]["id"].as_str().unwrap().to_string();

    let (status, body) = app.delete(&format!("/api/appointments/{id}"), Some(&patient_token)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["appointment"]["status"], "cancelled");
    assert_eq!(body["appointment"]["cancelledBy"], "patient");

    let (status, _) = app.book(&patient_token, &doctor_id, "11:30").await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_cancel_body_is_validated_when_present() {
    let app = TestApp::new().await;
    let (_, doctor_id) = app
        .approved_doctor("meera@clinic.test", "9000000001", "MCI-1001", 500.0)
        .await;
    let (patient_token, _) = app.patient("asha@example.test", "9800000001").await;

    let (_, body) = app.book(&patient_token, &doctor_id, "11:30").await;
    let id = body["appointment"]["id"].as_str().unwrap().to_string();
    let uri = format!("/api/appointments/{id}");

    let (status, body) = app
        .send(Method::DELETE, &uri, Some(&patient_token), Some(json!({ "reason": "x".repeat(301) })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"]["reason"][0], "Cancellation reason cannot exceed 300 characters");

    let (status, body) = app
        .send_raw(Method::DELETE, &uri, Some(&patient_token), Some(r#"{"reason": "Travel"#.to_string()))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errorType"], "bad_request");

    // Rejected bodies leave the appointment untouched
    let (_, body) = app.get(&uri, Some(&patient_token)).await;
    assert_eq!(body["appointment"]["status"], "pending");

    let (status, body) = app
        .send(Method::DELETE, &uri, Some(&patient_token), Some(json!({ "reason": "Travelling" })))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["appointment"]["cancellationReason"], "Travelling");
}

#[tokio::test]
async fn test_auth_gate_messages() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/api/appointments/user", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Access denied. No token provided.");
    assert_eq!(body["errorType"], "authentication_error");

    let (status, body) = app.get("/api/appointments/user", Some("not-a-jwt")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid token.");

    let (patient_token, _) = app.patient("asha@example.test", "9800000001").await;
    let (status, body) = app.get("/api/appointments/doctor", Some(&patient_token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Access denied. user role is not authorized.");

    let (status, body) = app.get("/api/auth/me", Some(&patient_token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "asha@example.test");
    assert!(body["user"].get("passwordHash").is_none());
}

#[tokio::test]
async fn test_token_of_deleted_identity_is_rejected() {
    let app = TestApp::new().await;
    let (patient_token, patient_id) = app.patient("asha@example.test", "9800000001").await;
    let admin = app.admin_token().await;

    let (status, _) = app.delete(&format!("/api/admin/users/{patient_id}"), Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.get("/api/auth/me", Some(&patient_token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid token. User not found.");
}

#[tokio::test]
async fn test_registration_validation_and_duplicates() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post(
            "/api/auth/register/user",
            None,
            json!({ "name": "", "email": "bad", "phone": "123", "password": "123" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Validation failed");
    for field in ["name", "email", "phone", "password"] {
        assert!(body["errors"][field].is_array(), "missing error for {field}");
    }

    app.patient("asha@example.test", "9800000001").await;
    let (status, body) = app
        .post(
            "/api/auth/register/user",
            None,
            json!({ "name": "Asha", "email": "ASHA@example.test", "phone": "9800000002", "password": PASSWORD }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "User with this email or phone already exists");
}

#[tokio::test]
async fn test_booking_validation_errors() {
    let app = TestApp::new().await;
    let (patient_token, _) = app.patient("asha@example.test", "9800000001").await;

    let (status, body) = app
        .post(
            "/api/appointments",
            Some(&patient_token),
            json!({ "doctorId": "nope", "appointmentDate": tomorrow() }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"]["doctorId"][0], "Valid doctor ID is required");
    assert_eq!(body["errors"]["department"][0], "Department is required");
    assert_eq!(body["errors"]["appointmentTime"][0], "Appointment time is required");
}

#[tokio::test]
async fn test_booking_requires_future_time() {
    let app = TestApp::new().await;
    let (_, doctor_id) = app
        .approved_doctor("meera@clinic.test", "9000000001", "MCI-1001", 500.0)
        .await;
    let (patient_token, _) = app.patient("asha@example.test", "9800000001").await;

    let (status, body) = app
        .post(
            "/api/appointments",
            Some(&patient_token),
            json!({
                "doctorId": doctor_id,
                "department": "Cardiology",
                "appointmentDate": yesterday(),
                "appointmentTime": "10:00"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Appointment date and time must be in the future");
}

#[tokio::test]
async fn test_unapproved_and_inactive_doctors_cannot_be_booked() {
    let app = TestApp::new().await;
    let (patient_token, _) = app.patient("asha@example.test", "9800000001").await;

    let pending_id = app
        .register_doctor("new@clinic.test", "9000000002", "MCI-2002", 300.0)
        .await;
    let (status, body) = app.book(&patient_token, &pending_id, "09:00").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Doctor is not available for appointments");

    let (_, doctor_id) = app
        .approved_doctor("meera@clinic.test", "9000000001", "MCI-1001", 500.0)
        .await;
    let admin = app.admin_token().await;
    let (status, body) = app
        .put(
            &format!("/api/admin/doctors/{doctor_id}/status"),
            Some(&admin),
            json!({ "isActive": false }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Doctor deactivated successfully");

    let (status, _) = app.book(&patient_token, &doctor_id, "09:00").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = app.get("/api/appointments/user", Some(&patient_token)).await;
    assert_eq!(body["appointments"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_doctor_login_waits_for_approval() {
    let app = TestApp::new().await;
    let doctor_id = app
        .register_doctor("new@clinic.test", "9000000002", "MCI-2002", 300.0)
        .await;

    let (status, body) = app
        .post(
            "/api/auth/login/doctor",
            None,
            json!({ "email": "new@clinic.test", "password": PASSWORD }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        body["message"],
        "Your account is pending approval. Please wait for admin approval."
    );

    app.approve(&doctor_id).await;
    app.doctor_token("new@clinic.test").await;

    let (status, body) = app
        .post(
            "/api/auth/login/doctor",
            None,
            json!({ "email": "new@clinic.test", "password": "wrong-password" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid email or password");
}

#[tokio::test]
async fn test_status_workflow_ownership_and_cancellation() {
    let app = TestApp::new().await;
    let (doctor_token, doctor_id) = app
        .approved_doctor("meera@clinic.test", "9000000001", "MCI-1001", 500.0)
        .await;
    let (other_token, _) = app
        .approved_doctor("ravi@clinic.test", "9000000003", "MCI-3003", 400.0)
        .await;
    let (patient_token, _) = app.patient("asha@example.test", "9800000001").await;

    let (_, body) = app.book(&patient_token, &doctor_id, "14:00").await;
    let id = body["appointment"]["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .put(
            &format!("/api/appointments/{id}/status"),
            Some(&other_token),
            json!({ "status": "approved" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Not authorized to update this appointment");

    let (status, body) = app.get(&format!("/api/appointments/{id}"), Some(&other_token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Not authorized to view this appointment");

    let (status, body) = app
        .put(
            &format!("/api/appointments/{id}/status"),
            Some(&doctor_token),
            json!({ "status": "approved" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["message"], "Appointment approved successfully");

    let (status, body) = app
        .put(
            &format!("/api/appointments/{id}/prescription"),
            Some(&doctor_token),
            json!({
                "medicines": [{ "name": "Aspirin", "dosage": "75mg", "duration": "30 days" }],
                "advice": "Light exercise"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["appointment"]["status"], "completed");
    assert_eq!(body["appointment"]["prescription"]["medicines"][0]["name"], "Aspirin");

    let (status, body) = app.delete(&format!("/api/appointments/{id}"), Some(&patient_token)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Cannot cancel completed or already cancelled appointment");

    let (_, body) = app.get(&format!("/api/appointments/{id}"), Some(&patient_token)).await;
    assert_eq!(body["appointment"]["status"], "completed");
    assert!(body["appointment"]["cancellationReason"].is_null());
}

#[tokio::test]
async fn test_admin_delete_cascades_to_appointments() {
    let app = TestApp::new().await;
    let (doctor_token, doctor_id) = app
        .approved_doctor("meera@clinic.test", "9000000001", "MCI-1001", 500.0)
        .await;
    let (patient_token, patient_id) = app.patient("asha@example.test", "9800000001").await;
    let (_, body) = app.book(&patient_token, &doctor_id, "16:00").await;
    let appointment_id = body["appointment"]["id"].as_str().unwrap().to_string();

    let admin = app.admin_token().await;
    let (status, body) = app.get(&format!("/api/admin/users/{patient_id}"), Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["appointmentStats"]["pending"], 1);

    let (status, body) = app.delete(&format!("/api/admin/users/{patient_id}"), Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User deleted successfully");

    let (status, _) = app
        .get(&format!("/api/admin/appointments/{appointment_id}"), Some(&admin))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = app.get("/api/appointments/doctor", Some(&doctor_token)).await;
    assert_eq!(body["pagination"]["total"], 0);

    let (status, body) = app.delete(&format!("/api/admin/users/{patient_id}"), Some(&admin)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "User not found");
}

#[tokio::test]
async fn test_admin_doctor_detail_and_delete_share_a_route() {
    let app = TestApp::new().await;
    let (_, doctor_id) = app
        .approved_doctor("meera@clinic.test", "9000000001", "MCI-1001", 500.0)
        .await;
    let admin = app.admin_token().await;
    let uri = format!("/api/admin/doctors/{doctor_id}");

    let (status, body) = app.get(&uri, Some(&admin)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["doctor"]["email"], "meera@clinic.test");

    let (status, body) = app.delete(&uri, Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Doctor deleted successfully");

    let (status, body) = app.get(&uri, Some(&admin)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Doctor not found");
}

#[tokio::test]
async fn test_admin_stats_and_doctor_directory() {
    let app = TestApp::new().await;
    app.approved_doctor("meera@clinic.test", "9000000001", "MCI-1001", 500.0)
        .await;
    app.register_doctor("new@clinic.test", "9000000002", "MCI-2002", 300.0)
        .await;
    app.patient("asha@example.test", "9800000001").await;

    let admin = app.admin_token().await;
    let (status, body) = app.get("/api/admin/stats", Some(&admin)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let stats = &body["stats"];
    assert_eq!(stats["users"]["total"], 1);
    assert_eq!(stats["users"]["newThisMonth"], 1);
    assert_eq!(stats["doctors"]["total"], 1);
    assert_eq!(stats["doctors"]["pending"], 1);
    assert_eq!(stats["appointments"]["total"], 0);

    let (status, body) = app.get("/api/doctors?search=meera", None).await;
    assert_eq!(status, StatusCode::OK);
    let doctors = body["doctors"].as_array().unwrap();
    assert_eq!(doctors.len(), 1);
    assert_eq!(doctors[0]["specialization"], "Cardiology");

    let (_, body) = app.get("/api/doctors/specializations/list", None).await;
    assert_eq!(body["specializations"], json!(["Cardiology"]));

    let (status, body) = app.get("/api/admin/doctors?status=pending", Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["doctors"].as_array().unwrap().len(), 1);
    assert_eq!(body["doctors"][0]["email"], "new@clinic.test");
}

#[tokio::test]
async fn test_profile_updates_and_password_change() {
    let app = TestApp::new().await;
    let (patient_token, _) = app.patient("asha@example.test", "9800000001").await;
    app.patient("kiran@example.test", "9800000002").await;

    let (status, body) = app
        .put("/api/users/profile", Some(&patient_token), json!({ "phone": "9800000002" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Email or phone already exists");

    let (status, body) = app
        .put(
            "/api/users/profile",
            Some(&patient_token),
            json!({ "name": "Asha R.", "medicalHistory": ["Asthma"] }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["user"]["name"], "Asha R.");
    assert_eq!(body["user"]["medicalHistory"], json!(["Asthma"]));

    let (status, body) = app
        .put(
            "/api/users/password",
            Some(&patient_token),
            json!({ "currentPassword": "wrong", "newPassword": "another1" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Current password is incorrect");

    let (status, _) = app
        .put(
            "/api/users/password",
            Some(&patient_token),
            json!({ "currentPassword": PASSWORD, "newPassword": "another1" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .post(
            "/api/auth/login/user",
            None,
            json!({ "email": "asha@example.test", "password": "another1" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}
