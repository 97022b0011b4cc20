// Store behaviour exercised through the `ClinicStore` trait object
use chrono::{Duration, NaiveDate, Utc};
use database_layer::{
    AppointmentQuery, AppointmentStatus, Cancellation, CancelledBy, ClinicStore, ConflictProbe,
    ConsultationType, DatabaseError, Department, DoctorProfile, IdentityQuery, IdentitySort,
    MemoryClinicStore, NewAppointment, NewIdentity, PageRequest, PatientProfile, PaymentMethod,
    Prescription, Medicine, Profile, Role, StatusChange,
};
use std::sync::Arc;
use uuid::Uuid;

fn store() -> Arc<dyn ClinicStore> {
    Arc::new(MemoryClinicStore::new())
}

fn doctor(name: &str, email: &str, registration: &str, approved: bool, rating: f64) -> NewIdentity {
    NewIdentity {
        name: name.to_string(),
        email: email.to_string(),
        phone: None,
        password_hash: "hash".to_string(),
        profile: Profile::Doctor(DoctorProfile {
            specialization: "Cardiology".to_string(),
            qualification: vec!["MBBS".to_string()],
            experience: 8,
            registration_number: registration.to_string(),
            is_approved: approved,
            consultation_fee: 600.0,
            bio: None,
            availability: Vec::new(),
            rating,
            total_reviews: 3,
        }),
    }
}

fn patient(email: &str) -> NewIdentity {
    NewIdentity {
        name: "Ravi Kumar".to_string(),
        email: email.to_string(),
        phone: Some("9000000001".to_string()),
        password_hash: "hash".to_string(),
        profile: Profile::Patient(PatientProfile::default()),
    }
}

fn booking(patient_id: Uuid, doctor_id: Uuid, date: NaiveDate, time: &str) -> NewAppointment {
    NewAppointment {
        patient_id,
        doctor_id,
        department: Department::Cardiology,
        appointment_date: date,
        appointment_time: time.to_string(),
        consultation_type: ConsultationType::InPerson,
        symptoms: Some("Chest pain".to_string()),
        notes: None,
        fee: 600.0,
        payment_method: PaymentMethod::Cash,
    }
}

#[tokio::test]
async fn test_doctor_listing_filters_and_sorts_by_rating() {
    let store = store();
    store.insert_identity(doctor("Dr. Low", "low@clinic.org", "REG-1", true, 3.5)).await.unwrap();
    store.insert_identity(doctor("Dr. High", "high@clinic.org", "REG-2", true, 4.8)).await.unwrap();
    store.insert_identity(doctor("Dr. Pending", "pending@clinic.org", "REG-3", false, 5.0)).await.unwrap();

    let mut query = IdentityQuery::new(Role::Doctor).approved(true).active(true);
    query.sort = IdentitySort::TopRated;
    let page = store.list_identities(&query, PageRequest::new(1, 10)).await.unwrap();

    assert_eq!(page.total, 2);
    let names: Vec<_> = page.items.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["Dr. High", "Dr. Low"]);

    query.search = Some("HIGH".to_string());
    assert_eq!(store.count_identities(&query).await.unwrap(), 1);
}

#[tokio::test]
async fn test_same_email_allowed_across_roles_but_not_within() {
    let store = store();
    store.insert_identity(patient("shared@clinic.org")).await.unwrap();
    store
        .insert_identity(doctor("Dr. Shared", "shared@clinic.org", "REG-9", true, 0.0))
        .await
        .unwrap();

    let err = store.insert_identity(patient("SHARED@clinic.org")).await.unwrap_err();
    assert!(err.is_conflict());

    let probe = ConflictProbe {
        email: Some("shared@clinic.org"),
        ..ConflictProbe::default()
    };
    let hit = store.find_conflicting_identity(Role::Patient, &probe).await.unwrap();
    assert!(hit.is_some());
}

#[tokio::test]
async fn test_status_counts_and_prescription_completion() {
    let store = store();
    let doc = store.insert_identity(doctor("Dr. A", "a@clinic.org", "REG-A", true, 0.0)).await.unwrap();
    let pat = store.insert_identity(patient("p@clinic.org")).await.unwrap();
    let date = (Utc::now() + Duration::days(3)).date_naive();

    let first = store.insert_appointment(booking(pat.id, doc.id, date, "10:00")).await.unwrap();
    let second = store.insert_appointment(booking(pat.id, doc.id, date, "11:00")).await.unwrap();

    store
        .update_status(
            second.id,
            StatusChange {
                status: AppointmentStatus::Cancelled,
                cancellation: Some(Cancellation {
                    reason: "Travel".to_string(),
                    by: CancelledBy::Patient,
                }),
            },
        )
        .await
        .unwrap();

    let completed = store
        .complete_with_prescription(
            first.id,
            Prescription {
                medicines: vec![Medicine {
                    name: "Aspirin".to_string(),
                    dosage: "75mg".to_string(),
                    duration: "30 days".to_string(),
                    instructions: None,
                }],
                advice: Some("Rest".to_string()),
                follow_up_date: None,
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(completed.status, AppointmentStatus::Completed);
    assert!(completed.prescription.is_some());

    let counts = store.status_counts(&AppointmentQuery::for_doctor(doc.id)).await.unwrap();
    assert_eq!(counts.total, 2);
    assert_eq!(counts.completed, 1);
    assert_eq!(counts.cancelled, 1);

    let today = store
        .count_appointments(&AppointmentQuery::default().on(date))
        .await
        .unwrap();
    assert_eq!(today, 2);
}

#[tokio::test]
async fn test_booking_taken_slot_reports_slot_taken() {
    let store = store();
    let doc = store.insert_identity(doctor("Dr. B", "b@clinic.org", "REG-B", true, 0.0)).await.unwrap();
    let pat = store.insert_identity(patient("q@clinic.org")).await.unwrap();
    let date = (Utc::now() + Duration::days(1)).date_naive();

    store.insert_appointment(booking(pat.id, doc.id, date, "09:30")).await.unwrap();
    let err = store
        .insert_appointment(booking(pat.id, doc.id, date, "09:30"))
        .await
        .unwrap_err();
    assert!(matches!(err, DatabaseError::SlotTaken));
}
