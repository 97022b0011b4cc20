// Fixtures shared by the workflow unit tests
use database_layer::{
    ClinicStore, DoctorProfile, Identity, MemoryClinicStore, NewIdentity, PatientProfile, Profile,
};
use std::sync::Arc;

pub fn store() -> Arc<dyn ClinicStore> {
    Arc::new(MemoryClinicStore::new())
}

pub fn patient(email: &str) -> NewIdentity {
    NewIdentity {
        name: "Test Patient".to_string(),
        email: email.to_string(),
        phone: None,
        password_hash: "hash".to_string(),
        profile: Profile::Patient(PatientProfile::default()),
    }
}

pub async fn seed_patient(store: &Arc<dyn ClinicStore>, email: &str) -> Identity {
    store.insert_identity(patient(email)).await.unwrap()
}

pub async fn seed_doctor(
    store: &Arc<dyn ClinicStore>,
    registration: &str,
    approved: bool,
    active: bool,
    fee: f64,
) -> Identity {
    let doctor = store
        .insert_identity(NewIdentity {
            name: format!("Dr. {registration}"),
            email: format!("{}@clinic.org", registration.to_lowercase()),
            phone: None,
            password_hash: "hash".to_string(),
            profile: Profile::Doctor(DoctorProfile {
                specialization: "Cardiology".to_string(),
                qualification: vec!["MBBS".to_string()],
                experience: 5,
                registration_number: registration.to_string(),
                is_approved: approved,
                consultation_fee: fee,
                bio: None,
                availability: Vec::new(),
                rating: 0.0,
                total_reviews: 0,
            }),
        })
        .await
        .unwrap();
    if active {
        return doctor;
    }
    let mut inactive = doctor;
    inactive.is_active = false;
    store.save_identity(&inactive).await.unwrap().unwrap()
}
