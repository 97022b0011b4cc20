// Domain records persisted by the credential and appointment stores
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// A stored text value did not match any known variant
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Closed enum stored as text, with the same spelling on the wire and in SQL
macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $text)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(UnknownVariant {
                        kind: stringify!($name),
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

text_enum! {
    /// Role tag carried by tokens and stored with every identity
    Role {
        Patient => "user",
        Doctor => "doctor",
        Admin => "admin",
    }
}

text_enum! {
    AppointmentStatus {
        Pending => "pending",
        Approved => "approved",
        Cancelled => "cancelled",
        Completed => "completed",
    }
}

text_enum! {
    Department {
        Cardiology => "Cardiology",
        Neurology => "Neurology",
        Orthopedics => "Orthopedics",
        Pediatrics => "Pediatrics",
        Gynecology => "Gynecology",
        Dermatology => "Dermatology",
        Psychiatry => "Psychiatry",
        GeneralMedicine => "General Medicine",
        Ent => "ENT",
        Ophthalmology => "Ophthalmology",
        Dentistry => "Dentistry",
        Urology => "Urology",
    }
}

text_enum! {
    ConsultationType {
        InPerson => "in-person",
        Video => "video",
        Phone => "phone",
    }
}

text_enum! {
    PaymentStatus {
        Pending => "pending",
        Paid => "paid",
        Refunded => "refunded",
    }
}

text_enum! {
    PaymentMethod {
        Cash => "cash",
        Card => "card",
        Online => "online",
        Insurance => "insurance",
    }
}

text_enum! {
    CancelledBy {
        Patient => "patient",
        Doctor => "doctor",
        Admin => "admin",
    }
}

impl AppointmentStatus {
    /// Pending and approved appointments occupy their slot
    pub fn holds_slot(self) -> bool {
        matches!(self, AppointmentStatus::Pending | AppointmentStatus::Approved)
    }
}

impl Default for AppointmentStatus {
    fn default() -> Self {
        AppointmentStatus::Pending
    }
}

impl Default for ConsultationType {
    fn default() -> Self {
        ConsultationType::InPerson
    }
}

impl Default for PaymentStatus {
    fn default() -> Self {
        PaymentStatus::Pending
    }
}

impl Default for PaymentMethod {
    fn default() -> Self {
        PaymentMethod::Cash
    }
}

// =============================================================================
// IDENTITIES
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
}

/// One weekly consultation window, e.g. `{ day: "Monday", startTime: "09:00", endTime: "13:00" }`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityWindow {
    pub day: String,
    pub start_time: String,
    pub end_time: String,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PatientProfile {
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub address: Option<Address>,
    pub medical_history: Vec<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DoctorProfile {
    pub specialization: String,
    pub qualification: Vec<String>,
    pub experience: i32,
    pub registration_number: String,
    pub is_approved: bool,
    pub consultation_fee: f64,
    pub bio: Option<String>,
    pub availability: Vec<AvailabilityWindow>,
    pub rating: f64,
    pub total_reviews: i32,
}

/// Role specific part of an identity
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "role")]
pub enum Profile {
    #[serde(rename = "user")]
    Patient(PatientProfile),
    #[serde(rename = "doctor")]
    Doctor(DoctorProfile),
    #[serde(rename = "admin")]
    Admin,
}

impl Profile {
    pub fn role(&self) -> Role {
        match self {
            Profile::Patient(_) => Role::Patient,
            Profile::Doctor(_) => Role::Doctor,
            Profile::Admin => Role::Admin,
        }
    }
}

/// A patient, doctor or administrator account
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_active: bool,
    pub avatar: Option<String>,
    pub last_login: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub profile: Profile,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Identity {
    pub fn role(&self) -> Role {
        self.profile.role()
    }

    pub fn doctor(&self) -> Option<&DoctorProfile> {
        match &self.profile {
            Profile::Doctor(doctor) => Some(doctor),
            _ => None,
        }
    }

    pub fn doctor_mut(&mut self) -> Option<&mut DoctorProfile> {
        match &mut self.profile {
            Profile::Doctor(doctor) => Some(doctor),
            _ => None,
        }
    }

    pub fn patient(&self) -> Option<&PatientProfile> {
        match &self.profile {
            Profile::Patient(patient) => Some(patient),
            _ => None,
        }
    }

    pub fn patient_mut(&mut self) -> Option<&mut PatientProfile> {
        match &mut self.profile {
            Profile::Patient(patient) => Some(patient),
            _ => None,
        }
    }

    /// Approved and active doctors accept bookings
    pub fn accepts_bookings(&self) -> bool {
        self.is_active && self.doctor().is_some_and(|d| d.is_approved)
    }
}

/// Input for creating an identity; the store assigns id and timestamps
#[derive(Debug, Clone)]
pub struct NewIdentity {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password_hash: String,
    pub profile: Profile,
}

impl NewIdentity {
    pub fn into_identity(self, now: DateTime<Utc>) -> Identity {
        Identity {
            id: Uuid::new_v4(),
            name: self.name,
            email: self.email.to_lowercase(),
            phone: self.phone,
            password_hash: self.password_hash,
            is_active: true,
            avatar: None,
            last_login: None,
            profile: self.profile,
            created_at: now,
            updated_at: now,
        }
    }
}

// =============================================================================
// APPOINTMENTS
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Medicine {
    pub name: String,
    pub dosage: String,
    pub duration: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Prescription {
    pub medicines: Vec<Medicine>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advice: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow_up_date: Option<NaiveDate>,
}

/// A bookable (doctor, date, time) window
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Slot {
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub time: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub department: Department,
    pub appointment_date: NaiveDate,
    pub appointment_time: String,
    pub status: AppointmentStatus,
    pub consultation_type: ConsultationType,
    pub symptoms: Option<String>,
    pub notes: Option<String>,
    pub prescription: Option<Prescription>,
    pub fee: f64,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub reminder_sent: bool,
    pub cancellation_reason: Option<String>,
    pub cancelled_by: Option<CancelledBy>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    pub fn slot(&self) -> Slot {
        Slot {
            doctor_id: self.doctor_id,
            date: self.appointment_date,
            time: self.appointment_time.clone(),
        }
    }

    pub fn involves(&self, identity_id: Uuid) -> bool {
        self.patient_id == identity_id || self.doctor_id == identity_id
    }
}

/// Input for creating an appointment; always starts out pending
#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub department: Department,
    pub appointment_date: NaiveDate,
    pub appointment_time: String,
    pub consultation_type: ConsultationType,
    pub symptoms: Option<String>,
    pub notes: Option<String>,
    pub fee: f64,
    pub payment_method: PaymentMethod,
}

impl NewAppointment {
    pub fn slot(&self) -> Slot {
        Slot {
            doctor_id: self.doctor_id,
            date: self.appointment_date,
            time: self.appointment_time.clone(),
        }
    }

    pub fn into_appointment(self, now: DateTime<Utc>) -> Appointment {
        Appointment {
            id: Uuid::new_v4(),
            patient_id: self.patient_id,
            doctor_id: self.doctor_id,
            department: self.department,
            appointment_date: self.appointment_date,
            appointment_time: self.appointment_time,
            status: AppointmentStatus::Pending,
            consultation_type: self.consultation_type,
            symptoms: self.symptoms,
            notes: self.notes,
            prescription: None,
            fee: self.fee,
            payment_status: PaymentStatus::Pending,
            payment_method: self.payment_method,
            reminder_sent: false,
            cancellation_reason: None,
            cancelled_by: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cancellation {
    pub reason: String,
    pub by: CancelledBy,
}

/// A status write; cancellation details are only recorded when present
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub status: AppointmentStatus,
    pub cancellation: Option<Cancellation>,
}

/// Appointment counts per status
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct StatusCounts {
    pub total: i64,
    pub pending: i64,
    pub approved: i64,
    pub cancelled: i64,
    pub completed: i64,
}

impl StatusCounts {
    pub fn add(&mut self, status: AppointmentStatus, count: i64) {
        self.total += count;
        match status {
            AppointmentStatus::Pending => self.pending += count,
            AppointmentStatus::Approved => self.approved += count,
            AppointmentStatus::Cancelled => self.cancelled += count,
            AppointmentStatus::Completed => self.completed += count,
        }
    }

    pub fn get(&self, status: AppointmentStatus) -> i64 {
        match status {
            AppointmentStatus::Pending => self.pending,
            AppointmentStatus::Approved => self.approved,
            AppointmentStatus::Cancelled => self.cancelled,
            AppointmentStatus::Completed => self.completed,
        }
    }
}
