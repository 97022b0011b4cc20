//! Store traits shared by the Postgres and in-memory backends
//!
//! Handlers and workflows only ever see `Arc<dyn ClinicStore>`, so the same
//! request pipeline runs against Postgres in production and against
//! [`crate::memory::MemoryClinicStore`] in tests and `--in-memory` mode.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::error::DatabaseResult;
use crate::models::{
    Appointment, AppointmentStatus, Identity, NewAppointment, NewIdentity, Prescription, Role,
    Slot, StatusChange, StatusCounts,
};

/// Page window for list queries (1-based page)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: page.max(1),
            limit: limit.max(1),
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

/// One page of results plus the unpaginated total
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

impl SortDirection {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Ascending => "ASC",
            SortDirection::Descending => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdentitySort {
    /// Most recently created first
    #[default]
    Newest,
    /// Highest rated doctors first, then by number of reviews
    TopRated,
}

/// Filter for identity listings and counts
#[derive(Debug, Clone)]
pub struct IdentityQuery {
    pub role: Role,
    /// Case-insensitive substring over name, email, phone and specialization
    pub search: Option<String>,
    pub is_active: Option<bool>,
    pub is_approved: Option<bool>,
    pub specialization: Option<String>,
    pub created_since: Option<DateTime<Utc>>,
    pub sort: IdentitySort,
}

impl IdentityQuery {
    pub fn new(role: Role) -> Self {
        Self {
            role,
            search: None,
            is_active: None,
            is_approved: None,
            specialization: None,
            created_since: None,
            sort: IdentitySort::default(),
        }
    }

    pub fn active(mut self, active: bool) -> Self {
        self.is_active = Some(active);
        self
    }

    pub fn approved(mut self, approved: bool) -> Self {
        self.is_approved = Some(approved);
        self
    }

    pub fn created_since(mut self, since: DateTime<Utc>) -> Self {
        self.created_since = Some(since);
        self
    }

    pub fn matches(&self, identity: &Identity) -> bool {
        if identity.role() != self.role {
            return false;
        }
        if self.is_active.is_some_and(|active| identity.is_active != active) {
            return false;
        }
        let doctor = identity.doctor();
        if let Some(approved) = self.is_approved {
            if doctor.map_or(true, |d| d.is_approved != approved) {
                return false;
            }
        }
        if let Some(specialization) = &self.specialization {
            if doctor.map_or(true, |d| &d.specialization != specialization) {
                return false;
            }
        }
        if self.created_since.is_some_and(|since| identity.created_at < since) {
            return false;
        }
        if let Some(search) = self.search.as_deref().map(str::to_lowercase) {
            let haystacks = [
                Some(identity.name.as_str()),
                Some(identity.email.as_str()),
                identity.phone.as_deref(),
                doctor.map(|d| d.specialization.as_str()),
            ];
            if !haystacks
                .iter()
                .flatten()
                .any(|field| field.to_lowercase().contains(&search))
            {
                return false;
            }
        }
        true
    }
}

/// Filter for appointment listings, counts and per-status breakdowns
#[derive(Debug, Clone, Default)]
pub struct AppointmentQuery {
    pub patient_id: Option<Uuid>,
    pub doctor_id: Option<Uuid>,
    /// Empty means any status
    pub statuses: Vec<AppointmentStatus>,
    pub date: Option<NaiveDate>,
    pub from_date: Option<NaiveDate>,
    pub sort: SortDirection,
}

impl AppointmentQuery {
    pub fn for_patient(patient_id: Uuid) -> Self {
        Self {
            patient_id: Some(patient_id),
            ..Self::default()
        }
    }

    pub fn for_doctor(doctor_id: Uuid) -> Self {
        Self {
            doctor_id: Some(doctor_id),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: AppointmentStatus) -> Self {
        self.statuses.push(status);
        self
    }

    pub fn on(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn starting(mut self, date: NaiveDate) -> Self {
        self.from_date = Some(date);
        self
    }

    pub fn sorted(mut self, sort: SortDirection) -> Self {
        self.sort = sort;
        self
    }

    pub fn matches(&self, appointment: &Appointment) -> bool {
        self.patient_id.map_or(true, |id| appointment.patient_id == id)
            && self.doctor_id.map_or(true, |id| appointment.doctor_id == id)
            && (self.statuses.is_empty() || self.statuses.contains(&appointment.status))
            && self.date.map_or(true, |d| appointment.appointment_date == d)
            && self.from_date.map_or(true, |d| appointment.appointment_date >= d)
    }
}

/// Identity fields that must stay unique within a role
#[derive(Debug, Clone, Default)]
pub struct ConflictProbe<'a> {
    pub email: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub registration_number: Option<&'a str>,
    /// Identity being updated, never reported as its own conflict
    pub exclude_id: Option<Uuid>,
}

impl ConflictProbe<'_> {
    pub fn collides_with(&self, identity: &Identity) -> bool {
        if self.exclude_id == Some(identity.id) {
            return false;
        }
        let email = self
            .email
            .is_some_and(|email| identity.email.eq_ignore_ascii_case(email));
        let phone = self
            .phone
            .is_some_and(|phone| identity.phone.as_deref() == Some(phone));
        let registration = self.registration_number.is_some_and(|number| {
            identity
                .doctor()
                .is_some_and(|d| d.registration_number == number)
        });
        email || phone || registration
    }
}

/// Patients, doctors and administrators
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Fails with `UniqueViolation` when email, phone or registration number is taken
    async fn insert_identity(&self, identity: NewIdentity) -> DatabaseResult<Identity>;

    async fn find_identity(&self, id: Uuid) -> DatabaseResult<Option<Identity>>;

    async fn find_identity_by_email(&self, role: Role, email: &str) -> DatabaseResult<Option<Identity>>;

    async fn find_identities(&self, ids: &[Uuid]) -> DatabaseResult<Vec<Identity>>;

    /// First identity of `role` colliding with the probe, if any
    async fn find_conflicting_identity(
        &self,
        role: Role,
        probe: &ConflictProbe<'_>,
    ) -> DatabaseResult<Option<Identity>>;

    /// Persist every mutable field of an existing identity; `None` if it vanished
    async fn save_identity(&self, identity: &Identity) -> DatabaseResult<Option<Identity>>;

    /// Stamp `last_login` without touching any other column
    async fn touch_last_login(&self, id: Uuid, at: DateTime<Utc>) -> DatabaseResult<Option<Identity>>;

    async fn list_identities(
        &self,
        query: &IdentityQuery,
        page: PageRequest,
    ) -> DatabaseResult<Page<Identity>>;

    async fn count_identities(&self, query: &IdentityQuery) -> DatabaseResult<i64>;

    /// Specializations of approved, active doctors, sorted
    async fn distinct_specializations(&self) -> DatabaseResult<Vec<String>>;

    /// Delete the identity and every appointment that references it
    async fn delete_identity(&self, id: Uuid) -> DatabaseResult<bool>;
}

#[async_trait]
pub trait AppointmentStore: Send + Sync {
    /// The pending or approved appointment currently holding `slot`
    async fn find_slot_holder(&self, slot: &Slot) -> DatabaseResult<Option<Appointment>>;

    /// Fails with `SlotTaken` if the slot is held, atomically with the insert
    async fn insert_appointment(&self, appointment: NewAppointment) -> DatabaseResult<Appointment>;

    async fn find_appointment(&self, id: Uuid) -> DatabaseResult<Option<Appointment>>;

    /// Ordered by date then time in `query.sort` direction
    async fn list_appointments(
        &self,
        query: &AppointmentQuery,
        page: PageRequest,
    ) -> DatabaseResult<Page<Appointment>>;

    async fn count_appointments(&self, query: &AppointmentQuery) -> DatabaseResult<i64>;

    async fn status_counts(&self, query: &AppointmentQuery) -> DatabaseResult<StatusCounts>;

    /// Fails with `SlotTaken` when re-activating into an occupied slot
    async fn update_status(
        &self,
        id: Uuid,
        change: StatusChange,
    ) -> DatabaseResult<Option<Appointment>>;

    /// Store the prescription and mark the appointment completed in one write
    async fn complete_with_prescription(
        &self,
        id: Uuid,
        prescription: Prescription,
    ) -> DatabaseResult<Option<Appointment>>;
}

/// Everything the server needs from a backend
#[async_trait]
pub trait ClinicStore: CredentialStore + AppointmentStore {
    fn backend_name(&self) -> &'static str;

    async fn is_healthy(&self) -> bool;
}
