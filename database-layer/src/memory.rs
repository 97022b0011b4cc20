// In-memory backend for tests and `--in-memory` runs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::cmp::Ordering;
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::{DatabaseError, DatabaseResult};
use crate::models::{
    Appointment, AppointmentStatus, Identity, NewAppointment, NewIdentity, Prescription, Role,
    Slot, StatusChange, StatusCounts,
};
use crate::store::{
    AppointmentQuery, AppointmentStore, ClinicStore, ConflictProbe, CredentialStore,
    IdentityQuery, IdentitySort, Page, PageRequest, SortDirection,
};

#[derive(Default)]
struct MemoryState {
    identities: HashMap<Uuid, Identity>,
    appointments: HashMap<Uuid, Appointment>,
}

impl MemoryState {
    fn slot_holder(&self, slot: &Slot, except: Option<Uuid>) -> Option<&Appointment> {
        self.appointments.values().find(|a| {
            Some(a.id) != except && a.status.holds_slot() && a.slot() == *slot
        })
    }

    fn unique_violation(&self, candidate: &Identity) -> Option<&'static str> {
        let role = candidate.role();
        let registration_number = candidate.doctor().map(|d| d.registration_number.as_str());
        self.identities
            .values()
            .filter(|other| other.id != candidate.id && other.role() == role)
            .find_map(|other| {
                if other.email.eq_ignore_ascii_case(&candidate.email) {
                    Some("identities_role_email_key")
                } else if candidate.phone.is_some() && other.phone == candidate.phone {
                    Some("identities_role_phone_key")
                } else if registration_number.is_some()
                    && other.doctor().map(|d| d.registration_number.as_str()) == registration_number
                {
                    Some("identities_registration_number_key")
                } else {
                    None
                }
            })
    }
}

/// Process-local store behind a single lock
///
/// Every write takes the write lock for its whole check-and-mutate sequence,
/// which gives the same slot guarantee as the Postgres partial unique index.
#[derive(Default)]
pub struct MemoryClinicStore {
    state: RwLock<MemoryState>,
}

impl MemoryClinicStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn paginate<T>(mut items: Vec<T>, page: PageRequest) -> Page<T> {
    let total = i64::try_from(items.len()).unwrap_or(i64::MAX);
    let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
    let limit = usize::try_from(page.limit).unwrap_or(usize::MAX);
    let items = if offset >= items.len() {
        Vec::new()
    } else {
        items.drain(offset..).take(limit).collect()
    };
    Page { items, total }
}

fn compare_identities(sort: IdentitySort, a: &Identity, b: &Identity) -> Ordering {
    match sort {
        IdentitySort::Newest => b.created_at.cmp(&a.created_at),
        IdentitySort::TopRated => {
            let rating = |i: &Identity| i.doctor().map_or(0.0, |d| d.rating);
            let reviews = |i: &Identity| i.doctor().map_or(0, |d| d.total_reviews);
            rating(b)
                .total_cmp(&rating(a))
                .then_with(|| reviews(b).cmp(&reviews(a)))
                .then_with(|| b.created_at.cmp(&a.created_at))
        }
    }
}

fn compare_appointments(sort: SortDirection, a: &Appointment, b: &Appointment) -> Ordering {
    let ordering = a
        .appointment_date
        .cmp(&b.appointment_date)
        .then_with(|| a.appointment_time.cmp(&b.appointment_time));
    match sort {
        SortDirection::Ascending => ordering,
        SortDirection::Descending => ordering.reverse(),
    }
}

#[async_trait]
impl CredentialStore for MemoryClinicStore {
    async fn insert_identity(&self, identity: NewIdentity) -> DatabaseResult<Identity> {
        let identity = identity.into_identity(Utc::now());
        let mut state = self.state.write();
        if let Some(constraint) = state.unique_violation(&identity) {
            return Err(DatabaseError::UniqueViolation {
                constraint: constraint.to_string(),
            });
        }
        state.identities.insert(identity.id, identity.clone());
        Ok(identity)
    }

    async fn find_identity(&self, id: Uuid) -> DatabaseResult<Option<Identity>> {
        Ok(self.state.read().identities.get(&id).cloned())
    }

    async fn find_identity_by_email(&self, role: Role, email: &str) -> DatabaseResult<Option<Identity>> {
        Ok(self
            .state
            .read()
            .identities
            .values()
            .find(|i| i.role() == role && i.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_identities(&self, ids: &[Uuid]) -> DatabaseResult<Vec<Identity>> {
        let state = self.state.read();
        Ok(ids
            .iter()
            .filter_map(|id| state.identities.get(id).cloned())
            .collect())
    }

    async fn find_conflicting_identity(
        &self,
        role: Role,
        probe: &ConflictProbe<'_>,
    ) -> DatabaseResult<Option<Identity>> {
        Ok(self
            .state
            .read()
            .identities
            .values()
            .find(|i| i.role() == role && probe.collides_with(i))
            .cloned())
    }

    async fn save_identity(&self, identity: &Identity) -> DatabaseResult<Option<Identity>> {
        let mut state = self.state.write();
        if !state.identities.contains_key(&identity.id) {
            return Ok(None);
        }
        if let Some(constraint) = state.unique_violation(identity) {
            return Err(DatabaseError::UniqueViolation {
                constraint: constraint.to_string(),
            });
        }
        let mut saved = identity.clone();
        saved.email = saved.email.to_lowercase();
        saved.updated_at = Utc::now();
        state.identities.insert(saved.id, saved.clone());
        Ok(Some(saved))
    }

    async fn touch_last_login(&self, id: Uuid, at: DateTime<Utc>) -> DatabaseResult<Option<Identity>> {
        let mut state = self.state.write();
        Ok(state.identities.get_mut(&id).map(|identity| {
            identity.last_login = Some(at);
            identity.clone()
        }))
    }

    async fn list_identities(
        &self,
        query: &IdentityQuery,
        page: PageRequest,
    ) -> DatabaseResult<Page<Identity>> {
        let mut matching: Vec<Identity> = self
            .state
            .read()
            .identities
            .values()
            .filter(|i| query.matches(i))
            .cloned()
            .collect();
        matching.sort_by(|a, b| compare_identities(query.sort, a, b));
        Ok(paginate(matching, page))
    }

    async fn count_identities(&self, query: &IdentityQuery) -> DatabaseResult<i64> {
        let count = self
            .state
            .read()
            .identities
            .values()
            .filter(|i| query.matches(i))
            .count();
        Ok(i64::try_from(count).unwrap_or(i64::MAX))
    }

    async fn distinct_specializations(&self) -> DatabaseResult<Vec<String>> {
        let mut specializations: Vec<String> = self
            .state
            .read()
            .identities
            .values()
            .filter(|i| i.accepts_bookings())
            .filter_map(|i| i.doctor().map(|d| d.specialization.clone()))
            .collect();
        specializations.sort();
        specializations.dedup();
        Ok(specializations)
    }

    async fn delete_identity(&self, id: Uuid) -> DatabaseResult<bool> {
        let mut state = self.state.write();
        if state.identities.remove(&id).is_none() {
            return Ok(false);
        }
        state.appointments.retain(|_, a| !a.involves(id));
        Ok(true)
    }
}

#[async_trait]
impl AppointmentStore for MemoryClinicStore {
    async fn find_slot_holder(&self, slot: &Slot) -> DatabaseResult<Option<Appointment>> {
        Ok(self.state.read().slot_holder(slot, None).cloned())
    }

    async fn insert_appointment(&self, appointment: NewAppointment) -> DatabaseResult<Appointment> {
        let mut state = self.state.write();
        if state.slot_holder(&appointment.slot(), None).is_some() {
            return Err(DatabaseError::SlotTaken);
        }
        let appointment = appointment.into_appointment(Utc::now());
        state.appointments.insert(appointment.id, appointment.clone());
        Ok(appointment)
    }

    async fn find_appointment(&self, id: Uuid) -> DatabaseResult<Option<Appointment>> {
        Ok(self.state.read().appointments.get(&id).cloned())
    }

    async fn list_appointments(
        &self,
        query: &AppointmentQuery,
        page: PageRequest,
    ) -> DatabaseResult<Page<Appointment>> {
        let mut matching: Vec<Appointment> = self
            .state
            .read()
            .appointments
            .values()
            .filter(|a| query.matches(a))
            .cloned()
            .collect();
        matching.sort_by(|a, b| compare_appointments(query.sort, a, b));
        Ok(paginate(matching, page))
    }

    async fn count_appointments(&self, query: &AppointmentQuery) -> DatabaseResult<i64> {
        let count = self
            .state
            .read()
            .appointments
            .values()
            .filter(|a| query.matches(a))
            .count();
        Ok(i64::try_from(count).unwrap_or(i64::MAX))
    }

    async fn status_counts(&self, query: &AppointmentQuery) -> DatabaseResult<StatusCounts> {
        let mut counts = StatusCounts::default();
        for appointment in self.state.read().appointments.values() {
            if query.matches(appointment) {
                counts.add(appointment.status, 1);
            }
        }
        Ok(counts)
    }

    async fn update_status(
        &self,
        id: Uuid,
        change: StatusChange,
    ) -> DatabaseResult<Option<Appointment>> {
        let mut state = self.state.write();
        let Some(current) = state.appointments.get(&id) else {
            return Ok(None);
        };
        if change.status.holds_slot()
            && !current.status.holds_slot()
            && state.slot_holder(&current.slot(), Some(id)).is_some()
        {
            return Err(DatabaseError::SlotTaken);
        }
        let Some(appointment) = state.appointments.get_mut(&id) else {
            return Ok(None);
        };
        appointment.status = change.status;
        if let Some(cancellation) = change.cancellation {
            appointment.cancellation_reason = Some(cancellation.reason);
            appointment.cancelled_by = Some(cancellation.by);
        }
        appointment.updated_at = Utc::now();
        Ok(Some(appointment.clone()))
    }

    async fn complete_with_prescription(
        &self,
        id: Uuid,
        prescription: Prescription,
    ) -> DatabaseResult<Option<Appointment>> {
        let mut state = self.state.write();
        let Some(appointment) = state.appointments.get_mut(&id) else {
            return Ok(None);
        };
        appointment.prescription = Some(prescription);
        appointment.status = AppointmentStatus::Completed;
        appointment.updated_at = Utc::now();
        Ok(Some(appointment.clone()))
    }
}

#[async_trait]
impl ClinicStore for MemoryClinicStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn is_healthy(&self) -> bool {
        true
    }
}
