// Appointment booking
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};
use database_layer::{
    Appointment, ClinicStore, ConsultationType, Department, NewAppointment, PaymentMethod, Slot,
};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{Result, WorkflowError};

const SLOT_TIME_FORMATS: [&str; 2] = ["%H:%M", "%H:%M:%S"];

/// Parse an `HH:MM` slot label into a time of day.
///
/// `HH:MM:SS` is accepted only with zero seconds, since slots are stored as `HH:MM`.
pub fn parse_slot_time(time: &str) -> Result<NaiveTime> {
    let trimmed = time.trim();
    SLOT_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(trimmed, format).ok())
        .filter(|parsed| parsed.second() == 0)
        .ok_or_else(|| WorkflowError::InvalidSlotTime(time.to_string()))
}

/// Combine a calendar date and slot label in the clinic's offset into an instant
pub fn compose_slot_time(date: NaiveDate, time: &str, offset: FixedOffset) -> Result<DateTime<Utc>> {
    let local = date.and_time(parse_slot_time(time)?);
    offset
        .from_local_datetime(&local)
        .single()
        .map(|at| at.with_timezone(&Utc))
        .ok_or_else(|| WorkflowError::InvalidSlotTime(time.to_string()))
}

/// A patient's request for a slot with a doctor
#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub doctor_id: Uuid,
    pub department: Department,
    pub appointment_date: NaiveDate,
    pub appointment_time: String,
    pub consultation_type: ConsultationType,
    pub symptoms: Option<String>,
    pub notes: Option<String>,
    pub payment_method: PaymentMethod,
}

/// Validates and creates appointments
#[derive(Clone)]
pub struct BookingWorkflow {
    store: Arc<dyn ClinicStore>,
    offset: FixedOffset,
}

impl BookingWorkflow {
    pub fn new(store: Arc<dyn ClinicStore>, offset: FixedOffset) -> Self {
        Self { store, offset }
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Book `request` for `patient_id`, judging "future" against `now`
    pub async fn book(
        &self,
        patient_id: Uuid,
        request: BookingRequest,
        now: DateTime<Utc>,
    ) -> Result<Appointment> {
        let doctor = self
            .store
            .find_identity(request.doctor_id)
            .await?
            .filter(|identity| identity.doctor().is_some())
            .ok_or(WorkflowError::DoctorNotFound)?;

        if !doctor.accepts_bookings() {
            debug!(doctor_id = %doctor.id, "Booking rejected, doctor unavailable");
            return Err(WorkflowError::DoctorUnavailable);
        }
        let fee = doctor.doctor().map_or(0.0, |d| d.consultation_fee);

        let starts_at = compose_slot_time(request.appointment_date, &request.appointment_time, self.offset)?;
        if starts_at <= now {
            return Err(WorkflowError::NotInFuture);
        }

        // Canonical label so "9:00" and "09:00" name the same slot
        let time_label = parse_slot_time(&request.appointment_time)?
            .format("%H:%M")
            .to_string();

        let slot = Slot {
            doctor_id: doctor.id,
            date: request.appointment_date,
            time: time_label,
        };
        if self.store.find_slot_holder(&slot).await?.is_some() {
            return Err(WorkflowError::SlotTaken);
        }

        let appointment = self
            .store
            .insert_appointment(NewAppointment {
                patient_id,
                doctor_id: slot.doctor_id,
                department: request.department,
                appointment_date: slot.date,
                appointment_time: slot.time,
                consultation_type: request.consultation_type,
                symptoms: request.symptoms,
                notes: request.notes,
                fee,
                payment_method: request.payment_method,
            })
            .await?;

        info!(
            appointment_id = %appointment.id,
            doctor_id = %appointment.doctor_id,
            patient_id = %appointment.patient_id,
            date = %appointment.appointment_date,
            time = %appointment.appointment_time,
            "Appointment booked"
        );
        Ok(appointment)
    }
}
