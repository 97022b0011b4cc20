// Appointment status changes under ownership rules
use database_layer::{
    Appointment, AppointmentStatus, Cancellation, CancelledBy, ClinicStore, Prescription, Role,
    StatusChange,
};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{Result, WorkflowError};
use crate::status;

pub const DEFAULT_PATIENT_CANCEL_REASON: &str = "Cancelled by patient";

/// Doctor and patient driven status transitions
#[derive(Clone)]
pub struct StatusWorkflow {
    store: Arc<dyn ClinicStore>,
}

impl StatusWorkflow {
    pub fn new(store: Arc<dyn ClinicStore>) -> Self {
        Self { store }
    }

    async fn load(&self, appointment_id: Uuid) -> Result<Appointment> {
        self.store
            .find_appointment(appointment_id)
            .await?
            .ok_or(WorkflowError::AppointmentNotFound)
    }

    /// Appointment as seen by `caller`: admins see all, others only their own
    pub async fn view(&self, caller_id: Uuid, role: Role, appointment_id: Uuid) -> Result<Appointment> {
        let appointment = self.load(appointment_id).await?;
        let visible = match role {
            Role::Admin => true,
            Role::Patient => appointment.patient_id == caller_id,
            Role::Doctor => appointment.doctor_id == caller_id,
        };
        if !visible {
            return Err(WorkflowError::NotOwner { action: "view" });
        }
        Ok(appointment)
    }

    /// Set `target` on one of the doctor's appointments
    pub async fn doctor_update(
        &self,
        doctor_id: Uuid,
        appointment_id: Uuid,
        target: AppointmentStatus,
        reason: Option<String>,
    ) -> Result<Appointment> {
        if !status::doctor_may_set(target) {
            return Err(WorkflowError::InvalidStatus(target));
        }

        let appointment = self.load(appointment_id).await?;
        if appointment.doctor_id != doctor_id {
            return Err(WorkflowError::NotOwner { action: "update" });
        }

        if !status::is_modeled(appointment.status, target) {
            warn!(
                appointment_id = %appointment.id,
                from = %appointment.status,
                to = %target,
                "Status update outside the modeled lifecycle"
            );
        }

        let cancellation = match (target, reason) {
            (AppointmentStatus::Cancelled, Some(reason)) => Some(Cancellation {
                reason,
                by: CancelledBy::Doctor,
            }),
            _ => None,
        };

        let updated = self
            .store
            .update_status(
                appointment.id,
                StatusChange {
                    status: target,
                    cancellation,
                },
            )
            .await?
            .ok_or(WorkflowError::AppointmentNotFound)?;

        info!(
            appointment_id = %updated.id,
            doctor_id = %doctor_id,
            status = %updated.status,
            "Appointment status updated"
        );
        Ok(updated)
    }

    /// Store a prescription and complete the appointment in one write
    pub async fn attach_prescription(
        &self,
        doctor_id: Uuid,
        appointment_id: Uuid,
        prescription: Prescription,
    ) -> Result<Appointment> {
        let appointment = self.load(appointment_id).await?;
        if appointment.doctor_id != doctor_id {
            return Err(WorkflowError::NotOwner { action: "update" });
        }

        if appointment.status == AppointmentStatus::Cancelled {
            warn!(
                appointment_id = %appointment.id,
                "Prescription attached to a cancelled appointment, marking it completed"
            );
        }

        let updated = self
            .store
            .complete_with_prescription(appointment.id, prescription)
            .await?
            .ok_or(WorkflowError::AppointmentNotFound)?;

        info!(
            appointment_id = %updated.id,
            doctor_id = %doctor_id,
            medicines = updated.prescription.as_ref().map_or(0, |p| p.medicines.len()),
            "Prescription added"
        );
        Ok(updated)
    }

    /// Withdraw one of the patient's pending or approved appointments
    pub async fn patient_cancel(
        &self,
        patient_id: Uuid,
        appointment_id: Uuid,
        reason: Option<String>,
    ) -> Result<Appointment> {
        let appointment = self.load(appointment_id).await?;
        if appointment.patient_id != patient_id {
            return Err(WorkflowError::NotOwner { action: "cancel" });
        }
        if !status::patient_may_cancel(appointment.status) {
            return Err(WorkflowError::NotCancellable);
        }

        let reason = reason
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PATIENT_CANCEL_REASON.to_string());

        let updated = self
            .store
            .update_status(
                appointment.id,
                StatusChange {
                    status: AppointmentStatus::Cancelled,
                    cancellation: Some(Cancellation {
                        reason,
                        by: CancelledBy::Patient,
                    }),
                },
            )
            .await?
            .ok_or(WorkflowError::AppointmentNotFound)?;

        info!(appointment_id = %updated.id, patient_id = %patient_id, "Appointment cancelled by patient");
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{seed_doctor, seed_patient, store};
    use chrono::{Duration, Utc};
    use database_layer::{
        ConsultationType, Department, Medicine, NewAppointment, PaymentMethod,
    };

    struct Fixture {
        store: Arc<dyn ClinicStore>,
        workflow: StatusWorkflow,
        doctor_id: Uuid,
        other_doctor_id: Uuid,
        patient_id: Uuid,
        appointment_id: Uuid,
    }

    async fn fixture() -> Fixture {
        let store = store();
        let doctor = seed_doctor(&store, "REG-200", true, true, 400.0).await;
        let other = seed_doctor(&store, "REG-201", true, true, 400.0).await;
        let patient = seed_patient(&store, "patient@example.com").await;
        let appointment = store
            .insert_appointment(NewAppointment {
                patient_id: patient.id,
                doctor_id: doctor.id,
                department: Department::Neurology,
                appointment_date: (Utc::now() + Duration::days(2)).date_naive(),
                appointment_time: "14:00".to_string(),
                consultation_type: ConsultationType::Video,
                symptoms: None,
                notes: None,
                fee: 400.0,
                payment_method: PaymentMethod::Online,
            })
            .await
            .unwrap();
        Fixture {
            workflow: StatusWorkflow::new(store.clone()),
            store,
            doctor_id: doctor.id,
            other_doctor_id: other.id,
            patient_id: patient.id,
            appointment_id: appointment.id,
        }
    }

    fn prescription() -> Prescription {
        Prescription {
            medicines: vec![Medicine {
                name: "Paracetamol".to_string(),
                dosage: "500mg".to_string(),
                duration: "5 days".to_string(),
                instructions: Some("After food".to_string()),
            }],
            advice: None,
            follow_up_date: None,
        }
    }

    #[tokio::test]
    async fn test_foreign_doctor_cannot_update() {
        let f = fixture().await;
        let err = f
            .workflow
            .doctor_update(f.other_doctor_id, f.appointment_id, AppointmentStatus::Approved, None)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::NotOwner { action: "update" }));

        let unchanged = f.store.find_appointment(f.appointment_id).await.unwrap().unwrap();
        assert_eq!(unchanged.status, AppointmentStatus::Pending);
    }

    #[tokio::test]
    async fn test_doctor_cancel_records_reason() {
        let f = fixture().await;
        let updated = f
            .workflow
            .doctor_update(
                f.doctor_id,
                f.appointment_id,
                AppointmentStatus::Cancelled,
                Some("Doctor on leave".to_string()),
            )
            .await
            .unwrap();
        assert_eq!(updated.status, AppointmentStatus::Cancelled);
        assert_eq!(updated.cancelled_by, Some(CancelledBy::Doctor));
        assert_eq!(updated.cancellation_reason.as_deref(), Some("Doctor on leave"));
    }

    #[tokio::test]
    async fn test_pending_is_not_a_doctor_target() {
        let f = fixture().await;
        let err = f
            .workflow
            .doctor_update(f.doctor_id, f.appointment_id, AppointmentStatus::Pending, None)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidStatus(AppointmentStatus::Pending)));
    }

    #[tokio::test]
    async fn test_prescription_completes_even_cancelled_appointments() {
        let f = fixture().await;
        f.workflow
            .doctor_update(f.doctor_id, f.appointment_id, AppointmentStatus::Cancelled, None)
            .await
            .unwrap();

        let updated = f
            .workflow
            .attach_prescription(f.doctor_id, f.appointment_id, prescription())
            .await
            .unwrap();
        assert_eq!(updated.status, AppointmentStatus::Completed);
        assert_eq!(updated.prescription, Some(prescription()));
    }

    #[tokio::test]
    async fn test_patient_cancel_uses_default_reason() {
        let f = fixture().await;
        let cancelled = f
            .workflow
            .patient_cancel(f.patient_id, f.appointment_id, None)
            .await
            .unwrap();
        assert_eq!(cancelled.status, AppointmentStatus::Cancelled);
        assert_eq!(cancelled.cancelled_by, Some(CancelledBy::Patient));
        assert_eq!(
            cancelled.cancellation_reason.as_deref(),
            Some(DEFAULT_PATIENT_CANCEL_REASON)
        );
    }

    #[tokio::test]
    async fn test_patient_cannot_cancel_completed_appointment() {
        let f = fixture().await;
        f.workflow
            .attach_prescription(f.doctor_id, f.appointment_id, prescription())
            .await
            .unwrap();

        let err = f
            .workflow
            .patient_cancel(f.patient_id, f.appointment_id, Some("Changed my mind".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::NotCancellable));

        let unchanged = f.store.find_appointment(f.appointment_id).await.unwrap().unwrap();
        assert_eq!(unchanged.status, AppointmentStatus::Completed);
        assert!(unchanged.cancellation_reason.is_none());
        assert!(unchanged.cancelled_by.is_none());
    }

    #[tokio::test]
    async fn test_view_is_limited_to_participants() {
        let f = fixture().await;
        assert!(f.workflow.view(f.patient_id, Role::Patient, f.appointment_id).await.is_ok());
        assert!(f.workflow.view(Uuid::new_v4(), Role::Admin, f.appointment_id).await.is_ok());

        let err = f
            .workflow
            .view(f.other_doctor_id, Role::Doctor, f.appointment_id)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::NotOwner { action: "view" }));
    }

    #[tokio::test]
    async fn test_missing_appointment() {
        let f = fixture().await;
        let err = f
            .workflow
            .patient_cancel(f.patient_id, Uuid::new_v4(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::AppointmentNotFound));
    }
}
