use database_layer::{AppointmentStatus, DatabaseError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("Doctor is not available for appointments")]
    DoctorUnavailable,

    #[error("Appointment date and time must be in the future")]
    NotInFuture,

    #[error("Invalid appointment time '{0}', expected HH:MM")]
    InvalidSlotTime(String),

    #[error("This time slot is already booked. Please choose another time.")]
    SlotTaken,

    #[error("Appointment not found")]
    AppointmentNotFound,

    /// Caller is not a participant allowed to perform `action`
    #[error("Not authorized to {action} this appointment")]
    NotOwner { action: &'static str },

    #[error("Status '{0}' cannot be set by a doctor")]
    InvalidStatus(AppointmentStatus),

    #[error("Cannot cancel completed or already cancelled appointment")]
    NotCancellable,

    #[error("Store error: {0}")]
    Store(DatabaseError),
}

impl From<DatabaseError> for WorkflowError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::SlotTaken => WorkflowError::SlotTaken,
            other => WorkflowError::Store(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, WorkflowError>;
