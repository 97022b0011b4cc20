//! Appointment status state machine
//!
//! ```text
//! pending ──► approved ──► completed
//!    │           │
//!    └──► cancelled ◄──┘
//! ```
//!
//! `pending → completed` is reachable only by attaching a prescription.

use database_layer::AppointmentStatus;

/// Statuses a doctor may set through a status update
pub const DOCTOR_SETTABLE: [AppointmentStatus; 3] = [
    AppointmentStatus::Approved,
    AppointmentStatus::Cancelled,
    AppointmentStatus::Completed,
];

/// Whether `from → to` is an edge of the modeled lifecycle
pub fn is_modeled(from: AppointmentStatus, to: AppointmentStatus) -> bool {
    use AppointmentStatus::{Approved, Cancelled, Completed, Pending};
    matches!(
        (from, to),
        (Pending, Approved)
            | (Pending, Cancelled)
            | (Pending, Completed)
            | (Approved, Cancelled)
            | (Approved, Completed)
    )
}

pub fn doctor_may_set(status: AppointmentStatus) -> bool {
    DOCTOR_SETTABLE.contains(&status)
}

/// Patients may only withdraw appointments that still hold their slot
pub fn patient_may_cancel(status: AppointmentStatus) -> bool {
    status.holds_slot()
}

/// Terminal statuses have no outgoing modeled edges
pub fn is_terminal(status: AppointmentStatus) -> bool {
    !AppointmentStatus::ALL.iter().any(|&to| is_modeled(status, to))
}
