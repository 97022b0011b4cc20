//! Appointment workflows for MediBook
//!
//! - [`status`]: the appointment status state machine
//! - [`BookingWorkflow`]: doctor availability, future-time and slot checks
//!   before an appointment is created
//! - [`StatusWorkflow`]: doctor updates, prescriptions and patient
//!   cancellation under ownership rules
//!
//! Both workflows run over `Arc<dyn ClinicStore>` and never touch HTTP types.
//!
//! # Example
//!
//! ```rust,no_run
//! use chrono::{Offset, Utc};
//! use database_layer::{ClinicStore, MemoryClinicStore};
//! use std::sync::Arc;
//! use workflow_engine::{BookingWorkflow, StatusWorkflow};
//!
//! let store: Arc<dyn ClinicStore> = Arc::new(MemoryClinicStore::new());
//! let utc = Utc.fix();
//! let booking = BookingWorkflow::new(store.clone(), utc);
//! let status = StatusWorkflow::new(store);
//! # let _ = (booking, status);
//! ```

pub mod booking;
pub mod error;
pub mod lifecycle;
pub mod status;

#[cfg(test)]
mod testing;

pub use booking::{compose_slot_time, parse_slot_time, BookingRequest, BookingWorkflow};
pub use error::{Result, WorkflowError};
pub use lifecycle::{StatusWorkflow, DEFAULT_PATIENT_CANCEL_REASON};
