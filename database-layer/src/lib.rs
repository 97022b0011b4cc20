//! Persistence for MediBook identities and appointments
//!
//! The crate exposes two store traits, [`CredentialStore`] for patients,
//! doctors and administrators and [`AppointmentStore`] for bookings, joined
//! by [`ClinicStore`]. Two backends implement them:
//!
//! - [`PgClinicStore`] over a [`DatabasePool`], with the schema in
//!   `migrations/` and slot exclusivity enforced by a partial unique index
//! - [`MemoryClinicStore`], used by tests and the server's `--in-memory` mode
//!
//! # Example
//!
//! ```rust,no_run
//! use database_layer::{DatabasePool, PgClinicStore, PoolSettings};
//!
//! # async fn run() -> Result<(), database_layer::DatabaseError> {
//! let pool = DatabasePool::connect(&PoolSettings::new("postgres://localhost/medibook")).await?;
//! pool.run_migrations().await?;
//! let store = PgClinicStore::new(pool);
//! # let _ = store;
//! # Ok(())
//! # }
//! ```

pub mod connection;
pub mod error;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod store;

pub use connection::{DatabasePool, PoolSettings};
pub use error::{DatabaseError, DatabaseResult, ACTIVE_SLOT_CONSTRAINT};
pub use memory::MemoryClinicStore;
pub use models::*;
pub use postgres::PgClinicStore;
pub use store::*;
