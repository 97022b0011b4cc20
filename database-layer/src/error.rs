use thiserror::Error;

/// Name of the partial unique index guarding active appointment slots
pub const ACTIVE_SLOT_CONSTRAINT: &str = "appointments_active_slot_key";

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Migration error: {0}")]
    MigrationError(String),

    /// Another pending or approved appointment already holds the slot
    #[error("Appointment slot already taken")]
    SlotTaken,

    #[error("Unique constraint violated: {constraint}")]
    UniqueViolation { constraint: String },

    /// A stored row could not be mapped back to a domain record
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Database error: {0}")]
    SqlxError(sqlx::Error),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some("23505") {
                let constraint = db_err.constraint().unwrap_or_default().to_string();
                if constraint == ACTIVE_SLOT_CONSTRAINT {
                    return DatabaseError::SlotTaken;
                }
                return DatabaseError::UniqueViolation { constraint };
            }
        }
        DatabaseError::SqlxError(err)
    }
}

impl From<crate::models::UnknownVariant> for DatabaseError {
    fn from(err: crate::models::UnknownVariant) -> Self {
        DatabaseError::InvalidRecord(err.to_string())
    }
}

impl DatabaseError {
    /// Unique-key and slot collisions, as opposed to infrastructure failures
    pub fn is_conflict(&self) -> bool {
        matches!(self, DatabaseError::SlotTaken | DatabaseError::UniqueViolation { .. })
    }
}

pub type DatabaseResult<T> = Result<T, DatabaseError>;
