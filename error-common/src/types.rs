use thiserror::Error;

/// Errors that abort the process
#[derive(Error, Debug)]
pub enum MediBookError {
    /// Network communication errors (bind, accept)
    #[error("Network error: {0}")]
    NetworkError(String),

    /// HTTP server runtime errors
    #[error("Server error: {0}")]
    ServerError(String),

    /// Database connection or migration errors
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Internal system errors
    #[error("Internal error: {0}")]
    InternalError(String),

    /// Wrapped external errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MediBookError {
    /// Short machine-readable category, used as a log field
    pub fn category(&self) -> &'static str {
        match self {
            MediBookError::NetworkError(_) => "network",
            MediBookError::ServerError(_) => "server",
            MediBookError::DatabaseError(_) => "database",
            MediBookError::ConfigError(_) => "config",
            MediBookError::InternalError(_) => "internal",
            MediBookError::Other(_) => "other",
        }
    }
}

/// Result type alias for MediBook process operations
pub type Result<T> = std::result::Result<T, MediBookError>;

/// Log a fatal error with its category before the process exits
pub fn log_error(context: &str, error: &MediBookError) {
    tracing::error!(
        context = context,
        category = error.category(),
        error = %error,
        "MediBook error occurred"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anyhow_conversion_keeps_message() {
        let err: MediBookError = anyhow::anyhow!("pool exhausted").into();
        assert_eq!(err.category(), "other");
        assert_eq!(err.to_string(), "pool exhausted");
    }

    #[test]
    fn test_display_includes_category_prefix() {
        let err = MediBookError::ConfigError("missing jwt secret".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing jwt secret");
        assert_eq!(err.category(), "config");
    }
}
