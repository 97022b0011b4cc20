// Logging macros

/// `tracing::info!` with the formatted message passed through a redactor
///
/// ```rust,ignore
/// redacted_info!(redactor, role = "user", "Login succeeded for {}", email);
/// ```
#[macro_export]
macro_rules! redacted_info {
    ($redactor:expr, $($field:ident = $value:expr,)* $fmt:literal $(, $arg:expr)* $(,)?) => {
        tracing::info!($($field = $value,)* "{}", $redactor.redact(&format!($fmt $(, $arg)*)))
    };
}

/// `tracing::warn!` with the formatted message passed through a redactor
#[macro_export]
macro_rules! redacted_warn {
    ($redactor:expr, $($field:ident = $value:expr,)* $fmt:literal $(, $arg:expr)* $(,)?) => {
        tracing::warn!($($field = $value,)* "{}", $redactor.redact(&format!($fmt $(, $arg)*)))
    };
}
