//! PII redaction for log output
//!
//! Patient and doctor contact details (e-mail addresses, phone numbers) show
//! up in authentication and registration logs. Everything that reaches a
//! `tracing` field from a request body goes through a [`PiiRedactor`] first.
//!
//! # Example
//!
//! ```rust
//! use logger_redacted::{PiiRedactor, RedactionConfig};
//!
//! let redactor = PiiRedactor::new(RedactionConfig {
//!     hash_for_correlation: false,
//!     ..RedactionConfig::default()
//! })
//! .unwrap();
//!
//! let line = redactor.redact("login attempt for asha@example.com from 9876543210");
//! assert!(!line.contains("asha@example.com"));
//! assert!(!line.contains("9876543210"));
//! ```
//!
//! With `hash_for_correlation` enabled (the default) every value is replaced
//! by a short SHA-256 digest, so repeated attempts for the same address can
//! still be correlated in the logs without exposing it.

pub mod config;
pub mod macros;
pub mod redactor;

pub use config::*;
pub use redactor::*;

/// Replacement text for redacted values when hashing is disabled
pub const REDACTION_MARKER: &str = "[REDACTED]";
