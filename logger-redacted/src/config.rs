// Redaction configuration
use serde::{Deserialize, Serialize};

/// A user supplied pattern and its replacement text
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CustomPattern {
    pub pattern: String,
    #[serde(default = "default_replacement")]
    pub replacement: String,
}

/// PII redaction configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RedactionConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub redact_emails: bool,
    #[serde(default = "default_true")]
    pub redact_phones: bool,
    /// Replace values by a digest instead of a partial mask
    #[serde(default = "default_true")]
    pub hash_for_correlation: bool,
    #[serde(default)]
    pub custom_patterns: Vec<CustomPattern>,
}

fn default_true() -> bool {
    true
}

fn default_replacement() -> String {
    crate::REDACTION_MARKER.to_string()
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            redact_emails: true,
            redact_phones: true,
            hash_for_correlation: true,
            custom_patterns: Vec::new(),
        }
    }
}
