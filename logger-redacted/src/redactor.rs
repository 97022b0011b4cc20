use base64::{engine::general_purpose, Engine as _};
use regex::Regex;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::config::RedactionConfig;

const EMAIL_PATTERN: &str = r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b";
const PHONE_PATTERN: &str = r"(?:\+\d{1,3}[-.\s]?)?\b\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}\b";

#[derive(Error, Debug)]
pub enum RedactionError {
    #[error("Invalid redaction pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// PII redactor for log messages
#[derive(Debug, Clone)]
pub struct PiiRedactor {
    config: RedactionConfig,
    email: Regex,
    phone: Regex,
    custom: Vec<(Regex, String)>,
}

impl PiiRedactor {
    pub fn new(config: RedactionConfig) -> Result<Self, RedactionError> {
        let custom = config
            .custom_patterns
            .iter()
            .map(|p| compile(&p.pattern).map(|re| (re, p.replacement.clone())))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            email: compile(EMAIL_PATTERN)?,
            phone: compile(PHONE_PATTERN)?,
            custom,
            config,
        })
    }

    /// Redactor that leaves text untouched
    pub fn disabled() -> Result<Self, RedactionError> {
        Self::new(RedactionConfig {
            enabled: false,
            ..RedactionConfig::default()
        })
    }

    pub fn redact(&self, text: &str) -> String {
        if !self.config.enabled {
            return text.to_string();
        }

        let mut result = text.to_string();

        if self.config.redact_emails {
            result = self.redact_emails(&result);
        }

        if self.config.redact_phones {
            result = self.redact_phones(&result);
        }

        for (pattern, replacement) in &self.custom {
            result = pattern.replace_all(&result, replacement.as_str()).to_string();
        }

        result
    }

    /// Redact a single value known to be an e-mail address or phone number
    pub fn redact_value(&self, value: &str) -> String {
        if !self.config.enabled {
            return value.to_string();
        }
        if self.config.hash_for_correlation {
            return format!("PII[{}]", hash_value(value));
        }
        mask_tail(value, 2)
    }

    fn redact_emails(&self, text: &str) -> String {
        self.email
            .replace_all(text, |caps: &regex::Captures| {
                let email = caps.get(0).map_or("", |m| m.as_str());
                if self.config.hash_for_correlation {
                    return format!("EMAIL[{}]", hash_value(email));
                }
                match email.split_once('@') {
                    Some((local, domain)) => {
                        format!("{}***@{}***", first_char(local), first_char(domain))
                    }
                    None => "***@***".to_string(),
                }
            })
            .to_string()
    }

    fn redact_phones(&self, text: &str) -> String {
        self.phone
            .replace_all(text, |caps: &regex::Captures| {
                let phone = caps.get(0).map_or("", |m| m.as_str());
                if self.config.hash_for_correlation {
                    format!("PHONE[{}]", hash_value(phone))
                } else {
                    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
                    mask_tail(&digits, 4)
                }
            })
            .to_string()
    }
}

fn compile(pattern: &str) -> Result<Regex, RedactionError> {
    Regex::new(pattern).map_err(|source| RedactionError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

fn first_char(s: &str) -> String {
    s.chars().next().map(String::from).unwrap_or_default()
}

/// Keep the last `keep` characters, star out the rest
fn mask_tail(value: &str, keep: usize) -> String {
    let count = value.chars().count();
    let hidden = count.saturating_sub(keep);
    value
        .chars()
        .enumerate()
        .map(|(i, c)| if i < hidden { '*' } else { c })
        .collect()
}

fn hash_value(value: &str) -> String {
    let digest = Sha256::digest(value.as_bytes());
    general_purpose::STANDARD_NO_PAD.encode(digest.get(..8).unwrap_or_default())
}
