//! Server configuration
//!
//! Values come from an optional TOML file layered under `MEDIBOOK_*`
//! environment variables, e.g. `MEDIBOOK_SERVER__PORT=8080` or
//! `MEDIBOOK_AUTH__JWT_SECRET=...`. `DATABASE_URL` is honoured when no
//! database url is configured.

use anyhow::{anyhow, Context, Result};
use chrono::{FixedOffset, Offset, Utc};
use database_layer::PoolSettings;
use logger_redacted::RedactionConfig;
use serde::{Deserialize, Serialize};

/// Signing secret used when none is configured; startup warns about it
pub const DEV_JWT_SECRET: &str = "medibook-development-secret-change-me";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: HttpSettings,
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub auth: AuthSettings,
    #[serde(default)]
    pub booking: BookingSettings,
    #[serde(default)]
    pub logging: RedactionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Allowed CORS origins; empty allows any origin
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// Postgres url; absent selects the in-memory store
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSettings {
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,
    /// Bootstrap administrator, created at startup when email and password are set
    #[serde(default = "default_admin_name")]
    pub admin_name: String,
    #[serde(default)]
    pub admin_email: Option<String>,
    #[serde(default)]
    pub admin_password: Option<String>,
    /// Argon2id memory cost in KiB
    #[serde(default = "default_password_memory_kib")]
    pub password_memory_kib: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingSettings {
    /// Clinic wall-clock offset from UTC, used to judge "future" slots
    #[serde(default)]
    pub utc_offset_minutes: i32,
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_max_connections() -> u32 {
    20
}

fn default_min_connections() -> u32 {
    2
}

fn default_acquire_timeout_secs() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

fn default_jwt_secret() -> String {
    DEV_JWT_SECRET.to_string()
}

fn default_token_ttl_hours() -> i64 {
    24 * 7
}

fn default_admin_name() -> String {
    "Administrator".to_string()
}

fn default_password_memory_kib() -> u32 {
    19456
}

fn default_page_size() -> u32 {
    10
}

fn default_max_page_size() -> u32 {
    100
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout_secs(),
            cors_origins: Vec::new(),
        }
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            acquire_timeout_secs: default_acquire_timeout_secs(),
            run_migrations: true,
        }
    }
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            token_ttl_hours: default_token_ttl_hours(),
            admin_name: default_admin_name(),
            admin_email: None,
            admin_password: None,
            password_memory_kib: default_password_memory_kib(),
        }
    }
}

impl Default for BookingSettings {
    fn default() -> Self {
        Self {
            utc_offset_minutes: 0,
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

impl ServerConfig {
    /// Load `path` (missing file is fine) and apply environment overrides
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("MEDIBOOK")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("server.cors_origins"),
            )
            .build()
            .with_context(|| format!("Failed to read configuration from {path}"))?;

        let mut config: ServerConfig = settings
            .try_deserialize()
            .context("Invalid configuration")?;

        if config.database.url.is_none() {
            config.database.url = std::env::var("DATABASE_URL").ok().filter(|url| !url.is_empty());
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.auth.jwt_secret.trim().is_empty() {
            return Err(anyhow!("auth.jwt_secret must not be empty"));
        }
        if self.auth.token_ttl_hours <= 0 {
            return Err(anyhow!("auth.token_ttl_hours must be positive"));
        }
        if FixedOffset::east_opt(self.booking.utc_offset_minutes.saturating_mul(60)).is_none() {
            return Err(anyhow!(
                "booking.utc_offset_minutes out of range: {}",
                self.booking.utc_offset_minutes
            ));
        }
        if self.booking.default_page_size == 0 || self.booking.max_page_size == 0 {
            return Err(anyhow!("booking page sizes must be positive"));
        }
        Ok(())
    }

    /// Clinic offset; validated at load time
    pub fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.booking.utc_offset_minutes.saturating_mul(60))
            .unwrap_or_else(|| Utc.fix())
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.auth.jwt_secret == DEV_JWT_SECRET
    }

    /// Pool settings when a database url is configured
    pub fn pool_settings(&self) -> Option<PoolSettings> {
        self.database.url.as_ref().map(|url| PoolSettings {
            url: url.clone(),
            max_connections: self.database.max_connections,
            min_connections: self.database.min_connections,
            acquire_timeout_secs: self.database.acquire_timeout_secs,
        })
    }
}
