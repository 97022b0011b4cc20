use anyhow::{Context, Result};
use database_layer::{
    ClinicStore, DatabasePool, Identity, IdentityQuery, MemoryClinicStore, NewIdentity,
    PgClinicStore, Profile, Role,
};
use logger_redacted::{redacted_info, PiiRedactor};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use workflow_engine::{BookingWorkflow, StatusWorkflow};

use crate::auth::{PasswordService, TokenService};
use crate::config::ServerConfig;

/// Shared state handed to every handler through axum `State`
#[derive(Clone)]
pub struct MediBookServer {
    pub config: Arc<ServerConfig>,
    pub store: Arc<dyn ClinicStore>,
    pub tokens: TokenService,
    pub passwords: PasswordService,
    pub booking: BookingWorkflow,
    pub status: StatusWorkflow,
    pub redactor: Arc<PiiRedactor>,
    pub started_at: Instant,
}

impl MediBookServer {
    /// Connect the configured store, Postgres unless `in_memory` or no url is set
    pub async fn new(config: ServerConfig, in_memory: bool) -> Result<Self> {
        let pool_settings = config.pool_settings().filter(|_| !in_memory);

        let store: Arc<dyn ClinicStore> = match pool_settings {
            Some(settings) => {
                let pool = DatabasePool::connect(&settings)
                    .await
                    .context("Failed to connect to Postgres")?;
                if config.database.run_migrations {
                    pool.run_migrations().await.context("Failed to run migrations")?;
                }
                Arc::new(PgClinicStore::new(pool))
            }
            None => {
                warn!("Using the in-memory store, data is lost on shutdown");
                Arc::new(MemoryClinicStore::new())
            }
        };

        Self::with_store(config, store)
    }

    /// Build the server state over an existing store
    pub fn with_store(config: ServerConfig, store: Arc<dyn ClinicStore>) -> Result<Self> {
        let tokens = TokenService::new(&config.auth.jwt_secret, config.auth.token_ttl_hours);
        let passwords = PasswordService::new(config.auth.password_memory_kib)
            .context("Invalid password hashing parameters")?;
        let redactor = PiiRedactor::new(config.logging.clone()).context("Invalid log redaction patterns")?;

        info!(backend = store.backend_name(), "Clinic store ready");

        Ok(Self {
            booking: BookingWorkflow::new(store.clone(), config.offset()),
            status: StatusWorkflow::new(store.clone()),
            config: Arc::new(config),
            store,
            tokens,
            passwords,
            redactor: Arc::new(redactor),
            started_at: Instant::now(),
        })
    }

    /// Create the configured administrator if it does not exist yet
    pub async fn bootstrap_admin(&self) -> Result<Option<Identity>> {
        let auth = &self.config.auth;
        let (Some(email), Some(password)) = (auth.admin_email.as_deref(), auth.admin_password.as_deref()) else {
            let admins = self.store.count_identities(&IdentityQuery::new(Role::Admin)).await?;
            if admins == 0 {
                warn!("No administrator configured; set auth.admin_email and auth.admin_password");
            }
            return Ok(None);
        };

        if let Some(existing) = self.store.find_identity_by_email(Role::Admin, email).await? {
            redacted_info!(self.redactor, "Administrator {} already present", existing.email);
            return Ok(Some(existing));
        }

        let password_hash = self.passwords.hash(password).await?;
        let admin = self
            .store
            .insert_identity(NewIdentity {
                name: auth.admin_name.clone(),
                email: email.to_string(),
                phone: None,
                password_hash,
                profile: Profile::Admin,
            })
            .await
            .context("Failed to create administrator")?;

        redacted_info!(
            self.redactor,
            admin_id = tracing::field::display(admin.id),
            "Administrator {} created",
            admin.email
        );
        Ok(Some(admin))
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
